use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Snapshot of the files known on a mirror at one point in time.
///
/// Never mutated after construction; a refresh replaces the whole value.
#[derive(Debug, Clone)]
pub struct MirrorListing {
    captured_at: Instant,
    paths: Vec<String>,
    by_basename: HashMap<String, usize>,
}

impl MirrorListing {
    pub fn new(paths: Vec<String>) -> Self {
        Self::captured(paths, Instant::now())
    }

    pub fn captured(paths: Vec<String>, captured_at: Instant) -> Self {
        let mut by_basename = HashMap::with_capacity(paths.len());
        for (index, path) in paths.iter().enumerate() {
            // First occurrence wins when two directories hold the same name.
            by_basename.entry(basename(path).to_string()).or_insert(index);
        }
        Self {
            captured_at,
            paths,
            by_basename,
        }
    }

    pub fn captured_at(&self) -> Instant { self.captured_at }

    pub fn paths(&self) -> &[String] { &self.paths }

    pub fn len(&self) -> usize { self.paths.len() }

    pub fn is_empty(&self) -> bool { self.paths.is_empty() }

    /// Full mirror-relative path of a file by its basename.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.by_basename.get(name).map(|&index| self.paths[index].as_str())
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.captured_at.elapsed() >= ttl
    }
}

fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}
