use std::fmt;

use serde::Serialize;

use crate::data::{PackageKind, PackageQuery};

const ORIG_COMPRESSIONS: [&str; 3] = ["gz", "xz", "bz2"];

/// Logical role a file plays in a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Dsc,
    Orig,
    Debian,
    Native,
    Binary,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Dsc => "dsc",
            Role::Orig => "orig",
            Role::Debian => "debian",
            Role::Native => "native",
            Role::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// Filename conventions of the target archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    /// Appended to the full version of every name except the orig tarball.
    pub revision_suffix: Option<String>,
    /// Binary architectures, in reporting order.
    pub architectures: Vec<String>,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            revision_suffix: None,
            architectures: vec!["amd64".to_string(), "all".to_string()],
        }
    }
}

impl NamingConvention {
    #[must_use]
    pub fn revision_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.revision_suffix = (!suffix.is_empty()).then_some(suffix);
        self
    }

    #[must_use]
    pub fn architectures<I, S>(mut self, architectures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.architectures = architectures.into_iter().map(Into::into).collect();
        self
    }

    fn full_version(&self, query: &PackageQuery) -> String {
        match &self.revision_suffix {
            Some(suffix) => format!("{}{suffix}", query.file_version()),
            None => query.file_version().to_string(),
        }
    }
}

/// Ordered alternatives for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateGroup {
    pub role: Role,
    /// Set for binary groups only.
    pub architecture: Option<String>,
    pub filenames: Vec<String>,
}

/// All filenames worth trying for a query, plus its pool directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    pub pool_path: String,
    pub groups: Vec<CandidateGroup>,
}

impl CandidateSet {
    pub fn group(&self, role: Role) -> Option<&CandidateGroup> {
        self.groups.iter().find(|group| group.role == role)
    }

    pub fn binaries(&self) -> impl Iterator<Item = &CandidateGroup> {
        self.groups.iter().filter(|group| group.role == Role::Binary)
    }
}

/// Pool directory of a package: `pool/main/{prefix}/{name}`.
///
/// `prefix` is the first four characters for `lib*` names, otherwise the
/// first character.
pub fn pool_path(name: &str) -> String {
    let prefix = if name.starts_with("lib") {
        name.get(..4).unwrap_or(name)
    } else {
        name.get(..1).unwrap_or(name)
    };
    format!("pool/main/{prefix}/{name}")
}

pub fn candidates(query: &PackageQuery, naming: &NamingConvention) -> CandidateSet {
    let name = query.name();
    let version = naming.full_version(query);

    let groups = match query.kind() {
        PackageKind::Source => {
            let upstream = query.upstream_version();
            vec![
                single(Role::Dsc, format!("{name}_{version}.dsc")),
                CandidateGroup {
                    role: Role::Orig,
                    architecture: None,
                    filenames: ORIG_COMPRESSIONS
                        .iter()
                        .map(|ext| format!("{name}_{upstream}.orig.tar.{ext}"))
                        .collect(),
                },
                single(Role::Debian, format!("{name}_{version}.debian.tar.xz")),
                single(Role::Native, format!("{name}_{version}.tar.xz")),
            ]
        }
        PackageKind::Binary => naming
            .architectures
            .iter()
            .map(|arch| CandidateGroup {
                role: Role::Binary,
                architecture: Some(arch.clone()),
                filenames: vec![format!("{name}_{version}_{arch}.deb")],
            })
            .collect(),
    };

    CandidateSet {
        pool_path: pool_path(name),
        groups,
    }
}

fn single(role: Role, filename: String) -> CandidateGroup {
    CandidateGroup {
        role,
        architecture: None,
        filenames: vec![filename],
    }
}
