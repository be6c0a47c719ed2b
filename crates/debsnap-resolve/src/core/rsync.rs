/// Extract regular-file paths from `rsync --list-only --recursive` output.
///
/// Each kept line looks like
/// `-rw-r--r--      1,234 2023/01/01 00:00:00 main/f/foo/foo_1.0.dsc`;
/// the path is everything after the fourth column and is returned with
/// `prefix` prepended.
pub fn parse_rsync_listing(stdout: &str, prefix: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| line.starts_with('-'))
        .filter_map(|line| {
            let mut rest = line;
            for _ in 0..4 {
                rest = rest.trim_start();
                let end = rest.find(char::is_whitespace)?;
                rest = &rest[end..];
            }
            let path = rest.trim();
            (!path.is_empty()).then(|| format!("{prefix}{path}"))
        })
        .collect()
}
