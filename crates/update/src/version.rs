/// Dot-separated numeric comparison. Non-numeric parts are skipped; on an
/// equal prefix the version with more parts is newer.
pub fn is_newer_version(latest: &str, current: &str) -> bool {
    let latest = parts(latest);
    let current = parts(current);

    for (l, c) in latest.iter().zip(&current) {
        if l != c {
            return l > c;
        }
    }
    latest.len() > current.len()
}

fn parts(version: &str) -> Vec<u32> {
    version
        .trim()
        .trim_start_matches('v')
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect()
}
