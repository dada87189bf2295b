/// Turns the contents of a URL list into job URLs.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. Order and
/// duplicates are preserved: one line is one job.
pub fn parse_url_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToOwned::to_owned)
        .collect()
}
