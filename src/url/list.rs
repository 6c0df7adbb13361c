use std::path::Path;

/// Parses a line-delimited URL list
///
/// Each line is trimmed; blank lines and lines starting with `#` are skipped.
/// The remaining lines are returned in file order without validation.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Reads and parses a URL list file
pub fn load_url_list(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_url_list(&content))
}
