use url::Url;

/// Checks if a host matches a domain pattern
///
/// Two kinds of patterns are supported:
/// 1. Exact: "example.edu" matches only "example.edu"
/// 2. Wildcard: "*.example.edu" matches the bare domain and any subdomain
///    at any depth ("www.example.edu", "library.dept.example.edu")
///
/// Both sides are expected to be lowercase.
///
/// # Examples
///
/// ```
/// use campus_crawler::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.example.edu", "example.edu"));
/// assert!(matches_wildcard("*.example.edu", "library.example.edu"));
/// assert!(!matches_wildcard("*.example.edu", "notexample.edu"));
/// assert!(!matches_wildcard("example.edu", "www.example.edu"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Returns true if the host matches any of the patterns
pub fn matches_any(patterns: &[String], candidate: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| matches_wildcard(pattern, candidate))
}

/// Extracts the lowercase host from a URL
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
