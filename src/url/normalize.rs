use crate::UrlError;
use url::{form_urlencoded, Url};

/// Query parameters that only carry tracking information
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL into the form used for every dedup comparison
///
/// The same policy is applied to seeds, to URLs loaded from the ledger and
/// queue files, and to every discovered link before it is enqueued, so
/// `/page` and `/page/` are one entity everywhere.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Lowercase scheme and host, drop default ports (done by the parser)
/// 3. Collapse duplicate slashes and dot segments
/// 4. Remove the trailing slash of non-root paths
/// 5. Remove the fragment
/// 6. Remove tracking query parameters (`utm_*`, `fbclid`, `gclid`, `mc_eid`)
/// 7. Sort the remaining query parameters; drop an empty query
///
/// The scheme and any `www.` prefix are preserved: `http` and `https`
/// variants of a page stay distinct.
///
/// # Examples
///
/// ```
/// use campus_crawler::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Example.EDU/dept//page/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://www.example.edu/dept/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let query = filter_and_sort_query(query);
        url.set_query(query.as_deref());
    }

    Ok(url)
}

/// Convenience wrapper returning the normalized form as a `String`
pub fn normalize_str(url_str: &str) -> Result<String, UrlError> {
    normalize_url(url_str).map(String::from)
}

/// Collapses empty and dot segments and strips the trailing slash
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Drops tracking parameters and orders the rest by key
///
/// Segments are kept exactly as written (no re-encoding), and the sort is
/// stable so repeated keys keep their relative order.
fn filter_and_sort_query(query: &str) -> Option<String> {
    let mut segments: Vec<(String, &str)> = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| (decoded_key(segment), segment))
        .filter(|(key, _)| !is_tracking_param(key))
        .collect();

    if segments.is_empty() {
        return None;
    }

    segments.sort_by(|a, b| a.0.cmp(&b.0));
    let joined: Vec<&str> = segments.into_iter().map(|(_, segment)| segment).collect();
    Some(joined.join("&"))
}

fn decoded_key(segment: &str) -> String {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
