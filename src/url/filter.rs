//! Crawl-scope predicate
//!
//! [`UrlFilter`] decides whether a discovered link is in scope and worth
//! fetching. It performs no I/O and holds no mutable state, so every rule can
//! be tested against literal URL strings.

use crate::config::{ScopeConfig, SecondaryDomain};
use crate::url::matcher::{extract_host, matches_any};
use std::fmt;
use url::Url;

/// Outcome of evaluating a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Why a link was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Not parseable as an absolute URL
    Malformed,
    /// Scheme other than http/https
    UnsupportedScheme,
    /// Contains a `#` fragment delimiter
    Fragment,
    /// Host is neither in scope nor on the secondary allow-list
    OutOfScope,
    /// Secondary host, but the link fails the relevance heuristic
    IrrelevantSecondary,
    /// Path ends with a blacklisted extension
    BlockedExtension,
    /// Contains a blacklisted substring
    BlockedSubstring,
    /// Starts with a blacklisted prefix
    BlockedPrefix,
    /// Belongs to an excluded sibling-campus section
    ExcludedSection,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Malformed => "malformed",
            Self::UnsupportedScheme => "unsupported_scheme",
            Self::Fragment => "fragment",
            Self::OutOfScope => "out_of_scope",
            Self::IrrelevantSecondary => "irrelevant_secondary",
            Self::BlockedExtension => "blocked_extension",
            Self::BlockedSubstring => "blocked_substring",
            Self::BlockedPrefix => "blocked_prefix",
            Self::ExcludedSection => "excluded_section",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
struct SecondaryRule {
    host: String,
    indicators: Vec<String>,
    path_patterns: Vec<String>,
}

impl SecondaryRule {
    fn from_config(entry: &SecondaryDomain) -> Self {
        Self {
            host: entry.domain.to_lowercase(),
            indicators: lowercase_all(&entry.indicators),
            path_patterns: lowercase_all(&entry.path_patterns),
        }
    }

    fn is_relevant(&self, link_lower: &str, path_lower: &str) -> bool {
        self.indicators.iter().any(|i| link_lower.contains(i.as_str()))
            || self
                .path_patterns
                .iter()
                .any(|p| path_lower.contains(p.as_str()))
    }
}

/// Pure scope predicate built once from the configuration
#[derive(Debug, Clone)]
pub struct UrlFilter {
    domains: Vec<String>,
    secondary: Vec<SecondaryRule>,
    excluded_sections: Vec<String>,
    blocked_prefixes: Vec<String>,
    blocked_substrings: Vec<String>,
    blocked_extensions: Vec<String>,
}

impl UrlFilter {
    pub fn new(scope: &ScopeConfig) -> Self {
        Self {
            domains: lowercase_all(&scope.domains),
            secondary: scope.secondary.iter().map(SecondaryRule::from_config).collect(),
            excluded_sections: lowercase_all(&scope.excluded_sections),
            blocked_prefixes: scope.blocked_prefixes.clone(),
            blocked_substrings: lowercase_all(&scope.blocked_substrings),
            blocked_extensions: lowercase_all(&scope.blocked_extensions),
        }
    }

    /// Evaluates an absolute link against every scope rule
    ///
    /// Rules are checked in a fixed order: shape (parse, scheme, fragment),
    /// then host scope, then the blacklists.
    pub fn evaluate(&self, link: &str) -> Verdict {
        let url = match Url::parse(link) {
            Ok(url) => url,
            Err(_) => return Verdict::Reject(RejectReason::Malformed),
        };

        if url.scheme() != "http" && url.scheme() != "https" {
            return Verdict::Reject(RejectReason::UnsupportedScheme);
        }

        if link.contains('#') {
            return Verdict::Reject(RejectReason::Fragment);
        }

        let host = match extract_host(&url) {
            Some(host) => host,
            None => return Verdict::Reject(RejectReason::Malformed),
        };
        let link_lower = link.to_lowercase();
        let path_lower = url.path().to_lowercase();

        if !matches_any(&self.domains, &host) {
            match self.secondary.iter().find(|rule| rule.host == host) {
                Some(rule) if rule.is_relevant(&link_lower, &path_lower) => {}
                Some(_) => return Verdict::Reject(RejectReason::IrrelevantSecondary),
                None => return Verdict::Reject(RejectReason::OutOfScope),
            }
        }

        if self
            .blocked_prefixes
            .iter()
            .any(|prefix| link.starts_with(prefix.as_str()))
        {
            return Verdict::Reject(RejectReason::BlockedPrefix);
        }

        if self
            .blocked_extensions
            .iter()
            .any(|ext| path_lower.ends_with(ext.as_str()))
        {
            return Verdict::Reject(RejectReason::BlockedExtension);
        }

        if self
            .blocked_substrings
            .iter()
            .any(|s| link_lower.contains(s.as_str()))
        {
            return Verdict::Reject(RejectReason::BlockedSubstring);
        }

        if self
            .excluded_sections
            .iter()
            .any(|s| link_lower.contains(s.as_str()))
        {
            return Verdict::Reject(RejectReason::ExcludedSection);
        }

        Verdict::Accept
    }

    /// Shorthand for `evaluate(link).is_accepted()`
    pub fn accepts(&self, link: &str) -> bool {
        self.evaluate(link).is_accepted()
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campus_filter() -> UrlFilter {
        let mut scope = ScopeConfig::new(
            vec!["https://www.campus.parent.edu".to_string()],
            vec!["*.campus.parent.edu".to_string()],
        );
        scope.secondary = vec![SecondaryDomain {
            domain: "calendar.parent.edu".to_string(),
            indicators: vec!["/campus".to_string(), "mississauga".to_string()],
            path_patterns: vec!["/course/".to_string()],
        }];
        scope.excluded_sections = vec!["othercampus".to_string(), "/oc/".to_string()];
        scope.blocked_prefixes = vec!["https://www.campus.parent.edu/~lab".to_string()];
        UrlFilter::new(&scope)
    }

    fn reject(reason: RejectReason) -> Verdict {
        Verdict::Reject(reason)
    }

    #[test]
    fn test_subdomain_accepted() {
        let filter = campus_filter();
        assert_eq!(
            filter.evaluate("https://sub.campus.parent.edu/page"),
            Verdict::Accept
        );
        assert!(filter.accepts("https://campus.parent.edu/"));
    }

    #[test]
    fn test_blocked_extension() {
        let filter = campus_filter();
        assert_eq!(
            filter.evaluate("https://campus.parent.edu/doc.pdf"),
            reject(RejectReason::BlockedExtension)
        );
        assert_eq!(
            filter.evaluate("https://campus.parent.edu/Files/Report.DOCX"),
            reject(RejectReason::BlockedExtension)
        );
    }

    #[test]
    fn test_sibling_campus_rejected() {
        let filter = campus_filter();
        assert!(!filter.accepts("https://othercampus.parent.edu/x"));
        assert_eq!(
            filter.evaluate("https://www.campus.parent.edu/othercampus-exchange"),
            reject(RejectReason::ExcludedSection)
        );
        assert_eq!(
            filter.evaluate("https://calendar.parent.edu/course/oc/ABC101"),
            reject(RejectReason::ExcludedSection)
        );
    }

    #[test]
    fn test_course_page_allowance() {
        let filter = campus_filter();
        assert_eq!(
            filter.evaluate("https://calendar.parent.edu/course/123"),
            Verdict::Accept
        );
    }

    #[test]
    fn test_secondary_needs_relevance() {
        let filter = campus_filter();
        assert_eq!(
            filter.evaluate("https://calendar.parent.edu/programs/history"),
            reject(RejectReason::IrrelevantSecondary)
        );
        assert!(filter.accepts("https://calendar.parent.edu/campus/programs"));
        assert!(filter.accepts("https://calendar.parent.edu/section/Mississauga"));
    }

    #[test]
    fn test_fragment_rejected() {
        let filter = campus_filter();
        assert_eq!(
            filter.evaluate("https://www.campus.parent.edu/about#section"),
            reject(RejectReason::Fragment)
        );
    }

    #[test]
    fn test_scheme_rules() {
        let filter = campus_filter();
        assert_eq!(
            filter.evaluate("ftp://www.campus.parent.edu/file"),
            reject(RejectReason::UnsupportedScheme)
        );
        assert_eq!(
            filter.evaluate("mailto:dean@campus.parent.edu"),
            reject(RejectReason::UnsupportedScheme)
        );
        assert!(filter.accepts("http://www.campus.parent.edu/news"));
    }

    #[test]
    fn test_out_of_scope() {
        let filter = campus_filter();
        assert_eq!(
            filter.evaluate("https://www.google.com/search"),
            reject(RejectReason::OutOfScope)
        );
        assert_eq!(
            filter.evaluate("https://notcampus.parent.edu/"),
            reject(RejectReason::OutOfScope)
        );
    }

    #[test]
    fn test_blocked_prefix_and_substring() {
        let filter = campus_filter();
        assert_eq!(
            filter.evaluate("https://www.campus.parent.edu/~lab/members"),
            reject(RejectReason::BlockedPrefix)
        );
        assert_eq!(
            filter.evaluate("https://www.campus.parent.edu/media/download?inline=1"),
            reject(RejectReason::BlockedSubstring)
        );
    }

    #[test]
    fn test_malformed() {
        let filter = campus_filter();
        assert_eq!(filter.evaluate("not a url"), reject(RejectReason::Malformed));
        assert_eq!(filter.evaluate(""), reject(RejectReason::Malformed));
    }

    #[test]
    fn test_extension_only_on_path_suffix() {
        let filter = campus_filter();
        // ".ai" inside a segment is not an extension
        assert!(filter.accepts("https://www.campus.parent.edu/aid/financial"));
        assert!(filter.accepts("https://www.campus.parent.edu/news?format=json"));
    }
}
