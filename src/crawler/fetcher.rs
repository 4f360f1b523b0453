//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the crawler's user agent
//! - GET requests with a bounded timeout
//! - The content-type gate (only `text/html` proceeds)
//! - Failure classification for diagnostics
//!
//! Failed fetches are never retried within a run.

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::error::Error as _;
use std::fmt;
use std::time::Duration;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Why a URL did not produce a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    Timeout,
    Connection,
    Tls,
    RateLimited,
    Forbidden,
    NotFound,
    ServerError,
    OtherStatus,
    Body,
    Storage,
}

impl FailureKind {
    /// Maps a non-success status code to its kind
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            s if s.is_server_error() => Self::ServerError,
            _ => Self::OtherStatus,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::Tls => "tls",
            Self::RateLimited => "rate_limited",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::ServerError => "server_error",
            Self::OtherStatus => "other_status",
            Self::Body => "body",
            Self::Storage => "storage",
        }
    }

    pub fn all() -> [Self; 10] {
        [
            Self::Timeout,
            Self::Connection,
            Self::Tls,
            Self::RateLimited,
            Self::Forbidden,
            Self::NotFound,
            Self::ServerError,
            Self::OtherStatus,
            Self::Body,
            Self::Storage,
        ]
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Response was not HTML; not an error, the URL is just dropped
    NotHtml {
        /// The actual Content-Type received (empty if absent)
        content_type: String,
    },

    /// Server answered with a non-success status
    HttpError {
        status_code: u16,
        kind: FailureKind,
    },

    /// Transport failure (timeout, refused connection, TLS, body read)
    NetworkError {
        error: String,
        kind: FailureKind,
    },
}

/// Formats the user agent string: `Name/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Builds the HTTP client shared by every worker
///
/// # Example
///
/// ```no_run
/// use campus_crawler::config::UserAgentConfig;
/// use campus_crawler::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "CampusCrawler".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.edu/about".to_string(),
///     contact_email: "admin@example.edu".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if a Content-Type header value denotes HTML
pub fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with `text/html` | `Success` |
/// | 2xx with another type | `NotHtml` |
/// | HTTP 429 / 403 / 404 / 5xx / other | `HttpError` |
/// | Timeout, refused connection, TLS failure | `NetworkError` |
/// | Body could not be read | `NetworkError` (`Body`) |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            return FetchResult::NetworkError {
                kind: classify_transport_error(&e),
                error: e.to_string(),
            }
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            kind: FailureKind::from_status(status),
        };
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html(&content_type) {
        return FetchResult::NotHtml { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => FetchResult::NetworkError {
            kind: if e.is_timeout() {
                FailureKind::Timeout
            } else {
                FailureKind::Body
            },
            error: e.to_string(),
        },
    }
}

/// Classifies a request-level error
fn classify_transport_error(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        return FailureKind::Timeout;
    }
    if is_tls_error(error) {
        return FailureKind::Tls;
    }
    if error.is_body() || error.is_decode() {
        return FailureKind::Body;
    }
    FailureKind::Connection
}

/// reqwest does not expose TLS failures directly; look through the source chain
fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(err) = source {
        let text = err.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            return true;
        }
        source = err.source();
    }
    false
}
