//! URL handling module for Campus-Crawler
//!
//! This module provides URL normalization, wildcard domain matching and the
//! crawl-scope filter applied to every discovered link.

mod filter;
mod matcher;
mod normalize;

// Re-export main functions
pub use filter::{RejectReason, UrlFilter, Verdict};
pub use matcher::{extract_host, matches_any, matches_wildcard};
pub use normalize::{normalize_str, normalize_url};
