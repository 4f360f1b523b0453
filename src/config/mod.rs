//! Configuration module for Campus-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The configuration is read once at process start and never re-read.
//!
//! # Example
//!
//! ```no_run
//! use campus_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, MembershipBackend, OutputConfig, ScopeConfig, SecondaryDomain,
    UserAgentConfig, DEFAULT_BLOCKED_EXTENSIONS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
