//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of a crawl run as driven by the supervisor

mod phase;

pub use phase::CrawlPhase;
