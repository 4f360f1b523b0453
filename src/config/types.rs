use serde::Deserialize;

/// Main configuration structure for Campus-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub scope: ScopeConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent worker tasks
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Fixed delay after every worker iteration (milliseconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// How long an idle worker waits on the frontier before re-checking (milliseconds)
    #[serde(rename = "dequeue-timeout", default = "default_dequeue_timeout")]
    pub dequeue_timeout: u64,

    /// Interval between progress log lines (seconds)
    #[serde(rename = "status-interval", default = "default_status_interval")]
    pub status_interval: u64,

    /// Interval between full state flushes and checkpoints (seconds)
    #[serde(rename = "checkpoint-interval", default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,

    /// Flush full state every N stored pages
    #[serde(rename = "milestone-interval", default = "default_milestone_interval")]
    pub milestone_interval: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            request_timeout: default_request_timeout(),
            politeness_delay: default_politeness_delay(),
            dequeue_timeout: default_dequeue_timeout(),
            status_interval: default_status_interval(),
            checkpoint_interval: default_checkpoint_interval(),
            milestone_interval: default_milestone_interval(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Which backend tracks queued/scraped membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MembershipBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one text file per stored page
    #[serde(rename = "pages-dir", default = "default_pages_dir")]
    pub pages_dir: String,

    /// Ledger of scraped URLs
    #[serde(rename = "scraped-file", default = "default_scraped_file")]
    pub scraped_file: String,

    /// Frontier snapshot
    #[serde(rename = "queue-file", default = "default_queue_file")]
    pub queue_file: String,

    /// Advisory progress snapshot
    #[serde(rename = "checkpoint-file", default = "default_checkpoint_file")]
    pub checkpoint_file: String,

    /// Extension of page files (without the dot)
    #[serde(rename = "page-extension", default = "default_page_extension")]
    pub page_extension: String,

    /// Zero-padding width of page file names
    #[serde(rename = "index-width", default = "default_index_width")]
    pub index_width: usize,

    /// Membership index backend
    #[serde(default)]
    pub membership: MembershipBackend,

    /// SQLite file used when `membership = "sqlite"`
    #[serde(rename = "index-path", default = "default_index_path")]
    pub index_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pages_dir: default_pages_dir(),
            scraped_file: default_scraped_file(),
            queue_file: default_queue_file(),
            checkpoint_file: default_checkpoint_file(),
            page_extension: default_page_extension(),
            index_width: default_index_width(),
            membership: MembershipBackend::Memory,
            index_path: default_index_path(),
        }
    }
}

/// Crawl scope: seeds, in-scope domains and blacklists
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// URLs queued when no prior state exists
    pub seeds: Vec<String>,

    /// Domain patterns (e.g., "example.edu" or "*.example.edu")
    pub domains: Vec<String>,

    /// Related domains admitted only for relevant links
    #[serde(default)]
    pub secondary: Vec<SecondaryDomain>,

    /// Case-insensitive substrings marking sibling-campus sections
    #[serde(rename = "excluded-sections", default)]
    pub excluded_sections: Vec<String>,

    /// Exact URL prefixes that are never crawled
    #[serde(rename = "blocked-prefixes", default)]
    pub blocked_prefixes: Vec<String>,

    /// Case-insensitive substrings that are never crawled
    #[serde(rename = "blocked-substrings", default = "default_blocked_substrings")]
    pub blocked_substrings: Vec<String>,

    /// Path extensions that are never crawled
    #[serde(rename = "blocked-extensions", default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,
}

/// Secondary domain entry with its relevance heuristic
#[derive(Debug, Clone, Deserialize)]
pub struct SecondaryDomain {
    /// Exact host (e.g., "calendar.example.edu")
    pub domain: String,

    /// A link is relevant if it contains any of these (case-insensitive)
    #[serde(default)]
    pub indicators: Vec<String>,

    /// A link is relevant if its path contains any of these
    #[serde(rename = "path-patterns", default)]
    pub path_patterns: Vec<String>,
}

fn default_workers() -> u32 {
    24
}

fn default_request_timeout() -> u64 {
    15_000
}

fn default_politeness_delay() -> u64 {
    200
}

fn default_dequeue_timeout() -> u64 {
    1_000
}

fn default_status_interval() -> u64 {
    60
}

fn default_checkpoint_interval() -> u64 {
    180
}

fn default_milestone_interval() -> u64 {
    50
}

fn default_pages_dir() -> String {
    "pages".to_string()
}

fn default_scraped_file() -> String {
    "scraped_urls.txt".to_string()
}

fn default_queue_file() -> String {
    "queued_urls.txt".to_string()
}

fn default_checkpoint_file() -> String {
    "checkpoint.txt".to_string()
}

fn default_page_extension() -> String {
    "txt".to_string()
}

fn default_index_width() -> usize {
    5
}

fn default_index_path() -> String {
    "membership.db".to_string()
}

fn default_blocked_substrings() -> Vec<String> {
    vec!["download?inline".to_string()]
}

/// Documents, media, archives, executables and structured-data formats
pub const DEFAULT_BLOCKED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".svg", ".zip", ".doc", ".docx", ".mp3", ".csv", ".xls",
    ".xlsx", ".ppt", ".pptx", ".txt", ".rtf", ".odt", ".ods", ".odp", ".gif", ".bmp", ".tiff",
    ".webp", ".ico", ".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm", ".mkv", ".wav", ".flac",
    ".aac", ".ogg", ".wma", ".m4a", ".tar", ".gz", ".rar", ".7z", ".bz2", ".exe", ".msi", ".dmg",
    ".deb", ".rpm", ".apk", ".ipa", ".swf", ".fla", ".psd", ".ai", ".eps", ".indd", ".sketch",
    ".fig", ".xml", ".json", ".yaml", ".yml", ".sql", ".db", ".sqlite", ".mdb", ".accdb", ".log",
    ".tmp", ".bak", ".old", ".orig", ".backup",
];

fn default_blocked_extensions() -> Vec<String> {
    DEFAULT_BLOCKED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl ScopeConfig {
    /// Builds a scope with the default blacklists
    pub fn new(seeds: Vec<String>, domains: Vec<String>) -> Self {
        Self {
            seeds,
            domains,
            secondary: Vec::new(),
            excluded_sections: Vec::new(),
            blocked_prefixes: Vec::new(),
            blocked_substrings: default_blocked_substrings(),
            blocked_extensions: default_blocked_extensions(),
        }
    }
}
