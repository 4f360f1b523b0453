//! Campus-Crawler main entry point
//!
//! This is the command-line interface for the campus crawler.

use anyhow::Context;
use campus_crawler::config::{load_config_with_hash, Config};
use campus_crawler::crawler::{crawl, CrawlStatus};
use campus_crawler::url::UrlFilter;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Campus-Crawler: a resumable crawler for a bounded campus web property
///
/// Campus-Crawler crawls a university domain and a few related subdomains,
/// stores the text of every HTML page as a numbered file, and keeps a
/// durable ledger and queue so an interrupted crawl picks up where it
/// stopped.
#[derive(Parser, Debug)]
#[command(name = "campus-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A resumable campus web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, ignoring the previous ledger and queue
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the output files and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(ExitCode::SUCCESS)
    } else if cli.stats {
        handle_stats(&config)?;
        Ok(ExitCode::SUCCESS)
    } else {
        handle_crawl(config, config_hash, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("campus_crawler=info,warn"),
            1 => EnvFilter::new("campus_crawler=debug,info"),
            2 => EnvFilter::new("campus_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Campus-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Request timeout: {}ms", config.crawler.request_timeout);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay);
    println!("  Status interval: {}s", config.crawler.status_interval);
    println!("  Checkpoint interval: {}s", config.crawler.checkpoint_interval);
    println!(
        "  Milestone flush: every {} pages",
        config.crawler.milestone_interval
    );

    println!("\nUser Agent:");
    println!(
        "  {}",
        campus_crawler::crawler::user_agent_string(&config.user_agent)
    );

    println!("\nOutput:");
    println!("  Pages: {}", config.output.pages_dir);
    println!("  Ledger: {}", config.output.scraped_file);
    println!("  Queue: {}", config.output.queue_file);
    println!("  Checkpoint: {}", config.output.checkpoint_file);
    println!("  Membership index: {:?}", config.output.membership);

    println!("\nIn-Scope Domains ({}):", config.scope.domains.len());
    for domain in &config.scope.domains {
        println!("  - {}", domain);
    }

    println!(
        "\nSecondary Domains ({}):",
        config.scope.secondary.len()
    );
    for secondary in &config.scope.secondary {
        println!(
            "  - {} ({} indicators, {} path patterns)",
            secondary.domain,
            secondary.indicators.len(),
            secondary.path_patterns.len()
        );
    }

    println!(
        "\nExcluded Sections ({}):",
        config.scope.excluded_sections.len()
    );
    for section in &config.scope.excluded_sections {
        println!("  - {}", section);
    }

    let filter = UrlFilter::new(&config.scope);
    println!("\nSeeds ({}):", config.scope.seeds.len());
    for seed in &config.scope.seeds {
        println!("  * {} [{:?}]", seed, filter.evaluate(seed));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: summarizes the durable output files
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use campus_crawler::output::{load_statistics, print_statistics};

    let stats = load_statistics(&config.output).context("Failed to read output files")?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String, fresh: bool) -> anyhow::Result<ExitCode> {
    use campus_crawler::output::print_run_summary;

    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous ledger and queue)");
    } else {
        tracing::info!("Starting crawl (resuming from ledger and queue if present)");
    }
    tracing::info!(
        "Seeds: {}, in-scope domains: {}, workers: {}",
        config.scope.seeds.len(),
        config.scope.domains.len(),
        config.crawler.workers
    );

    let report = crawl(config, config_hash, fresh)
        .await
        .context("Crawl failed")?;

    print_run_summary(&report.stats);
    match report.status {
        CrawlStatus::Completed => println!(
            "\nDone crawling! Total pages scraped: {}",
            report.scraped_total
        ),
        CrawlStatus::Interrupted => println!(
            "\nState saved: {} scraped, {} remaining for the next run",
            report.scraped_total, report.remaining
        ),
    }

    Ok(ExitCode::from(report.status.exit_code()))
}
