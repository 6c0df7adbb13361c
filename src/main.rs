//! Ripple-Scrape main entry point
//!
//! This is the command-line interface for the Ripple-Scrape concurrent scraper.

use clap::Parser;
use ripple_scrape::config::{
    build_config, load_config_with_hash, parse_selector_arg, ScrapeConfig, ScraperSection,
};
use ripple_scrape::output::{
    print_record_lines, print_statistics, write_records, OutputFormat, RunStatistics,
};
use ripple_scrape::pipeline::Pipeline;
use ripple_scrape::url::{load_url_list, parse_targets, Target};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ripple-Scrape: a polite concurrent web scraper
///
/// Ripple-Scrape fetches a list of URLs under a concurrency limit, extracts
/// values with named CSS selectors, optionally respects robots.txt and
/// throttles requests globally or per host.
#[derive(Parser, Debug)]
#[command(name = "ripple-scrape")]
#[command(version)]
#[command(about = "A polite concurrent web scraper", long_about = None)]
struct Cli {
    /// URL to scrape (repeatable)
    #[arg(long = "url", value_name = "URL", required_unless_present = "urls_file")]
    urls: Vec<String>,

    /// File with one URL per line (blank lines and # comments are skipped)
    #[arg(long, value_name = "FILE", conflicts_with = "urls")]
    urls_file: Option<PathBuf>,

    /// Extraction rule in the form name=css[@attr] (repeatable)
    #[arg(long = "selector", value_name = "RULE")]
    selectors: Vec<String>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of URLs processed at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Minimum delay between requests, in seconds
    #[arg(long)]
    delay: Option<f64>,

    /// Apply the delay per host instead of globally
    #[arg(long)]
    per_host: bool,

    /// Consult robots.txt before fetching
    #[arg(long)]
    respect_robots: bool,

    /// Per-request timeout, in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    user_agent: Option<String>,

    /// Extra attempts for network errors, timeouts, HTTP 429 and 5xx
    #[arg(long)]
    retries: Option<u32>,

    /// Delay before the first retry in seconds (doubles on each retry)
    #[arg(long)]
    retry_backoff: Option<f64>,

    /// Stop the run after this many seconds; unfinished URLs are cancelled
    #[arg(long)]
    deadline: Option<f64>,

    /// Emit records in completion order instead of input order
    #[arg(long)]
    no_preserve_order: bool,

    /// Write records to this file
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Format of the output file (jsonl or csv)
    #[arg(long, default_value = "jsonl")]
    output_format: OutputFormat,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and input and show what would be scraped without fetching
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Command-line values that override the configuration file
    fn overrides(&self) -> ScraperSection {
        ScraperSection {
            concurrency: self.concurrency,
            delay: self.delay,
            per_host: self.per_host.then_some(true),
            respect_robots: self.respect_robots.then_some(true),
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
            retries: self.retries,
            retry_backoff: self.retry_backoff,
            deadline: self.deadline,
            preserve_order: self.no_preserve_order.then_some(false),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    Some(cfg)
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => None,
    };

    let cli_selectors = cli
        .selectors
        .iter()
        .map(|arg| parse_selector_arg(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let config = match build_config(file_config, cli.overrides(), cli_selectors) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    // Load and validate input URLs
    let raw_urls = match &cli.urls_file {
        Some(path) => load_url_list(path)?,
        None => cli.urls.clone(),
    };
    let targets = match parse_targets(&raw_urls) {
        Ok(targets) => targets,
        Err(e) => {
            tracing::error!("Invalid input: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &targets, &cli);
        return Ok(());
    }

    handle_scrape(config, targets, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_scrape=info,warn"),
            1 => EnvFilter::new("ripple_scrape=debug,info"),
            2 => EnvFilter::new("ripple_scrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows what would be scraped
fn handle_dry_run(config: &ScrapeConfig, targets: &[Target], cli: &Cli) {
    println!("=== Ripple-Scrape Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Concurrency: {}", config.concurrency);
    println!(
        "  Delay: {:?} ({})",
        config.delay,
        if config.per_host { "per host" } else { "global" }
    );
    println!("  Timeout: {:?}", config.timeout);
    println!("  Respect robots.txt: {}", config.respect_robots);
    println!("  User agent: {}", config.user_agent);
    println!(
        "  Retries: {} (backoff {:?})",
        config.retries, config.retry_backoff
    );
    if let Some(deadline) = config.deadline {
        println!("  Deadline: {:?}", deadline);
    }
    println!("  Preserve order: {}", config.preserve_order);

    let selectors = config.effective_selectors();
    println!("\nSelectors ({}):", selectors.len());
    for rule in &selectors {
        match &rule.attribute {
            Some(attribute) => println!("  - {} = {} @{}", rule.name, rule.css, attribute),
            None => println!("  - {} = {}", rule.name, rule.css),
        }
    }

    println!("\nOutput:");
    match &cli.output {
        Some(path) => println!("  {} ({})", path.display(), cli.output_format),
        None => println!("  console only"),
    }

    println!("\nURLs ({}):", targets.len());
    for target in targets {
        println!("  - {}", target.url);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would scrape {} URLs", targets.len());
}

/// Handles the main scrape operation
async fn handle_scrape(
    config: ScrapeConfig,
    targets: Vec<Target>,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let columns: Vec<String> = config
        .effective_selectors()
        .into_iter()
        .map(|rule| rule.name)
        .collect();

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            return Err(e.into());
        }
    };

    let records = pipeline.run(targets).await;

    if let Some(path) = &cli.output {
        if let Err(e) = write_records(path, cli.output_format, &records, &columns) {
            tracing::error!("Failed to write {}: {}", path.display(), e);
            return Err(e.into());
        }
    }

    // Print a concise summary to stdout
    if !cli.quiet {
        print_record_lines(&records);
        print_statistics(&RunStatistics::from_records(&records));
    }

    Ok(())
}
