mod config;
mod errors;
mod llm_client;
mod matching;
mod models;
mod resume;
mod scrape;
mod store;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::matching::pipeline::run_analysis;
use crate::scrape::fetcher::{HttpFetcher, PageFetch};
use crate::scrape::{log_scrape_summary, scrape_jobs, ScrapeSettings};
use crate::store::job_table::write_job_table;

#[derive(Parser, Debug)]
#[command(name = "jobmatch", version, about = "Scrape job listings and shortlist the ones that fit a resume")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the careers site and write the jobs table
    Scrape,
    /// Filter, score and shortlist the jobs table against the resume
    Analyze,
    /// Scrape, then analyze
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first; malformed values abort before anything runs
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobmatch v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Scrape => {
            run_scrape(&config).await?;
        }
        Command::Analyze => analyze(&config).await?,
        Command::Run => {
            if run_scrape(&config).await? {
                analyze(&config).await?;
            } else {
                info!("Skipping analysis: the scrape wrote no jobs table.");
            }
        }
    }

    Ok(())
}

/// Returns whether a jobs table was written.
async fn run_scrape(config: &Config) -> Result<bool> {
    let fetcher = HttpFetcher::new(config.request_timeout)?;
    let settings = ScrapeSettings {
        base_url: config.careers_url.clone(),
        concurrency_limit: config.concurrency_limit,
        detail_batch_delay: config.detail_batch_delay,
    };
    scrape_to_table(&fetcher, &settings, &config.jobs_csv, &config.descriptions_dir).await
}

async fn scrape_to_table<F>(
    fetcher: &F,
    settings: &ScrapeSettings,
    jobs_csv: &Path,
    descriptions_dir: &Path,
) -> Result<bool>
where
    F: PageFetch + ?Sized,
{
    info!("Starting job extraction from {}", settings.base_url);
    let listings = scrape_jobs(fetcher, settings).await;
    if listings.is_empty() {
        info!("No jobs were extracted.");
        return Ok(false);
    }

    write_job_table(jobs_csv, descriptions_dir, &listings)?;
    log_scrape_summary(&listings);
    Ok(true)
}

// The error is reported once, by main's return.
async fn analyze(config: &Config) -> Result<()> {
    run_analysis(config).await.context("Analysis aborted")
}
