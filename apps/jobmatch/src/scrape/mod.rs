//! Scrape stage: listing pages → deduplicated summaries → detail enrichment.
//!
//! Flow: page 1 → total count → pages 2..N in concurrency-sized batches →
//!       dedupe by URL → detail pages in batches (polite delay between them).

pub mod extractor;
pub mod fetcher;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::models::job::{synthesize_job_id, JobDetail, JobListing, JobSummary};
use extractor::{extract_job_detail, extract_listing_page};
use fetcher::{fetch_all, PageFetch};

/// The careers site renders this many cards per listing page.
pub const JOBS_PER_PAGE: u32 = 20;
/// Upper bound when pagination has to follow "next" links because the count label is missing.
const MAX_FOLLOWED_PAGES: u32 = 100;

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub base_url: String,
    pub concurrency_limit: usize,
    pub detail_batch_delay: Duration,
}

pub fn page_count(total_jobs: u32) -> u32 {
    total_jobs.div_ceil(JOBS_PER_PAGE)
}

/// `(page number, url)` for listing pages 2..=N.
pub fn listing_page_urls(base_url: &str, total_jobs: u32) -> Vec<(u32, String)> {
    (2..=page_count(total_jobs))
        .map(|page| (page, format!("{base_url}&page={page}")))
        .collect()
}

/// Runs the whole scrape. Network failures shrink the result; they never abort it.
pub async fn scrape_jobs<F>(fetcher: &F, settings: &ScrapeSettings) -> Vec<JobListing>
where
    F: PageFetch + ?Sized,
{
    let started = Instant::now();
    let limit = settings.concurrency_limit.max(1);

    let first_html = fetch_all(fetcher, std::slice::from_ref(&settings.base_url), 1)
        .await
        .into_iter()
        .next()
        .flatten();
    let Some(first_html) = first_html else {
        warn!("Could not fetch the first listing page: {}", settings.base_url);
        return Vec::new();
    };

    let first_page = extract_listing_page(&first_html, 1);
    info!(
        "Found {} total jobs. Processing page 1: {} jobs extracted",
        first_page.total_job_count,
        first_page.jobs.len()
    );

    let mut summaries = first_page.jobs;
    if first_page.total_job_count > 0 {
        let pages = listing_page_urls(&settings.base_url, first_page.total_job_count);
        info!("Estimated {} total pages to process", page_count(first_page.total_job_count));

        for batch in pages.chunks(limit) {
            let urls: Vec<String> = batch.iter().map(|(_, url)| url.clone()).collect();
            let bodies = fetch_all(fetcher, &urls, limit).await;
            for ((page, _), body) in batch.iter().zip(bodies) {
                if let Some(html) = body {
                    let listing = extract_listing_page(&html, *page);
                    info!("Processing page {page}: {} jobs extracted", listing.jobs.len());
                    summaries.extend(listing.jobs);
                }
            }
        }
    } else if let Some(next) = first_page.next_page_url {
        debug!("No job count on page 1; following next-page links from {next}");
        summaries.extend(follow_next_links(fetcher, next).await);
    }

    let summaries = dedupe_by_url(summaries);
    let details = fetch_details(fetcher, &summaries, limit, settings.detail_batch_delay).await;

    let listings: Vec<JobListing> = summaries
        .into_iter()
        .zip(details)
        .enumerate()
        .map(|(position, (summary, detail))| JobListing {
            id: synthesize_job_id(position, &summary.url),
            summary,
            detail,
        })
        .collect();

    info!(
        "Extraction completed in {:.2} seconds",
        started.elapsed().as_secs_f64()
    );
    listings
}

/// Sequential pagination for pages that carry a next link but no total.
async fn follow_next_links<F>(fetcher: &F, first_next: String) -> Vec<JobSummary>
where
    F: PageFetch + ?Sized,
{
    let mut summaries = Vec::new();
    let mut next = Some(first_next);
    let mut page = 2;

    while let Some(url) = next.take() {
        if page > MAX_FOLLOWED_PAGES {
            warn!("Stopped following next-page links after {MAX_FOLLOWED_PAGES} pages");
            break;
        }
        let Some(html) = fetch_all(fetcher, std::slice::from_ref(&url), 1)
            .await
            .into_iter()
            .next()
            .flatten()
        else {
            break;
        };
        let listing = extract_listing_page(&html, page);
        info!("Processing page {page}: {} jobs extracted", listing.jobs.len());
        if listing.jobs.is_empty() {
            break;
        }
        summaries.extend(listing.jobs);
        next = listing.next_page_url;
        page += 1;
    }

    summaries
}

/// Keeps the first listing per URL. Listings without a URL cannot collide and are all kept.
pub fn dedupe_by_url(summaries: Vec<JobSummary>) -> Vec<JobSummary> {
    let before = summaries.len();
    let mut seen = HashSet::new();
    let unique: Vec<JobSummary> = summaries
        .into_iter()
        .filter(|job| !job.has_url() || seen.insert(job.url.clone()))
        .collect();

    if unique.len() < before {
        info!("Dropped {} duplicate listings seen on several pages", before - unique.len());
    }
    unique
}

/// Detail pages for every summary with a URL, in concurrency-sized batches.
/// The returned vector is aligned with `summaries`.
async fn fetch_details<F>(
    fetcher: &F,
    summaries: &[JobSummary],
    limit: usize,
    batch_delay: Duration,
) -> Vec<Option<JobDetail>>
where
    F: PageFetch + ?Sized,
{
    let mut details: Vec<Option<JobDetail>> = vec![None; summaries.len()];
    let targets: Vec<usize> = summaries
        .iter()
        .enumerate()
        .filter(|(_, job)| job.has_url())
        .map(|(i, _)| i)
        .collect();
    let total = targets.len();
    info!("Fetching detailed job descriptions for {total} jobs...");

    let batches: Vec<&[usize]> = targets.chunks(limit).collect();
    for (batch_no, batch) in batches.iter().enumerate() {
        let start = batch_no * limit;
        info!(
            "Fetching details for jobs {}-{} of {}",
            start + 1,
            start + batch.len(),
            total
        );

        let urls: Vec<String> = batch.iter().map(|&i| summaries[i].url.clone()).collect();
        let bodies = fetch_all(fetcher, &urls, limit).await;
        for (&i, body) in batch.iter().zip(bodies) {
            details[i] = body.map(|html| extract_job_detail(&html));
        }

        if batch_no + 1 < batches.len() && !batch_delay.is_zero() {
            tokio::time::sleep(batch_delay).await;
        }
    }

    details
}

/// Logs the post-scrape summary statistics.
pub fn log_scrape_summary(listings: &[JobListing]) {
    let total = listings.len();
    let unique_titles = listings
        .iter()
        .map(|l| l.summary.title.as_str())
        .collect::<HashSet<_>>()
        .len();
    let with_detail = listings.iter().filter(|l| l.detail.is_some()).count();
    let pct = if total == 0 {
        0.0
    } else {
        with_detail as f64 * 100.0 / total as f64
    };

    info!("Total jobs found: {total}");
    info!("Unique job titles: {unique_titles}");
    info!("Jobs with full descriptions: {with_detail} ({pct:.1}%)");
}
