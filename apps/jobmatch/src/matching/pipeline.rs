//! Analysis driver.
//!
//! Order of work:
//!   1. cache, resume, API clients   (missing inputs are fatal here)
//!   2. resume embedding              (failure disables the pre-filter)
//!   3. jobs table
//!   4. pre-filter → optional cap → sequential scoring with periodic cache flush
//!   5. merge, shortlist, artifacts

use std::time::Instant;

use tracing::{info, warn};

use super::embedding_filter::{EmbeddingFilter, FilterOutcome, FilterSettings};
use super::scorer::Scorer;
use super::shortlist::{log_top_matches, merge_outcomes, shortlist, AnalyzedEntry, ShortlistCriteria};
use super::truncate_chars;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::embeddings::EmbeddingClient;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::LlmClient;
use crate::models::assessment::ScoreOutcome;
use crate::models::job::JobRow;
use crate::resume::load_resume_text;
use crate::store::artifacts::write_rows;
use crate::store::job_table::load_job_table;
use crate::store::{AssessmentCache, JsonFileCache};

/// The cache is flushed after this many processed jobs, and once more at the end.
const FLUSH_EVERY: usize = 10;
/// Failure reasons are cut to this length in the per-job log line.
const LOGGED_REASON_CHARS: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct AnalysisSettings {
    /// `None` sends every selected job to the LLM.
    pub max_llm_jobs: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub jobs_in_table: usize,
    pub jobs_selected: usize,
    pub successes: usize,
    pub failures: usize,
    pub llm_calls: usize,
    pub cache_hits: usize,
}

#[derive(Debug)]
pub struct AnalysisResult {
    /// One entry per scored job, in scoring order.
    pub analyzed: Vec<AnalyzedEntry>,
    pub stats: AnalysisStats,
}

/// Runs filter → cap → scoring over `rows`. `resume_embedding` of `None`
/// sends every row to the scorer.
pub async fn analyze_jobs(
    rows: &[JobRow],
    resume_text: &str,
    filter: &EmbeddingFilter<'_>,
    resume_embedding: Option<&[f32]>,
    scorer: &mut Scorer<'_>,
    settings: &AnalysisSettings,
) -> AnalysisResult {
    let mut selected: Vec<usize> = match resume_embedding {
        Some(vector) => match filter.rank(vector, rows).await {
            FilterOutcome::Ranked(ranked) => ranked.into_iter().map(|r| r.index).collect(),
            FilterOutcome::Disabled { reason } => {
                warn!("Embedding filter skipped ({reason}); analyzing all jobs");
                (0..rows.len()).collect()
            }
        },
        None => (0..rows.len()).collect(),
    };

    if let Some(cap) = settings.max_llm_jobs {
        if selected.len() > cap {
            info!("Limiting LLM analysis to the first {cap} of {} jobs", selected.len());
            selected.truncate(cap);
        }
    }

    info!("Starting LLM analysis for {} jobs...", selected.len());

    let mut outcomes = Vec::with_capacity(selected.len());
    for (processed, &index) in selected.iter().enumerate() {
        let row = &rows[index];
        let identity = row.identity();
        info!(
            "Analyzing job {}/{}: {}",
            processed + 1,
            selected.len(),
            row.title
        );

        let outcome = scorer
            .score(resume_text, &row.details_text(), &row.title, identity)
            .await;
        match &outcome {
            ScoreOutcome::Success { assessment, .. } => info!(
                "  -> Fit score: {}, category: {}",
                assessment.fit_score, assessment.fit_category
            ),
            ScoreOutcome::Failure { reason, .. } => warn!(
                "  -> Failed to assess {identity}: {}",
                truncate_chars(reason, LOGGED_REASON_CHARS)
            ),
        }
        outcomes.push(outcome);

        if (processed + 1) % FLUSH_EVERY == 0 {
            flush_or_warn(scorer);
        }
    }
    flush_or_warn(scorer);

    let successes = outcomes.iter().filter(|o| o.assessment().is_some()).count();
    let stats = AnalysisStats {
        jobs_in_table: rows.len(),
        jobs_selected: selected.len(),
        successes,
        failures: outcomes.len() - successes,
        llm_calls: scorer.llm_calls(),
        cache_hits: scorer.cache_hits(),
    };

    AnalysisResult {
        analyzed: merge_outcomes(rows, outcomes),
        stats,
    }
}

fn flush_or_warn(scorer: &mut Scorer<'_>) {
    if let Err(e) = scorer.flush_cache() {
        warn!("Could not save the assessment cache: {e}");
    }
}

/// The `analyze` command: everything from the jobs table to the two artifacts.
pub async fn run_analysis(config: &Config) -> Result<(), AppError> {
    let started = Instant::now();

    let api_key = config
        .require_api_key()
        .map_err(|e| AppError::MissingResource(e.to_string()))?
        .to_string();

    let mut cache = JsonFileCache::load(&config.cache_path);
    info!("Using assessment cache {} ({} entries)", cache.path().display(), cache.len());
    let resume_text = load_resume_text(&config.resume_path)?;

    let llm = LlmClient::new(api_key.clone(), config.analysis_model.clone())?;
    let embedder = EmbeddingClient::new(api_key, config.embedding_model.clone())?;
    info!("Gemini clients initialized (analysis model: {})", llm.model());

    let filter = EmbeddingFilter::new(
        &embedder,
        FilterSettings {
            threshold: config.similarity_threshold,
            max_jobs: config.max_jobs_after_filter,
            retry: RetryPolicy::once_after(config.embedding_retry_delay),
        },
    );
    let resume_embedding = if config.use_embedding_filter {
        filter.embed_resume(&resume_text).await
    } else {
        info!("Embedding pre-filter disabled by configuration");
        None
    };

    let rows = load_job_table(&config.jobs_csv)?;

    let mut scorer = Scorer::new(
        &llm,
        &mut cache,
        config.llm_call_delay,
        config.candidate_notes.clone(),
    );
    let settings = AnalysisSettings {
        max_llm_jobs: config.max_llm_jobs,
    };
    let result = analyze_jobs(
        &rows,
        &resume_text,
        &filter,
        resume_embedding.as_deref(),
        &mut scorer,
        &settings,
    )
    .await;

    let criteria = ShortlistCriteria {
        min_fit_score: config.min_fit_score,
        ..Default::default()
    };
    write_artifacts(config, &result.analyzed, &criteria)?;

    let stats = &result.stats;
    info!(
        "Analysis complete: {} jobs in table, {} analyzed ({} ok, {} failed), {} LLM calls, {} cache hits",
        stats.jobs_in_table,
        stats.jobs_selected,
        stats.successes,
        stats.failures,
        stats.llm_calls,
        stats.cache_hits
    );
    info!("Total execution time: {:.2} seconds", started.elapsed().as_secs_f64());
    Ok(())
}

/// Both artifacts are always rewritten, even when empty, so stale results never linger.
fn write_artifacts(
    config: &Config,
    analyzed: &[AnalyzedEntry],
    criteria: &ShortlistCriteria,
) -> Result<(), AppError> {
    let all_rows: Vec<Vec<(String, String)>> = analyzed.iter().map(|e| e.columns.clone()).collect();
    write_rows(&config.analyzed_csv, &all_rows)?;

    let shortlisted = shortlist(analyzed, criteria);
    let shortlist_rows: Vec<Vec<(String, String)>> =
        shortlisted.iter().map(|e| e.columns.clone()).collect();
    write_rows(&config.shortlist_csv, &shortlist_rows)?;
    info!(
        "{} jobs shortlisted (score >= {})",
        shortlisted.len(),
        criteria.min_fit_score
    );

    log_top_matches(&shortlisted);
    Ok(())
}
