use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_CAREERS_URL: &str = "https://www.google.com/about/careers/applications/jobs/results?location=India&target_level=INTERN_AND_APPRENTICE&target_level=EARLY&target_level=MID&employment_type=FULL_TIME";

/// Application configuration loaded from environment variables.
/// Every key has a default except the API key, which only the analysis stage needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: Option<String>,
    pub careers_url: String,
    pub concurrency_limit: usize,
    pub request_timeout: Duration,
    pub detail_batch_delay: Duration,
    pub jobs_csv: PathBuf,
    pub descriptions_dir: PathBuf,
    pub resume_path: PathBuf,
    pub cache_path: PathBuf,
    pub analyzed_csv: PathBuf,
    pub shortlist_csv: PathBuf,
    pub use_embedding_filter: bool,
    pub similarity_threshold: f32,
    pub max_jobs_after_filter: usize,
    pub max_llm_jobs: Option<usize>,
    pub min_fit_score: u8,
    pub llm_call_delay: Duration,
    pub embedding_retry_delay: Duration,
    pub analysis_model: String,
    pub embedding_model: String,
    pub candidate_notes: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let concurrency_limit: usize = env_or("CONCURRENCY_LIMIT", 10)?;
        anyhow::ensure!(concurrency_limit > 0, "CONCURRENCY_LIMIT must be at least 1");

        let min_fit_score: u8 = env_or("MIN_FIT_SCORE", 7)?;
        anyhow::ensure!(min_fit_score <= 10, "MIN_FIT_SCORE must be between 0 and 10");

        Ok(Config {
            google_api_key: optional_env("GOOGLE_API_KEY"),
            careers_url: std::env::var("CAREERS_URL")
                .unwrap_or_else(|_| DEFAULT_CAREERS_URL.to_string()),
            concurrency_limit,
            request_timeout: Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 30)?),
            detail_batch_delay: Duration::from_millis(env_or("DETAIL_BATCH_DELAY_MS", 1000)?),
            jobs_csv: env_or("JOBS_CSV", PathBuf::from("google_jobs_with_details.csv"))?,
            descriptions_dir: env_or("DESCRIPTIONS_DIR", PathBuf::from("descriptions"))?,
            resume_path: env_or("RESUME_PATH", PathBuf::from("resume.pdf"))?,
            cache_path: env_or("CACHE_PATH", PathBuf::from("llm_response_cache.json"))?,
            analyzed_csv: env_or("ANALYZED_CSV", PathBuf::from("analyzed_google_jobs_full.csv"))?,
            shortlist_csv: env_or(
                "SHORTLIST_CSV",
                PathBuf::from("shortlisted_google_jobs_full.csv"),
            )?,
            use_embedding_filter: env_or("USE_EMBEDDING_FILTER", true)?,
            similarity_threshold: env_or("SIMILARITY_THRESHOLD", 0.55)?,
            max_jobs_after_filter: env_or("MAX_JOBS_AFTER_FILTER", 200)?,
            max_llm_jobs: optional_env("MAX_LLM_JOBS")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_LLM_JOBS must be a non-negative integer")?,
            min_fit_score,
            llm_call_delay: Duration::from_millis(env_or("LLM_CALL_DELAY_MS", 500)?),
            embedding_retry_delay: Duration::from_millis(env_or("EMBEDDING_RETRY_DELAY_MS", 1000)?),
            analysis_model: std::env::var("ANALYSIS_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-004".to_string()),
            candidate_notes: optional_env("CANDIDATE_NOTES"),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// The API key is only required once the LLM stages start.
    pub fn require_api_key(&self) -> Result<&str> {
        self.google_api_key
            .as_deref()
            .context("Required environment variable 'GOOGLE_API_KEY' is not set")
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
