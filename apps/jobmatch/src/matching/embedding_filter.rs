//! Embedding pre-filter: ranks jobs by cosine similarity to the resume so the
//! expensive LLM scorer only sees plausible matches.

use tracing::{debug, info, warn};

use crate::llm_client::embeddings::{EmbeddingMode, EmbeddingProvider};
use crate::llm_client::prompts::RESUME_EMBEDDING_TITLE;
use crate::llm_client::retry::RetryPolicy;
use crate::models::job::JobRow;

const PROGRESS_EVERY: usize = 50;

#[derive(Debug, Clone, Copy)]
pub struct FilterSettings {
    /// Jobs below this cosine similarity are dropped.
    pub threshold: f32,
    pub max_jobs: usize,
    /// Applied per job; the resume embedding gets a single attempt.
    pub retry: RetryPolicy,
}

/// A job that survived the filter, by position in the input rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedJob {
    pub index: usize,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// No ranking was possible; every job should proceed.
    Disabled { reason: String },
    /// Best first, at most `max_jobs` long.
    Ranked(Vec<RankedJob>),
}

pub struct EmbeddingFilter<'a> {
    provider: &'a dyn EmbeddingProvider,
    settings: FilterSettings,
}

impl<'a> EmbeddingFilter<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider, settings: FilterSettings) -> Self {
        Self { provider, settings }
    }

    /// Query-mode resume vector. `None` means the filter must be skipped.
    pub async fn embed_resume(&self, resume_text: &str) -> Option<Vec<f32>> {
        match self
            .provider
            .embed(resume_text, EmbeddingMode::Query, Some(RESUME_EMBEDDING_TITLE))
            .await
        {
            Ok(vector) => {
                info!("Resume embedding generated ({} dimensions)", vector.len());
                Some(vector)
            }
            Err(e) => {
                warn!("Error generating resume embedding: {e}. Embedding filter will be skipped.");
                None
            }
        }
    }

    /// Embeds every job with content and ranks it against `resume_vector`.
    pub async fn rank(&self, resume_vector: &[f32], jobs: &[JobRow]) -> FilterOutcome {
        info!(
            "Pre-filtering {} jobs using embeddings (threshold {:.2})",
            jobs.len(),
            self.settings.threshold
        );

        let mut scored = Vec::new();
        let mut embedded = 0usize;
        for (index, job) in jobs.iter().enumerate() {
            if index > 0 && index % PROGRESS_EVERY == 0 {
                info!("Embedding progress: {index}/{} jobs", jobs.len());
            }

            let Some(text) = job.embedding_text() else {
                debug!("Skipping '{}': nothing to embed", job.title);
                continue;
            };

            let attempt = || {
                self.provider
                    .embed(&text, EmbeddingMode::Document, Some(job.title.as_str()))
            };
            match self.settings.retry.run("Job embedding", attempt, |_| true).await {
                Ok(vector) => {
                    embedded += 1;
                    scored.push(RankedJob {
                        index,
                        similarity: cosine_similarity(resume_vector, &vector),
                    });
                }
                Err(e) => warn!("Dropping '{}' from ranking: embedding failed ({e})", job.title),
            }
        }

        if embedded == 0 {
            return FilterOutcome::Disabled {
                reason: "no job produced an embedding".to_string(),
            };
        }

        let ranked = rank_by_similarity(scored, self.settings.threshold, self.settings.max_jobs);
        info!(
            "{} of {embedded} embedded jobs passed the similarity threshold",
            ranked.len()
        );
        FilterOutcome::Ranked(ranked)
    }
}

/// Cosine similarity in [-1, 1]. Zero-norm or mismatched vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Keeps similarity >= threshold, sorts best first (ties keep input order), truncates.
pub fn rank_by_similarity(mut scored: Vec<RankedJob>, threshold: f32, max_jobs: usize) -> Vec<RankedJob> {
    scored.retain(|job| job.similarity >= threshold);
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(max_jobs);
    scored
}
