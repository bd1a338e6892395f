//! LLM fit scorer.
//!
//! One job at a time: cache lookup → prompt → LLM → fence strip → schema parse.
//! Every failure is folded into `ScoreOutcome::Failure`; nothing escapes `score`.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::prompts::assessment_prompt;
use super::truncate_chars;
use crate::errors::AppError;
use crate::llm_client::{strip_json_fences, LanguageModel};
use crate::models::assessment::{Assessment, ScoreOutcome};
use crate::store::AssessmentCache;

/// Response excerpts quoted in failure reasons are cut to this many chars.
const RESPONSE_EXCERPT_CHARS: usize = 500;

pub struct Scorer<'a> {
    llm: &'a dyn LanguageModel,
    cache: &'a mut dyn AssessmentCache,
    call_delay: Duration,
    candidate_notes: Option<String>,
    llm_calls: usize,
    cache_hits: usize,
}

impl<'a> Scorer<'a> {
    pub fn new(
        llm: &'a dyn LanguageModel,
        cache: &'a mut dyn AssessmentCache,
        call_delay: Duration,
        candidate_notes: Option<String>,
    ) -> Self {
        Self {
            llm,
            cache,
            call_delay,
            candidate_notes,
            llm_calls: 0,
            cache_hits: 0,
        }
    }

    pub async fn score(
        &mut self,
        resume_text: &str,
        job_details: &str,
        job_title: &str,
        job_identity: &str,
    ) -> ScoreOutcome {
        if let Some(assessment) = self.cache.get(job_identity) {
            debug!("Cache hit for {job_identity}");
            self.cache_hits += 1;
            return ScoreOutcome::Success {
                job_identity: job_identity.to_string(),
                assessment,
            };
        }

        // Pace consecutive LLM calls; the first call of the run goes out immediately.
        if self.llm_calls > 0 && !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }
        self.llm_calls += 1;

        let prompt = assessment_prompt(
            resume_text,
            job_details,
            job_title,
            job_identity,
            self.candidate_notes.as_deref(),
        );
        let failure = |reason: String| ScoreOutcome::Failure {
            job_identity: job_identity.to_string(),
            job_title: job_title.to_string(),
            reason,
        };

        let response = match self.llm.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => return failure(format!("LLM API call failed: {e}")),
        };

        match parse_assessment(&response) {
            Ok(assessment) => {
                self.cache.put(job_identity, assessment.clone());
                ScoreOutcome::Success {
                    job_identity: job_identity.to_string(),
                    assessment,
                }
            }
            Err(reason) => failure(reason),
        }
    }

    pub fn flush_cache(&mut self) -> Result<(), AppError> {
        self.cache.flush()
    }

    pub fn llm_calls(&self) -> usize {
        self.llm_calls
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits
    }
}

/// Parses raw LLM output into an `Assessment`, returning a human-readable reason on failure.
pub fn parse_assessment(response: &str) -> Result<Assessment, String> {
    let cleaned = strip_json_fences(response);
    let excerpt = || truncate_chars(cleaned, RESPONSE_EXCERPT_CHARS);

    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        format!("LLM response was not valid JSON ({e}). Response: {}", excerpt())
    })?;
    serde_json::from_value(value).map_err(|e| {
        format!(
            "LLM response did not match the assessment schema ({e}). Response: {}",
            excerpt()
        )
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::models::assessment::FitCategory;
    use crate::store::cache::tests::{sample_assessment, MemoryCache};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays canned responses in order; `Err` entries become API failures.
    #[derive(Default)]
    pub(crate) struct ScriptedModel {
        pub(crate) responses: Mutex<VecDeque<Result<String, u16>>>,
        pub(crate) calls: AtomicUsize,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub(crate) fn new<I>(responses: I) -> Self
        where
            I: IntoIterator<Item = Result<String, u16>>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(Ok(text)) => Ok(text),
                Some(Err(status)) => Err(LlmError::Api {
                    status,
                    message: "scripted failure".to_string(),
                }),
                None => Err(LlmError::EmptyContent),
            }
        }
    }

    pub(crate) fn assessment_response(url: &str, score: u8, category: &str) -> String {
        serde_json::json!({
            "job_title": "Data Analyst",
            "job_url": url,
            "fit_score": score,
            "fit_category": category,
            "key_matches": ["SQL", "Python"],
            "potential_gaps": ["Go"],
            "reasoning_summary": "Strong analytics background.",
            "auto_drafted_outreach_snippet": "Hello, I noticed the role."
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_fenced_json_is_parsed_and_cached() {
        let fenced = format!("```json\n{}\n```", assessment_response("https://x/1", 8, "Strong Fit"));
        let model = ScriptedModel::new([Ok(fenced)]);
        let mut cache = MemoryCache::default();
        let mut scorer = Scorer::new(&model, &mut cache, Duration::ZERO, None);

        let outcome = scorer.score("resume", "details", "Data Analyst", "https://x/1").await;

        let assessment = outcome.assessment().expect("success");
        assert_eq!(assessment.fit_score, 8);
        assert_eq!(assessment.fit_category, FitCategory::StrongFit);
        assert_eq!(outcome.job_identity(), "https://x/1");
        drop(scorer);
        assert!(cache.entries.contains_key("https://x/1"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_failure_and_not_cached() {
        let model = ScriptedModel::new([Ok("Sorry, I cannot help".to_string())]);
        let mut cache = MemoryCache::default();
        let mut scorer = Scorer::new(&model, &mut cache, Duration::ZERO, None);

        let outcome = scorer.score("resume", "details", "SRE", "3_abc").await;

        match &outcome {
            ScoreOutcome::Failure { job_title, job_identity, reason } => {
                assert_eq!(job_title, "SRE");
                assert_eq!(job_identity, "3_abc");
                assert!(reason.contains("not valid JSON"));
                assert!(reason.contains("Sorry, I cannot help"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        drop(scorer);
        assert!(cache.entries.is_empty());
    }

    #[tokio::test]
    async fn test_schema_violation_is_failure() {
        let model = ScriptedModel::new([Ok(assessment_response("u", 8, "Great Fit"))]);
        let mut cache = MemoryCache::default();
        let mut scorer = Scorer::new(&model, &mut cache, Duration::ZERO, None);

        let outcome = scorer.score("r", "d", "t", "u").await;

        let ScoreOutcome::Failure { reason, .. } = outcome else {
            panic!("expected failure");
        };
        assert!(reason.contains("did not match the assessment schema"));
    }

    #[tokio::test]
    async fn test_transport_error_is_failure() {
        let model = ScriptedModel::new([Err(500)]);
        let mut cache = MemoryCache::default();
        let mut scorer = Scorer::new(&model, &mut cache, Duration::ZERO, None);

        let outcome = scorer.score("r", "d", "t", "u").await;

        let ScoreOutcome::Failure { reason, .. } = outcome else {
            panic!("expected failure");
        };
        assert!(reason.starts_with("LLM API call failed"));
    }

    #[tokio::test]
    async fn test_cache_hit_makes_no_call() {
        let model = ScriptedModel::default();
        let mut cache = MemoryCache::default();
        cache.entries.insert("https://x/1".to_string(), sample_assessment("https://x/1", 9));
        let mut scorer = Scorer::new(&model, &mut cache, Duration::from_millis(500), None);

        let outcome = scorer.score("r", "d", "t", "https://x/1").await;

        assert_eq!(outcome.assessment().map(|a| a.fit_score), Some(9));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(scorer.cache_hits(), 1);
        assert_eq!(scorer.llm_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_llm_calls() {
        let model = ScriptedModel::new([
            Ok(assessment_response("a", 7, "Potential Fit")),
            Ok(assessment_response("b", 6, "Borderline Fit")),
        ]);
        let mut cache = MemoryCache::default();
        cache.entries.insert("hit".to_string(), sample_assessment("hit", 9));
        let mut scorer = Scorer::new(&model, &mut cache, Duration::from_millis(500), None);

        let start = Instant::now();
        scorer.score("r", "d", "t", "a").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        scorer.score("r", "d", "t", "hit").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        scorer.score("r", "d", "t", "b").await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(500) && waited < Duration::from_millis(510));
    }

    #[tokio::test]
    async fn test_candidate_notes_reach_prompt() {
        let model = ScriptedModel::new([Ok(assessment_response("u", 5, "Borderline Fit"))]);
        let mut cache = MemoryCache::default();
        let mut scorer = Scorer::new(
            &model,
            &mut cache,
            Duration::ZERO,
            Some("Prefers analytics roles.".to_string()),
        );

        scorer.score("my resume", "details", "Analyst", "u").await;

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Prefers analytics roles."));
        assert!(prompts[0].contains("my resume"));
    }

    #[test]
    fn test_long_response_excerpt_is_truncated() {
        let garbage = "x".repeat(2000);
        let reason = parse_assessment(&garbage).unwrap_err();
        assert!(reason.len() < 700);
    }
}
