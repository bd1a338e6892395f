use std::collections::HashMap;

use chrono::Local;
use tracing::info;

use crate::models::assessment::{FitCategory, ScoreOutcome};
use crate::models::job::JobRow;

/// How many shortlisted jobs are printed in the run summary.
pub const SUMMARY_TOP_N: usize = 10;

#[derive(Debug, Clone)]
pub struct ShortlistCriteria {
    pub min_fit_score: u8,
    pub categories: Vec<FitCategory>,
}

impl Default for ShortlistCriteria {
    fn default() -> Self {
        Self {
            min_fit_score: 7,
            categories: vec![FitCategory::StrongFit, FitCategory::PotentialFit],
        }
    }
}

impl ShortlistCriteria {
    pub fn admits(&self, outcome: &ScoreOutcome) -> bool {
        outcome.assessment().is_some_and(|a| {
            a.fit_score >= self.min_fit_score && self.categories.contains(&a.fit_category)
        })
    }
}

/// One processed job: its table row joined with its scoring outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedEntry {
    pub columns: Vec<(String, String)>,
    pub outcome: ScoreOutcome,
}

/// Joins each outcome to its row, by URL first and `job_id_unique` second.
/// Outcome columns win when a name collides with a row column.
pub fn merge_outcomes(rows: &[JobRow], outcomes: Vec<ScoreOutcome>) -> Vec<AnalyzedEntry> {
    let by_url: HashMap<&str, &JobRow> = rows
        .iter()
        .filter_map(|row| row.url.as_deref().map(|url| (url, row)))
        .collect();
    let by_id: HashMap<&str, &JobRow> = rows.iter().map(|row| (row.job_id.as_str(), row)).collect();

    outcomes
        .into_iter()
        .map(|outcome| {
            let identity = outcome.job_identity();
            let mut columns = by_url
                .get(identity)
                .or_else(|| by_id.get(identity))
                .map(|row| row.columns.clone())
                .unwrap_or_default();

            for (name, value) in outcome.columns() {
                match columns.iter_mut().find(|(existing, _)| *existing == name) {
                    Some(slot) => slot.1 = value,
                    None => columns.push((name, value)),
                }
            }
            AnalyzedEntry { columns, outcome }
        })
        .collect()
}

/// Admitted entries, best fit score first. Equal scores keep processing order.
pub fn shortlist<'a>(entries: &'a [AnalyzedEntry], criteria: &ShortlistCriteria) -> Vec<&'a AnalyzedEntry> {
    let mut picked: Vec<&AnalyzedEntry> = entries
        .iter()
        .filter(|entry| criteria.admits(&entry.outcome))
        .collect();
    picked.sort_by_key(|entry| {
        std::cmp::Reverse(entry.outcome.assessment().map_or(0, |a| a.fit_score))
    });
    picked
}

pub fn log_top_matches(shortlisted: &[&AnalyzedEntry]) {
    if shortlisted.is_empty() {
        info!("No jobs met the shortlisting criteria.");
        return;
    }

    info!(
        "Top {} shortlisted jobs as of {}:",
        shortlisted.len().min(SUMMARY_TOP_N),
        Local::now().format("%Y-%m-%d")
    );
    for (rank, entry) in shortlisted.iter().take(SUMMARY_TOP_N).enumerate() {
        let Some(a) = entry.outcome.assessment() else {
            continue;
        };
        info!("{}. {} ({})", rank + 1, a.job_title, entry.outcome.job_identity());
        info!("   Score: {}/10, Category: {}", a.fit_score, a.fit_category);
        info!("   Key matches: {}", a.key_matches.join(", "));
        info!("   Potential gaps: {}", a.potential_gaps.join(", "));
        info!("   Outreach: {}", a.auto_drafted_outreach_snippet);
    }
}
