// Prompt for the per-job fit assessment.
// Reuses cross-cutting fragments from llm_client::prompts.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder regex"));

/// Fit assessment prompt. Placeholders: `{candidate_notes}`, `{job_title}`,
/// `{job_url}`, `{job_details}`, `{json_only}`, `{resume_text}`.
pub const ASSESSMENT_PROMPT_TEMPLATE: &str = r#"You are a highly skilled career advisor and resume analyst.
Your task is to evaluate the provided resume against a specific job description and return your analysis strictly in JSON format.
{candidate_notes}
**Resume Content:**
---
{resume_text}
---

**Job Description Details:**
Job Title: {job_title}
Job URL: {job_url}
---
{job_details}
---

**Instructions for JSON Output:**
Please provide your analysis in a single JSON object with the following fields:
- "job_title": (string) Echo back the job title provided.
- "job_url": (string) Echo back the job URL provided.
- "fit_score": (integer) A numerical score from 0 to 10 (inclusive). 10 is a perfect fit.
- "fit_category": (string) One of: "Strong Fit", "Potential Fit", "Borderline Fit", "Not a Good Fit".
- "key_matches": (array of strings) Specific skills/experiences from resume matching job requirements.
- "potential_gaps": (array of strings) Specific skills/experiences from job description missing or less emphasized in resume.
- "reasoning_summary": (string) A brief (2-3 sentences) justification for your fit_score and fit_category.
- "auto_drafted_outreach_snippet": (string) A polite, concise, 2-sentence outreach message referencing one key match.

{json_only}"#;

/// Fills the assessment template in a single pass over the template text.
/// Substituted values are never rescanned, so braces inside them stay literal.
pub fn assessment_prompt(
    resume_text: &str,
    job_details: &str,
    job_title: &str,
    job_url: &str,
    candidate_notes: Option<&str>,
) -> String {
    let notes = match candidate_notes {
        Some(notes) => format!("Candidate context to weigh: {notes}\n"),
        None => String::new(),
    };

    PLACEHOLDER_RE
        .replace_all(ASSESSMENT_PROMPT_TEMPLATE, |caps: &Captures| match &caps[1] {
            "candidate_notes" => notes.clone(),
            "resume_text" => resume_text.to_string(),
            "job_title" => job_title.to_string(),
            "job_url" => job_url.to_string(),
            "job_details" => job_details.to_string(),
            "json_only" => JSON_ONLY_INSTRUCTION.to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_fills_every_placeholder() {
        let prompt = assessment_prompt(
            "Rust, SQL",
            "Preferred Qualifications:\n- SQL",
            "Data Analyst",
            "https://x/jobs/1",
            Some("Two years of experience."),
        );
        assert!(prompt.contains("Job Title: Data Analyst"));
        assert!(prompt.contains("Job URL: https://x/jobs/1"));
        assert!(prompt.contains("Candidate context to weigh: Two years of experience."));
        assert!(prompt.ends_with(JSON_ONLY_INSTRUCTION));
        assert!(!prompt.contains("{job_details}"));
    }

    #[test]
    fn test_resume_braces_are_left_alone() {
        let prompt = assessment_prompt("Built {job_title} parser", "-", "SRE", "u", None);
        assert!(prompt.contains("Built {job_title} parser"));
        assert!(!prompt.contains("Candidate context"));
    }

    #[test]
    fn test_braces_in_job_fields_and_notes_are_left_alone() {
        let prompt = assessment_prompt(
            "SECRET RESUME BODY",
            "Use {resume_text} templates",
            "Lead {job_details} owner",
            "u",
            Some("notes {job_url}"),
        );
        assert_eq!(prompt.matches("SECRET RESUME BODY").count(), 1);
        assert!(prompt.contains("Use {resume_text} templates"));
        assert!(prompt.contains("Job Title: Lead {job_details} owner"));
        assert!(prompt.contains("Candidate context to weigh: notes {job_url}"));
        assert!(prompt.contains("Job URL: u\n"));
    }
}
