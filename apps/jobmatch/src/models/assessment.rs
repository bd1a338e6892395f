use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Closed set of fit categories the scorer may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FitCategory {
    #[serde(rename = "Strong Fit")]
    StrongFit,
    #[serde(rename = "Potential Fit")]
    PotentialFit,
    #[serde(rename = "Borderline Fit")]
    BorderlineFit,
    #[serde(rename = "Not a Good Fit")]
    NotAGoodFit,
}

impl FitCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FitCategory::StrongFit => "Strong Fit",
            FitCategory::PotentialFit => "Potential Fit",
            FitCategory::BorderlineFit => "Borderline Fit",
            FitCategory::NotAGoodFit => "Not a Good Fit",
        }
    }
}

impl fmt::Display for FitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful fit assessment, exactly as parsed from the LLM and stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub job_title: String,
    pub job_url: String,
    /// 0 – 10
    #[serde(deserialize_with = "deserialize_fit_score")]
    pub fit_score: u8,
    pub fit_category: FitCategory,
    pub key_matches: Vec<String>,
    pub potential_gaps: Vec<String>,
    pub reasoning_summary: String,
    pub auto_drafted_outreach_snippet: String,
}

/// Accepts an integer, an integral float, or a numeric string, and enforces 0–10.
fn deserialize_fit_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let score = match &raw {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match score {
        Some(s) if s <= 10 => Ok(s as u8),
        _ => Err(de::Error::custom(format!(
            "fit_score must be an integer between 0 and 10, got {raw}"
        ))),
    }
}

/// Result of scoring one job. Failures keep the job's title and identity so the
/// run stays auditable; they never carry a fit score.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Success {
        job_identity: String,
        assessment: Assessment,
    },
    Failure {
        job_identity: String,
        job_title: String,
        reason: String,
    },
}

impl ScoreOutcome {
    pub fn job_identity(&self) -> &str {
        match self {
            ScoreOutcome::Success { job_identity, .. } | ScoreOutcome::Failure { job_identity, .. } => {
                job_identity
            }
        }
    }

    pub fn assessment(&self) -> Option<&Assessment> {
        match self {
            ScoreOutcome::Success { assessment, .. } => Some(assessment),
            ScoreOutcome::Failure { .. } => None,
        }
    }

    /// Flat columns for the tabular artifacts. List fields are written as JSON arrays.
    pub fn columns(&self) -> Vec<(String, String)> {
        match self {
            ScoreOutcome::Success { assessment, .. } => vec![
                col("job_title", assessment.job_title.clone()),
                col("job_url", assessment.job_url.clone()),
                col("fit_score", assessment.fit_score.to_string()),
                col("fit_category", assessment.fit_category.to_string()),
                col("key_matches", json_list(&assessment.key_matches)),
                col("potential_gaps", json_list(&assessment.potential_gaps)),
                col("reasoning_summary", assessment.reasoning_summary.clone()),
                col(
                    "auto_drafted_outreach_snippet",
                    assessment.auto_drafted_outreach_snippet.clone(),
                ),
            ],
            ScoreOutcome::Failure {
                job_identity,
                job_title,
                reason,
            } => vec![
                col("error", reason.clone()),
                col("job_title", job_title.clone()),
                col("job_url", job_identity.clone()),
            ],
        }
    }
}

fn col(name: &str, value: String) -> (String, String) {
    (name.to_string(), value)
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assessment_json(score: Value, category: &str) -> Value {
        json!({
            "job_title": "Data Analyst",
            "job_url": "https://careers.example.com/jobs/1",
            "fit_score": score,
            "fit_category": category,
            "key_matches": ["SQL"],
            "potential_gaps": ["Go"],
            "reasoning_summary": "Good overlap.",
            "auto_drafted_outreach_snippet": "Hello."
        })
    }

    #[test]
    fn test_fit_category_round_trips_display_names() {
        let parsed: FitCategory = serde_json::from_value(json!("Not a Good Fit")).unwrap();
        assert_eq!(parsed, FitCategory::NotAGoodFit);
        assert_eq!(
            serde_json::to_value(FitCategory::PotentialFit).unwrap(),
            json!("Potential Fit")
        );
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let result = serde_json::from_value::<Assessment>(assessment_json(json!(8), "Great Fit"));
        assert!(result.is_err());
    }

    #[test]
    fn test_fit_score_accepts_string_and_integral_float() {
        let a: Assessment = serde_json::from_value(assessment_json(json!("8"), "Strong Fit")).unwrap();
        assert_eq!(a.fit_score, 8);
        let b: Assessment = serde_json::from_value(assessment_json(json!(9.0), "Strong Fit")).unwrap();
        assert_eq!(b.fit_score, 9);
    }

    #[test]
    fn test_fit_score_out_of_range_is_rejected() {
        assert!(serde_json::from_value::<Assessment>(assessment_json(json!(11), "Strong Fit")).is_err());
        assert!(serde_json::from_value::<Assessment>(assessment_json(json!(-1), "Strong Fit")).is_err());
        assert!(serde_json::from_value::<Assessment>(assessment_json(json!(7.5), "Strong Fit")).is_err());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let mut value = assessment_json(json!(8), "Strong Fit");
        value.as_object_mut().unwrap().remove("potential_gaps");
        assert!(serde_json::from_value::<Assessment>(value).is_err());
    }

    #[test]
    fn test_failure_columns_carry_error_marker() {
        let outcome = ScoreOutcome::Failure {
            job_identity: "3_abc".to_string(),
            job_title: "SRE".to_string(),
            reason: "LLM API call failed".to_string(),
        };
        let cols = outcome.columns();
        assert_eq!(cols[0], ("error".to_string(), "LLM API call failed".to_string()));
        assert!(outcome.assessment().is_none());
        assert_eq!(outcome.job_identity(), "3_abc");
    }

    #[test]
    fn test_success_columns_encode_lists_as_json() {
        let assessment: Assessment =
            serde_json::from_value(assessment_json(json!(8), "Strong Fit")).unwrap();
        let outcome = ScoreOutcome::Success {
            job_identity: assessment.job_url.clone(),
            assessment,
        };
        let cols = outcome.columns();
        assert!(cols.contains(&("key_matches".to_string(), "[\"SQL\"]".to_string())));
        assert!(cols.contains(&("fit_category".to_string(), "Strong Fit".to_string())));
    }
}
