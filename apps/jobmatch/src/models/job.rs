/// Title used when a listing card has no recognizable heading.
pub const UNKNOWN_TITLE: &str = "Unknown";
/// Sentinel for any other missing listing field (location, level, URL).
pub const NOT_AVAILABLE: &str = "N/A";

/// How many preferred-qualification / responsibility columns the analyzer reads.
pub const PREF_QUAL_COLUMNS: usize = 6;
pub const RESPONSIBILITY_COLUMNS: usize = 5;

pub const JOB_ID_COLUMN: &str = "job_id_unique";

/// One card from a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub page: u32,
    pub title: String,
    pub location: String,
    pub experience_level: String,
    pub url: String,
}

impl JobSummary {
    pub fn has_url(&self) -> bool {
        has_value(&self.url)
    }
}

/// Structured sections of a job detail page. A section is `None` when its heading was not found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobDetail {
    pub minimum_qualifications: Option<Vec<String>>,
    pub preferred_qualifications: Option<Vec<String>>,
    pub about_job: Option<String>,
    pub responsibilities: Option<Vec<String>>,
}

impl JobDetail {
    /// Concatenates the sections in fixed order: minimum qualifications, preferred
    /// qualifications, about, responsibilities. Downstream text must be reproducible
    /// from the same page, so the layout here never changes.
    pub fn full_description(&self) -> String {
        let mut out = String::new();

        if let Some(quals) = &self.minimum_qualifications {
            out.push_str("Minimum qualifications:\n");
            for qual in quals {
                out.push_str(qual);
                out.push('\n');
            }
            out.push('\n');
        }

        if let Some(quals) = &self.preferred_qualifications {
            out.push_str("Preferred qualifications:\n");
            for qual in quals {
                out.push_str(qual);
                out.push('\n');
            }
            out.push('\n');
        }

        if let Some(about) = &self.about_job {
            out.push_str("About the job\n");
            out.push_str(about);
            out.push_str("\n\n");
        }

        if let Some(responsibilities) = &self.responsibilities {
            out.push_str("Responsibilities\n");
            for item in responsibilities {
                out.push_str(item);
                out.push('\n');
            }
        }

        out
    }
}

/// A scraped job: listing card plus (optionally) its detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct JobListing {
    pub id: String,
    pub summary: JobSummary,
    pub detail: Option<JobDetail>,
}

/// A row of the jobs table as read back for analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub job_id: String,
    pub title: String,
    /// `None` when the cell is empty or holds the `N/A` sentinel.
    pub url: Option<String>,
    pub preferred_qualifications: Vec<String>,
    pub responsibilities: Vec<String>,
    /// Every cell of the row in header order, including a synthesized `job_id_unique`.
    pub columns: Vec<(String, String)>,
}

impl JobRow {
    /// Cache and merge key: the detail-page URL, or the row id when there is none.
    pub fn identity(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.job_id)
    }

    /// Text embedded (document mode) for the similarity pre-filter.
    /// Returns `None` when the row has neither preferred qualifications nor responsibilities.
    pub fn embedding_text(&self) -> Option<String> {
        if self.preferred_qualifications.is_empty() && self.responsibilities.is_empty() {
            return None;
        }
        Some(format!(
            "Preferred Qualifications: {}\nResponsibilities: {}",
            self.preferred_qualifications.join(" "),
            self.responsibilities.join(" ")
        ))
    }

    /// Job text handed to the LLM scorer.
    pub fn details_text(&self) -> String {
        format!(
            "Preferred Qualifications:\n{}\n\nResponsibilities:\n{}",
            bullet_list(&self.preferred_qualifications),
            bullet_list(&self.responsibilities)
        )
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "Not specified.".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// True for cells that carry a real value (not blank, not the `N/A` sentinel).
pub fn has_value(cell: &str) -> bool {
    let cell = cell.trim();
    !cell.is_empty() && cell != NOT_AVAILABLE
}

/// Row id used when the table has no `job_id_unique` column: row position plus the URL tail.
pub fn synthesize_job_id(position: usize, url: &str) -> String {
    let tail = url.rsplit('=').next().unwrap_or_default();
    format!("{position}_{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pref: &[&str], resp: &[&str]) -> JobRow {
        JobRow {
            job_id: "0_x".to_string(),
            title: "Data Analyst".to_string(),
            url: None,
            preferred_qualifications: pref.iter().map(|s| s.to_string()).collect(),
            responsibilities: resp.iter().map(|s| s.to_string()).collect(),
            columns: vec![],
        }
    }

    #[test]
    fn test_full_description_fixed_section_order() {
        let detail = JobDetail {
            minimum_qualifications: Some(vec!["BA/BS".to_string()]),
            preferred_qualifications: Some(vec!["SQL".to_string(), "Python".to_string()]),
            about_job: Some("Join the team.".to_string()),
            responsibilities: Some(vec!["Build dashboards".to_string()]),
        };
        assert_eq!(
            detail.full_description(),
            "Minimum qualifications:\nBA/BS\n\n\
             Preferred qualifications:\nSQL\nPython\n\n\
             About the job\nJoin the team.\n\n\
             Responsibilities\nBuild dashboards\n"
        );
    }

    #[test]
    fn test_full_description_skips_absent_sections() {
        let detail = JobDetail {
            responsibilities: Some(vec!["Ship".to_string()]),
            ..Default::default()
        };
        assert_eq!(detail.full_description(), "Responsibilities\nShip\n");
        assert_eq!(JobDetail::default().full_description(), "");
    }

    #[test]
    fn test_synthesize_job_id_uses_url_tail() {
        assert_eq!(
            synthesize_job_id(3, "https://careers.example.com/jobs/results/?id=12345"),
            "3_12345"
        );
        assert_eq!(synthesize_job_id(0, ""), "0_");
        assert_eq!(synthesize_job_id(7, "no-equals"), "7_no-equals");
    }

    #[test]
    fn test_identity_falls_back_to_job_id() {
        let mut r = row(&[], &[]);
        assert_eq!(r.identity(), "0_x");
        r.url = Some("https://careers.example.com/jobs/1".to_string());
        assert_eq!(r.identity(), "https://careers.example.com/jobs/1");
    }

    #[test]
    fn test_embedding_text_empty_row_is_skipped() {
        assert!(row(&[], &[]).embedding_text().is_none());
        assert_eq!(
            row(&["SQL", "Python"], &["Analyze"]).embedding_text().unwrap(),
            "Preferred Qualifications: SQL Python\nResponsibilities: Analyze"
        );
    }

    #[test]
    fn test_details_text_marks_missing_lists() {
        assert_eq!(
            row(&["SQL"], &[]).details_text(),
            "Preferred Qualifications:\n- SQL\n\nResponsibilities:\nNot specified."
        );
    }

    #[test]
    fn test_has_value_rejects_sentinels() {
        assert!(!has_value(""));
        assert!(!has_value("  N/A "));
        assert!(has_value("https://example.com"));
    }
}
