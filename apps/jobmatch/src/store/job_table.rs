//! The jobs table: CSV written by `scrape`, read back by `analyze`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::job::{
    has_value, synthesize_job_id, JobDetail, JobListing, JobRow, JOB_ID_COLUMN, NOT_AVAILABLE,
    PREF_QUAL_COLUMNS, RESPONSIBILITY_COLUMNS,
};

const FIXED_COLUMNS: [&str; 6] = [
    JOB_ID_COLUMN,
    "page",
    "title",
    "location",
    "experience_level",
    "url",
];

/// Writes one row per listing, flattening list fields into numbered columns,
/// and each full description into `<descriptions_dir>/<job id>.txt`.
pub fn write_job_table(
    path: &Path,
    descriptions_dir: &Path,
    listings: &[JobListing],
) -> Result<(), AppError> {
    let min_quals = column_width(listings, |d| d.minimum_qualifications.as_ref());
    let pref_quals = column_width(listings, |d| d.preferred_qualifications.as_ref());
    let responsibilities = column_width(listings, |d| d.responsibilities.as_ref());

    let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend((1..=min_quals).map(|i| format!("min_qual_{i}")));
    header.extend((1..=pref_quals).map(|i| format!("pref_qual_{i}")));
    header.extend((1..=responsibilities).map(|i| format!("responsibility_{i}")));
    header.push("description_file".to_string());

    if listings.iter().any(|l| l.detail.is_some()) {
        fs::create_dir_all(descriptions_dir)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&header)?;

    for listing in listings {
        let s = &listing.summary;
        let mut record = vec![
            listing.id.clone(),
            s.page.to_string(),
            s.title.clone(),
            s.location.clone(),
            s.experience_level.clone(),
            s.url.clone(),
        ];

        let detail = listing.detail.as_ref();
        push_padded(&mut record, detail.and_then(|d| d.minimum_qualifications.as_ref()), min_quals);
        push_padded(&mut record, detail.and_then(|d| d.preferred_qualifications.as_ref()), pref_quals);
        push_padded(&mut record, detail.and_then(|d| d.responsibilities.as_ref()), responsibilities);

        let description_file = match detail {
            Some(d) => {
                let file = description_path(descriptions_dir, &listing.id);
                fs::write(&file, d.full_description())?;
                file.display().to_string()
            }
            None => String::new(),
        };
        record.push(description_file);

        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!("Saved {} jobs to {}", listings.len(), path.display());
    Ok(())
}

/// Widest list across all listings; that many numbered columns get written.
fn column_width(
    listings: &[JobListing],
    field: impl Fn(&JobDetail) -> Option<&Vec<String>>,
) -> usize {
    listings
        .iter()
        .filter_map(|l| l.detail.as_ref().and_then(&field))
        .map(Vec::len)
        .max()
        .unwrap_or(0)
}

fn push_padded(record: &mut Vec<String>, items: Option<&Vec<String>>, width: usize) {
    let items = items.map(Vec::as_slice).unwrap_or_default();
    record.extend((0..width).map(|i| items.get(i).cloned().unwrap_or_default()));
}

fn description_path(dir: &Path, job_id: &str) -> PathBuf {
    let stem: String = job_id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    dir.join(format!("{stem}.txt"))
}

/// Reads the jobs table. A missing file is fatal for the run.
///
/// Rows get a synthesized `job_id_unique` when the column is absent, and rows
/// whose URL repeats an earlier row are dropped so that every identity maps to
/// exactly one row.
pub fn load_job_table(path: &Path) -> Result<Vec<JobRow>, AppError> {
    if !path.exists() {
        return Err(AppError::MissingResource(format!(
            "jobs table '{}' not found; run the scraper first",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let has_id_column = headers.iter().any(|h| h == JOB_ID_COLUMN);

    let mut rows = Vec::new();
    for (position, record) in reader.records().enumerate() {
        let record = record?;
        let mut columns: Vec<(String, String)> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or_default().to_string()))
            .collect();

        let cell = |name: &str| -> String {
            columns
                .iter()
                .find(|(h, _)| h == name)
                .map(|(_, v)| v.trim().to_string())
                .unwrap_or_default()
        };

        let raw_url = cell("url");
        let job_id = match cell(JOB_ID_COLUMN) {
            id if !id.is_empty() => id,
            _ => synthesize_job_id(position, &raw_url),
        };
        let title = match cell("title") {
            t if t.is_empty() => NOT_AVAILABLE.to_string(),
            t => t,
        };
        let preferred_qualifications = numbered_cells(&cell, "pref_qual", PREF_QUAL_COLUMNS);
        let responsibilities = numbered_cells(&cell, "responsibility", RESPONSIBILITY_COLUMNS);

        if !has_id_column {
            columns.insert(0, (JOB_ID_COLUMN.to_string(), job_id.clone()));
        }

        rows.push(JobRow {
            job_id,
            title,
            url: has_value(&raw_url).then_some(raw_url),
            preferred_qualifications,
            responsibilities,
            columns,
        });
    }

    info!("Job data loaded successfully. Total jobs in table: {}", rows.len());
    Ok(dedupe_rows(rows))
}

fn numbered_cells(cell: &impl Fn(&str) -> String, prefix: &str, count: usize) -> Vec<String> {
    (1..=count)
        .map(|i| cell(&format!("{prefix}_{i}")))
        .filter(|v| !v.is_empty())
        .collect()
}

fn dedupe_rows(rows: Vec<JobRow>) -> Vec<JobRow> {
    let mut seen_urls = HashSet::new();
    let mut seen_ids = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            let url_ok = row.url.as_ref().map_or(true, |u| seen_urls.insert(u.clone()));
            let id_ok = seen_ids.insert(row.job_id.clone());
            if !(url_ok && id_ok) {
                warn!(
                    "Dropping row '{}' ({}): its identity repeats an earlier row",
                    row.title,
                    row.identity()
                );
            }
            url_ok && id_ok
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobSummary;

    fn listing(id: &str, url: &str, detail: Option<JobDetail>) -> JobListing {
        JobListing {
            id: id.to_string(),
            summary: JobSummary {
                page: 1,
                title: format!("Title {id}"),
                location: "Pune".to_string(),
                experience_level: "Mid".to_string(),
                url: url.to_string(),
            },
            detail,
        }
    }

    #[test]
    fn test_written_table_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("jobs.csv");
        let descriptions = dir.path().join("descriptions");
        let detail = JobDetail {
            preferred_qualifications: Some(vec!["SQL".to_string(), "Python".to_string()]),
            responsibilities: Some(vec!["Analyze".to_string()]),
            ..Default::default()
        };
        let listings = vec![
            listing("0_a", "https://x/jobs?id=a", Some(detail)),
            listing("1_N/A", "N/A", None),
        ];

        write_job_table(&table, &descriptions, &listings).unwrap();
        let rows = load_job_table(&table).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].job_id, "0_a");
        assert_eq!(rows[0].url.as_deref(), Some("https://x/jobs?id=a"));
        assert_eq!(rows[0].preferred_qualifications, vec!["SQL", "Python"]);
        assert_eq!(rows[0].responsibilities, vec!["Analyze"]);
        assert!(rows[1].url.is_none());
        assert!(rows[1].preferred_qualifications.is_empty());

        let description = std::fs::read_to_string(descriptions.join("0_a.txt")).unwrap();
        assert_eq!(
            description,
            "Preferred qualifications:\nSQL\nPython\n\nResponsibilities\nAnalyze\n"
        );
    }

    #[test]
    fn test_missing_table_is_missing_resource() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_job_table(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, AppError::MissingResource(_)));
    }

    #[test]
    fn test_job_id_synthesized_when_column_absent() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("jobs.csv");
        std::fs::write(
            &table,
            "title,url,pref_qual_1,responsibility_1\n\
             Analyst,https://x/jobs?jid=111,SQL,Report\n\
             Engineer,,,\n",
        )
        .unwrap();

        let rows = load_job_table(&table).unwrap();

        assert_eq!(rows[0].job_id, "0_111");
        assert_eq!(rows[1].job_id, "1_");
        assert_eq!(rows[1].identity(), "1_");
        assert_eq!(rows[0].columns[0], (JOB_ID_COLUMN.to_string(), "0_111".to_string()));
    }

    #[test]
    fn test_duplicate_urls_keep_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("jobs.csv");
        std::fs::write(
            &table,
            "title,url\nFirst,https://x/1\nSecond,https://x/1\nThird,https://x/2\n",
        )
        .unwrap();

        let rows = load_job_table(&table).unwrap();

        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Third"]);
    }
}
