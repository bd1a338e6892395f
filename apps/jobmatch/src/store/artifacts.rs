use std::path::Path;

use tracing::info;

use crate::errors::AppError;

/// Writes heterogeneous rows as one CSV. The header is the union of column
/// names in first-seen order; a row without a column gets an empty cell.
/// An empty `rows` still produces the file (header only, possibly blank).
pub fn write_rows(path: &Path, rows: &[Vec<(String, String)>]) -> Result<(), AppError> {
    let mut header: Vec<&str> = Vec::new();
    for row in rows {
        for (name, _) in row {
            if !header.contains(&name.as_str()) {
                header.push(name);
            }
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    if !header.is_empty() {
        writer.write_record(&header)?;
    }
    for row in rows {
        let record = header.iter().map(|name| {
            row.iter()
                .find(|(column, _)| column == name)
                .map_or("", |(_, value)| value.as_str())
        });
        writer.write_record(record)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
