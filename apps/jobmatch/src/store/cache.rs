//! Persistent assessment cache keyed by job identity.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::assessment::Assessment;

/// Only successful assessments are ever stored, so a hit never hides a failure.
pub trait AssessmentCache: Send {
    fn get(&self, identity: &str) -> Option<Assessment>;
    fn put(&mut self, identity: &str, assessment: Assessment);
    fn flush(&mut self) -> Result<(), AppError>;
    fn len(&self) -> usize;
}

/// JSON object `{identity: assessment}` on disk, rewritten whole on every flush.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    entries: BTreeMap<String, Assessment>,
    dirty: bool,
}

impl JsonFileCache {
    /// Missing file → empty cache. A file that is not a JSON object is treated the same
    /// (with a warning); individual entries that fail to parse are skipped.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => parse_entries(&path, &raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Could not read cache {}: {e}. Starting empty.", path.display());
                BTreeMap::new()
            }
        };

        if !entries.is_empty() {
            info!("Loaded {} cached assessments from {}", entries.len(), path.display());
        }
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_entries(path: &Path, raw: &str) -> BTreeMap<String, Assessment> {
    let object = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            warn!(
                "Cache file {} is corrupt or not a JSON object. Starting with an empty cache.",
                path.display()
            );
            return BTreeMap::new();
        }
    };

    object
        .into_iter()
        .filter_map(|(identity, value)| match serde_json::from_value::<Assessment>(value) {
            Ok(assessment) => Some((identity, assessment)),
            Err(e) => {
                warn!("Skipping unreadable cache entry '{identity}': {e}");
                None
            }
        })
        .collect()
}

impl AssessmentCache for JsonFileCache {
    fn get(&self, identity: &str) -> Option<Assessment> {
        self.entries.get(identity).cloned()
    }

    fn put(&mut self, identity: &str, assessment: Assessment) {
        self.entries.insert(identity.to_string(), assessment);
        self.dirty = true;
    }

    /// Writes to a temp file beside the target and renames it over, so an
    /// interrupted flush leaves the previous cache intact.
    fn flush(&mut self) -> Result<(), AppError> {
        if !self.dirty {
            return Ok(());
        }

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.entries)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| AppError::Io(e.error))?;

        self.dirty = false;
        info!("Saved {} assessments to cache", self.entries.len());
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
