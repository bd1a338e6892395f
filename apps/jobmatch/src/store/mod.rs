//! On-disk state: the scraped jobs table, the assessment cache, and the
//! analyzed / shortlisted outputs.

pub mod artifacts;
pub mod cache;
pub mod job_table;

pub use cache::{AssessmentCache, JsonFileCache};
