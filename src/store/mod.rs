//! Record store for saved analyses.
//!
//! Every saved analysis lives at `contracts/{id}/analysis.json`, where the
//! id is the save time as `YYYYMMDD_HHMMSS`. Two stores share that layout:
//!
//! - [`LocalStore`]: plain files under a data directory
//! - [`GitHubStore`]: a GitHub repository through the contents API
//!
//! [`summary`] projects stored records into the typed dashboard listing.

pub mod github;
pub mod local;
pub mod summary;

use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::analysis::AnalysisResult;
use crate::config::{self, ClauseScopeConfig, StorageBackend};

pub use github::GitHubStore;
pub use local::LocalStore;

/// Directory (or repository folder) holding one sub-directory per record.
pub const RECORDS_DIR: &str = "contracts";

/// File name of a record inside its directory.
pub const RECORD_FILE: &str = "analysis.json";

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("id regex must compile"));

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Analysis not found: {0}")]
    NotFound(String),

    #[error("Invalid analysis id: {0}")]
    InvalidId(String),

    #[error("{0}")]
    NotConfigured(String),

    #[error("GitHub API rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Request timed out. Check your network connection.")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// HTTP status the backend answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidId(_) => 400,
            Self::NotConfigured(_) => 503,
            Self::RateLimited => 429,
            Self::Timeout => 504,
            Self::Network(_) => 502,
            Self::Io(_) | Self::Json(_) | Self::Other(_) => 500,
        }
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Persistence for saved analyses.
pub trait Store {
    /// `"local"` or `"github"`.
    fn kind(&self) -> &'static str;

    /// Whether the store has what it needs to be reached.
    fn is_configured(&self) -> bool {
        true
    }

    /// Persist an analysis and return its newly assigned id.
    fn save(&self, analysis: &AnalysisResult) -> Result<String, StoreError>;

    /// Load the raw JSON of one record.
    fn get(&self, id: &str) -> Result<Value, StoreError>;

    /// All record ids, newest first.
    fn list_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Every loadable record with its id, newest first. Records that fail
    /// to load are skipped.
    fn list_with_data(&self) -> Result<Vec<(String, Value)>, StoreError> {
        let ids = self.list_ids()?;
        Ok(ids
            .into_iter()
            .filter_map(|id| match self.get(&id) {
                Ok(value) => Some((id, value)),
                Err(e) => {
                    crate::activity::record_error("list", &format!("skipped {id}: {e}"));
                    None
                }
            })
            .collect())
    }
}

/// Open the store selected by `[storage] backend`.
pub fn open_store(config: &ClauseScopeConfig) -> Result<Box<dyn Store>, StoreError> {
    match config.storage.backend {
        StorageBackend::Local => {
            let root = config::data_dir(config).ok_or_else(|| {
                StoreError::NotConfigured(
                    "Local storage not configured: could not determine a data directory".into(),
                )
            })?;
            Ok(Box::new(LocalStore::new(root)))
        }
        StorageBackend::Github => Ok(Box::new(GitHubStore::from_config(&config.storage))),
    }
}

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// A fresh record id from the current local time.
pub fn new_record_id() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Reject ids that could escape the records directory.
pub fn validate_id(id: &str) -> Result<&str, StoreError> {
    if ID_RE.is_match(id) {
        Ok(id)
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// Relative path of a record: `contracts/{id}/analysis.json`.
pub fn record_path(id: &str) -> String {
    format!("{RECORDS_DIR}/{id}/{RECORD_FILE}")
}

/// The record as written to storage: the analysis with its id filled in.
pub(crate) fn record_value(analysis: &AnalysisResult, id: &str) -> Result<Value, StoreError> {
    let mut stamped = analysis.clone();
    stamped.analysis_id = Some(id.to_string());
    Ok(serde_json::to_value(&stamped)?)
}

/// Sort ids newest first (ids are timestamp-shaped, so this is a reverse
/// lexicographic sort).
pub(crate) fn newest_first(mut ids: Vec<String>) -> Vec<String> {
    ids.sort_by(|a, b| b.cmp(a));
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_are_timestamp_shaped() {
        let id = new_record_id();
        assert_eq!(id.len(), 15);
        assert_eq!(&id[8..9], "_");
        assert!(validate_id(&id).is_ok());
    }

    #[test]
    fn validate_id_rejects_traversal() {
        assert!(validate_id("../etc/passwd").is_err());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("").is_err());
        assert!(validate_id("20250115_100000_2").is_ok());
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(StoreError::NotFound("x".into()).status_code(), 404);
        assert_eq!(StoreError::RateLimited.status_code(), 429);
        assert_eq!(StoreError::NotConfigured("x".into()).status_code(), 503);
        assert_eq!(StoreError::Other("x".into()).status_code(), 500);
    }

    #[test]
    fn record_path_layout() {
        assert_eq!(
            record_path("20250115_100000"),
            "contracts/20250115_100000/analysis.json"
        );
    }

    #[test]
    fn newest_first_sorts_descending() {
        let ids = vec![
            "20250101_000000".to_string(),
            "20250301_000000".to_string(),
            "20250201_000000".to_string(),
        ];
        assert_eq!(
            newest_first(ids),
            vec!["20250301_000000", "20250201_000000", "20250101_000000"]
        );
    }
}
