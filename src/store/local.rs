//! Filesystem record store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{RECORD_FILE, RECORDS_DIR, Store, StoreError};
use crate::analysis::AnalysisResult;

/// Stores records under `{root}/contracts/{id}/analysis.json`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    /// Claim a directory for a new record. Two saves in the same second get
    /// `_2`, `_3`, ... suffixes instead of overwriting each other.
    fn claim_dir(&self, base_id: &str) -> Result<(String, PathBuf), StoreError> {
        fs::create_dir_all(self.records_dir())?;

        let mut id = base_id.to_string();
        let mut attempt = 1;
        loop {
            let dir = self.records_dir().join(&id);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok((id, dir)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    attempt += 1;
                    id = format!("{base_id}_{attempt}");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Store for LocalStore {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn save(&self, analysis: &AnalysisResult) -> Result<String, StoreError> {
        let (id, dir) = self.claim_dir(&super::new_record_id())?;
        let value = super::record_value(analysis, &id)?;
        let content = serde_json::to_string_pretty(&value)?;
        fs::write(dir.join(RECORD_FILE), content)?;
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Value, StoreError> {
        let id = super::validate_id(id)?;
        let path = self.records_dir().join(id).join(RECORD_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(self.records_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let ids = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();

        Ok(super::newest_first(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AiOutcome, RuleAnalysis};

    fn scratch_store(name: &str) -> LocalStore {
        let root = std::env::temp_dir().join(format!(
            "clausescope-store-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        LocalStore::new(root)
    }

    fn sample() -> AnalysisResult {
        AnalysisResult {
            clause_text: "Either party may terminate.".into(),
            rule_based: RuleAnalysis {
                clause_type: "Termination".into(),
                risk_score: 2,
                flags: vec!["Missing protective language".into()],
                summary: "s".into(),
            },
            ai_based: AiOutcome::failed("AI service not configured"),
            analysis_id: None,
            timestamp: "2025-01-15T10:00:00+00:00".into(),
        }
    }

    #[test]
    fn save_then_get_stamps_id() {
        let store = scratch_store("roundtrip");
        let id = store.save(&sample()).unwrap();

        let value = store.get(&id).unwrap();
        assert_eq!(value["analysisId"], id.as_str());
        assert_eq!(value["ruleBased"]["clauseType"], "Termination");
    }

    #[test]
    fn same_second_saves_do_not_collide() {
        let store = scratch_store("collide");
        let first = store.save(&sample()).unwrap();
        let second = store.save(&sample()).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.list_ids().unwrap().len(), 2);
    }

    #[test]
    fn missing_record_is_not_found() {
        let store = scratch_store("missing");
        assert!(matches!(
            store.get("20990101_000000"),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.get("../x"), Err(StoreError::InvalidId(_))));
    }

    #[test]
    fn empty_store_lists_nothing() {
        let store = scratch_store("empty");
        assert!(store.list_ids().unwrap().is_empty());
        assert!(store.list_with_data().unwrap().is_empty());
    }

    #[test]
    fn unreadable_records_are_skipped_in_listing() {
        let store = scratch_store("skip");
        let good = store.save(&sample()).unwrap();
        let broken = store.records_dir().join("20000101_000000");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join(RECORD_FILE), "{not json").unwrap();

        let listed = store.list_with_data().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, good);
    }
}
