//! GitHub-backed record store.
//!
//! Records are committed to a repository through the REST contents API
//! (`/repos/{owner}/{repo}/contents/{path}`), base64-encoded as the API
//! requires. Saving over an existing path sends the current blob `sha` so
//! the commit becomes an update instead of a conflict.
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{RECORDS_DIR, Store, StoreError};
use crate::analysis::AnalysisResult;
use crate::config::schema::StorageConfig;

const GITHUB_API: &str = "https://api.github.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Message reported when saving or browsing without credentials.
pub const NOT_CONFIGURED: &str = "GitHub storage not configured: set CLAUSESCOPE_GITHUB_TOKEN, \
                                  storage.github_owner and storage.github_repo";

/// A file entry from the contents API.
#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// A directory listing entry from the contents API.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Clone)]
pub struct GitHubStore {
    token: String,
    base_url: String,
}

impl GitHubStore {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            &config.github_token,
            &config.github_owner,
            &config.github_repo,
            GITHUB_API,
        )
    }

    /// Build a store against an explicit API root (GitHub Enterprise, tests).
    pub fn new(token: &str, owner: &str, repo: &str, api_root: &str) -> Self {
        let base_url = if owner.trim().is_empty() || repo.trim().is_empty() {
            String::new()
        } else {
            format!(
                "{}/repos/{}/{}",
                api_root.trim_end_matches('/'),
                owner.trim(),
                repo.trim()
            )
        };
        Self {
            token: token.trim().to_string(),
            base_url,
        }
    }

    fn contents_url(&self, path: &str) -> Result<String, StoreError> {
        if !self.is_configured() {
            return Err(StoreError::NotConfigured(NOT_CONFIGURED.to_string()));
        }
        Ok(format!("{}/contents/{path}", self.base_url))
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, StoreError> {
        let url = self.contents_url(path)?;
        let resp = self
            .authorized(ureq::get(&url))
            .call()
            .map_err(|e| map_ureq_error(e, path))?;
        resp.into_json()
            .map_err(|e| StoreError::Other(format!("failed to parse GitHub response: {e}")))
    }

    fn put_json(&self, path: &str, body: &Value) -> Result<(), StoreError> {
        let url = self.contents_url(path)?;
        self.authorized(ureq::put(&url))
            .send_json(body)
            .map_err(|e| map_ureq_error(e, path))?;
        Ok(())
    }

    fn authorized(&self, req: ureq::Request) -> ureq::Request {
        req.timeout(REQUEST_TIMEOUT)
            .set("Authorization", &format!("token {}", self.token))
            .set("Accept", "application/vnd.github.v3+json")
            .set("User-Agent", "clausescope")
    }
}

impl Store for GitHubStore {
    fn kind(&self) -> &'static str {
        "github"
    }

    fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.base_url.is_empty()
    }

    fn save(&self, analysis: &AnalysisResult) -> Result<String, StoreError> {
        let id = super::new_record_id();
        let path = super::record_path(&id);

        // An existing file at this path needs its sha; absence is the normal case.
        let sha = match self.get_json::<ContentFile>(&path) {
            Ok(file) => file.sha,
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let content = serde_json::to_string_pretty(&super::record_value(analysis, &id)?)?;
        let mut body = json!({
            "message": format!("Add analysis for {id}"),
            "content": STANDARD.encode(content.as_bytes()),
        });
        if let Some(sha) = sha {
            body["sha"] = Value::String(sha);
        }

        self.put_json(&path, &body)?;
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Value, StoreError> {
        let id = super::validate_id(id)?;
        let file: ContentFile = self
            .get_json(&super::record_path(id))
            .map_err(|e| match e {
                StoreError::NotFound(_) => StoreError::NotFound(id.to_string()),
                other => other,
            })?;
        let encoded = file
            .content
            .ok_or_else(|| StoreError::Other(format!("record {id} has no content")))?;
        Ok(serde_json::from_slice(&decode_content(&encoded)?)?)
    }

    fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let entries: Vec<ContentEntry> = match self.get_json(RECORDS_DIR) {
            Ok(entries) => entries,
            // No record has been saved yet.
            Err(StoreError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let ids = entries
            .into_iter()
            .filter(|entry| entry.kind == "dir")
            .map(|entry| entry.name)
            .collect();
        Ok(super::newest_first(ids))
    }
}

/// Decode base64 content; the API wraps it at 60 columns.
fn decode_content(encoded: &str) -> Result<Vec<u8>, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| StoreError::Other(format!("invalid base64 content: {e}")))
}

fn map_ureq_error(err: ureq::Error, path: &str) -> StoreError {
    match err {
        ureq::Error::Status(404, _) => StoreError::NotFound(path.to_string()),
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            if code == 429 || (code == 403 && body.to_lowercase().contains("rate limit")) {
                StoreError::RateLimited
            } else {
                StoreError::Other(format!("GitHub API error: {code} - {body}"))
            }
        }
        ureq::Error::Transport(t) => {
            let message = t.to_string();
            if message.to_lowercase().contains("timed out") {
                StoreError::Timeout
            } else {
                StoreError::Network(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_store_reports_not_configured() {
        let store = GitHubStore::from_config(&StorageConfig::default());
        assert!(!store.is_configured());
        match store.list_ids() {
            Err(StoreError::NotConfigured(msg)) => assert!(msg.contains("not configured")),
            other => panic!("expected NotConfigured, got {other:?}"),
        }
    }

    #[test]
    fn base_url_includes_owner_and_repo() {
        let store = GitHubStore::new("t", "acme", "contracts", "https://ghe.example.com/api/v3/");
        assert_eq!(store.base_url, "https://ghe.example.com/api/v3/repos/acme/contracts");
        assert_eq!(
            store.contents_url("contracts").unwrap(),
            "https://ghe.example.com/api/v3/repos/acme/contracts/contents/contracts"
        );
    }

    #[test]
    fn decode_content_ignores_line_wrapping() {
        let encoded = STANDARD.encode(br#"{"clauseText":"x"}"#);
        let wrapped = format!("{}\n{}\n", &encoded[..10], &encoded[10..]);
        let value: Value = serde_json::from_slice(&decode_content(&wrapped).unwrap()).unwrap();
        assert_eq!(value["clauseText"], "x");
    }

    #[test]
    fn invalid_id_is_rejected_before_any_request() {
        let store = GitHubStore::new("t", "acme", "contracts", GITHUB_API);
        assert!(matches!(store.get("../../x"), Err(StoreError::InvalidId(_))));
    }
}
