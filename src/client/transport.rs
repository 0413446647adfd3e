//! [`Backend`] implementations.
//!
//! [`HttpBackend`] talks to a running `clausescope serve` over JSON/HTTP.
//! [`LocalBackend`] runs the analysis and the record store in-process; the
//! HTTP server answers its own requests through one as well, so both paths
//! share validation and error statuses.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::dashboard::AnalysisSummary;
use super::{Backend, TransportError};
use crate::activity;
use crate::ai::{self, AiEngine};
use crate::analysis::record::StoredRecord;
use crate::analysis::{self, AnalysisResult};
use crate::config::ClauseScopeConfig;
use crate::protocol::{
    AnalyzeRequest, ErrorBody, HealthReport, SaveRequest, SaveResponse, SummaryRecord,
};
use crate::store::{self, Store, StoreError, summary};

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Client for the JSON endpoints of `clausescope serve`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &ClauseScopeConfig) -> Self {
        Self::new(
            &config.client.backend_url,
            Duration::from_millis(config.client.timeout_ms),
        )
    }

    pub fn health(&self) -> Result<HealthReport, TransportError> {
        self.get_json("/api/health")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, TransportError> {
        let resp = ureq::get(&self.url(path))
            .timeout(self.timeout)
            .call()
            .map_err(map_ureq_error)?;
        resp.into_json()
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, TransportError> {
        let resp = ureq::post(&self.url(path))
            .timeout(self.timeout)
            .send_json(body)
            .map_err(map_ureq_error)?;
        resp.into_json()
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl Backend for HttpBackend {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, TransportError> {
        self.post_json("/api/analyze", request)
    }

    fn save(&self, request: &SaveRequest) -> Result<SaveResponse, TransportError> {
        self.post_json("/api/save", request)
    }

    fn fetch(&self, id: &str) -> Result<StoredRecord, TransportError> {
        let value: Value = self.get_json(&format!("/api/analyses/{id}"))?;
        StoredRecord::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
    }

    fn list(&self) -> Result<Vec<AnalysisSummary>, TransportError> {
        self.get_json("/api/analyses")
    }

    fn export_url(&self, id: &str) -> Option<String> {
        Some(self.url(&format!("/api/analyses/{id}/export")))
    }
}

/// Non-2xx bodies carry `{ "error": ... }`; anything else falls back to the
/// status line.
fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(status, resp) => {
            let reason = resp.status_text().to_string();
            let message = resp
                .into_json::<ErrorBody>()
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("Request failed with status {status} {reason}"));
            TransportError::Status { status, message }
        }
        ureq::Error::Transport(t) => TransportError::Network(t.to_string()),
    }
}

// ---------------------------------------------------------------------------
// In-process
// ---------------------------------------------------------------------------

/// Analysis and storage in the current process.
pub struct LocalBackend {
    ai: Box<dyn AiEngine>,
    store: Box<dyn Store>,
}

impl LocalBackend {
    pub fn new(ai: Box<dyn AiEngine>, store: Box<dyn Store>) -> Self {
        Self { ai, store }
    }

    pub fn from_config(config: &ClauseScopeConfig) -> Result<Self, StoreError> {
        Ok(Self::new(
            ai::engine_from_config(&config.ai),
            store::open_store(config)?,
        ))
    }

    /// A stored record exactly as saved.
    pub fn fetch_raw(&self, id: &str) -> Result<Value, TransportError> {
        match self.store.get(id) {
            Ok(value) => {
                activity::record_fetch(id, true);
                Ok(value)
            }
            Err(e) => {
                activity::record_fetch(id, false);
                Err(store_failure(e))
            }
        }
    }

    /// The typed listing, newest first.
    pub fn summaries(&self) -> Result<Vec<SummaryRecord>, TransportError> {
        let records = self.store.list_with_data().map_err(store_failure)?;
        Ok(summary::summarize_all(&records))
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ai_configured: self.ai.is_configured(),
            storage: self.store.kind().to_string(),
            storage_configured: self.store.is_configured(),
        }
    }
}

impl Backend for LocalBackend {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, TransportError> {
        let start = Instant::now();
        let result =
            analysis::analyze_clause(&request.clause_text, self.ai.as_ref()).map_err(|e| {
                TransportError::Status {
                    status: 400,
                    message: e.to_string(),
                }
            })?;
        activity::record_analyze(
            start.elapsed().as_millis() as u64,
            &result.rule_based.clause_type,
            result.ai_based.is_failed(),
        );
        Ok(result)
    }

    fn save(&self, request: &SaveRequest) -> Result<SaveResponse, TransportError> {
        if request.analysis_data.clause_text.trim().is_empty() {
            return Err(TransportError::Status {
                status: 400,
                message: "No analysis data provided".to_string(),
            });
        }
        let analysis_id = self
            .store
            .save(&request.analysis_data)
            .map_err(store_failure)?;
        activity::record_save(&analysis_id);
        Ok(SaveResponse { analysis_id })
    }

    fn fetch(&self, id: &str) -> Result<StoredRecord, TransportError> {
        let value = self.fetch_raw(id)?;
        StoredRecord::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
    }

    fn list(&self) -> Result<Vec<AnalysisSummary>, TransportError> {
        Ok(self
            .summaries()?
            .into_iter()
            .map(AnalysisSummary::from)
            .collect())
    }
}

fn store_failure(err: StoreError) -> TransportError {
    activity::record_error("store", &err.to_string());
    TransportError::Status {
        status: err.status_code(),
        message: err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
