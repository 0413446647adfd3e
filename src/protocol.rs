use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub clause_text: String,
}

/// Body of `POST /api/save`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub analysis_data: AnalysisResult,
}

/// Success body of `POST /api/save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub analysis_id: String,
}

/// Failure body of every endpoint, sent with a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// One saved analysis as listed by `GET /api/analyses`.
///
/// `risk_score` is a display string (`"6/10"`, or `"N/A"` when the record
/// has no rule-based score); clients parse the number out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub risk: String,
    pub risk_score: String,
    pub date: String,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub ai_configured: bool,
    /// `"local"` or `"github"`.
    pub storage: String,
    pub storage_configured: bool,
}
