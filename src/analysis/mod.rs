//! Clause analysis: the dual-engine result shared by backend and client.
//!
//! An [`AnalysisResult`] pairs two independent opinions on one clause:
//!
//! - **rule-based**: deterministic keyword scoring from [`rules`]
//! - **AI-based**: a structured opinion from the model service, which may
//!   fail on its own without affecting the rule-based half
//!
//! The JSON shape (camelCase) is the wire format of the analyze and save
//! endpoints and of stored records.

pub mod record;
pub mod rules;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::AiEngine;

/// Maximum accepted clause length, in characters.
pub const MAX_CLAUSE_CHARS: usize = 10_000;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Both analyses of one clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub clause_text: String,
    pub rule_based: RuleAnalysis,
    pub ai_based: AiOutcome,
    /// Assigned by the store on save; absent before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    /// RFC 3339 creation time, assigned by the backend.
    #[serde(default)]
    pub timestamp: String,
}

/// Output of the deterministic rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAnalysis {
    pub clause_type: String,
    /// 0 to 10.
    pub risk_score: u8,
    pub flags: Vec<String>,
    pub summary: String,
}

/// The AI half: either a structured analysis or the reason it failed.
///
/// Any payload that carries an `error` key is a failure, whatever else it
/// contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AiOutcome {
    Failed { error: String },
    Analysis(AiAnalysis),
}

impl AiOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Structured opinion from the AI engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub clause_type: String,
    pub risk_level: RiskLevel,
    /// Distinct terms, first-seen order.
    pub key_terms: Vec<String>,
    pub summary: String,
    pub recommendations: Vec<String>,
}

/// Categorical risk assigned by the AI engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Parse a model-provided label, tolerating case and whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

/// Clause text rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter clause text to analyze.")]
    Empty,
    #[error("Clause text is too long ({chars} characters). Maximum is 10000 characters.")]
    TooLong { chars: usize },
}

/// Validate clause text and return it trimmed.
pub fn validate_clause_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_CLAUSE_CHARS {
        return Err(ValidationError::TooLong { chars });
    }
    Ok(trimmed)
}

// ---------------------------------------------------------------------------
// Analysis service
// ---------------------------------------------------------------------------

/// Run both engines over one clause.
///
/// The AI engine never fails the whole analysis; its errors land in
/// [`AiOutcome::Failed`].
pub fn analyze_clause(text: &str, ai: &dyn AiEngine) -> Result<AnalysisResult, ValidationError> {
    let clause = validate_clause_text(text)?;

    Ok(AnalysisResult {
        clause_text: clause.to_string(),
        rule_based: rules::analyze(clause),
        ai_based: ai.analyze(clause),
        analysis_id: None,
        timestamp: Utc::now().to_rfc3339(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAi(AiOutcome);

    impl AiEngine for FixedAi {
        fn analyze(&self, _clause: &str) -> AiOutcome {
            self.0.clone()
        }
    }

    #[test]
    fn validation_rejects_blank_and_oversized_text() {
        assert_eq!(validate_clause_text(""), Err(ValidationError::Empty));
        assert_eq!(validate_clause_text(" \n\t "), Err(ValidationError::Empty));

        let long = "a".repeat(MAX_CLAUSE_CHARS + 1);
        assert_eq!(
            validate_clause_text(&long),
            Err(ValidationError::TooLong {
                chars: MAX_CLAUSE_CHARS + 1
            })
        );
    }

    #[test]
    fn validation_counts_characters_not_bytes() {
        let accented = "é".repeat(MAX_CLAUSE_CHARS);
        assert!(validate_clause_text(&accented).is_ok());
    }

    #[test]
    fn validation_trims_surrounding_whitespace() {
        assert_eq!(validate_clause_text("  Tenant shall pay.  "), Ok("Tenant shall pay."));
    }

    #[test]
    fn ai_failure_keeps_rule_result() {
        let ai = FixedAi(AiOutcome::failed("AI service not configured"));
        let result = analyze_clause("The supplier shall indemnify the buyer.", &ai).unwrap();

        assert_eq!(result.rule_based.clause_type, "Indemnification");
        assert!(result.ai_based.is_failed());
        assert!(result.analysis_id.is_none());
        assert!(!result.timestamp.is_empty());
    }

    #[test]
    fn ai_outcome_with_error_key_is_failure() {
        let json = r#"{"error":"Unexpected error: boom","clause_type":"Unknown","summary":"Analysis failed."}"#;
        let outcome: AiOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome, AiOutcome::failed("Unexpected error: boom"));
    }

    #[test]
    fn result_serializes_camel_case_without_id() {
        let result = AnalysisResult {
            clause_text: "x".into(),
            rule_based: RuleAnalysis {
                clause_type: "Unknown".into(),
                risk_score: 2,
                flags: vec![],
                summary: "s".into(),
            },
            ai_based: AiOutcome::Analysis(AiAnalysis {
                clause_type: "Termination".into(),
                risk_level: RiskLevel::Medium,
                key_terms: vec!["notice".into()],
                summary: "s".into(),
                recommendations: vec![],
            }),
            analysis_id: None,
            timestamp: "2025-01-15T10:00:00+00:00".into(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ruleBased"]["riskScore"], 2);
        assert_eq!(json["aiBased"]["riskLevel"], "Medium");
        assert!(json.get("analysisId").is_none());
    }

    #[test]
    fn risk_level_parse_is_lenient() {
        assert_eq!(RiskLevel::parse(" HIGH "), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse("moderate"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("Unknown"), None);
    }
}
