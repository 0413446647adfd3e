//! Display projections: total functions from a (possibly partial) analysis
//! to display strings.
//!
//! Nothing here can fail. Every field has its own placeholder, so a record
//! missing one field still renders every other field.

use serde::Serialize;

use crate::analysis::record::{AiFields, RuleFields, StoredRecord, present};
use crate::analysis::{AiOutcome, AnalysisResult, RuleAnalysis};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_SUMMARY: &str = "No summary available";
pub const NO_FLAGS: &str = "No flags";
pub const NO_RECOMMENDATIONS: &str = "No recommendations";

/// Rule-based column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePanel {
    pub clause_type: String,
    /// `"{score}/10"`, or `"N/A"` when the record has no score.
    pub risk_score: String,
    /// Never empty; holds [`NO_FLAGS`] alone when there are none.
    pub flags: Vec<String>,
    pub summary: String,
}

/// AI-based column. Exactly one variant is rendered, chosen by whether the
/// payload carries an `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "panel", rename_all = "camelCase")]
pub enum AiPanel {
    #[serde(rename_all = "camelCase")]
    Analysis {
        clause_type: String,
        risk_level: String,
        key_terms: String,
        summary: String,
        /// Never empty; holds [`NO_RECOMMENDATIONS`] alone when there are none.
        recommendations: Vec<String>,
    },
    Error { message: String },
}

impl AiPanel {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// The results area after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsPanel {
    pub clause_text: String,
    pub rule: RulePanel,
    pub ai: AiPanel,
}

impl ResultsPanel {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            clause_text: result.clause_text.clone(),
            rule: rule_panel(&result.rule_based),
            ai: ai_panel(&result.ai_based),
        }
    }
}

/// Two-column view of one saved record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    pub id: String,
    pub clause_text: String,
    pub timestamp: String,
    pub rule: RulePanel,
    pub ai: AiPanel,
}

impl DetailView {
    /// Project a stored record. `id` is the id it was requested under, used
    /// when the record does not carry its own.
    pub fn from_record(id: &str, record: &StoredRecord) -> Self {
        let rule = record.rule_based.clone().unwrap_or_default();
        let ai = match record.ai_error() {
            Some(error) => AiPanel::Error {
                message: error.to_string(),
            },
            None => stored_ai_panel(&record.ai_based.clone().unwrap_or_default()),
        };

        Self {
            id: or_placeholder(record.analysis_id.as_deref().or(Some(id)), NOT_AVAILABLE),
            clause_text: or_placeholder(record.clause_text.as_deref(), NOT_AVAILABLE),
            timestamp: or_placeholder(record.timestamp.as_deref(), NOT_AVAILABLE),
            rule: stored_rule_panel(&rule),
            ai,
        }
    }

    /// Plain-text report for export.
    pub fn to_report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Clause Analysis Report: {}\n", self.id));
        out.push_str(&format!("Date: {}\n\n", self.timestamp));
        out.push_str(&format!("Clause:\n{}\n\n", self.clause_text));

        out.push_str("Rule-Based Analysis\n");
        out.push_str(&format!("  Clause type: {}\n", self.rule.clause_type));
        out.push_str(&format!("  Risk score:  {}\n", self.rule.risk_score));
        out.push_str("  Flags:\n");
        for flag in &self.rule.flags {
            out.push_str(&format!("    - {flag}\n"));
        }
        out.push_str(&format!("  Summary: {}\n\n", self.rule.summary));

        out.push_str("AI Analysis\n");
        match &self.ai {
            AiPanel::Error { message } => out.push_str(&format!("  Error: {message}\n")),
            AiPanel::Analysis {
                clause_type,
                risk_level,
                key_terms,
                summary,
                recommendations,
            } => {
                out.push_str(&format!("  Clause type: {clause_type}\n"));
                out.push_str(&format!("  Risk level:  {risk_level}\n"));
                out.push_str(&format!("  Key terms:   {key_terms}\n"));
                out.push_str(&format!("  Summary: {summary}\n"));
                out.push_str("  Recommendations:\n");
                for rec in recommendations {
                    out.push_str(&format!("    - {rec}\n"));
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Field projections
// ---------------------------------------------------------------------------

fn rule_panel(rule: &RuleAnalysis) -> RulePanel {
    RulePanel {
        clause_type: or_placeholder(Some(&rule.clause_type), NOT_AVAILABLE),
        risk_score: format_score(Some(rule.risk_score)),
        flags: list_or_placeholder(&rule.flags, NO_FLAGS),
        summary: or_placeholder(Some(&rule.summary), NO_SUMMARY),
    }
}

fn ai_panel(outcome: &AiOutcome) -> AiPanel {
    match outcome {
        AiOutcome::Failed { error } => AiPanel::Error {
            message: error.clone(),
        },
        AiOutcome::Analysis(ai) => AiPanel::Analysis {
            clause_type: or_placeholder(Some(&ai.clause_type), NOT_AVAILABLE),
            risk_level: ai.risk_level.to_string(),
            key_terms: join_or_placeholder(&ai.key_terms, NOT_AVAILABLE),
            summary: or_placeholder(Some(&ai.summary), NO_SUMMARY),
            recommendations: list_or_placeholder(&ai.recommendations, NO_RECOMMENDATIONS),
        },
    }
}

fn stored_rule_panel(rule: &RuleFields) -> RulePanel {
    RulePanel {
        clause_type: or_placeholder(rule.clause_type.as_deref(), NOT_AVAILABLE),
        risk_score: format_score(rule.score()),
        flags: list_or_placeholder(rule.flags.as_deref().unwrap_or_default(), NO_FLAGS),
        summary: or_placeholder(rule.summary.as_deref(), NO_SUMMARY),
    }
}

fn stored_ai_panel(ai: &AiFields) -> AiPanel {
    AiPanel::Analysis {
        clause_type: or_placeholder(ai.clause_type.as_deref(), NOT_AVAILABLE),
        risk_level: or_placeholder(ai.risk_level.as_deref(), NOT_AVAILABLE),
        key_terms: join_or_placeholder(ai.key_terms.as_deref().unwrap_or_default(), NOT_AVAILABLE),
        summary: or_placeholder(ai.summary.as_deref(), NO_SUMMARY),
        recommendations: list_or_placeholder(
            ai.recommendations.as_deref().unwrap_or_default(),
            NO_RECOMMENDATIONS,
        ),
    }
}

/// `"6/10"`, or `"N/A"` without a score.
pub fn format_score(score: Option<u8>) -> String {
    match score {
        Some(score) => format!("{score}/10"),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn or_placeholder(text: Option<&str>, placeholder: &str) -> String {
    present(text).unwrap_or(placeholder).to_string()
}

fn list_or_placeholder(items: &[String], placeholder: &str) -> Vec<String> {
    let items: Vec<String> = items
        .iter()
        .filter_map(|item| present(Some(item)))
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        vec![placeholder.to_string()]
    } else {
        items
    }
}

fn join_or_placeholder(items: &[String], placeholder: &str) -> String {
    list_or_placeholder(items, placeholder).join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_record_renders_every_placeholder() {
        let view = DetailView::from_record("20250115_100000", &StoredRecord::default());
        assert_eq!(view.id, "20250115_100000");
        assert_eq!(view.clause_text, NOT_AVAILABLE);
        assert_eq!(view.rule.risk_score, NOT_AVAILABLE);
        assert_eq!(view.rule.flags, vec![NO_FLAGS]);
        assert_eq!(view.rule.summary, NO_SUMMARY);
        match view.ai {
            AiPanel::Analysis {
                risk_level,
                recommendations,
                ..
            } => {
                assert_eq!(risk_level, NOT_AVAILABLE);
                assert_eq!(recommendations, vec![NO_RECOMMENDATIONS]);
            }
            AiPanel::Error { .. } => panic!("no error was stored"),
        }
    }

    #[test]
    fn partial_record_keeps_present_fields() {
        let record = StoredRecord::from_value(json!({
            "clauseText": "Tenant shall indemnify Landlord.",
            "ruleBased": { "clauseType": "Indemnification", "riskScore": "4" },
            "aiBased": { "summary": "One-way indemnity.", "recommendations": ["Make it mutual"] }
        }))
        .unwrap();

        let view = DetailView::from_record("x", &record);
        assert_eq!(view.rule.clause_type, "Indemnification");
        assert_eq!(view.rule.risk_score, "4/10");
        assert_eq!(view.rule.summary, NO_SUMMARY);
        assert_eq!(
            view.ai,
            AiPanel::Analysis {
                clause_type: NOT_AVAILABLE.into(),
                risk_level: NOT_AVAILABLE.into(),
                key_terms: NOT_AVAILABLE.into(),
                summary: "One-way indemnity.".into(),
                recommendations: vec!["Make it mutual".into()],
            }
        );
    }

    #[test]
    fn stored_ai_error_renders_error_panel_only() {
        let record = StoredRecord::from_value(json!({
            "aiBased": { "error": "AI service not configured", "summary": "ignored" }
        }))
        .unwrap();
        let view = DetailView::from_record("x", &record);
        assert_eq!(
            view.ai,
            AiPanel::Error {
                message: "AI service not configured".into()
            }
        );
    }

    #[test]
    fn report_lists_both_columns() {
        let record = StoredRecord::from_value(json!({
            "ruleBased": { "clauseType": "Termination", "riskScore": 2, "flags": ["One-sided language detected"] },
            "aiBased": { "error": "AI service not configured" }
        }))
        .unwrap();
        let report = DetailView::from_record("20250115_100000", &record).to_report();
        assert!(report.starts_with("Clause Analysis Report: 20250115_100000\n"));
        assert!(report.contains("  Risk score:  2/10\n"));
        assert!(report.contains("    - One-sided language detected\n"));
        assert!(report.contains("  Error: AI service not configured\n"));
    }

    #[test]
    fn blank_flags_count_as_none() {
        let rule = RuleAnalysis {
            clause_type: "Termination".into(),
            risk_score: 0,
            flags: vec!["  ".into()],
            summary: String::new(),
        };
        let panel = rule_panel(&rule);
        assert_eq!(panel.risk_score, "0/10");
        assert_eq!(panel.flags, vec![NO_FLAGS]);
        assert_eq!(panel.summary, NO_SUMMARY);
    }
}
