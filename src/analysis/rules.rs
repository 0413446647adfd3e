//! Deterministic rule engine.
//!
//! Scores a clause from keyword presence alone:
//!
//! | Signal                                   | Points |
//! |------------------------------------------|--------|
//! | each high-risk term present              | +2     |
//! | more than two one-sided indicators       | +3     |
//! | no protective language at all            | +2     |
//!
//! The total is capped at 10. Matching is case-insensitive substring
//! matching, so `"end"` also fires inside `"amendment"`.

use super::RuleAnalysis;

/// Clause types in detection order; the first type with any keyword wins.
const CLAUSE_KEYWORDS: &[(&str, &[&str])] = &[
    ("Limitation of Liability", &["liability", "limit", "damages"]),
    ("Indemnification", &["indemnify", "hold harmless", "defend"]),
    ("Termination", &["terminate", "expire", "end"]),
];

const HIGH_RISK_TERMS: &[&str] = &[
    "unlimited",
    "capless",
    "no limit",
    "full liability",
    "gross negligence",
    "willful misconduct",
];

const ONE_SIDED_INDICATORS: &[&str] = &["shall", "must", "will", "agrees to", "obligated to"];

const PROTECTIVE_LANGUAGE: &[&str] = &["mutual", "reasonable", "fair", "reciprocal", "limited to"];

const MAX_SCORE: u8 = 10;

pub const FLAG_HIGH_RISK: &str = "Contains high-risk terms";
pub const FLAG_ONE_SIDED: &str = "One-sided language detected";
pub const FLAG_NO_PROTECTION: &str = "Missing protective language";

/// Run the rule engine over one clause.
pub fn analyze(clause: &str) -> RuleAnalysis {
    let signals = Signals::scan(clause);
    let clause_type = detect_clause_type(clause).to_string();
    let risk_score = signals.score();
    let flags = signals.flags();
    let summary = summarize(&clause_type, risk_score, &flags);

    RuleAnalysis {
        clause_type,
        risk_score,
        flags,
        summary,
    }
}

/// Detect the clause type by keyword, `"Unknown"` when nothing matches.
pub fn detect_clause_type(clause: &str) -> &'static str {
    let lower = clause.to_lowercase();
    CLAUSE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(name, _)| *name)
        .unwrap_or("Unknown")
}

/// Keyword counts behind both the score and the flags.
struct Signals {
    high_risk_terms: usize,
    one_sided: usize,
    protective: usize,
}

impl Signals {
    fn scan(clause: &str) -> Self {
        let lower = clause.to_lowercase();
        let count = |terms: &[&str]| terms.iter().filter(|t| lower.contains(*t)).count();
        Self {
            high_risk_terms: count(HIGH_RISK_TERMS),
            one_sided: count(ONE_SIDED_INDICATORS),
            protective: count(PROTECTIVE_LANGUAGE),
        }
    }

    fn is_one_sided(&self) -> bool {
        self.one_sided > 2
    }

    fn lacks_protection(&self) -> bool {
        self.protective == 0
    }

    fn score(&self) -> u8 {
        let mut score = 2 * self.high_risk_terms;
        if self.is_one_sided() {
            score += 3;
        }
        if self.lacks_protection() {
            score += 2;
        }
        score.min(usize::from(MAX_SCORE)) as u8
    }

    fn flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.high_risk_terms > 0 {
            flags.push(FLAG_HIGH_RISK.to_string());
        }
        if self.is_one_sided() {
            flags.push(FLAG_ONE_SIDED.to_string());
        }
        if self.lacks_protection() {
            flags.push(FLAG_NO_PROTECTION.to_string());
        }
        flags
    }
}

fn summarize(clause_type: &str, risk_score: u8, flags: &[String]) -> String {
    let mut summary = format!("Clause type: {clause_type}. Risk score: {risk_score}/10.");
    if flags.is_empty() {
        summary.push_str(" No flags raised.");
    } else {
        summary.push_str(&format!(" Flags: {}.", flags.join(", ")));
    }
    summary
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_clause_types_in_order() {
        assert_eq!(
            detect_clause_type("Damages shall not exceed fees paid."),
            "Limitation of Liability"
        );
        assert_eq!(
            detect_clause_type("Vendor will indemnify Customer."),
            "Indemnification"
        );
        assert_eq!(
            detect_clause_type("Either party may terminate on notice."),
            "Termination"
        );
        assert_eq!(detect_clause_type("Payment is due monthly."), "Unknown");
    }

    #[test]
    fn liability_keyword_beats_indemnity_keyword() {
        // Both families match; the first in detection order wins.
        assert_eq!(
            detect_clause_type("Supplier shall indemnify and accept liability."),
            "Limitation of Liability"
        );
    }

    #[test]
    fn plain_clause_only_misses_protection() {
        let result = analyze("This clause limits liability to $100.");
        assert_eq!(result.clause_type, "Limitation of Liability");
        assert_eq!(result.risk_score, 2);
        assert_eq!(result.flags, vec![FLAG_NO_PROTECTION.to_string()]);
        assert_eq!(
            result.summary,
            "Clause type: Limitation of Liability. Risk score: 2/10. Flags: Missing protective language."
        );
    }

    #[test]
    fn protective_language_clears_all_flags() {
        let result = analyze("Liability is limited to fees under a mutual cap.");
        assert_eq!(result.risk_score, 0);
        assert!(result.flags.is_empty());
        assert!(result.summary.ends_with("No flags raised."));
    }

    #[test]
    fn one_sided_high_risk_clause_scores_and_flags_everything() {
        let clause = "Customer shall and must accept unlimited, full liability and \
                      agrees to cover gross negligence.";
        let result = analyze(clause);
        // 3 high-risk terms (6) + one-sided (3) + no protection (2) = 11, capped.
        assert_eq!(result.risk_score, 10);
        assert_eq!(
            result.flags,
            vec![
                FLAG_HIGH_RISK.to_string(),
                FLAG_ONE_SIDED.to_string(),
                FLAG_NO_PROTECTION.to_string()
            ]
        );
    }

    #[test]
    fn exactly_two_one_sided_indicators_is_not_one_sided() {
        let result = analyze("Tenant shall pay and must maintain a reasonable reserve.");
        assert!(!result.flags.contains(&FLAG_ONE_SIDED.to_string()));
    }
}
