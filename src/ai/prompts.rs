//! Prompt templates for the legal analysis request.
//!
//! The system message fixes the role; the user message carries the output
//! schema and the clause itself. The reply is expected to be a bare JSON
//! object with snake_case keys, parsed by [`super::validation`].

/// System role for every analysis request.
pub const SYSTEM_PROMPT: &str = "You are a legal expert.";

/// Longest clause excerpt embedded in a prompt, in characters.
const MAX_PROMPT_CLAUSE_CHARS: usize = 10_000;

const LEGAL_ANALYSIS_TEMPLATE: &str = "\
You are a legal expert analyzing contract clauses. For the given clause text, \
provide a structured JSON response with the following fields:

- clause_type: The type of clause (e.g., Limitation of Liability, Indemnification, Termination, Confidentiality, etc.)
- key_terms: A list of key legal terms or phrases found in the clause
- risk_level: A string indicating the risk level: \"Low\", \"Medium\", \"High\"
- summary: A brief summary of the clause's purpose and implications
- recommendations: A list of recommendations for improving or mitigating risks in the clause

Clause text: {clause_text}

Respond only with valid JSON, no additional text.";

/// Build the user message for one clause.
pub fn build_user_prompt(clause: &str) -> String {
    LEGAL_ANALYSIS_TEMPLATE.replace("{clause_text}", truncate_chars(clause, MAX_PROMPT_CLAUSE_CHARS))
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
