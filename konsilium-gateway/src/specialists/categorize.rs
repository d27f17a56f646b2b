//! Keyword-based question categorization.
//!
//! Each specialist supplies an ordered rule table; the first rule whose
//! keyword set matches wins, and no match falls back to the generic header.

pub const DIAGNOSIS_HEADER: &str = "📋 **Diagnostic Information**";
pub const TREATMENT_HEADER: &str = "💊 **Treatment Information**";
pub const PREVENTION_HEADER: &str = "🛡️ **Prevention & Risk Factors**";
pub const BPH_HEADER: &str = "🏥 **Benign Prostatic Hyperplasia**";
pub const GENERIC_HEADER: &str = "🏥 **Medical Information**";

/// One (category, keyword set) rule. Tables are evaluated top to bottom.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub header: &'static str,
    pub keywords: &'static [&'static str],
}

/// Pick the answer header for a question. Matching is case-insensitive
/// substring search over the question text.
pub fn categorize(question: &str, rules: &[CategoryRule]) -> &'static str {
    let lowered = question.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|rule| rule.header)
        .unwrap_or(GENERIC_HEADER)
}
