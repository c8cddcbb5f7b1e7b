//! Quality scoring for generated responses.
//!
//! Starts from 1.0 and subtracts a penalty per defect. Responses scoring
//! below the configured threshold are regenerated while the retry budget
//! lasts, then escalated.

use crate::ticket::SupportCategory;

const MIN_RESPONSE_LEN: usize = 20;
const MAX_RESPONSE_LEN: usize = 1000;

const LENGTH_PENALTY: f64 = 0.3;
const BOILERPLATE_PENALTY: f64 = 0.25;
const CATEGORY_MISMATCH_PENALTY: f64 = 0.25;

/// Stock filler that signals a canned non-answer.
const BOILERPLATE_PHRASES: &[&str] = &[
    "we value your business",
    "your call is important to us",
    "as an ai",
    "i cannot help with that",
    "lorem ipsum",
];

/// Terms a response for each category is expected to touch on.
fn category_terms(category: SupportCategory) -> &'static [&'static str] {
    match category {
        SupportCategory::Billing => &[
            "billing", "payment", "invoice", "account", "refund", "subscription", "plan", "charge",
        ],
        SupportCategory::Technical => &[
            "technical", "troubleshoot", "error", "issue", "server", "restart", "steps", "logs",
        ],
        SupportCategory::General => &["help", "question", "information", "guide", "support"],
    }
}

/// Score breakdown for one response.
#[derive(Debug, Clone)]
pub struct QualityReport {
    pub score: f64,
    pub penalties: Vec<String>,
}

impl QualityReport {
    pub fn passes(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}

/// Score a generated response against its category.
pub fn score(response: &str, category: SupportCategory) -> QualityReport {
    let mut score = 1.0;
    let mut penalties = Vec::new();
    let lower = response.to_lowercase();
    let len = response.chars().count();

    if len < MIN_RESPONSE_LEN || len > MAX_RESPONSE_LEN {
        score -= LENGTH_PENALTY;
        penalties.push(format!("response length {len} outside bounds"));
    }

    for phrase in BOILERPLATE_PHRASES {
        if lower.contains(phrase) {
            score -= BOILERPLATE_PENALTY;
            penalties.push(format!("boilerplate phrase: {phrase}"));
        }
    }

    if !category_terms(category).iter().any(|t| lower.contains(t)) {
        score -= CATEGORY_MISMATCH_PENALTY;
        penalties.push(format!("no {category} terms in response"));
    }

    QualityReport {
        score: score.max(0.0),
        penalties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_good_billing_response_passes() {
        let report = score(
            "You can cancel your subscription from the billing section of your account dashboard.",
            SupportCategory::Billing,
        );
        assert_eq!(report.score, 1.0);
        assert!(report.passes(0.6));
        assert!(report.penalties.is_empty());
    }

    #[test]
    fn test_short_response_penalized() {
        let report = score("Check the docs.", SupportCategory::General);
        assert!(report.score < 1.0);
        assert!(!report.penalties.is_empty());
    }

    #[test]
    fn test_boilerplate_penalized() {
        let report = score(
            "We value your business and your call is important to us, regarding billing.",
            SupportCategory::Billing,
        );
        // Two boilerplate phrases stack
        assert!(report.score <= 0.5);
        assert!(!report.passes(0.6));
    }

    #[test]
    fn test_category_mismatch_penalized() {
        let report = score(
            "The weather is lovely today and the office opens at nine in the morning.",
            SupportCategory::Technical,
        );
        assert!(report.score < 1.0);
        assert!(report
            .penalties
            .iter()
            .any(|p| p.contains("technical terms")));
    }

    #[test]
    fn test_score_never_negative() {
        let junk = "as an ai we value your business lorem ipsum";
        let report = score(junk, SupportCategory::Technical);
        assert!(report.score >= 0.0);
    }
}
