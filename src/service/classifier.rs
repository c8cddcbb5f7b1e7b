//! Deterministic keyword classifier.
//!
//! Scores a question against per-category keyword sets with category weights,
//! then derives confidence from the margin between the best and second-best
//! score. No network calls, no model downloads; the classification port can
//! be swapped for a real service without touching the workflow.

use async_trait::async_trait;

use crate::ports::{Classifier, ClassifyError};
use crate::ticket::{Classification, SupportCategory};

const BILLING_KEYWORDS: &[&str] = &[
    "billing", "payment", "invoice", "charge", "charged", "subscription", "refund", "cancel",
    "upgrade", "downgrade", "plan", "pricing", "cost", "fee", "balance", "credit", "card",
    "receipt", "transaction", "price", "expensive", "trial",
];

const TECHNICAL_KEYWORDS: &[&str] = &[
    "server", "down", "error", "bug", "crash", "crashed", "slow", "performance", "login",
    "password", "api", "integration", "configuration", "setup", "install", "update",
    "troubleshoot", "connection", "timeout", "database", "ssl", "certificate", "backup",
    "restore", "deploy", "code", "website", "app", "application", "network", "broken",
];

const GENERAL_KEYWORDS: &[&str] = &[
    "feature", "documentation", "tutorial", "guide", "help", "support", "contact", "hours",
    "available", "information", "about", "demo", "learn", "explain", "understand", "know",
    "tell", "show", "example", "how", "what", "when", "where", "why",
];

const KEYWORD_BASE_SCORE: f64 = 2.0;
const BILLING_WEIGHT: f64 = 1.0;
const TECHNICAL_WEIGHT: f64 = 1.2;
const GENERAL_WEIGHT: f64 = 0.8;

/// Confidence when nothing matched and the question defaults to general.
const DEFAULT_CONFIDENCE: f64 = 0.5;
const MAX_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    fn score(question: &str) -> Classification {
        let tokens: Vec<String> = question
            .to_lowercase()
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let count = |keywords: &[&str]| -> f64 {
            tokens.iter().filter(|t| keywords.contains(&t.as_str())).count() as f64
        };

        let mut scores = [
            (SupportCategory::Billing, count(BILLING_KEYWORDS) * KEYWORD_BASE_SCORE * BILLING_WEIGHT),
            (SupportCategory::Technical, count(TECHNICAL_KEYWORDS) * KEYWORD_BASE_SCORE * TECHNICAL_WEIGHT),
            (SupportCategory::General, count(GENERAL_KEYWORDS) * KEYWORD_BASE_SCORE * GENERAL_WEIGHT),
        ];
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let (top_category, top) = scores[0];
        let (_, second) = scores[1];

        if top == 0.0 {
            return Classification::new(SupportCategory::General, DEFAULT_CONFIDENCE);
        }

        // Confidence grows with the margin over the runner-up category.
        let confidence = 0.5 + 0.5 * (top - second) / top;
        Classification::new(top_category, confidence.min(MAX_CONFIDENCE))
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, question: &str) -> Result<Classification, ClassifyError> {
        Ok(Self::score(question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_billing_question_is_confident() {
        let c = KeywordClassifier::new();
        let result = c.classify("How do I cancel my subscription?").await.unwrap();
        assert_eq!(result.category, SupportCategory::Billing);
        assert!(result.confidence >= 0.75, "confidence {}", result.confidence);
    }

    #[tokio::test]
    async fn test_technical_question() {
        let c = KeywordClassifier::new();
        let result = c
            .classify("the server is down and I keep getting a timeout error")
            .await
            .unwrap();
        assert_eq!(result.category, SupportCategory::Technical);
        assert!(result.confidence > 0.75);
    }

    #[tokio::test]
    async fn test_unmatched_question_defaults_to_general() {
        let c = KeywordClassifier::new();
        let result = c.classify("zzz qqq xyzzy").await.unwrap();
        assert_eq!(result.category, SupportCategory::General);
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_mixed_question_has_lower_confidence() {
        let c = KeywordClassifier::new();
        // Billing and technical terms pull in different directions
        let result = c
            .classify("payment error on the website subscription crash")
            .await
            .unwrap();
        assert!(result.confidence < 0.95);
    }

    #[test]
    fn test_punctuation_is_ignored() {
        let result = KeywordClassifier::score("Refund!!! my payment???");
        assert_eq!(result.category, SupportCategory::Billing);
    }
}
