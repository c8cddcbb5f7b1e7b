//! Lightweight lexical sentiment scoring.
//!
//! Counts negative versus positive terms; no model calls. Enough signal to
//! prioritize clearly unhappy customers, nothing more.

use crate::ticket::Sentiment;

const NEGATIVE_TERMS: &[&str] = &[
    "angry",
    "furious",
    "unacceptable",
    "terrible",
    "awful",
    "horrible",
    "worst",
    "useless",
    "broken",
    "frustrated",
    "frustrating",
    "disappointed",
    "disappointing",
    "ridiculous",
    "unhappy",
    "hate",
    "garbage",
    "scam",
];

const POSITIVE_TERMS: &[&str] = &[
    "thanks",
    "thank you",
    "great",
    "love",
    "awesome",
    "excellent",
    "happy",
    "appreciate",
    "wonderful",
    "perfect",
];

/// Outcome of scoring one question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentReport {
    pub sentiment: Sentiment,
    pub negative_hits: usize,
    pub positive_hits: usize,
}

impl SentimentReport {
    /// Whether the tone is hostile enough to escalate: at least two negative
    /// terms, and more negative than positive.
    pub fn is_hostile(&self) -> bool {
        self.negative_hits >= 2 && self.negative_hits > self.positive_hits
    }
}

/// Score a question by counting lexicon matches.
pub fn analyze(question: &str) -> SentimentReport {
    let lower = question.to_lowercase();
    let negative_hits = NEGATIVE_TERMS.iter().filter(|t| lower.contains(*t)).count();
    let positive_hits = POSITIVE_TERMS.iter().filter(|t| lower.contains(*t)).count();

    let sentiment = if negative_hits > positive_hits {
        Sentiment::Negative
    } else if positive_hits > negative_hits {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    };

    SentimentReport {
        sentiment,
        negative_hits,
        positive_hits,
    }
}
