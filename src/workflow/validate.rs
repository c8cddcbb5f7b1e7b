//! Input validation and manual-escalation keyword detection.

/// Length bounds on the trimmed question text.
pub const MIN_QUESTION_LEN: usize = 3;
pub const MAX_QUESTION_LEN: usize = 1000;

/// Phrases that request a human outright, threaten legal action, or demand
/// an urgent cancellation. Any match escalates before classification runs.
const MANUAL_ESCALATION_PHRASES: &[&str] = &[
    "speak to a human",
    "talk to a human",
    "human agent",
    "real person",
    "speak to a manager",
    "talk to a manager",
    "get me a manager",
    "speak to a supervisor",
    "talk to your supervisor",
    "lawyer",
    "legal action",
    "sue you",
    "attorney",
    "cancel immediately",
    "cancel right now",
];

/// Terms that raise an already-escalated ticket to urgent.
const URGENCY_TERMS: &[&str] = &[
    "urgent",
    "emergency",
    "critical",
    "immediately",
    "asap",
    "right now",
    "production",
    "outage",
];

/// Why a question was rejected before any processing happened.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("question is empty")]
    Empty,

    #[error("question must be at least {MIN_QUESTION_LEN} characters")]
    TooShort,

    #[error("question must be no more than {MAX_QUESTION_LEN} characters")]
    TooLong,

    #[error("question is mostly non-text characters")]
    TooManySymbols,
}

/// Trim, strip control characters, collapse internal whitespace, and enforce
/// the length and character-distribution bounds. Returns the cleaned text.
pub fn validate_question(raw: &str) -> Result<String, ValidationError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() {
        return Err(ValidationError::Empty);
    }
    let len = cleaned.chars().count();
    if len < MIN_QUESTION_LEN {
        return Err(ValidationError::TooShort);
    }
    if len > MAX_QUESTION_LEN {
        return Err(ValidationError::TooLong);
    }

    // Reject input that is mostly punctuation/symbols.
    let textual = cleaned
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .count();
    if (textual as f64) < (len as f64) * 0.5 {
        return Err(ValidationError::TooManySymbols);
    }

    Ok(cleaned)
}

/// Whether the question explicitly requests human handling.
pub fn requests_human(question: &str) -> bool {
    let lower = question.to_lowercase();
    MANUAL_ESCALATION_PHRASES.iter().any(|p| lower.contains(p))
}

/// Whether the question carries urgency cues.
pub fn is_urgent(question: &str) -> bool {
    let lower = question.to_lowercase();
    URGENCY_TERMS.iter().any(|t| lower.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_question_is_cleaned() {
        let out = validate_question("  How do I   reset\tmy password? ").unwrap();
        assert_eq!(out, "How do I reset my password?");
    }

    #[test]
    fn test_empty_and_short_rejected() {
        assert_eq!(validate_question("   "), Err(ValidationError::Empty));
        assert_eq!(validate_question("hi"), Err(ValidationError::TooShort));
    }

    #[test]
    fn test_too_long_rejected() {
        let long = "a".repeat(MAX_QUESTION_LEN + 1);
        assert_eq!(validate_question(&long), Err(ValidationError::TooLong));
    }

    #[test]
    fn test_control_characters_stripped() {
        let out = validate_question("hello\u{0000}\u{0007} world").unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn test_symbol_soup_rejected() {
        assert_eq!(
            validate_question("!!!###$$$%%%^^^&&&***((()))"),
            Err(ValidationError::TooManySymbols)
        );
    }

    #[test]
    fn test_manual_escalation_phrases() {
        assert!(requests_human("I want to SPEAK TO A MANAGER about this"));
        assert!(requests_human("get me a manager now"));
        assert!(requests_human("I will take legal action"));
        assert!(!requests_human("How do I cancel my subscription?"));
    }

    #[test]
    fn test_urgency_terms() {
        assert!(is_urgent("production is down, this is URGENT"));
        assert!(!is_urgent("how do invoices work?"));
    }
}
