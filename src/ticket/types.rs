//! Core enums and value types shared across the workflow, pool, and cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Support categories a question can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportCategory {
    Billing,
    Technical,
    General,
}

impl SupportCategory {
    /// Department a category escalates to when a human takes over.
    pub fn suggested_department(&self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Technical => "engineering",
            Self::General => "customer_success",
        }
    }

    /// Stock follow-up actions attached to a generated answer.
    pub fn suggested_actions(&self) -> &'static [&'static str] {
        match self {
            Self::Billing => &[
                "Review your invoices in the billing dashboard",
                "Contact the billing team for plan changes or refunds",
            ],
            Self::Technical => &[
                "Check the service status page",
                "Share the exact error message if the issue persists",
            ],
            Self::General => &[
                "Browse the help center for step-by-step guides",
                "Reply with more detail if you need further help",
            ],
        }
    }
}

impl std::fmt::Display for SupportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Billing => write!(f, "billing"),
            Self::Technical => write!(f, "technical"),
            Self::General => write!(f, "general"),
        }
    }
}

/// Ticket priority. Ordering matters: a ticket's priority is only ever raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Rough urgency score used when a ticket is handed to a human.
    pub fn urgency_score(&self) -> f64 {
        match self {
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 0.75,
            Self::Urgent => 1.0,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

/// Lifecycle status of a ticket. Forward progress is monotonic except that
/// `Escalated` and `Failed` are absorbing states reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    Classified,
    Routed,
    Processing,
    Escalated,
    Resolved,
    Failed,
}

impl TicketStatus {
    /// Whether no further stage should mutate the ticket.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Escalated | Self::Resolved | Self::Failed)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Classified => write!(f, "classified"),
            Self::Routed => write!(f, "routed"),
            Self::Processing => write!(f, "processing"),
            Self::Escalated => write!(f, "escalated"),
            Self::Resolved => write!(f, "resolved"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Why a ticket was marked for human handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    LowConfidence,
    ComplexIssue,
    SentimentNegative,
    ManualRequest,
    TechnicalLimitation,
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowConfidence => write!(f, "low_confidence"),
            Self::ComplexIssue => write!(f, "complex_issue"),
            Self::SentimentNegative => write!(f, "sentiment_negative"),
            Self::ManualRequest => write!(f, "manual_request"),
            Self::TechnicalLimitation => write!(f, "technical_limitation"),
        }
    }
}

/// Result delivered by the classification port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub category: SupportCategory,
    /// Confidence in [0, 1]. Clamped on construction.
    pub confidence: f64,
}

impl Classification {
    pub fn new(category: SupportCategory, confidence: f64) -> Self {
        Self {
            category,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Details attached to a ticket when escalation triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationInfo {
    pub reason: EscalationReason,
    pub suggested_department: String,
    pub human_required: bool,
    pub urgency_score: f64,
}

/// Final answer attached to a ticket, whatever path produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportResponse {
    pub message: String,
    pub category: SupportCategory,
    pub suggested_actions: Vec<String>,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl SupportResponse {
    pub fn new(message: impl Into<String>, category: SupportCategory, confidence: f64) -> Self {
        Self {
            message: message.into(),
            category,
            suggested_actions: Vec::new(),
            confidence: confidence.clamp(0.0, 1.0),
            created_at: Utc::now(),
        }
    }

    pub fn with_actions(mut self, actions: &[&str]) -> Self {
        self.suggested_actions = actions.iter().map(|a| a.to_string()).collect();
        self
    }
}

/// Per-ticket timing and call counters, populated by the workflow stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    pub classification_time_ms: f64,
    pub routing_time_ms: f64,
    pub response_generation_time_ms: f64,
    pub total_processing_time_ms: f64,
    pub api_calls_made: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Urgent);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TicketStatus::Resolved.is_terminal());
        assert!(TicketStatus::Escalated.is_terminal());
        assert!(TicketStatus::Failed.is_terminal());
        assert!(!TicketStatus::Processing.is_terminal());
        assert!(!TicketStatus::New.is_terminal());
    }

    #[test]
    fn test_classification_clamps_confidence() {
        assert_eq!(Classification::new(SupportCategory::Billing, 1.4).confidence, 1.0);
        assert_eq!(Classification::new(SupportCategory::Billing, -0.1).confidence, 0.0);
    }

    #[test]
    fn test_category_departments() {
        assert_eq!(SupportCategory::Billing.suggested_department(), "billing");
        assert_eq!(SupportCategory::Technical.suggested_department(), "engineering");
        assert_eq!(SupportCategory::General.suggested_department(), "customer_success");
    }

    #[test]
    fn test_enum_serde_snake_case() {
        let json = serde_json::to_string(&TicketStatus::Escalated).unwrap();
        assert_eq!(json, "\"escalated\"");
        let reason: EscalationReason = serde_json::from_str("\"manual_request\"").unwrap();
        assert_eq!(reason, EscalationReason::ManualRequest);
    }
}
