//! Ticket — one question's full processing record, state, and outcome.

mod context;
mod types;

pub use context::{ContextEntry, ConversationContext, CustomerTier, Sentiment};
pub use types::{
    Classification, EscalationInfo, EscalationReason, Priority, ProcessingMetrics,
    SupportCategory, SupportResponse, TicketStatus,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The unit of work flowing through the workflow state machine.
///
/// A ticket is created at the start of one workflow execution, mutated only
/// by that execution's stage functions, and handed back to the caller in a
/// terminal state with a response always attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub question_text: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub classification: Option<Classification>,
    pub requires_escalation: bool,
    pub escalation_info: Option<EscalationInfo>,
    pub response: Option<SupportResponse>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metrics: ProcessingMetrics,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(question_text: impl Into<String>, max_retries: u32) -> Self {
        Self {
            ticket_id: Uuid::new_v4().to_string(),
            question_text: question_text.into(),
            status: TicketStatus::New,
            priority: Priority::Medium,
            classification: None,
            requires_escalation: false,
            escalation_info: None,
            response: None,
            retry_count: 0,
            max_retries,
            errors: Vec::new(),
            warnings: Vec::new(),
            metrics: ProcessingMetrics::default(),
            created_at: Utc::now(),
        }
    }

    /// Raise the priority. Priorities never go down within a ticket lifecycle.
    pub fn raise_priority(&mut self, priority: Priority) {
        if priority > self.priority {
            self.priority = priority;
        }
    }

    /// Latch the escalation flag and record why, if no reason was recorded
    /// yet. Once set, `requires_escalation` is never cleared and the first
    /// recorded reason wins.
    pub fn mark_for_escalation(&mut self, reason: EscalationReason) {
        self.requires_escalation = true;
        if self.escalation_info.is_none() {
            let department = self
                .classification
                .as_ref()
                .map(|c| c.category.suggested_department())
                .unwrap_or("customer_success");
            self.escalation_info = Some(EscalationInfo {
                reason,
                suggested_department: department.to_string(),
                human_required: true,
                urgency_score: self.priority.urgency_score(),
            });
        }
    }

    /// Whether another classification or generation attempt is allowed.
    pub fn retries_remaining(&self) -> bool {
        self.retry_count < self.max_retries
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn record_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Category if classified, general otherwise. Used by fallback paths that
    /// must answer even when classification never happened.
    pub fn category_or_general(&self) -> SupportCategory {
        self.classification
            .as_ref()
            .map(|c| c.category)
            .unwrap_or(SupportCategory::General)
    }

    /// One-line summary for session history and logs.
    pub fn summary(&self) -> String {
        format!(
            "ticket={} status={} priority={} category={} escalated={}",
            self.ticket_id,
            self.status,
            self.priority,
            self.classification
                .as_ref()
                .map(|c| c.category.to_string())
                .unwrap_or_else(|| "unclassified".to_string()),
            self.requires_escalation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket_defaults() {
        let ticket = Ticket::new("my server is down", 3);
        assert_eq!(ticket.status, TicketStatus::New);
        assert_eq!(ticket.priority, Priority::Medium);
        assert_eq!(ticket.retry_count, 0);
        assert!(!ticket.requires_escalation);
        assert!(ticket.response.is_none());
        assert!(!ticket.ticket_id.is_empty());
    }

    #[test]
    fn test_priority_only_raises() {
        let mut ticket = Ticket::new("q", 3);
        ticket.raise_priority(Priority::High);
        assert_eq!(ticket.priority, Priority::High);
        ticket.raise_priority(Priority::Low);
        assert_eq!(ticket.priority, Priority::High);
        ticket.raise_priority(Priority::Urgent);
        assert_eq!(ticket.priority, Priority::Urgent);
    }

    #[test]
    fn test_escalation_latches_first_reason() {
        let mut ticket = Ticket::new("q", 3);
        ticket.mark_for_escalation(EscalationReason::ManualRequest);
        ticket.mark_for_escalation(EscalationReason::SentimentNegative);
        assert!(ticket.requires_escalation);
        assert_eq!(
            ticket.escalation_info.as_ref().unwrap().reason,
            EscalationReason::ManualRequest
        );
    }

    #[test]
    fn test_escalation_department_follows_classification() {
        let mut ticket = Ticket::new("q", 3);
        ticket.classification = Some(Classification::new(SupportCategory::Billing, 0.9));
        ticket.mark_for_escalation(EscalationReason::LowConfidence);
        assert_eq!(
            ticket.escalation_info.as_ref().unwrap().suggested_department,
            "billing"
        );
    }

    #[test]
    fn test_retry_budget() {
        let mut ticket = Ticket::new("q", 2);
        assert!(ticket.retries_remaining());
        ticket.retry_count = 2;
        assert!(!ticket.retries_remaining());
    }
}
