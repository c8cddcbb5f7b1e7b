//! End-to-end workflow scenarios: happy path, hostile escalation, service
//! failure, tier-adjusted confidence gating, and quality-driven regeneration.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use ticket_triage::{
    Classification, Classifier, ClassifyError, ConversationContext, CustomerTier, EscalationReason,
    GenerateError, Generator, KeywordClassifier, Priority, SupportCategory, TemplateGenerator,
    TicketStatus, TicketWorkflow, WorkflowConfig,
};

/// Classifier that always reports the service as unavailable.
struct FailingClassifier {
    calls: AtomicU32,
}

impl FailingClassifier {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _question: &str) -> Result<Classification, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ClassifyError::Unavailable("connection refused".into()))
    }
}

/// Classifier pinned to one category and confidence.
struct FixedClassifier {
    category: SupportCategory,
    confidence: f64,
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _question: &str) -> Result<Classification, ClassifyError> {
        Ok(Classification::new(self.category, self.confidence))
    }
}

/// Generator whose first answer is junk and whose second is usable.
struct FlakyGenerator {
    calls: AtomicU32,
}

impl FlakyGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Generator for FlakyGenerator {
    async fn generate(
        &self,
        _question: &str,
        _category: SupportCategory,
        _context: &ConversationContext,
    ) -> Result<String, GenerateError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            Ok("as an ai".to_string())
        } else {
            Ok("Happy to help with your question. You'll find a step-by-step guide in our \
                help center with more detailed information."
                .to_string())
        }
    }
}

fn default_workflow() -> TicketWorkflow<KeywordClassifier, TemplateGenerator> {
    TicketWorkflow::new(
        KeywordClassifier::new(),
        TemplateGenerator::new(),
        WorkflowConfig::default(),
    )
}

#[tokio::test]
async fn test_billing_question_resolves_without_escalation() {
    let workflow = default_workflow();
    let mut context = ConversationContext::new();

    let ticket = workflow
        .process("How do I cancel my subscription?", &mut context)
        .await;

    assert_eq!(ticket.status, TicketStatus::Resolved);
    assert!(!ticket.requires_escalation);
    let classification = ticket.classification.as_ref().unwrap();
    assert_eq!(classification.category, SupportCategory::Billing);
    assert!(classification.confidence >= 0.75);
    let response = ticket.response.as_ref().unwrap();
    assert!(!response.message.is_empty());
    assert!(!response.suggested_actions.is_empty());
    assert_eq!(context.exchange_count(), 1);
}

#[tokio::test]
async fn test_hostile_manager_request_escalates_high_priority() {
    let workflow = default_workflow();
    let mut context = ConversationContext::new();

    let ticket = workflow
        .process(
            "This is unacceptable and I am furious, I want to speak to a manager.",
            &mut context,
        )
        .await;

    assert_eq!(ticket.status, TicketStatus::Escalated);
    assert!(ticket.requires_escalation);
    assert_eq!(ticket.priority, Priority::High);
    let info = ticket.escalation_info.as_ref().unwrap();
    // The explicit human request is detected before sentiment and wins
    assert_eq!(info.reason, EscalationReason::ManualRequest);
    assert!(info.human_required);
    let response = ticket.response.as_ref().unwrap();
    assert!(response.message.contains(&ticket.ticket_id));
}

#[tokio::test]
async fn test_classifier_outage_exhausts_retries_and_fails() {
    let workflow = TicketWorkflow::new(
        FailingClassifier::new(),
        TemplateGenerator::new(),
        WorkflowConfig::default(),
    );
    let mut context = ConversationContext::new();

    let ticket = workflow
        .process("why was I charged twice this month?", &mut context)
        .await;

    assert_eq!(ticket.status, TicketStatus::Failed);
    assert_eq!(ticket.retry_count, 3);
    assert_eq!(ticket.errors.len(), 3);
    // The fallback apology still references the ticket
    let response = ticket.response.as_ref().unwrap();
    assert!(response.message.contains(&ticket.ticket_id));
    assert_eq!(workflow.stats().tickets_failed, 1);
}

#[tokio::test]
async fn test_every_input_reaches_a_terminal_state_with_a_response() {
    let workflow = default_workflow();
    let inputs = [
        "How do I cancel my subscription?",
        "the server is down, production outage",
        "",
        "!!!###$$$",
        "hi",
        "I demand to talk to a human immediately",
    ];

    for input in inputs {
        let mut context = ConversationContext::new();
        let ticket = workflow.process(input, &mut context).await;
        assert!(ticket.status.is_terminal(), "input {input:?}: {}", ticket.status);
        assert!(ticket.response.is_some(), "input {input:?} got no response");
    }
}

#[tokio::test]
async fn test_low_confidence_escalates_for_standard_tier() {
    let workflow = TicketWorkflow::new(
        FixedClassifier {
            category: SupportCategory::General,
            confidence: 0.70,
        },
        TemplateGenerator::new(),
        WorkflowConfig::default(),
    );
    let mut context = ConversationContext::new();

    let ticket = workflow.process("something ambiguous", &mut context).await;

    assert_eq!(ticket.status, TicketStatus::Escalated);
    assert_eq!(
        ticket.escalation_info.as_ref().unwrap().reason,
        EscalationReason::LowConfidence
    );
}

#[tokio::test]
async fn test_enterprise_tier_relaxes_the_confidence_gate() {
    let workflow = TicketWorkflow::new(
        FixedClassifier {
            category: SupportCategory::General,
            confidence: 0.70,
        },
        TemplateGenerator::new(),
        WorkflowConfig::default(),
    );
    let mut context = ConversationContext::new().with_tier(CustomerTier::Enterprise);

    let ticket = workflow.process("something ambiguous", &mut context).await;

    // 0.70 clears the enterprise threshold of 0.75 * 0.9
    assert_eq!(ticket.status, TicketStatus::Resolved);
    assert!(!ticket.requires_escalation);
}

#[tokio::test]
async fn test_hostile_tone_alone_escalates_with_sentiment_reason() {
    let workflow = default_workflow();
    let mut context = ConversationContext::new();

    let ticket = workflow
        .process(
            "this product is awful, terrible and completely useless",
            &mut context,
        )
        .await;

    assert_eq!(ticket.status, TicketStatus::Escalated);
    assert_eq!(ticket.priority, Priority::High);
    // Sentiment fired first; a later low-confidence trigger must not
    // overwrite the recorded reason
    assert_eq!(
        ticket.escalation_info.as_ref().unwrap().reason,
        EscalationReason::SentimentNegative
    );
}

#[tokio::test]
async fn test_low_quality_response_is_regenerated() {
    let workflow = TicketWorkflow::new(
        FixedClassifier {
            category: SupportCategory::General,
            confidence: 0.9,
        },
        FlakyGenerator::new(),
        WorkflowConfig::default(),
    );
    let mut context = ConversationContext::new();

    let ticket = workflow
        .process("where can I find the documentation?", &mut context)
        .await;

    assert_eq!(ticket.status, TicketStatus::Resolved);
    assert_eq!(ticket.retry_count, 1);
    assert!(ticket.warnings.iter().any(|w| w.starts_with("quality:")));
    let response = ticket.response.as_ref().unwrap();
    assert!(response.message.contains("help center"));
}

#[tokio::test]
async fn test_session_history_accumulates_across_tickets() {
    let workflow = default_workflow();
    let mut context = ConversationContext::new().with_user("user-42");

    workflow
        .process("How do I cancel my subscription?", &mut context)
        .await;
    workflow
        .process("the server is down with an error", &mut context)
        .await;

    assert_eq!(context.exchange_count(), 2);
    assert_eq!(context.history[0].category, Some(SupportCategory::Billing));
    assert_eq!(context.history[1].category, Some(SupportCategory::Technical));
    let stats = workflow.stats();
    assert_eq!(stats.tickets_processed, 2);
    assert!(stats.average_processing_time_ms() >= 0.0);
}
