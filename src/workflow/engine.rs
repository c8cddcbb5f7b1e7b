//! The ticket workflow — an explicit finite-state machine.
//!
//! A fixed directed graph of stages drives one ticket from raw question to
//! final response. Retries are scoped to the two stages that call external
//! services (classification, generation) and draw from one shared budget.
//! The confidence gate runs before routing so low-confidence tickets never
//! reach category-specific generation. `process` never fails: every ticket
//! comes back in a terminal state with a response attached.

use std::sync::Mutex;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::WorkflowConfig;
use crate::ports::{Classifier, Generator};
use crate::ticket::{
    ContextEntry, ConversationContext, EscalationReason, Priority, SupportResponse, Ticket,
    TicketStatus,
};

use super::{quality, sentiment, validate};

/// Stages of the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Initialize,
    ValidateInput,
    AnalyzeSentiment,
    Classify,
    CheckConfidence,
    Route,
    GenerateResponse,
    QualityCheck,
    Escalate,
    Finalize,
    Error,
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Initialize => "initialize",
            Self::ValidateInput => "validate_input",
            Self::AnalyzeSentiment => "analyze_sentiment",
            Self::Classify => "classify",
            Self::CheckConfidence => "check_confidence",
            Self::Route => "route",
            Self::GenerateResponse => "generate_response",
            Self::QualityCheck => "quality_check",
            Self::Escalate => "escalate",
            Self::Finalize => "finalize",
            Self::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// Aggregate counters across all executions of one workflow instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowStats {
    pub tickets_processed: u64,
    pub tickets_escalated: u64,
    pub tickets_failed: u64,
    pub total_processing_time_ms: f64,
}

impl WorkflowStats {
    pub fn average_processing_time_ms(&self) -> f64 {
        if self.tickets_processed == 0 {
            0.0
        } else {
            self.total_processing_time_ms / self.tickets_processed as f64
        }
    }
}

/// Executes the stage graph over one ticket at a time.
///
/// The workflow itself holds no per-ticket state, so one instance is shared
/// across all pool workers.
pub struct TicketWorkflow<C, G> {
    classifier: C,
    generator: G,
    config: WorkflowConfig,
    stats: Mutex<WorkflowStats>,
}

impl<C: Classifier, G: Generator> TicketWorkflow<C, G> {
    pub fn new(classifier: C, generator: G, config: WorkflowConfig) -> Self {
        Self {
            classifier,
            generator,
            config,
            stats: Mutex::new(WorkflowStats::default()),
        }
    }

    /// Drive one question through the stage graph to a terminal state.
    ///
    /// The conversation context is borrowed for the duration of the call and
    /// receives a summary entry when the ticket finalizes.
    pub async fn process(&self, question: &str, context: &mut ConversationContext) -> Ticket {
        let started = Instant::now();
        let mut ticket = Ticket::new(question, self.config.max_retries);
        let mut stage = WorkflowStage::Initialize;

        loop {
            debug!(ticket_id = %ticket.ticket_id, stage = %stage, "entering stage");
            let next = self.run_stage(stage, &mut ticket, context, started).await;
            match next {
                Some(s) => stage = s,
                None => break,
            }
        }

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        {
            let mut stats = self.stats.lock().expect("workflow stats lock poisoned");
            stats.tickets_processed += 1;
            stats.total_processing_time_ms += elapsed_ms;
            match ticket.status {
                TicketStatus::Escalated => stats.tickets_escalated += 1,
                TicketStatus::Failed => stats.tickets_failed += 1,
                _ => {}
            }
        }

        info!(
            ticket_id = %ticket.ticket_id,
            status = %ticket.status,
            elapsed_ms,
            "ticket processed"
        );
        ticket
    }

    /// Snapshot of the aggregate counters.
    pub fn stats(&self) -> WorkflowStats {
        self.stats
            .lock()
            .expect("workflow stats lock poisoned")
            .clone()
    }

    /// Run one stage and return the next, or `None` once terminal work is done.
    async fn run_stage(
        &self,
        stage: WorkflowStage,
        ticket: &mut Ticket,
        context: &mut ConversationContext,
        started: Instant,
    ) -> Option<WorkflowStage> {
        match stage {
            WorkflowStage::Initialize => Some(WorkflowStage::ValidateInput),

            WorkflowStage::ValidateInput => match validate::validate_question(&ticket.question_text)
            {
                Ok(cleaned) => {
                    ticket.question_text = cleaned;
                    if validate::requests_human(&ticket.question_text) {
                        ticket.raise_priority(Priority::High);
                        ticket.mark_for_escalation(EscalationReason::ManualRequest);
                        if validate::is_urgent(&ticket.question_text) {
                            ticket.raise_priority(Priority::Urgent);
                        }
                    }
                    Some(WorkflowStage::AnalyzeSentiment)
                }
                Err(e) => {
                    ticket.record_error(format!("input validation failed: {e}"));
                    Some(WorkflowStage::Error)
                }
            },

            WorkflowStage::AnalyzeSentiment => {
                let report = sentiment::analyze(&ticket.question_text);
                context.sentiment = Some(report.sentiment);
                if report.is_hostile() {
                    ticket.raise_priority(Priority::High);
                    ticket.mark_for_escalation(EscalationReason::SentimentNegative);
                    ticket.record_warning(format!(
                        "hostile tone detected ({} negative terms)",
                        report.negative_hits
                    ));
                }
                Some(WorkflowStage::Classify)
            }

            WorkflowStage::Classify => {
                let call_started = Instant::now();
                match self.classifier.classify(&ticket.question_text).await {
                    Ok(classification) => {
                        ticket.metrics.classification_time_ms +=
                            call_started.elapsed().as_secs_f64() * 1000.0;
                        ticket.metrics.api_calls_made += 1;
                        debug!(
                            ticket_id = %ticket.ticket_id,
                            category = %classification.category,
                            confidence = classification.confidence,
                            "classified"
                        );
                        ticket.classification = Some(classification);
                        ticket.status = TicketStatus::Classified;
                        Some(WorkflowStage::CheckConfidence)
                    }
                    Err(e) => {
                        ticket.record_error(format!("classification failed: {e}"));
                        ticket.retry_count += 1;
                        if ticket.retries_remaining() {
                            warn!(
                                ticket_id = %ticket.ticket_id,
                                retry = ticket.retry_count,
                                "retrying classification"
                            );
                            Some(WorkflowStage::Classify)
                        } else {
                            Some(WorkflowStage::Error)
                        }
                    }
                }
            }

            WorkflowStage::CheckConfidence => {
                if ticket.requires_escalation {
                    return Some(WorkflowStage::Escalate);
                }
                let threshold = self.config.confidence_threshold
                    * context.customer_tier.threshold_factor();
                let confidence = ticket
                    .classification
                    .as_ref()
                    .map(|c| c.confidence)
                    .unwrap_or(0.0);
                if confidence < threshold {
                    ticket.record_warning(format!(
                        "confidence {confidence:.2} below threshold {threshold:.2}"
                    ));
                    ticket.mark_for_escalation(EscalationReason::LowConfidence);
                    Some(WorkflowStage::Escalate)
                } else {
                    Some(WorkflowStage::Route)
                }
            }

            WorkflowStage::Route => {
                let route_started = Instant::now();
                let category = ticket.category_or_general();
                ticket.metrics.routing_time_ms += route_started.elapsed().as_secs_f64() * 1000.0;
                ticket.status = TicketStatus::Routed;
                debug!(ticket_id = %ticket.ticket_id, route = %category, "routed");
                Some(WorkflowStage::GenerateResponse)
            }

            WorkflowStage::GenerateResponse => {
                ticket.status = TicketStatus::Processing;
                let category = ticket.category_or_general();
                let call_started = Instant::now();
                let result = self
                    .generator
                    .generate(&ticket.question_text, category, context)
                    .await;
                ticket.metrics.response_generation_time_ms +=
                    call_started.elapsed().as_secs_f64() * 1000.0;
                ticket.metrics.api_calls_made += 1;

                match result {
                    Ok(text) if !text.trim().is_empty() => {
                        let confidence = ticket
                            .classification
                            .as_ref()
                            .map(|c| c.confidence)
                            .unwrap_or(0.0);
                        ticket.response = Some(
                            SupportResponse::new(text, category, confidence)
                                .with_actions(category.suggested_actions()),
                        );
                        Some(WorkflowStage::QualityCheck)
                    }
                    other => {
                        let reason = match other {
                            Err(e) => e.to_string(),
                            Ok(_) => "generation service returned empty text".to_string(),
                        };
                        ticket.record_error(format!("generation failed: {reason}"));
                        ticket.retry_count += 1;
                        if ticket.retries_remaining() {
                            warn!(
                                ticket_id = %ticket.ticket_id,
                                retry = ticket.retry_count,
                                "retrying generation"
                            );
                            Some(WorkflowStage::GenerateResponse)
                        } else {
                            Some(WorkflowStage::Error)
                        }
                    }
                }
            }

            WorkflowStage::QualityCheck => {
                let category = ticket.category_or_general();
                let message = ticket
                    .response
                    .as_ref()
                    .map(|r| r.message.clone())
                    .unwrap_or_default();
                let report = quality::score(&message, category);
                if report.passes(self.config.quality_threshold) {
                    return Some(WorkflowStage::Finalize);
                }

                for penalty in &report.penalties {
                    ticket.record_warning(format!("quality: {penalty}"));
                }
                if ticket.retries_remaining() {
                    ticket.retry_count += 1;
                    warn!(
                        ticket_id = %ticket.ticket_id,
                        score = report.score,
                        "regenerating low-quality response"
                    );
                    Some(WorkflowStage::GenerateResponse)
                } else {
                    ticket.mark_for_escalation(EscalationReason::TechnicalLimitation);
                    Some(WorkflowStage::Escalate)
                }
            }

            WorkflowStage::Escalate => {
                let info = ticket.escalation_info.clone().unwrap_or_else(|| {
                    // Escalation reached without a recorded reason; treat as complex.
                    ticket.mark_for_escalation(EscalationReason::ComplexIssue);
                    ticket.escalation_info.clone().expect("escalation info just set")
                });
                let category = ticket.category_or_general();
                let message = format!(
                    "Your request (ticket {}) has been escalated to our {} team and a human \
                     agent will follow up with you shortly. Reason: {}.",
                    ticket.ticket_id, info.suggested_department, info.reason
                );
                ticket.response = Some(
                    SupportResponse::new(message, category, 1.0).with_actions(&[
                        "Keep your ticket id for reference",
                        "A human agent will reach out within one business day",
                    ]),
                );
                ticket.status = TicketStatus::Escalated;
                info!(
                    ticket_id = %ticket.ticket_id,
                    reason = %info.reason,
                    department = %info.suggested_department,
                    "ticket escalated"
                );
                Some(WorkflowStage::Finalize)
            }

            WorkflowStage::Finalize => {
                ticket.metrics.total_processing_time_ms =
                    started.elapsed().as_secs_f64() * 1000.0;
                if ticket.status != TicketStatus::Escalated {
                    ticket.status = TicketStatus::Resolved;
                }
                context.push_entry(ContextEntry {
                    ticket_id: ticket.ticket_id.clone(),
                    category: ticket.classification.as_ref().map(|c| c.category),
                    status: ticket.status,
                    summary: ticket.summary(),
                    timestamp: Utc::now(),
                });
                None
            }

            WorkflowStage::Error => {
                ticket.metrics.total_processing_time_ms =
                    started.elapsed().as_secs_f64() * 1000.0;
                if ticket.response.is_none() {
                    let message = format!(
                        "I apologize, but I ran into a problem processing your question \
                         (ticket {}). Please try again or contact our support team directly.",
                        ticket.ticket_id
                    );
                    ticket.response = Some(
                        SupportResponse::new(message, ticket.category_or_general(), 0.0)
                            .with_actions(&[
                                "Rephrase your question and try again",
                                "Contact support@company.com",
                            ]),
                    );
                }
                ticket.status = TicketStatus::Failed;
                warn!(
                    ticket_id = %ticket.ticket_id,
                    errors = ticket.errors.len(),
                    "ticket failed"
                );
                None
            }
        }
    }
}
