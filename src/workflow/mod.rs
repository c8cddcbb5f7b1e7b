//! Workflow state machine: validation, sentiment, classification,
//! confidence gating, routing, generation, quality checking, escalation.

mod engine;
pub mod quality;
pub mod sentiment;
pub mod validate;

pub use engine::{TicketWorkflow, WorkflowStage, WorkflowStats};
pub use validate::ValidationError;
