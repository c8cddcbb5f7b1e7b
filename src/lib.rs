//! Support Ticket Triage Core
//!
//! This library provides:
//! - A workflow state machine that drives support questions from validation
//!   through classification, routing, generation, and quality control to a
//!   final response or a human escalation
//! - A worker pool for concurrent ticket processing over one shared workflow
//! - A TTL + LRU response cache keyed on normalized question text
//!
//! # Usage
//!
//! ```bash
//! # Answer one question
//! triage -q "How do I update my payment method?"
//!
//! # Process a batch concurrently
//! triage --batch "server is down::where is my invoice::how do I export data"
//!
//! # Show per-ticket processing details
//! triage -q "I want to speak to a human" --details
//! ```

pub mod cache;
pub mod config;
pub mod pool;
pub mod ports;
pub mod service;
pub mod ticket;
pub mod workflow;

// Re-export core workflow types
pub use workflow::{TicketWorkflow, WorkflowStage, WorkflowStats};

// Re-export ticket types
pub use ticket::{
    Classification, ContextEntry, ConversationContext, CustomerTier, EscalationInfo,
    EscalationReason, Priority, ProcessingMetrics, Sentiment, SupportCategory, SupportResponse,
    Ticket, TicketStatus,
};

// Re-export pool types
pub use pool::{
    CompletionReport, PerformanceStats, PoolError, QueueStatus, TaskState, WorkerPool, WorkerStats,
    WorkerTask,
};

// Re-export cache types
pub use cache::{CacheStats, ResponseCache};

// Re-export configuration
pub use config::{CacheConfig, ConfigError, PoolConfig, TriageConfig, WorkflowConfig};

// Re-export service ports and built-in backends
pub use ports::{Classifier, ClassifyError, GenerateError, Generator};
pub use service::{KeywordClassifier, TemplateGenerator};
