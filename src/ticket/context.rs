//! Conversation context — per-session state carried across tickets.
//!
//! The context is owned by the caller and passed by exclusive reference into
//! one workflow execution at a time. One caller drives one session
//! sequentially; the core does not defend against two concurrent tickets
//! sharing the same context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{SupportCategory, TicketStatus};

/// How many prior ticket summaries a session keeps.
const HISTORY_LIMIT: usize = 20;

/// Customer tier, used to relax the confidence gate for paying customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTier {
    Standard,
    Premium,
    Enterprise,
}

impl CustomerTier {
    /// Multiplier applied to the confidence threshold for this tier.
    /// Higher tiers tolerate slightly lower classifier confidence before
    /// falling back to a human.
    pub fn threshold_factor(&self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::Premium => 0.95,
            Self::Enterprise => 0.9,
        }
    }
}

impl Default for CustomerTier {
    fn default() -> Self {
        Self::Standard
    }
}

/// Overall tone detected in a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Summary of one finished ticket, appended to the session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub ticket_id: String,
    pub category: Option<SupportCategory>,
    pub status: TicketStatus,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-session accumulator shared across the tickets of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub user_id: Option<String>,
    pub session_id: String,
    pub sentiment: Option<Sentiment>,
    pub customer_tier: CustomerTier,
    pub history: Vec<ContextEntry>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self {
            user_id: None,
            session_id: Uuid::new_v4().to_string(),
            sentiment: None,
            customer_tier: CustomerTier::Standard,
            history: Vec::new(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_tier(mut self, tier: CustomerTier) -> Self {
        self.customer_tier = tier;
        self
    }

    /// Append a finished-ticket summary, dropping the oldest entries beyond
    /// the history limit.
    pub fn push_entry(&mut self, entry: ContextEntry) {
        self.history.push(entry);
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }

    pub fn exchange_count(&self) -> usize {
        self.history.len()
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}
