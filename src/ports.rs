//! External service ports — classification and response generation.
//!
//! Both ports are consumed as black boxes: pure request/response, no retained
//! state. Any failure they report is treated as retryable by the workflow up
//! to the shared retry budget.

use async_trait::async_trait;

use crate::ticket::{Classification, ConversationContext, SupportCategory};

/// Error from the classification service.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("classification service unavailable: {0}")]
    Unavailable(String),

    #[error("classification timed out after {0}ms")]
    Timeout(u64),
}

/// Error from the generation service.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("generation service unavailable: {0}")]
    Unavailable(String),

    #[error("generation timed out after {0}ms")]
    Timeout(u64),

    #[error("generation service returned empty text")]
    EmptyResponse,
}

/// Classifies a question into a support category with a confidence score.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, question: &str) -> Result<Classification, ClassifyError>;
}

/// Produces response text for a question given its category and session
/// context. Implementations must return non-empty text or fail with
/// [`GenerateError::EmptyResponse`].
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        question: &str,
        category: SupportCategory,
        context: &ConversationContext,
    ) -> Result<String, GenerateError>;
}
