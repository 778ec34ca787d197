//! Bus errors

/// Errors surfaced by the message bus and parameter service
#[derive(Debug, Clone, thiserror::Error)]
pub enum BusError {
    #[error("Topic closed: {0}")]
    TopicClosed(String),

    #[error("Parameter service unavailable")]
    ServiceUnavailable,

    #[error("Parameter submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Operation timed out")]
    Timeout,
}
