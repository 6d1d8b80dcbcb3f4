use thiserror::Error;

/// Message shown to the user whenever the model call fails, whatever the cause.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze company. Please try again.";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The hosted model rejected the request or could not be reached.
    #[error("{0}")]
    Upstream(String),
}

impl AnalysisError {
    /// Collapse any upstream failure into the single user-facing message.
    pub fn upstream() -> Self {
        AnalysisError::Upstream(GENERIC_FAILURE_MESSAGE.to_string())
    }
}
