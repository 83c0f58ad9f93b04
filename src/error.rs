use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by the pipeline stages. Every stage returns these to its
/// immediate caller; nothing is retried or replaced with a default.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source could not be opened or is not valid delimited text.
    #[error("data access error: {0}")]
    DataAccess(String),
    /// Expected column absent, wrong type, or a value outside the mapping.
    #[error("schema error: {0}")]
    Schema(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid hyperparameter `{name}`: {reason}")]
    InvalidHyperparameter { name: String, reason: String },
    #[error("training did not converge: {0}")]
    ConvergenceFailure(String),
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("operation cancelled")]
    Cancelled,
    /// Tensor operation failed inside the network backend.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}

impl PipelineError {
    pub(crate) fn invalid_hyperparameter(name: &str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidHyperparameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
