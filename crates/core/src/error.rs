//! Error types for the actloop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `AgentError` is what a
//! caller of the agent loop ultimately sees.

use thiserror::Error;

/// Everything that can end an agent run abnormally.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model asked for an action the registry does not know.
    #[error("Unknown action: {name}: {argument}")]
    UnknownAction { name: String, argument: String },

    /// The completion backend failed.
    #[error("Backend error: {0}")]
    Backend(#[from] ProviderError),

    /// A registered action failed while running.
    #[error("Action '{name}' failed: {source}")]
    Action {
        name: String,
        #[source]
        source: ActionError,
    },

    /// `resume` was called while no directive was awaiting approval.
    #[error("No action is awaiting approval")]
    NothingPending,

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl AgentError {
    /// The offending `(name, argument)` pair for an unknown-action failure.
    pub fn unknown_action(&self) -> Option<(&str, &str)> {
        match self {
            Self::UnknownAction { name, argument } => Some((name, argument)),
            _ => None,
        }
    }
}

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

// --- Bounded context errors ---

/// Completion backend failures.
///
/// Split into two families: the backend could not be reached at all
/// (`is_unavailable`), or it answered with something we cannot use.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl ProviderError {
    /// True for transport-level failures (nothing usable came back).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout(_) | Self::NotConfigured(_)
        )
    }
}

/// Failures raised by action implementations or the registry.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("Action not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint storage error: {0}")]
    Storage(String),

    #[error("Checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
