//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider did not answer within the configured timeout
    #[error("Provider timed out after {0}s")]
    Timeout(u64),

    /// Context length exceeded
    #[error("Context length exceeded: {used} tokens (max: {max})")]
    ContextOverflow { used: u32, max: u32 },

    /// Parse error (e.g., a reply that must be structured but is not)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_)
                | Self::Timeout(_)
                | Self::RateLimited(_)
                | Self::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) | Self::Timeout(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::ContextOverflow { .. } => "The conversation is too long. Please start a new session.".into(),
            Self::Parse(_) => "The AI service returned a reply that could not be understood.".into(),
            Self::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            Self::Session(_) => "Your session could not be loaded or saved.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AgentError::Timeout(30).is_retryable());
        assert!(AgentError::ProviderUnavailable("down".into()).is_retryable());
        assert!(!AgentError::Parse("bad".into()).is_retryable());
        assert!(!AgentError::Config("missing".into()).is_retryable());
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = AgentError::Session("permission denied: /var/state".into());
        assert!(!err.user_message().contains("/var/state"));
    }
}
