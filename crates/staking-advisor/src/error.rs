//! Error Types for Staking Advisor

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("{source_name} request failed with status {status}: {body}")]
    Retrieval {
        source_name: String,
        status: u16,
        body: String,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid account id: {0:?}")]
    InvalidAccountId(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

impl AdvisorError {
    pub fn retrieval(source_name: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Retrieval {
            source_name: source_name.into(),
            status,
            body: body.into(),
        }
    }

    /// Machine-readable code for API error bodies
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Retrieval { .. } => "RETRIEVAL_ERROR",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InvalidAccountId(_) => "INVALID_ACCOUNT_ID",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Agent(_) => "AGENT_ERROR",
        }
    }
}
