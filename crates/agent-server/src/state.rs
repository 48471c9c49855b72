//! Application State

use std::sync::Arc;

use agent_core::{LlmProvider, SessionStore};
use staking_advisor::{AdvisorState, StakingAdvisor};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Staking advisor over the configured account source
    pub advisor: Arc<StakingAdvisor>,

    /// Chat sessions keyed by session id
    pub sessions: Arc<dyn SessionStore<AdvisorState>>,

    /// LLM provider used for commentary (None if disabled)
    pub provider: Option<Arc<dyn LlmProvider>>,
}
