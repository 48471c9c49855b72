//! Conversation state carried between chat turns

use agent_core::PersistentState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{Decision, TokenCatalog};

/// What the advisor remembers about a conversation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorState {
    #[serde(default)]
    pub last_account_id: Option<String>,

    #[serde(default)]
    pub last_balance: Option<Decimal>,

    #[serde(default)]
    pub last_decision: Option<Decision>,

    #[serde(default)]
    pub last_suggested_amount: Option<Decimal>,

    /// Cached token metadata, refetched after a reload
    #[serde(default, skip_serializing_if = "TokenCatalog::is_empty")]
    pub token_catalog: TokenCatalog,
}

impl PersistentState for AdvisorState {
    const VERSION: u32 = 1;

    fn persistable_view(&self) -> Self {
        Self {
            token_catalog: TokenCatalog::default(),
            ..self.clone()
        }
    }
}
