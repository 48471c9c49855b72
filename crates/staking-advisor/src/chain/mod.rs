//! Account Data Sources
//!
//! Retrieval of balances, transactions, staking pools and token metadata
//! from public NEAR indexers.

mod mock;
mod nearblocks;

pub use mock::MockAccountSource;
pub use nearblocks::NearBlocksClient;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::{StakingPool, TokenCatalog, TokenHolding, Transaction};

/// Account data source (Strategy pattern)
///
/// Implemented over HTTP indexers and over static fixtures.
#[async_trait]
pub trait AccountDataSource: Send + Sync {
    /// Native balance in NEAR
    async fn balance(&self, account_id: &str) -> Result<Decimal>;

    /// Most recent transactions first, at most `limit`
    async fn recent_transactions(&self, account_id: &str, limit: usize) -> Result<Vec<Transaction>>;

    /// Pools the account delegates to
    async fn staking_pools(&self, account_id: &str) -> Result<Vec<StakingPool>>;

    /// Price and decimals for every listed token
    async fn token_catalog(&self) -> Result<TokenCatalog>;

    /// Fungible token balances, made human-readable using `catalog`
    async fn fungible_tokens(
        &self,
        account_id: &str,
        catalog: &TokenCatalog,
    ) -> Result<Vec<TokenHolding>>;

    /// Source name for logs
    fn name(&self) -> &str;
}

/// Build a holding from an indexer balance, converting with the catalog's
/// decimals when the token is listed
pub(crate) fn token_holding(
    contract_id: &str,
    raw_balance: &serde_json::Value,
    catalog: &TokenCatalog,
) -> TokenHolding {
    let balance_raw = match raw_balance {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => "0".to_string(),
        other => other.to_string(),
    };

    let info = catalog.get(contract_id);
    let balance = catalog
        .decimals(contract_id)
        .filter(|decimals| *decimals > 0)
        .and_then(|decimals| {
            crate::units::convert_json_amount(raw_balance, decimals, crate::units::DISPLAY_DIGITS)
                .map_err(|e| tracing::debug!(contract_id, error = %e, "Unreadable token balance"))
                .ok()
        });

    TokenHolding {
        contract_id: contract_id.to_string(),
        balance_raw,
        symbol: info.and_then(|i| i.symbol.clone()),
        balance,
    }
}
