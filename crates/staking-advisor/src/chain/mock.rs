//! Mock Account Source
//!
//! For testing and offline demos. Serves static account fixtures.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use super::{AccountDataSource, token_holding};
use crate::error::{AdvisorError, Result};
use crate::model::{
    Action, StakingPool, TokenCatalog, TokenHolding, TokenInfo, Transaction,
};

#[derive(Clone, Debug, Default)]
struct AccountFixture {
    balance: Decimal,
    transactions: Vec<Transaction>,
    pools: Vec<StakingPool>,
    tokens: Vec<(String, String)>,
}

/// In-memory account source
#[derive(Clone, Debug, Default)]
pub struct MockAccountSource {
    accounts: HashMap<String, AccountFixture>,
    catalog: TokenCatalog,
    unavailable: bool,
}

impl MockAccountSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account with its balance and transactions
    #[must_use]
    pub fn with_account(
        mut self,
        account_id: impl Into<String>,
        balance: Decimal,
        transactions: Vec<Transaction>,
    ) -> Self {
        let fixture = self.accounts.entry(account_id.into()).or_default();
        fixture.balance = balance;
        fixture.transactions = transactions;
        self
    }

    #[must_use]
    pub fn with_pools(mut self, account_id: &str, pool_ids: &[&str]) -> Self {
        let fixture = self.accounts.entry(account_id.to_string()).or_default();
        fixture.pools = pool_ids
            .iter()
            .map(|pool_id| StakingPool {
                pool_id: (*pool_id).to_string(),
                last_update_block_height: None,
            })
            .collect();
        self
    }

    /// Add a token balance (raw units) held by `account_id`
    #[must_use]
    pub fn with_token(mut self, account_id: &str, contract_id: &str, raw_balance: &str) -> Self {
        self.accounts
            .entry(account_id.to_string())
            .or_default()
            .tokens
            .push((contract_id.to_string(), raw_balance.to_string()));
        self
    }

    #[must_use]
    pub fn with_catalog_entry(mut self, contract_id: &str, symbol: &str, decimals: u32) -> Self {
        self.catalog.0.insert(
            contract_id.to_string(),
            TokenInfo {
                price: None,
                symbol: Some(symbol.to_string()),
                decimal: Some(decimals),
            },
        );
        self
    }

    /// Every call fails as if the indexer were down
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// A few accounts covering the main decision paths
    pub fn demo(now_nanos: u64) -> Self {
        const HOUR: u64 = 3_600_000_000_000;
        const DAY: u64 = 24 * HOUR;

        let busy: Vec<Transaction> = (0..5u64)
            .map(|i| {
                Transaction::new(
                    format!("BusyTx{i}0000000000000000000000000000000000000"),
                    now_nanos.saturating_sub(i * HOUR),
                    vec![Action::transfer("250000000000000000000000")],
                )
                .with_status(true)
            })
            .collect();

        let quiet = vec![
            Transaction::new(
                "QuietTx100000000000000000000000000000000000000",
                now_nanos.saturating_sub(30 * DAY),
                vec![Action::function_call("ft_transfer")],
            )
            .with_status(true),
            Transaction::new(
                "QuietTx200000000000000000000000000000000000000",
                now_nanos.saturating_sub(45 * DAY),
                vec![Action::transfer("1000000000000000000000000")],
            )
            .with_status(true),
        ];

        Self::new()
            .with_account("busy.near", dec!(15), busy)
            .with_account("quiet.near", dec!(3), quiet)
            .with_account("idle.near", dec!(120), Vec::new())
            .with_account("dust.near", dec!(0.25), Vec::new())
            .with_pools("quiet.near", &["astro-stakers.poolv1.near"])
            .with_token("idle.near", "wrap.near", "1500000000000000000000000")
            .with_catalog_entry("wrap.near", "wNEAR", 24)
    }

    fn account(&self, account_id: &str) -> Result<&AccountFixture> {
        if self.unavailable {
            return Err(AdvisorError::retrieval("Mock", 503, "service unavailable"));
        }
        self.accounts
            .get(account_id)
            .ok_or_else(|| AdvisorError::AccountNotFound(account_id.to_string()))
    }
}

#[async_trait]
impl AccountDataSource for MockAccountSource {
    async fn balance(&self, account_id: &str) -> Result<Decimal> {
        Ok(self.account(account_id)?.balance)
    }

    async fn recent_transactions(&self, account_id: &str, limit: usize) -> Result<Vec<Transaction>> {
        let mut txns = self.account(account_id)?.transactions.clone();
        txns.sort_by(|a, b| b.timestamp_nanos.cmp(&a.timestamp_nanos));
        txns.truncate(limit);
        Ok(txns)
    }

    async fn staking_pools(&self, account_id: &str) -> Result<Vec<StakingPool>> {
        Ok(self.account(account_id)?.pools.clone())
    }

    async fn token_catalog(&self) -> Result<TokenCatalog> {
        if self.unavailable {
            return Err(AdvisorError::retrieval("Mock", 503, "service unavailable"));
        }
        Ok(self.catalog.clone())
    }

    async fn fungible_tokens(
        &self,
        account_id: &str,
        catalog: &TokenCatalog,
    ) -> Result<Vec<TokenHolding>> {
        Ok(self
            .account(account_id)?
            .tokens
            .iter()
            .map(|(contract_id, raw)| token_holding(contract_id, &Value::String(raw.clone()), catalog))
            .collect())
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
