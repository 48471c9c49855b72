//! NearBlocks / FastNear / Ref Finance HTTP client

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use reqwest::Url;
use serde_json::Value;

use super::{AccountDataSource, token_holding};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::model::{StakingPool, TokenCatalog, TokenHolding, Transaction};
use crate::units::yocto_to_near;

#[derive(Deserialize)]
struct AccountResponse {
    #[serde(default)]
    account: Vec<AccountRecord>,
}

#[derive(Deserialize)]
struct AccountRecord {
    #[serde(default)]
    amount: Option<Value>,
}

#[derive(Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    txns: Vec<Value>,
}

impl TransactionsResponse {
    /// Decode record by record so one bad entry cannot sink the batch
    fn into_transactions(self) -> Vec<Transaction> {
        self.txns
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(tx) => Some(tx),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable transaction record");
                    None
                }
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct TokensResponse {
    #[serde(default)]
    tokens: Vec<TokenRecord>,
}

#[derive(Deserialize)]
struct TokenRecord {
    contract_id: String,
    #[serde(default)]
    balance: Value,
}

#[derive(Deserialize)]
struct PoolsResponse {
    #[serde(default)]
    pools: Vec<StakingPool>,
}

/// HTTP client over the public NEAR indexers
pub struct NearBlocksClient {
    client: reqwest::Client,
    config: AdvisorConfig,
}

impl NearBlocksClient {
    pub fn new(config: AdvisorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("near-staking-advisor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdvisorError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(AdvisorConfig::from_env()?)
    }

    pub const fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        source_name: &str,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!(source = source_name, %url, "Fetching");

        let response = self.client.get(url.clone()).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(source = source_name, %url, status = status.as_u16(), "Request failed");
            return Err(AdvisorError::retrieval(source_name, status.as_u16(), body));
        }

        Ok(response.json().await?)
    }

    fn account_url(&self, account_id: &str, suffix: &[&str]) -> Result<Url> {
        endpoint_url(&self.config.nearblocks_api_url, &["v1", "account", account_id], suffix)
    }
}

/// `base` plus path segments, each percent-encoded as a single segment
fn endpoint_url(base: &str, segments: &[&str], suffix: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| AdvisorError::Config(format!("Invalid API URL '{base}': {e}")))?;
    url.path_segments_mut()
        .map_err(|()| AdvisorError::Config(format!("API URL '{base}' cannot take a path")))?
        .pop_if_empty()
        .extend(segments)
        .extend(suffix);
    Ok(url)
}

#[async_trait]
impl AccountDataSource for NearBlocksClient {
    async fn balance(&self, account_id: &str) -> Result<Decimal> {
        let response: AccountResponse = self
            .get_json("NearBlocks", self.account_url(account_id, &[])?, &[])
            .await?;

        let record = response
            .account
            .into_iter()
            .next()
            .ok_or_else(|| AdvisorError::AccountNotFound(account_id.to_string()))?;

        let balance = match record.amount {
            Some(Value::String(raw)) => yocto_to_near(&raw)?,
            Some(Value::Number(raw)) => yocto_to_near(&raw.to_string())?,
            _ => Decimal::ZERO,
        };

        tracing::debug!(account_id, %balance, "Fetched balance");
        Ok(balance)
    }

    async fn recent_transactions(&self, account_id: &str, limit: usize) -> Result<Vec<Transaction>> {
        let response: TransactionsResponse = self
            .get_json(
                "NearBlocks",
                self.account_url(account_id, &["txns"])?,
                &[("limit", limit.to_string()), ("order", "desc".to_string())],
            )
            .await?;

        let mut txns = response.into_transactions();
        txns.truncate(limit);
        tracing::debug!(account_id, count = txns.len(), "Fetched transactions");
        Ok(txns)
    }

    async fn staking_pools(&self, account_id: &str) -> Result<Vec<StakingPool>> {
        let url = endpoint_url(
            &self.config.fastnear_api_url,
            &["v1", "account", account_id],
            &["staking"],
        )?;
        let response: PoolsResponse = self.get_json("FastNear", url, &[]).await?;

        tracing::debug!(account_id, count = response.pools.len(), "Fetched staking pools");
        Ok(response.pools)
    }

    async fn token_catalog(&self) -> Result<TokenCatalog> {
        let url = endpoint_url(&self.config.ref_finance_api_url, &["list-token-price"], &[])?;
        let catalog: TokenCatalog = self.get_json("Ref Finance", url, &[]).await?;

        tracing::debug!(count = catalog.len(), "Fetched token catalog");
        Ok(catalog)
    }

    async fn fungible_tokens(
        &self,
        account_id: &str,
        catalog: &TokenCatalog,
    ) -> Result<Vec<TokenHolding>> {
        let response: TokensResponse = self
            .get_json("NearBlocks", self.account_url(account_id, &["ft"])?, &[])
            .await?;

        Ok(response
            .tokens
            .iter()
            .map(|token| token_holding(&token.contract_id, &token.balance, catalog))
            .collect())
    }

    fn name(&self) -> &str {
        "NearBlocks"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_account_urls() {
        let client = NearBlocksClient::new(AdvisorConfig::default()).unwrap();
        assert_eq!(
            client.account_url("alice.near", &["txns"]).unwrap().as_str(),
            "https://api.nearblocks.io/v1/account/alice.near/txns"
        );
        assert_eq!(
            client.account_url("alice.near", &[]).unwrap().as_str(),
            "https://api.nearblocks.io/v1/account/alice.near"
        );
    }

    #[test]
    fn test_account_id_stays_one_path_segment() {
        let client = NearBlocksClient::new(AdvisorConfig::default()).unwrap();

        let url = client.account_url("alice.near?x=", &["txns"]).unwrap();
        assert_eq!(url.as_str(), "https://api.nearblocks.io/v1/account/alice.near%3Fx=/txns");
        assert_eq!(url.query(), None);

        let url = client.account_url("a/b", &["ft"]).unwrap();
        assert_eq!(url.path(), "/v1/account/a%2Fb/ft");
    }

    #[test]
    fn test_endpoint_url_keeps_base_path() {
        let url = endpoint_url("https://indexer.ref.finance/", &["list-token-price"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://indexer.ref.finance/list-token-price");

        let url = endpoint_url("http://localhost:8080/api", &["v1", "account", "bob.near"], &["staking"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v1/account/bob.near/staking");

        assert!(matches!(endpoint_url("not a url", &[], &[]), Err(AdvisorError::Config(_))));
    }

    #[test]
    fn test_bad_transaction_record_is_skipped() {
        let response: TransactionsResponse = serde_json::from_value(json!({
            "txns": [
                {"transaction_hash": "a", "block_timestamp": "1700000000000000000"},
                "garbage",
                {"transaction_hash": null, "actions": [null], "outcomes": {"status": "SUCCESS"}}
            ]
        }))
        .unwrap();

        let txns = response.into_transactions();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].hash, "a");
        assert_eq!(txns[1].hash, "");
        assert_eq!(txns[1].outcome.as_ref().and_then(|o| o.status), Some(true));
    }

    #[test]
    fn test_response_shapes() {
        let account: AccountResponse = serde_json::from_value(json!({
            "account": [{"account_id": "alice.near", "amount": "2500000000000000000000000"}]
        }))
        .unwrap();
        assert_eq!(account.account.len(), 1);

        let pools: PoolsResponse = serde_json::from_value(json!({
            "account_id": "alice.near",
            "pools": [{"pool_id": "astro-stakers.poolv1.near", "last_update_block_height": 120}]
        }))
        .unwrap();
        assert_eq!(pools.pools[0].pool_id, "astro-stakers.poolv1.near");

        let catalog: TokenCatalog = serde_json::from_value(json!({
            "wrap.near": {"price": "3.41", "symbol": "wNEAR", "decimal": 24}
        }))
        .unwrap();
        assert_eq!(catalog.decimals("wrap.near"), Some(24));

        let tokens: TokensResponse = serde_json::from_value(json!({
            "tokens": [{"contract_id": "wrap.near", "balance": "1500000000000000000000000"}]
        }))
        .unwrap();
        let holding = token_holding(&tokens.tokens[0].contract_id, &tokens.tokens[0].balance, &catalog);
        assert_eq!(holding.balance, Some(dec!(1.5)));
        assert_eq!(holding.symbol.as_deref(), Some("wNEAR"));
    }
}
