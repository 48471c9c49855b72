//! Advisor configuration from environment variables

use std::time::Duration;

use crate::error::{AdvisorError, Result};

pub const DEFAULT_NEARBLOCKS_API_URL: &str = "https://api.nearblocks.io";
pub const DEFAULT_FASTNEAR_API_URL: &str = "https://api.fastnear.com";
pub const DEFAULT_REF_FINANCE_API_URL: &str = "https://api.ref.finance";

/// Endpoints and limits for account retrieval
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvisorConfig {
    /// NearBlocks indexer base URL (balance, transactions, tokens)
    pub nearblocks_api_url: String,

    /// FastNear base URL (staking pools)
    pub fastnear_api_url: String,

    /// Ref Finance base URL (token prices and decimals)
    pub ref_finance_api_url: String,

    /// Number of recent transactions analyzed
    pub transaction_limit: usize,

    pub http_timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            nearblocks_api_url: DEFAULT_NEARBLOCKS_API_URL.into(),
            fastnear_api_url: DEFAULT_FASTNEAR_API_URL.into(),
            ref_finance_api_url: DEFAULT_REF_FINANCE_API_URL.into(),
            transaction_limit: 5,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl AdvisorConfig {
    /// Read `NEARBLOCKS_API_URL`, `FASTNEAR_API_URL`, `REF_FINANCE_API_URL`,
    /// `TRANSACTION_LIMIT` and `HTTP_TIMEOUT_SECS`, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let url = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        let transaction_limit = match lookup("TRANSACTION_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| AdvisorError::Config(format!("TRANSACTION_LIMIT must be a positive integer, got '{raw}'")))?,
            None => defaults.transaction_limit,
        };

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| AdvisorError::Config(format!("HTTP_TIMEOUT_SECS must be a number of seconds, got '{raw}'")))?,
            None => defaults.http_timeout,
        };

        Ok(Self {
            nearblocks_api_url: url("NEARBLOCKS_API_URL", defaults.nearblocks_api_url),
            fastnear_api_url: url("FASTNEAR_API_URL", defaults.fastnear_api_url),
            ref_finance_api_url: url("REF_FINANCE_API_URL", defaults.ref_finance_api_url),
            transaction_limit,
            http_timeout,
        })
    }
}
