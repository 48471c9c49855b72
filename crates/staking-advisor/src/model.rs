//! Domain Models
//!
//! Account activity and staking recommendation types.
//! Uses `rust_decimal` for all balances - never use f64 for money!
//!
//! Indexer records are often incomplete. Deserialization substitutes
//! defaults instead of failing: a missing timestamp becomes `0`, missing
//! actions become an empty list, and a missing or malformed action becomes
//! an `"unknown"` one.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Action kind used when the indexer omits one
pub const UNKNOWN_ACTION_KIND: &str = "unknown";

/// A transaction as reported by the indexer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(
        rename = "transaction_hash",
        alias = "hash",
        default,
        deserialize_with = "text_or_empty"
    )]
    pub hash: String,

    /// Block timestamp in nanoseconds since the Unix epoch
    #[serde(
        rename = "block_timestamp",
        alias = "timestamp",
        default,
        deserialize_with = "timestamp_nanos"
    )]
    pub timestamp_nanos: u64,

    #[serde(default, deserialize_with = "lenient_actions")]
    pub actions: Vec<Action>,

    #[serde(
        rename = "outcomes",
        default,
        deserialize_with = "lenient_outcome",
        skip_serializing_if = "Option::is_none"
    )]
    pub outcome: Option<TransactionOutcome>,
}

impl Transaction {
    pub fn new(hash: impl Into<String>, timestamp_nanos: u64, actions: Vec<Action>) -> Self {
        Self {
            hash: hash.into(),
            timestamp_nanos,
            actions,
            outcome: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, success: bool) -> Self {
        self.outcome = Some(TransactionOutcome { status: Some(success) });
        self
    }
}

/// Execution outcome of a transaction
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    /// `true`/`false`, or a status word such as `"SUCCESS"`
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<bool>,
}

/// One action inside a transaction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAction")]
pub struct Action {
    /// Kind tag, e.g. "TRANSFER" or "FUNCTION_CALL"
    #[serde(rename = "action")]
    pub kind: String,

    /// Kind-dependent fields such as `deposit` or `method_name`
    #[serde(rename = "args")]
    pub arguments: Map<String, Value>,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            arguments: Map::new(),
        }
    }

    #[must_use]
    pub fn with_argument(mut self, key: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(key.into(), value);
        self
    }

    pub fn transfer(deposit_yocto: impl Into<String>) -> Self {
        Self::new("TRANSFER").with_argument("deposit", Value::String(deposit_yocto.into()))
    }

    pub fn function_call(method_name: impl Into<String>) -> Self {
        Self::new("FUNCTION_CALL").with_argument("method_name", Value::String(method_name.into()))
    }

    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }
}

/// Wire shape of an action. Indexers put some fields (`method`, `deposit`)
/// next to the kind and others inside `args`, which may also be a JSON string
/// or null.
#[derive(Deserialize)]
struct RawAction {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    args: Option<Value>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl From<RawAction> for Action {
    fn from(raw: RawAction) -> Self {
        let mut arguments = match raw.args {
            Some(Value::Object(map)) => map,
            Some(Value::String(text)) => match serde_json::from_str(&text) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
            _ => Map::new(),
        };

        for (key, value) in raw.rest {
            if value.is_null() {
                continue;
            }
            let key = if key == "method" { "method_name".to_string() } else { key };
            arguments.entry(key).or_insert(value);
        }

        let kind = raw
            .action
            .filter(|kind| !kind.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ACTION_KIND.to_string());

        Self { kind, arguments }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Integer(u64),
    Text(String),
    Other(IgnoredAny),
}

/// Accepts integer or string nanoseconds; anything else reads as `0`
fn timestamp_nanos<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimestamp::Integer(nanos)) => nanos,
        Some(RawTimestamp::Text(text)) => text.trim().parse().unwrap_or(0),
        Some(RawTimestamp::Other(_)) | None => 0,
    })
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => text,
        _ => String::new(),
    })
}

/// Entries that are not action objects read as `"unknown"` actions
fn lenient_actions<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Action>, D::Error> {
    let Some(Value::Array(entries)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Value::Object(_) => {
                serde_json::from_value(entry).unwrap_or_else(|_| Action::new(UNKNOWN_ACTION_KIND))
            }
            _ => Action::new(UNKNOWN_ACTION_KIND),
        })
        .collect())
}

fn lenient_outcome<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<TransactionOutcome>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(outcome @ Value::Object(_)) => serde_json::from_value(outcome).ok(),
        _ => None,
    })
}

fn lenient_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(ok)) => Some(ok),
        Some(Value::String(word)) => match word.trim().to_ascii_lowercase().as_str() {
            "success" | "succeeded" | "true" => Some(true),
            "failure" | "failed" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Coarse classification of how many recent transactions an account made
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Inactive,
    MinimallyActive,
    ModeratelyActive,
    HighlyActive,
}

impl ActivityLevel {
    /// 0 ⇒ inactive, 1–2 ⇒ minimal, 3–4 ⇒ moderate, 5+ ⇒ high
    pub const fn from_transaction_count(count: usize) -> Self {
        match count {
            0 => Self::Inactive,
            1..=2 => Self::MinimallyActive,
            3..=4 => Self::ModeratelyActive,
            _ => Self::HighlyActive,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::MinimallyActive => "minimally active",
            Self::ModeratelyActive => "moderately active",
            Self::HighlyActive => "highly active",
        }
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Summary of an account's recent transactions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityAnalysis {
    pub activity_level: ActivityLevel,

    /// Number of actions per kind
    pub action_kind_counts: BTreeMap<String, u32>,

    /// Latest transaction is less than seven days old
    pub has_recent_activity: bool,
}

impl ActivityAnalysis {
    pub const fn inactive() -> Self {
        Self {
            activity_level: ActivityLevel::Inactive,
            action_kind_counts: BTreeMap::new(),
            has_recent_activity: false,
        }
    }
}

/// Staking decision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    NotRecommended,
    PartialStake,
    Recommended,
    HighlyRecommended,
}

impl Decision {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotRecommended => "not_recommended",
            Self::PartialStake => "partial_stake",
            Self::Recommended => "recommended",
            Self::HighlyRecommended => "highly_recommended",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Staking advice for one account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub decision: Decision,

    /// Plain-language reason shown to the user
    pub rationale: String,

    pub confidence: Confidence,

    /// Amount to stake, in NEAR, rounded to two decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_amount: Option<Decimal>,
}

/// A staking pool the account already delegates to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPool {
    pub pool_id: String,

    #[serde(default)]
    pub last_update_block_height: Option<u64>,
}

/// A fungible token balance held by the account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub contract_id: String,

    /// Balance in the token's smallest unit, as reported
    pub balance_raw: String,

    #[serde(default)]
    pub symbol: Option<String>,

    /// Human-readable balance when the token's decimals are known
    #[serde(default)]
    pub balance: Option<Decimal>,
}

/// Price and metadata for one token contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub price: Option<String>,

    #[serde(default)]
    pub symbol: Option<String>,

    #[serde(default)]
    pub decimal: Option<u32>,
}

/// Token metadata keyed by contract id
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenCatalog(pub HashMap<String, TokenInfo>);

impl TokenCatalog {
    pub fn get(&self, contract_id: &str) -> Option<&TokenInfo> {
        self.0.get(contract_id)
    }

    pub fn decimals(&self, contract_id: &str) -> Option<u32> {
        self.get(contract_id).and_then(|info| info.decimal)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_indexer_transaction_shape() {
        let tx: Transaction = serde_json::from_value(json!({
            "transaction_hash": "9xnaEs5YFGBTyNfRWZQxnM5RyPwEWFLvQCjnNrZqFmZc",
            "block_timestamp": "1700000000000000000",
            "actions": [
                {"action": "TRANSFER", "method": null, "deposit": "1500000000000000000000000"},
                {"action": "FUNCTION_CALL", "method": "ft_transfer", "args": "{\"amount\": \"5\"}"}
            ],
            "outcomes": {"status": true}
        }))
        .unwrap();

        assert_eq!(tx.timestamp_nanos, 1_700_000_000_000_000_000);
        assert_eq!(tx.actions[0].kind, "TRANSFER");
        assert_eq!(tx.actions[0].argument("deposit"), Some(&json!("1500000000000000000000000")));
        assert_eq!(tx.actions[1].argument("method_name"), Some(&json!("ft_transfer")));
        assert_eq!(tx.actions[1].argument("amount"), Some(&json!("5")));
        assert_eq!(tx.outcome, Some(TransactionOutcome { status: Some(true) }));
    }

    #[test]
    fn test_malformed_transaction_gets_defaults() {
        let tx: Transaction = serde_json::from_value(json!({
            "block_timestamp": null,
            "actions": [{"args": null}, {"action": ""}]
        }))
        .unwrap();

        assert_eq!(tx.hash, "");
        assert_eq!(tx.timestamp_nanos, 0);
        assert_eq!(tx.actions.len(), 2);
        assert!(tx.actions.iter().all(|a| a.kind == UNKNOWN_ACTION_KIND));

        let empty: Transaction = serde_json::from_value(json!({"actions": null})).unwrap();
        assert!(empty.actions.is_empty());

        let odd_time: Transaction = serde_json::from_value(json!({"timestamp": 12.5})).unwrap();
        assert_eq!(odd_time.timestamp_nanos, 0);
    }

    #[test]
    fn test_null_hash_and_stray_actions_get_defaults() {
        let tx: Transaction = serde_json::from_value(json!({
            "transaction_hash": null,
            "block_timestamp": "1700000000000000000",
            "actions": [null, 7, {"action": 3}, {"action": "TRANSFER", "deposit": "1"}]
        }))
        .unwrap();

        assert_eq!(tx.hash, "");
        assert_eq!(tx.timestamp_nanos, 1_700_000_000_000_000_000);
        let kinds: Vec<_> = tx.actions.iter().map(|a| a.kind.as_str()).collect();
        assert_eq!(kinds, ["unknown", "unknown", "unknown", "TRANSFER"]);

        let scalar_actions: Transaction = serde_json::from_value(json!({"actions": "TRANSFER"})).unwrap();
        assert!(scalar_actions.actions.is_empty());
    }

    #[test]
    fn test_outcome_status_words() {
        let status_of = |outcomes: Value| {
            serde_json::from_value::<Transaction>(json!({"outcomes": outcomes}))
                .unwrap()
                .outcome
                .and_then(|o| o.status)
        };

        assert_eq!(status_of(json!({"status": "SUCCESS"})), Some(true));
        assert_eq!(status_of(json!({"status": "failed"})), Some(false));
        assert_eq!(status_of(json!({"status": false})), Some(false));
        assert_eq!(status_of(json!({"status": {"SuccessValue": ""}})), None);
        assert_eq!(status_of(json!({"status": null})), None);
        assert_eq!(status_of(json!("SUCCESS")), None);
        assert_eq!(status_of(Value::Null), None);
    }

    #[test]
    fn test_activity_level_boundaries() {
        let levels: Vec<_> = (0..=6).map(ActivityLevel::from_transaction_count).collect();
        assert_eq!(
            levels,
            vec![
                ActivityLevel::Inactive,
                ActivityLevel::MinimallyActive,
                ActivityLevel::MinimallyActive,
                ActivityLevel::ModeratelyActive,
                ActivityLevel::ModeratelyActive,
                ActivityLevel::HighlyActive,
                ActivityLevel::HighlyActive,
            ]
        );
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_value(Decision::PartialStake).unwrap(), json!("partial_stake"));
        assert_eq!(serde_json::to_value(ActivityLevel::HighlyActive).unwrap(), json!("highly_active"));
        assert_eq!(serde_json::to_value(Confidence::Medium).unwrap(), json!("medium"));
    }
}
