//! # staking-advisor
//!
//! Conservative NEAR staking advisor. Reads an account's balance and recent
//! transactions, classifies how active it is, and recommends how much (if
//! anything) to stake.
//!
//! ## Philosophy
//!
//! Staked NEAR is locked for days after unstaking, so the advisor favors
//! liquidity for busy accounts:
//!
//! - **Minimum stake** - below 1 NEAR staking is not worth it
//! - **Liquidity first** - very active accounts stake at most 70%
//! - **Idle funds earn** - quiet or inactive accounts stake 90-95%
//!
//! ## Decision Rules (first match wins)
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ balance < 1                          ► not recommended            │
//! │ highly active + recent, balance > 10 ► partial stake    (70%)    │
//! │ highly active + recent, balance ≤ 10 ► not recommended            │
//! │ minimal/moderate, not recent         ► recommended      (90%)    │
//! │ inactive                             ► highly recommended (95%)  │
//! │ anything else                        ► recommended      (80%)    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod advisor;
pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod render;
pub mod state;
pub mod units;

pub use advisor::{AccountReport, AdvisorReply, Commentary, StakingAdvisor};
pub use chain::{AccountDataSource, MockAccountSource, NearBlocksClient};
pub use config::AdvisorConfig;
pub use engine::{Clock, FixedClock, StakingEngine, SystemClock, analyze_activity, recommend};
pub use error::{AdvisorError, Result};
pub use extract::{extract_account_id, validate_account_id};
pub use model::{
    ActivityAnalysis, ActivityLevel, Confidence, Decision, Recommendation, Transaction,
};
pub use state::AdvisorState;
pub use units::convert_from_decimals;

/// System prompt for the commentary agent
pub const STAKING_ADVISOR_PROMPT: &str = r#"You are a conservative NEAR Protocol staking advisor.

## Input

Each user message is a JSON object. Its `message` field holds the request; the
other fields describe one account: `account_id`, `balance` (NEAR),
`activity_level`, `has_recent_activity`, the rule-based `decision`, its
`rationale` and `suggested_amount`.

## Instructions

1. Never contradict the rule-based decision or change the suggested amount
2. Explain the decision in plain language for the account owner
3. Mention that unstaking takes roughly 2-3 days (4 epochs)
4. Suggest one practical way to reduce risk (e.g. spreading stake across validators)

## Output

Reply with a single JSON object and nothing else:

{"summary": "<two sentences>", "risk_mitigation": "<one sentence>"}"#;
