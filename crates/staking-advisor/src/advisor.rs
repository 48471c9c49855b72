//! Staking Advisor
//!
//! Turns a chat message into a staking report:
//!
//! ```text
//! message ─► extract id ─► balance + transactions ─► analyze ─► recommend
//!                               │                                  │
//!                               └─► pools + tokens (best effort)   ▼
//!                                                     commentary (optional LLM)
//!                                                               │
//!                                                               ▼
//!                                                       Markdown report
//! ```

use std::sync::Arc;

use agent_core::{Agent, ParseOutcome};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::chain::AccountDataSource;
use crate::config::AdvisorConfig;
use crate::engine::StakingEngine;
use crate::error::Result;
use crate::extract::{extract_account_id, validate_account_id};
use crate::model::{
    ActivityAnalysis, Decision, Recommendation, StakingPool, TokenCatalog, TokenHolding,
    Transaction,
};
use crate::render::{format_holdings, format_recommendation, format_transactions};
use crate::state::AdvisorState;

/// Reply when no account id could be found in the message
pub const NEED_ACCOUNT_MESSAGE: &str = "To provide a staking recommendation, I need your NEAR \
account ID. Please provide a valid account ID (e.g., 'example.near').";

const COMMENTARY_QUESTION: &str = "Review this staking recommendation and answer with \
{\"summary\": <two sentences for the account owner>, \"risk_mitigation\": <one practical tip>}.";

/// Optional model-written notes attached to a report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commentary {
    pub summary: String,

    #[serde(default)]
    pub risk_mitigation: Option<String>,
}

/// Everything gathered and decided for one account
#[derive(Clone, Debug, Serialize)]
pub struct AccountReport {
    pub account_id: String,
    pub balance: Decimal,
    pub transactions: Vec<Transaction>,
    pub analysis: ActivityAnalysis,
    pub recommendation: Recommendation,
    pub staking_pools: Vec<StakingPool>,
    pub tokens: Vec<TokenHolding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentary: Option<Commentary>,
}

impl AccountReport {
    /// Full Markdown reply
    pub fn to_markdown(&self) -> String {
        let mut out = format_recommendation(&self.account_id, self.balance, &self.recommendation);

        if let Some(commentary) = &self.commentary {
            out.push_str("\n\n## Advisor Notes\n\n");
            out.push_str(&commentary.summary);
            if let Some(tip) = &commentary.risk_mitigation {
                out.push_str("\n\n**Risk mitigation:** ");
                out.push_str(tip);
            }
        }

        out.push_str(&format_holdings(&self.staking_pools, &self.tokens));
        out.push_str("\n\n## Recent Transactions");
        out.push_str(&format_transactions(&self.transactions));
        out
    }
}

/// Outcome of one chat turn
#[derive(Clone, Debug)]
pub enum AdvisorReply {
    /// The message named no account
    NeedAccount,

    Report(Box<AccountReport>),

    /// Retrieval failed for the named account
    Failed { account_id: String, message: String },
}

impl AdvisorReply {
    /// Text shown to the user
    pub fn message(&self) -> String {
        match self {
            Self::NeedAccount => NEED_ACCOUNT_MESSAGE.to_string(),
            Self::Report(report) => report.to_markdown(),
            Self::Failed { message, .. } => message.clone(),
        }
    }

    pub fn decision(&self) -> Option<Decision> {
        match self {
            Self::Report(report) => Some(report.recommendation.decision),
            Self::NeedAccount | Self::Failed { .. } => None,
        }
    }
}

/// Orchestrates retrieval, analysis and rendering
pub struct StakingAdvisor {
    source: Arc<dyn AccountDataSource>,
    engine: StakingEngine,
    agent: Option<Agent>,
    config: AdvisorConfig,
}

impl StakingAdvisor {
    pub fn new(source: Arc<dyn AccountDataSource>, engine: StakingEngine, config: AdvisorConfig) -> Self {
        Self {
            source,
            engine,
            agent: None,
            config,
        }
    }

    /// Attach an agent used for optional commentary
    #[must_use]
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    pub const fn engine(&self) -> &StakingEngine {
        &self.engine
    }

    pub const fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn has_agent(&self) -> bool {
        self.agent.is_some()
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Answer one chat message
    pub async fn handle_message(&self, text: &str, state: &mut AdvisorState) -> AdvisorReply {
        let Some(account_id) = extract_account_id(text) else {
            tracing::debug!("No account id in message");
            return AdvisorReply::NeedAccount;
        };

        tracing::info!(account_id = %account_id, "Analyzing account");

        match self.analyze_account(&account_id, state).await {
            Ok(report) => AdvisorReply::Report(Box::new(report)),
            Err(e) => {
                tracing::error!(account_id = %account_id, error = %e, "Account analysis failed");
                AdvisorReply::Failed {
                    message: format!(
                        "Error analyzing account {account_id}: {e}\n\nPlease verify the account ID and try again."
                    ),
                    account_id,
                }
            }
        }
    }

    /// Fetch, analyze and recommend for `account_id`, recording the result in `state`
    pub async fn analyze_account(&self, account_id: &str, state: &mut AdvisorState) -> Result<AccountReport> {
        validate_account_id(account_id)?;

        let balance = self.source.balance(account_id).await?;
        let transactions = self
            .source
            .recent_transactions(account_id, self.config.transaction_limit)
            .await?;

        let (analysis, recommendation) = self.engine.evaluate(balance, &transactions);

        let staking_pools = self
            .source
            .staking_pools(account_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(account_id, error = %e, "Staking pools unavailable");
                Vec::new()
            });

        let tokens = self.tokens(account_id, &mut state.token_catalog).await;

        let mut report = AccountReport {
            account_id: account_id.to_string(),
            balance,
            transactions,
            analysis,
            recommendation,
            staking_pools,
            tokens,
            commentary: None,
        };
        report.commentary = self.commentary(&report).await;

        state.last_account_id = Some(report.account_id.clone());
        state.last_balance = Some(balance);
        state.last_decision = Some(report.recommendation.decision);
        state.last_suggested_amount = report.recommendation.suggested_amount;

        Ok(report)
    }

    async fn tokens(&self, account_id: &str, catalog: &mut TokenCatalog) -> Vec<TokenHolding> {
        if catalog.is_empty() {
            match self.source.token_catalog().await {
                Ok(fetched) => *catalog = fetched,
                Err(e) => tracing::warn!(error = %e, "Token catalog unavailable"),
            }
        }

        self.source
            .fungible_tokens(account_id, catalog)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(account_id, error = %e, "Token balances unavailable");
                Vec::new()
            })
    }

    async fn commentary(&self, report: &AccountReport) -> Option<Commentary> {
        let agent = self.agent.as_ref()?;

        let mut context = Map::new();
        context.insert("account_id".into(), json!(report.account_id));
        context.insert("balance".into(), json!(report.balance.to_string()));
        context.insert("activity_level".into(), json!(report.analysis.activity_level));
        context.insert("has_recent_activity".into(), json!(report.analysis.has_recent_activity));
        context.insert("decision".into(), json!(report.recommendation.decision));
        context.insert("rationale".into(), json!(report.recommendation.rationale));
        context.insert(
            "suggested_amount".into(),
            report
                .recommendation
                .suggested_amount
                .map_or(Value::Null, |a| json!(a.to_string())),
        );

        let mut answer = agent.ask_structured(COMMENTARY_QUESTION, &context).await;
        if let Err(e) = &answer {
            if e.is_retryable() {
                tracing::warn!(error = %e, "Commentary request failed, retrying once");
                answer = agent.ask_structured(COMMENTARY_QUESTION, &context).await;
            }
        }

        match answer {
            Ok(outcome @ ParseOutcome::Parsed { .. }) => outcome.decode::<Commentary>(),
            Ok(ParseOutcome::Unparsable) => {
                tracing::warn!("Commentary reply was not valid JSON");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Commentary unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockAccountSource;
    use crate::engine::FixedClock;
    use rust_decimal_macros::dec;

    const NOW: u64 = 1_700_000_000_000_000_000;

    fn advisor(source: MockAccountSource) -> StakingAdvisor {
        StakingAdvisor::new(
            Arc::new(source),
            StakingEngine::new(Arc::new(FixedClock::new(NOW))),
            AdvisorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_need_account() {
        let advisor = advisor(MockAccountSource::demo(NOW));
        let mut state = AdvisorState::default();

        let reply = advisor.handle_message("hello there", &mut state).await;
        assert!(matches!(reply, AdvisorReply::NeedAccount));
        assert_eq!(reply.message(), NEED_ACCOUNT_MESSAGE);
        assert_eq!(state, AdvisorState::default());
    }

    #[tokio::test]
    async fn test_busy_account_report() {
        let advisor = advisor(MockAccountSource::demo(NOW));
        let mut state = AdvisorState::default();

        let reply = advisor.handle_message("please check busy.near", &mut state).await;
        assert_eq!(reply.decision(), Some(Decision::PartialStake));

        let AdvisorReply::Report(report) = &reply else {
            panic!("expected a report");
        };
        assert_eq!(report.recommendation.suggested_amount, Some(dec!(10.5)));
        assert!(report.commentary.is_none());

        let md = reply.message();
        assert!(md.contains("# ⚠️ Partial Staking Recommended"));
        assert!(md.contains("## Recent Transactions"));
        assert!(md.contains("Transfer: 0.25 NEAR"));

        assert_eq!(state.last_account_id.as_deref(), Some("busy.near"));
        assert_eq!(state.last_decision, Some(Decision::PartialStake));
        assert_eq!(state.last_suggested_amount, Some(dec!(10.5)));
    }

    #[tokio::test]
    async fn test_catalog_cached_in_state() {
        let advisor = advisor(MockAccountSource::demo(NOW));
        let mut state = AdvisorState::default();

        let report = advisor.analyze_account("idle.near", &mut state).await.unwrap();
        assert_eq!(report.tokens[0].balance, Some(dec!(1.5)));
        assert_eq!(state.token_catalog.len(), 1);
        assert_eq!(report.recommendation.decision, Decision::HighlyRecommended);
    }

    #[tokio::test]
    async fn test_retrieval_failure_reply() {
        let advisor = advisor(MockAccountSource::demo(NOW).unavailable());
        let mut state = AdvisorState::default();

        let reply = advisor.handle_message("account: busy.near", &mut state).await;
        let AdvisorReply::Failed { account_id, message } = &reply else {
            panic!("expected a failure reply");
        };
        assert_eq!(account_id, "busy.near");
        assert!(message.starts_with("Error analyzing account busy.near: Mock request failed with status 503"));
        assert!(message.ends_with("\n\nPlease verify the account ID and try again."));
        assert_eq!(state.last_account_id, None);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_fetched() {
        let advisor = advisor(MockAccountSource::demo(NOW).unavailable());
        let mut state = AdvisorState::default();

        let reply = advisor.handle_message("account: ..", &mut state).await;
        let AdvisorReply::Failed { account_id, message } = &reply else {
            panic!("expected a failure reply");
        };
        assert_eq!(account_id, "..");
        assert!(message.starts_with("Error analyzing account ..: Invalid account id: \"..\""));

        let err = advisor.analyze_account("alice.near?x=", &mut state).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_ACCOUNT_ID");
        assert_eq!(state, AdvisorState::default());
    }
}
