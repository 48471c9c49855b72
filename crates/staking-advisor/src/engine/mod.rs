//! Staking Engine
//!
//! Activity analysis and the staking decision rules, wired to an injected
//! clock so recency checks are deterministic under test.

mod analyzer;
mod clock;
mod recommendation;

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::model::{ActivityAnalysis, Recommendation, Transaction};

pub use analyzer::{RECENT_WINDOW_NANOS, analyze_activity, analyze_activity_at};
pub use clock::{Clock, FixedClock, SystemClock};
pub use recommendation::{MINIMUM_STAKE, PARTIAL_STAKE_THRESHOLD, recommend};

/// Analyzer and recommender sharing one clock
#[derive(Clone)]
pub struct StakingEngine {
    clock: Arc<dyn Clock>,
}

impl Default for StakingEngine {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl StakingEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn analyze(&self, transactions: &[Transaction]) -> ActivityAnalysis {
        analyze_activity_at(transactions, self.clock.now_nanos())
    }

    pub fn recommend(&self, balance: Decimal, analysis: &ActivityAnalysis) -> Recommendation {
        recommend(balance, analysis)
    }

    /// Analyze then recommend
    pub fn evaluate(
        &self,
        balance: Decimal,
        transactions: &[Transaction],
    ) -> (ActivityAnalysis, Recommendation) {
        let analysis = self.analyze(transactions);
        let recommendation = recommend(balance, &analysis);
        tracing::debug!(
            activity = %analysis.activity_level,
            recent = analysis.has_recent_activity,
            decision = %recommendation.decision,
            "Evaluated staking decision"
        );
        (analysis, recommendation)
    }
}

impl std::fmt::Debug for StakingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StakingEngine")
            .field("now_nanos", &self.clock.now_nanos())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, Decision};
    use rust_decimal_macros::dec;

    const NOW: u64 = 1_700_000_000_000_000_000;
    const HOUR: u64 = 3_600_000_000_000;

    #[test]
    fn test_evaluate_uses_injected_clock() {
        let engine = StakingEngine::new(Arc::new(FixedClock::new(NOW)));
        let txs = vec![Transaction::new("a", NOW - HOUR, vec![Action::transfer("1")])];

        let (analysis, rec) = engine.evaluate(dec!(3), &txs);
        assert!(analysis.has_recent_activity);
        // minimally active with recent activity falls through to the default rule
        assert_eq!(rec.decision, Decision::Recommended);
        assert_eq!(rec.suggested_amount, Some(dec!(2.40)));

        let later = StakingEngine::new(Arc::new(FixedClock::new(NOW + 30 * 24 * HOUR)));
        let (analysis, rec) = later.evaluate(dec!(3), &txs);
        assert!(!analysis.has_recent_activity);
        assert_eq!(rec.suggested_amount, Some(dec!(2.70)));
    }
}
