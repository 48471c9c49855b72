//! Recommendation Rules
//!
//! Rules are evaluated top to bottom and the first match wins. They overlap
//! (a minimally active account without recent activity satisfies both the
//! "recommended" and "highly recommended" rules) so the order is part of the
//! behavior.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{ActivityAnalysis, ActivityLevel, Confidence, Decision, Recommendation};

/// Minimum balance, in NEAR, worth staking
pub const MINIMUM_STAKE: Decimal = dec!(1);

/// Balance above which a busy account can still stake part of its funds
pub const PARTIAL_STAKE_THRESHOLD: Decimal = dec!(10);

const PARTIAL_SHARE: Decimal = dec!(0.7);
const QUIET_SHARE: Decimal = dec!(0.9);
const IDLE_SHARE: Decimal = dec!(0.95);
const DEFAULT_SHARE: Decimal = dec!(0.8);

const AMOUNT_DIGITS: u32 = 2;

/// Decide whether, and how much, to stake
pub fn recommend(balance: Decimal, analysis: &ActivityAnalysis) -> Recommendation {
    let level = analysis.activity_level;
    let recent = analysis.has_recent_activity;

    if balance < MINIMUM_STAKE {
        return decline(
            Confidence::High,
            "Insufficient balance for staking. A minimum of 1 NEAR is recommended.",
        );
    }

    if level == ActivityLevel::HighlyActive && recent {
        if balance > PARTIAL_STAKE_THRESHOLD {
            return stake(
                Decision::PartialStake,
                Confidence::Medium,
                "Your account is very active with recent transactions. Consider staking only a \
                 portion of your balance to maintain liquidity for continued activity.",
                balance * PARTIAL_SHARE,
            );
        }
        return decline(
            Confidence::Medium,
            "Your account is very active with recent transactions, and your balance suggests \
             you may need liquidity for continued activity.",
        );
    }

    if matches!(level, ActivityLevel::ModeratelyActive | ActivityLevel::MinimallyActive) && !recent {
        return stake(
            Decision::Recommended,
            Confidence::High,
            "Your account shows some historical activity but has been quiet recently. Staking \
             would be a good way to earn rewards on your idle NEAR.",
            balance * QUIET_SHARE,
        );
    }

    if level == ActivityLevel::Inactive || (level == ActivityLevel::MinimallyActive && !recent) {
        return stake(
            Decision::HighlyRecommended,
            Confidence::High,
            "Your account shows minimal activity, making it an excellent candidate for staking \
             to earn rewards on your NEAR.",
            balance * IDLE_SHARE,
        );
    }

    stake(
        Decision::Recommended,
        Confidence::Medium,
        "Based on your balance and account activity, staking appears to be a reasonable option.",
        balance * DEFAULT_SHARE,
    )
}

fn decline(confidence: Confidence, rationale: &str) -> Recommendation {
    Recommendation {
        decision: Decision::NotRecommended,
        rationale: rationale.to_string(),
        confidence,
        suggested_amount: None,
    }
}

fn stake(decision: Decision, confidence: Confidence, rationale: &str, amount: Decimal) -> Recommendation {
    Recommendation {
        decision,
        rationale: rationale.to_string(),
        confidence,
        suggested_amount: Some(amount.round_dp(AMOUNT_DIGITS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn analysis(activity_level: ActivityLevel, has_recent_activity: bool) -> ActivityAnalysis {
        ActivityAnalysis {
            activity_level,
            action_kind_counts: BTreeMap::new(),
            has_recent_activity,
        }
    }

    #[test]
    fn test_below_minimum_never_stakes() {
        for level in [
            ActivityLevel::Inactive,
            ActivityLevel::MinimallyActive,
            ActivityLevel::ModeratelyActive,
            ActivityLevel::HighlyActive,
        ] {
            for recent in [false, true] {
                let rec = recommend(dec!(0.99), &analysis(level, recent));
                assert_eq!(rec.decision, Decision::NotRecommended);
                assert_eq!(rec.confidence, Confidence::High);
                assert_eq!(rec.suggested_amount, None);
            }
        }
    }

    #[test]
    fn test_exactly_minimum_is_allowed() {
        let rec = recommend(dec!(1), &analysis(ActivityLevel::Inactive, false));
        assert_eq!(rec.decision, Decision::HighlyRecommended);
        assert_eq!(rec.suggested_amount, Some(dec!(0.95)));
    }

    #[test]
    fn test_busy_account_with_large_balance() {
        let rec = recommend(dec!(15), &analysis(ActivityLevel::HighlyActive, true));
        assert_eq!(rec.decision, Decision::PartialStake);
        assert_eq!(rec.confidence, Confidence::Medium);
        assert_eq!(rec.suggested_amount, Some(dec!(10.5)));
    }

    #[test]
    fn test_busy_account_with_small_balance() {
        let rec = recommend(dec!(10), &analysis(ActivityLevel::HighlyActive, true));
        assert_eq!(rec.decision, Decision::NotRecommended);
        assert_eq!(rec.confidence, Confidence::Medium);
        assert_eq!(rec.suggested_amount, None);
    }

    #[test]
    fn test_quiet_account() {
        let rec = recommend(dec!(3), &analysis(ActivityLevel::MinimallyActive, false));
        assert_eq!(rec.decision, Decision::Recommended);
        assert_eq!(rec.confidence, Confidence::High);
        assert_eq!(rec.suggested_amount, Some(dec!(2.7)));

        let moderate = recommend(dec!(20), &analysis(ActivityLevel::ModeratelyActive, false));
        assert_eq!(moderate.suggested_amount, Some(dec!(18)));
    }

    #[test]
    fn test_inactive_account() {
        let rec = recommend(dec!(123.45), &analysis(ActivityLevel::Inactive, false));
        assert_eq!(rec.decision, Decision::HighlyRecommended);
        assert_eq!(rec.confidence, Confidence::High);
        // 117.2775 rounds to two digits
        assert_eq!(rec.suggested_amount, Some(dec!(117.28)));
    }

    #[test]
    fn test_fallback_combinations() {
        for (level, recent) in [
            (ActivityLevel::ModeratelyActive, true),
            (ActivityLevel::MinimallyActive, true),
            (ActivityLevel::HighlyActive, false),
        ] {
            let rec = recommend(dec!(50), &analysis(level, recent));
            assert_eq!(rec.decision, Decision::Recommended);
            assert_eq!(rec.confidence, Confidence::Medium);
            assert_eq!(rec.suggested_amount, Some(dec!(40)));
        }
    }
}
