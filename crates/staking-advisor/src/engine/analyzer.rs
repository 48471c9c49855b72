//! Activity Analyzer
//!
//! Classifies an account from its most recent transactions.

use std::collections::BTreeMap;

use crate::model::{ActivityAnalysis, ActivityLevel, Transaction};

use super::clock::{Clock, SystemClock};

/// Seven days in nanoseconds
pub const RECENT_WINDOW_NANOS: u64 = 7 * 24 * 60 * 60 * 1_000_000_000;

/// Analyze against the wall clock
pub fn analyze_activity(transactions: &[Transaction]) -> ActivityAnalysis {
    analyze_activity_at(transactions, SystemClock.now_nanos())
}

/// Analyze relative to `now_nanos`
///
/// Timestamps in the future count as recent.
pub fn analyze_activity_at(transactions: &[Transaction], now_nanos: u64) -> ActivityAnalysis {
    if transactions.is_empty() {
        return ActivityAnalysis::inactive();
    }

    let mut action_kind_counts: BTreeMap<String, u32> = BTreeMap::new();
    for action in transactions.iter().flat_map(|tx| &tx.actions) {
        *action_kind_counts.entry(action.kind.clone()).or_default() += 1;
    }

    let latest = transactions
        .iter()
        .map(|tx| tx.timestamp_nanos)
        .max()
        .unwrap_or(0);
    let has_recent_activity = now_nanos.saturating_sub(latest) < RECENT_WINDOW_NANOS;

    ActivityAnalysis {
        activity_level: ActivityLevel::from_transaction_count(transactions.len()),
        action_kind_counts,
        has_recent_activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, UNKNOWN_ACTION_KIND};

    const NOW: u64 = 1_700_000_000_000_000_000;
    const DAY: u64 = 24 * 60 * 60 * 1_000_000_000;

    fn transfers(count: usize, timestamp: u64) -> Vec<Transaction> {
        (0..count)
            .map(|i| Transaction::new(format!("tx{i}"), timestamp, vec![Action::transfer("1")]))
            .collect()
    }

    #[test]
    fn test_empty_history() {
        let analysis = analyze_activity_at(&[], NOW);
        assert_eq!(analysis, ActivityAnalysis::inactive());
        assert_eq!(analysis.activity_level, ActivityLevel::Inactive);
        assert!(analysis.action_kind_counts.is_empty());
        assert!(!analysis.has_recent_activity);
    }

    #[test]
    fn test_five_transfers_highly_active() {
        let analysis = analyze_activity_at(&transfers(5, NOW - DAY / 2), NOW);
        assert_eq!(analysis.activity_level, ActivityLevel::HighlyActive);
        assert_eq!(analysis.action_kind_counts, BTreeMap::from([("TRANSFER".to_string(), 5)]));
        assert!(analysis.has_recent_activity);
    }

    #[test]
    fn test_recency_window_boundary() {
        let just_inside = analyze_activity_at(&transfers(1, NOW - RECENT_WINDOW_NANOS + 1), NOW);
        assert!(just_inside.has_recent_activity);

        let exactly = analyze_activity_at(&transfers(1, NOW - RECENT_WINDOW_NANOS), NOW);
        assert!(!exactly.has_recent_activity);
    }

    #[test]
    fn test_latest_timestamp_decides_recency() {
        let mut txs = transfers(2, NOW - 30 * DAY);
        txs.push(Transaction::new("fresh", NOW - DAY, vec![]));
        let analysis = analyze_activity_at(&txs, NOW);
        assert!(analysis.has_recent_activity);
        assert_eq!(analysis.activity_level, ActivityLevel::ModeratelyActive);
    }

    #[test]
    fn test_future_timestamp_is_recent() {
        let analysis = analyze_activity_at(&transfers(1, NOW + DAY), NOW);
        assert!(analysis.has_recent_activity);
    }

    #[test]
    fn test_mixed_and_unknown_kinds() {
        let txs = vec![
            Transaction::new(
                "a",
                0,
                vec![Action::transfer("1"), Action::function_call("deposit_and_stake")],
            ),
            Transaction::new("b", 0, vec![Action::new(UNKNOWN_ACTION_KIND)]),
        ];
        let analysis = analyze_activity_at(&txs, NOW);
        assert_eq!(analysis.action_kind_counts["TRANSFER"], 1);
        assert_eq!(analysis.action_kind_counts["FUNCTION_CALL"], 1);
        assert_eq!(analysis.action_kind_counts[UNKNOWN_ACTION_KIND], 1);
        assert_eq!(analysis.activity_level, ActivityLevel::MinimallyActive);
        assert!(!analysis.has_recent_activity);
    }
}
