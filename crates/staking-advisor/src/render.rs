//! Markdown rendering of reports

use std::fmt::Write;

use chrono::DateTime;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::model::{Decision, Recommendation, StakingPool, TokenHolding, Transaction};
use crate::units::convert_json_amount;

const EXPLORER_URL: &str = "https://nearblocks.io";

const CONSIDERATIONS: [&str; 4] = [
    "Staking involves locking up your NEAR tokens",
    "There is a waiting period when unstaking (typically 2-3 days)",
    "APY rates vary by validator, typically ranging from 8-12%",
    "Choose validators carefully - consider their track record and fees",
];

const DISCLAIMER: &str = "*This recommendation is provided based on your account's transaction \
history and balance. Always do your own research before making financial decisions.*";

const fn header(decision: Decision) -> &'static str {
    match decision {
        Decision::HighlyRecommended => "# ✅ Staking is Highly Recommended",
        Decision::Recommended => "# ✅ Staking is Recommended",
        Decision::PartialStake => "# ⚠️ Partial Staking Recommended",
        Decision::NotRecommended => "# ❌ Staking is Not Recommended",
    }
}

/// Recommendation section
pub fn format_recommendation(
    account_id: &str,
    balance: Decimal,
    recommendation: &Recommendation,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", header(recommendation.decision));
    let _ = writeln!(out, "**Account:** [{account_id}]({EXPLORER_URL}/address/{account_id})\n");
    let _ = writeln!(out, "**Current Balance:** {balance} NEAR\n");
    let _ = writeln!(out, "**Recommendation:** {}\n", recommendation.rationale);

    if let Some(amount) = recommendation.suggested_amount.filter(|a| !a.is_zero()) {
        let _ = writeln!(out, "**Suggested Staking Amount:** {amount} NEAR\n");
    }

    out.push_str("## Important Considerations\n\n");
    for item in CONSIDERATIONS {
        let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
    out.push_str(DISCLAIMER);
    out
}

/// Recent transactions list, one line each
pub fn format_transactions(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "\n\n**No recent transactions found**".to_string();
    }

    let lines: Vec<String> = transactions.iter().map(transaction_line).collect();
    format!("\n{}", lines.join("\n"))
}

fn transaction_line(tx: &Transaction) -> String {
    let hash = if tx.hash.is_empty() { "Unknown" } else { tx.hash.as_str() };
    let short: String = hash.chars().take(8).collect();

    let actions = if tx.actions.is_empty() {
        "Unknown action".to_string()
    } else {
        tx.actions
            .iter()
            .map(|action| match action.kind.as_str() {
                "TRANSFER" => {
                    let deposit = action
                        .argument("deposit")
                        .and_then(|v| convert_json_amount(v, 24, 6).ok())
                        .unwrap_or(Decimal::ZERO);
                    format!("Transfer: {deposit} NEAR")
                }
                "FUNCTION_CALL" => {
                    let method = action
                        .argument("method_name")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown");
                    format!("Function: {method}")
                }
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let status = match tx.outcome.as_ref().and_then(|o| o.status) {
        Some(true) => "Success",
        Some(false) => "Failed",
        None => "Unknown",
    };

    format!(
        "- **[{short}...]({EXPLORER_URL}/txns/{hash})** | {actions} | Status: {status} | {}\n",
        format_timestamp(tx.timestamp_nanos)
    )
}

fn format_timestamp(nanos: u64) -> String {
    if nanos == 0 {
        return "Unknown".to_string();
    }
    let secs = i64::try_from(nanos / 1_000_000_000).unwrap_or(i64::MAX);
    // sub-second part is always below 1e9
    let subsec = u32::try_from(nanos % 1_000_000_000).unwrap_or(0);
    DateTime::from_timestamp(secs, subsec).map_or_else(
        || "Unknown".to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

/// Current staking pools and token balances; empty when there are neither
pub fn format_holdings(pools: &[StakingPool], tokens: &[TokenHolding]) -> String {
    let mut out = String::new();

    if !pools.is_empty() {
        out.push_str("\n\n## Current Staking Pools\n\n");
        for pool in pools {
            let _ = writeln!(out, "- [{0}]({EXPLORER_URL}/address/{0})", pool.pool_id);
        }
    }

    if !tokens.is_empty() {
        out.push_str("\n\n## Token Balances\n\n");
        for token in tokens {
            let name = token.symbol.as_deref().unwrap_or(&token.contract_id);
            match token.balance {
                Some(balance) => {
                    let _ = writeln!(out, "- **{name}**: {balance} (`{}`)", token.contract_id);
                }
                None => {
                    let _ = writeln!(out, "- **{name}**: {} raw units (`{}`)", token.balance_raw, token.contract_id);
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, Confidence};
    use rust_decimal_macros::dec;

    fn recommendation(decision: Decision, amount: Option<Decimal>) -> Recommendation {
        Recommendation {
            decision,
            rationale: "Because.".into(),
            confidence: Confidence::High,
            suggested_amount: amount,
        }
    }

    #[test]
    fn test_recommendation_markdown() {
        let md = format_recommendation(
            "alice.near",
            dec!(15),
            &recommendation(Decision::PartialStake, Some(dec!(10.5))),
        );
        assert!(md.starts_with("# ⚠️ Partial Staking Recommended\n\n"));
        assert!(md.contains("**Account:** [alice.near](https://nearblocks.io/address/alice.near)"));
        assert!(md.contains("**Current Balance:** 15 NEAR"));
        assert!(md.contains("**Suggested Staking Amount:** 10.5 NEAR"));
        assert!(md.contains("## Important Considerations"));
        assert!(md.ends_with(DISCLAIMER));
    }

    #[test]
    fn test_not_recommended_has_no_amount() {
        let md = format_recommendation("bob.near", dec!(0.5), &recommendation(Decision::NotRecommended, None));
        assert!(md.starts_with("# ❌ Staking is Not Recommended"));
        assert!(!md.contains("Suggested Staking Amount"));
    }

    #[test]
    fn test_empty_transactions() {
        assert_eq!(format_transactions(&[]), "\n\n**No recent transactions found**");
    }

    #[test]
    fn test_transaction_lines() {
        let txs = vec![
            Transaction::new(
                "9xnaEs5YFGBTyNfR",
                1_700_000_000_000_000_000,
                vec![Action::transfer("1500000000000000000000000"), Action::function_call("ft_transfer")],
            )
            .with_status(true),
            Transaction::new("", 0, vec![]),
        ];
        let md = format_transactions(&txs);

        assert!(md.contains("**[9xnaEs5Y...](https://nearblocks.io/txns/9xnaEs5YFGBTyNfR)**"));
        assert!(md.contains("Transfer: 1.5 NEAR, Function: ft_transfer"));
        assert!(md.contains("Status: Success | 2023-11-14 22:13:20 UTC"));
        assert!(md.contains("[Unknown...]"));
        assert!(md.contains("Unknown action | Status: Unknown | Unknown"));
    }

    #[test]
    fn test_holdings() {
        assert_eq!(format_holdings(&[], &[]), "");

        let pools = vec![StakingPool {
            pool_id: "astro-stakers.poolv1.near".into(),
            last_update_block_height: None,
        }];
        let tokens = vec![TokenHolding {
            contract_id: "wrap.near".into(),
            balance_raw: "1500000000000000000000000".into(),
            symbol: Some("wNEAR".into()),
            balance: Some(dec!(1.5)),
        }];
        let md = format_holdings(&pools, &tokens);
        assert!(md.contains("## Current Staking Pools"));
        assert!(md.contains("astro-stakers.poolv1.near"));
        assert!(md.contains("- **wNEAR**: 1.5 (`wrap.near`)"));
    }
}
