//! Unit conversion for on-chain integer amounts
//!
//! Chain balances are integers in the token's smallest unit (yoctoNEAR for
//! NEAR, 10^-24). Conversion shifts the decimal point on the digit string so
//! amounts wider than `u128` never pass through floating point, then rounds
//! toward zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::error::{AdvisorError, Result};

/// Decimals of the native NEAR token
pub const NEAR_DECIMALS: u32 = 24;

/// Digits kept when displaying NEAR amounts
pub const DISPLAY_DIGITS: u32 = 6;

/// Largest scale `Decimal` can represent
const MAX_SCALE: u32 = 28;

/// Convert an integer amount string into a human-readable decimal
///
/// `decimals` is the token's decimal count and `round_digits` the number of
/// fractional digits to keep. Extra digits are truncated, never rounded up.
pub fn convert_from_decimals(raw: &str, decimals: u32, round_digits: u32) -> Result<Decimal> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AdvisorError::InvalidAmount(raw.to_string()));
    }

    let digits = digits.trim_start_matches('0');
    let decimals = decimals as usize;
    let keep = round_digits.min(MAX_SCALE) as usize;

    let (whole, fraction) = if digits.len() > decimals {
        digits.split_at(digits.len() - decimals)
    } else {
        ("", digits)
    };

    // only the leading zeros that survive truncation are materialized
    let zeros = (decimals - fraction.len()).min(keep);
    let mut kept = "0".repeat(zeros);
    kept.push_str(&fraction[..(keep - zeros).min(fraction.len())]);
    let fraction = kept;

    let whole = if whole.is_empty() { "0" } else { whole };
    let text = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    };

    text.parse::<Decimal>()
        .map(|d| d.normalize())
        .map_err(|_| AdvisorError::InvalidAmount(raw.to_string()))
}

/// yoctoNEAR string to NEAR, truncated to six digits
pub fn yocto_to_near(raw: &str) -> Result<Decimal> {
    convert_from_decimals(raw, NEAR_DECIMALS, DISPLAY_DIGITS)
}

/// Convert an amount that may arrive as a JSON string or number
pub fn convert_json_amount(value: &Value, decimals: u32, round_digits: u32) -> Result<Decimal> {
    match value {
        Value::String(text) => convert_from_decimals(text, decimals, round_digits),
        Value::Number(number) => {
            if let Some(integer) = number.as_u64() {
                return convert_from_decimals(&integer.to_string(), decimals, round_digits);
            }
            let float = number
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .ok_or_else(|| AdvisorError::InvalidAmount(number.to_string()))?;
            let scaled = Decimal::from_f64_retain(float)
                .ok_or_else(|| AdvisorError::InvalidAmount(number.to_string()))?;
            let factor = Decimal::try_new(1, decimals)
                .map_err(|_| AdvisorError::InvalidAmount(number.to_string()))?;
            Ok(scaled
                .checked_mul(factor)
                .ok_or_else(|| AdvisorError::InvalidAmount(number.to_string()))?
                .round_dp_with_strategy(round_digits, RoundingStrategy::ToZero)
                .normalize())
        }
        other => Err(AdvisorError::InvalidAmount(other.to_string())),
    }
}
