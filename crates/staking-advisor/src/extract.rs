//! Account identifier extraction from free text
//!
//! Rules run in a fixed order and the first match wins:
//!
//! 1. a token ending in `.near`
//! 2. the word `account` followed by `:` or whitespace and an identifier
//! 3. an intent verb (`analyze`, `check`, `assess`, `evaluate`, `for`)
//!    followed by `:` or whitespace and an identifier
//!
//! Extraction is loose. [`validate_account_id`] applies the protocol's
//! account-id rules before anything is fetched.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AdvisorError, Result};

/// Shortest and longest legal account ids
const ACCOUNT_ID_LEN: std::ops::RangeInclusive<usize> = 2..=64;

/// Dot-separated parts of lowercase alphanumerics, each joined by single `_` or `-`
static ACCOUNT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9]+[-_])*[a-z0-9]+(?:\.(?:[a-z0-9]+[-_])*[a-z0-9]+)*$")
        .expect("valid account id regex")
});

static NEAR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z0-9_-]+\.near)").expect("valid near suffix regex"));

static EXPLICIT_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)account[:\s]+([a-zA-Z0-9_.-]+)").expect("valid account label regex")
});

static INTENT_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:analyze|check|assess|evaluate|for)[:\s]+([a-zA-Z0-9_.-]+)")
        .expect("valid intent verb regex")
});

/// One way of spotting an account id in a message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierRule {
    NearSuffix,
    ExplicitLabel,
    IntentVerb,
}

impl IdentifierRule {
    pub const ORDER: [Self; 3] = [Self::NearSuffix, Self::ExplicitLabel, Self::IntentVerb];

    pub const fn name(self) -> &'static str {
        match self {
            Self::NearSuffix => "near_suffix",
            Self::ExplicitLabel => "explicit_label",
            Self::IntentVerb => "intent_verb",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::NearSuffix => &NEAR_SUFFIX,
            Self::ExplicitLabel => &EXPLICIT_LABEL,
            Self::IntentVerb => &INTENT_VERB,
        }
    }

    /// First capture of this rule in `text`, if any
    pub fn apply(self, text: &str) -> Option<String> {
        self.pattern()
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Find the account id a message refers to
pub fn extract_account_id(text: &str) -> Option<String> {
    extract_account_id_with_rule(text).map(|(id, _)| id)
}

/// Like [`extract_account_id`], also reporting which rule matched
pub fn extract_account_id_with_rule(text: &str) -> Option<(String, IdentifierRule)> {
    IdentifierRule::ORDER.into_iter().find_map(|rule| {
        rule.apply(text).map(|id| {
            tracing::debug!(rule = rule.name(), account_id = %id, "Extracted account id");
            (id, rule)
        })
    })
}

/// Reject ids that are not legal NEAR account ids
pub fn validate_account_id(account_id: &str) -> Result<()> {
    if ACCOUNT_ID_LEN.contains(&account_id.len()) && ACCOUNT_ID.is_match(account_id) {
        Ok(())
    } else {
        Err(AdvisorError::InvalidAccountId(account_id.to_string()))
    }
}
