//! Structured Output Recovery
//!
//! Language models asked for JSON rarely return bare JSON. Replies arrive
//! wrapped in Markdown fences, followed by prose, or sprinkled with stray
//! semicolons. [`parse_structured_output`] runs an ordered list of
//! [`ParseStrategy`] values over the reply and returns the first value that
//! decodes. Exhausting every strategy yields [`ParseOutcome::Unparsable`],
//! never an error.
//!
//! ```text
//! direct ─▶ ```json fence ─▶ any fence ─▶ widest {…} ─▶ text without ';'
//! ```
//!
//! Every extracting strategy retries its own candidate once with all `;`
//! removed before the next strategy is tried. Results are never merged
//! across strategies.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fence labelled `json` at the very start of the text around one object
static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A```json\s*(\{.*?\})\s*```").expect("valid json fence pattern"));

/// The first fenced block anywhere in the text
static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(.*?)```").expect("valid fence pattern"));

/// From the first `{` to the last `}`
static BRACE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid brace pattern"));

const PREVIEW_CHARS: usize = 200;

/// One way of turning a reply into JSON
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// The whole text is JSON
    Direct,
    /// The text starts with a ```` ```json ```` fence around an object
    JsonFence,
    /// Content of the first fenced block, newlines removed
    AnyFence,
    /// Widest `{...}` span, newlines removed
    BraceSpan,
    /// The whole text with every `;` removed
    StrippedText,
}

impl ParseStrategy {
    /// Evaluation order
    pub const ORDER: [Self; 5] = [
        Self::Direct,
        Self::JsonFence,
        Self::AnyFence,
        Self::BraceSpan,
        Self::StrippedText,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::JsonFence => "json_fence",
            Self::AnyFence => "any_fence",
            Self::BraceSpan => "brace_span",
            Self::StrippedText => "stripped_text",
        }
    }

    /// Text this strategy would hand to the JSON decoder, if it applies at all
    pub fn candidate(self, text: &str) -> Option<Cow<'_, str>> {
        match self {
            Self::Direct => Some(Cow::Borrowed(text)),
            Self::JsonFence => JSON_FENCE
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| Cow::Borrowed(m.as_str())),
            Self::AnyFence => ANY_FENCE
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| Cow::Owned(without_newlines(m.as_str()))),
            Self::BraceSpan => BRACE_SPAN
                .find(text)
                .map(|m| Cow::Owned(without_newlines(m.as_str()))),
            Self::StrippedText => Some(Cow::Owned(text.replace(';', ""))),
        }
    }

    /// Whether a failed candidate gets a second attempt without semicolons
    const fn retries_without_semicolons(self) -> bool {
        matches!(self, Self::JsonFence | Self::AnyFence | Self::BraceSpan)
    }

    /// Run this strategy alone
    pub fn attempt(self, text: &str) -> Option<Value> {
        let candidate = self.candidate(text)?;
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            return Some(value);
        }
        if self.retries_without_semicolons() && candidate.contains(';') {
            return serde_json::from_str::<Value>(&candidate.replace(';', "")).ok();
        }
        None
    }
}

impl std::fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn without_newlines(text: &str) -> String {
    text.replace('\n', "").trim().to_string()
}

/// Result of recovering JSON from free-form text
#[derive(Clone, Debug, PartialEq)]
pub enum ParseOutcome {
    /// A value was decoded by `strategy`
    Parsed { value: Value, strategy: ParseStrategy },
    /// No strategy produced valid JSON
    Unparsable,
}

impl ParseOutcome {
    pub const fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }

    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Parsed { value, .. } => Some(value),
            Self::Unparsable => None,
        }
    }

    pub const fn strategy(&self) -> Option<ParseStrategy> {
        match self {
            Self::Parsed { strategy, .. } => Some(*strategy),
            Self::Unparsable => None,
        }
    }

    /// The decoded value, or the failure sentinel
    pub fn into_value(self) -> Value {
        match self {
            Self::Parsed { value, .. } => value,
            Self::Unparsable => failure_sentinel(),
        }
    }

    /// Decode the value into a concrete type. `None` on failure or shape mismatch.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        let value = self.value()?.clone();
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(error = %e, "Structured output has unexpected shape");
                None
            }
        }
    }
}

/// Fixed object reported in place of output that could not be parsed
pub fn failure_sentinel() -> Value {
    serde_json::json!({ "message": "JSON decode error" })
}

/// Recover one JSON value from arbitrary text
pub fn parse_structured_output(text: &str) -> ParseOutcome {
    for strategy in ParseStrategy::ORDER {
        if let Some(value) = strategy.attempt(text) {
            tracing::debug!(strategy = %strategy, "Parsed structured output");
            return ParseOutcome::Parsed { value, strategy };
        }
    }

    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
    tracing::warn!(preview = %preview, "Could not parse structured output");
    ParseOutcome::Unparsable
}

/// Recover and decode text into `T` in one step
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Option<T> {
    parse_structured_output(text).decode()
}
