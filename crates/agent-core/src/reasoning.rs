//! Structured Completions
//!
//! Drives a provider to answer in JSON. The latest user turn is wrapped in a
//! JSON envelope carrying a format reminder and caller-supplied context, and
//! the reply goes through the resilient parser in [`crate::output`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::output::{ParseOutcome, parse_structured_output};
use crate::provider::{GenerationOptions, LlmProvider};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub system_prompt: String,

    /// Appended to the latest user message inside the envelope
    pub format_reminder: String,

    pub generation: GenerationOptions,

    /// Upper bound for a single provider call
    pub timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            format_reminder: DEFAULT_FORMAT_REMINDER.into(),
            generation: GenerationOptions::json(),
            timeout: Duration::from_secs(120),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r"You are a helpful assistant.

Each user message is a JSON object whose `message` field holds the user's text;
any other fields are context for your answer.

Reply with a single JSON object and nothing else.";

const DEFAULT_FORMAT_REMINDER: &str =
    "Always follow INSTRUCTIONS and produce valid JSON only as explained in OUTPUT format.";

/// Agent producing structured replies from a provider
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        Self { provider, config }
    }

    pub fn with_defaults(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, AgentConfig::default())
    }

    /// Envelope for the latest user text: `{"message": "<text>\n<reminder>", ...context}`
    fn envelope(&self, text: &str, context: &Map<String, Value>) -> String {
        let mut body = context.clone();
        body.insert(
            "message".into(),
            Value::String(format!("{text}\n{}", self.config.format_reminder)),
        );
        Value::Object(body).to_string()
    }

    /// Prompt sent to the provider: system prompt followed by the history,
    /// with a trailing user turn rewritten into the envelope.
    ///
    /// Fails with [`AgentError::ContextOverflow`] when the newest turn alone
    /// does not fit the conversation's token budget.
    pub fn build_messages(&self, conversation: &Conversation, context: &Map<String, Value>) -> Result<Vec<Message>> {
        let mut history = conversation.clone();
        history.truncate_to_fit();

        let used = history.estimate_tokens();
        let max = history.max_context_tokens();
        if used > max {
            return Err(AgentError::ContextOverflow { used, max });
        }

        let mut messages = vec![Message::system(self.config.system_prompt.clone())];
        messages.extend(history.with_last_user_rewritten(|text| self.envelope(text, context)));
        Ok(messages)
    }

    /// Ask the provider to continue `conversation` and recover JSON from its reply.
    ///
    /// Provider failures are errors; an unparsable reply is not, it comes
    /// back as [`ParseOutcome::Unparsable`].
    pub async fn complete_structured(
        &self,
        conversation: &Conversation,
        context: &Map<String, Value>,
    ) -> Result<ParseOutcome> {
        let messages = self.build_messages(conversation, context)?;
        tracing::debug!(
            model = %self.config.generation.model,
            messages = messages.len(),
            "Requesting structured completion"
        );

        let completion = tokio::time::timeout(
            self.config.timeout,
            self.provider.complete(&messages, &self.config.generation),
        )
        .await
        .map_err(|_| AgentError::Timeout(self.config.timeout.as_secs()))??;

        Ok(parse_structured_output(&completion.content))
    }

    /// One-off structured question outside any session
    pub async fn ask_structured(&self, question: &str, context: &Map<String, Value>) -> Result<ParseOutcome> {
        let mut conversation = Conversation::new();
        conversation.push(Message::user(question));
        self.complete_structured(&conversation, context).await
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self.provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, self.config))
    }
}
