//! # agent-core
//!
//! Provider-agnostic building blocks for conversational agents.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Agent                               │
//! │  ┌─────────────┐   ┌───────────────┐   ┌──────────────────┐  │
//! │  │ Conversation│──▶│  LlmProvider  │──▶│ Structured-output│  │
//! │  │  + envelope │   │  (Strategy)   │   │  parser cascade  │  │
//! │  └─────────────┘   └───────────────┘   └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!          ▲
//!          │ Session<S> (typed, versioned state) ◀──▶ SessionStore
//! ```
//!
//! The `LlmProvider` trait enables swapping backends without changing agent
//! logic. [`output::parse_structured_output`] is usable on its own for any
//! text that should contain JSON.

pub mod error;
pub mod message;
pub mod output;
pub mod provider;
pub mod reasoning;
pub mod session;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use output::{ParseOutcome, ParseStrategy, parse_structured, parse_structured_output};
pub use provider::LlmProvider;
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use session::{FileSessionStore, MemorySessionStore, PersistentState, Session, SessionId, SessionStore};
