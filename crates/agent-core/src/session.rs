//! Session Management
//!
//! A session pairs the conversation history with a typed state record owned
//! by the application. State is versioned: a stored session whose state
//! version differs from the running code is discarded rather than
//! reinterpreted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::Conversation;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept an externally supplied id. Only ASCII alphanumerics, `-` and `_`
    /// are allowed since ids double as file names.
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        let valid = !s.is_empty()
            && s.len() <= 64
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(s))
        } else {
            Err(AgentError::Session(format!("invalid session id: {s:?}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application state that can be stored with a session
pub trait PersistentState: Serialize + DeserializeOwned + Default + Clone + Send + Sync {
    /// Bumped whenever the stored shape changes incompatibly
    const VERSION: u32;

    /// Copy of the state with volatile fields (caches, fetched catalogs) removed
    #[must_use]
    fn persistable_view(&self) -> Self;
}

/// A complete agent session
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "S: PersistentState")]
pub struct Session<S: PersistentState> {
    pub id: SessionId,

    pub conversation: Conversation,

    /// Version of `state` when it was written
    pub state_version: u32,

    pub state: S,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl<S: PersistentState> Session<S> {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation: Conversation::new(),
            state_version: S::VERSION,
            state: S::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// The shape written to storage: same history, state without volatile fields
    #[must_use]
    pub fn persistable_view(&self) -> Self {
        Self {
            id: self.id.clone(),
            conversation: self.conversation.clone(),
            state_version: S::VERSION,
            state: self.state.persistable_view(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

impl<S: PersistentState> Default for Session<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Session store trait for persistence
pub trait SessionStore<S: PersistentState>: Send + Sync {
    /// Save a session (its persistable view)
    fn save(&self, session: &Session<S>) -> Result<()>;

    /// Load a session by ID. Missing, corrupt, or outdated sessions load as `None`.
    fn load(&self, id: &SessionId) -> Result<Option<Session<S>>>;

    fn delete(&self, id: &SessionId) -> Result<()>;
}

/// In-memory session store (for development/testing)
pub struct MemorySessionStore<S: PersistentState> {
    sessions: RwLock<HashMap<SessionId, Session<S>>>,
}

impl<S: PersistentState> Default for MemorySessionStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: PersistentState> MemorySessionStore<S> {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::Session("session store lock poisoned".into())
}

impl<S: PersistentState> SessionStore<S> for MemorySessionStore<S> {
    fn save(&self, session: &Session<S>) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.insert(session.id.clone(), session.persistable_view());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<Session<S>>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(id).cloned())
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.remove(id);
        Ok(())
    }
}

/// One JSON file per session inside a directory
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create the store, creating `dir` if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }
}

impl<S: PersistentState> SessionStore<S> for FileSessionStore {
    fn save(&self, session: &Session<S>) -> Result<()> {
        let body = serde_json::to_string_pretty(&session.persistable_view())?;
        let path = self.path_for(&session.id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &path)?;
        tracing::debug!(session = %session.id, path = %path.display(), "Saved session");
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<Session<S>>> {
        let path = self.path_for(id);
        let body = match std::fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Peek at the version first so an outdated state shape is not
        // misread as a corrupt file.
        let header: SessionHeader = match serde_json::from_str(&body) {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "Discarding unreadable session file");
                return Ok(None);
            }
        };
        if header.state_version != S::VERSION {
            tracing::warn!(
                session = %id,
                stored = header.state_version,
                current = S::VERSION,
                "Discarding session with outdated state version"
            );
            return Ok(None);
        }

        match serde_json::from_str(&body) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "Discarding unreadable session file");
                Ok(None)
            }
        }
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        match std::fs::remove_file(self.path_for(id)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Deserialize)]
struct SessionHeader {
    #[serde(default)]
    state_version: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct CounterState {
        count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache: Option<String>,
    }

    impl PersistentState for CounterState {
        const VERSION: u32 = 2;

        fn persistable_view(&self) -> Self {
            Self { cache: None, ..self.clone() }
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("agent-core-{tag}-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_session_id_validation() {
        assert!(SessionId::parse("abc-123_DEF").is_ok());
        assert!(SessionId::parse("../etc/passwd").is_err());
        assert!(SessionId::parse("").is_err());
    }

    #[test]
    fn test_memory_store_drops_volatile_fields() {
        let store = MemorySessionStore::<CounterState>::new();
        let mut session = Session::<CounterState>::new();
        session.state = CounterState { count: 3, cache: Some("big catalog".into()) };

        store.save(&session).unwrap();

        let loaded = store.load(&session.id).unwrap().unwrap();
        assert_eq!(loaded.state, CounterState { count: 3, cache: None });
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = temp_dir("roundtrip");
        let store = FileSessionStore::new(&dir).unwrap();

        let mut session = Session::<CounterState>::new();
        session.conversation.push(Message::user("check bob.near"));
        session.state.count = 7;
        SessionStore::<CounterState>::save(&store, &session).unwrap();

        let loaded: Session<CounterState> = store.load(&session.id).unwrap().unwrap();
        assert_eq!(loaded.state.count, 7);
        assert_eq!(loaded.message_count(), 1);

        SessionStore::<CounterState>::delete(&store, &session.id).unwrap();
        let gone: Option<Session<CounterState>> = store.load(&session.id).unwrap();
        assert!(gone.is_none());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_file_store_discards_corrupt_and_outdated() {
        let dir = temp_dir("discard");
        let store = FileSessionStore::new(&dir).unwrap();

        let corrupt = SessionId::new();
        std::fs::write(dir.join(format!("{corrupt}.json")), "{not json").unwrap();
        let loaded: Option<Session<CounterState>> = store.load(&corrupt).unwrap();
        assert!(loaded.is_none());

        let outdated = SessionId::new();
        let mut session = Session::<CounterState>::with_id(outdated.clone());
        session.state_version = 1;
        std::fs::write(
            dir.join(format!("{outdated}.json")),
            serde_json::to_string(&session).unwrap(),
        )
        .unwrap();
        let loaded: Option<Session<CounterState>> = store.load(&outdated).unwrap();
        assert!(loaded.is_none());

        std::fs::remove_dir_all(dir).ok();
    }
}
