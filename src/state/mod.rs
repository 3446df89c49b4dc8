//! Shared application state: the session store, per-chat gates, the roster
//! and the archive handle.

/// Conversation state machine.
pub mod machine;
/// Incremental score entry.
pub mod score;
/// Scorer assignment engine.
pub mod scorers;
/// Per-chat session data.
pub mod session;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::dao::archive::MatchArchive;
use crate::dao::models::ChatId;
use crate::roster::Roster;
use crate::state::session::Session;

/// Cheaply cloneable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state. One instance per process.
pub struct AppState {
    roster: Roster,
    archive: Arc<dyn MatchArchive>,
    sessions: DashMap<ChatId, Session>,
    gates: DashMap<ChatId, Arc<Mutex<()>>>,
}

impl AppState {
    /// Construct the shared state around a roster and an archive backend.
    pub fn new(roster: Roster, archive: Arc<dyn MatchArchive>) -> SharedState {
        Arc::new(Self {
            roster,
            archive,
            sessions: DashMap::new(),
            gates: DashMap::new(),
        })
    }

    /// The read-only roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Handle to the match archive.
    pub fn archive(&self) -> Arc<dyn MatchArchive> {
        self.archive.clone()
    }

    /// Per-chat gate serializing event processing for one chat identity.
    /// Events for distinct chats proceed concurrently.
    pub fn chat_gate(&self, chat_id: ChatId) -> Arc<Mutex<()>> {
        self.gates
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run a closure against the chat's session, creating an idle one first if
    /// none exists. Get-or-create is atomic; the closure must not block.
    pub fn with_session<R>(&self, chat_id: ChatId, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut entry = self
            .sessions
            .entry(chat_id)
            .or_insert_with(|| Session::new(chat_id));
        f(entry.value_mut())
    }

    /// Remove the chat's session. Clearing an absent session is a no-op.
    pub fn clear_session(&self, chat_id: ChatId) {
        self.sessions.remove(&chat_id);
    }

    /// Copy of the chat's session, if one exists. Used by tests and
    /// diagnostics.
    pub fn session_snapshot(&self, chat_id: ChatId) -> Option<Session> {
        self.sessions.get(&chat_id).map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::dao::archive::memory::MemoryArchive;
    use crate::state::session::Stage;

    use super::*;

    fn state() -> SharedState {
        AppState::new(Roster::default(), Arc::new(MemoryArchive::new()))
    }

    #[test]
    fn with_session_creates_an_idle_session_lazily() {
        let state = state();
        assert!(state.session_snapshot(ChatId(1)).is_none());

        let stage = state.with_session(ChatId(1), |session| session.stage);
        assert_eq!(stage, Stage::Start);
        assert!(state.session_snapshot(ChatId(1)).is_some());
    }

    #[test]
    fn clear_session_is_idempotent() {
        let state = state();
        state.with_session(ChatId(1), |_| ());
        state.clear_session(ChatId(1));
        state.clear_session(ChatId(1));
        assert!(state.session_snapshot(ChatId(1)).is_none());
    }

    #[test]
    fn sessions_are_scoped_per_chat() {
        let state = state();
        state.with_session(ChatId(1), |session| session.sport = Some("Soccer".into()));
        let other = state.with_session(ChatId(2), |session| session.sport.clone());
        assert!(other.is_none());
    }
}
