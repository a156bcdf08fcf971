//! Per-session conversation state.
//!
//! A session owns one bounded, append-only history of completed turns.
//! The analyzer and retriever only ever read the window; turns are appended
//! by the engine after a full cycle completes, never mid-cycle, so in-flight
//! retrieval never races a context mutation. Nothing survives the session.

use crate::vocab::EntityKind;
use dashmap::DashMap;
use std::collections::VecDeque;
use uuid::Uuid;

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
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

/// An entity that was mentioned (or inherited) during a completed turn.
/// Later queries resolve pronouns against these, most-recent-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnEntity {
    pub kind: EntityKind,
    pub name: String,
}

impl TurnEntity {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// One completed query/answer exchange.
#[derive(Debug, Clone)]
pub struct Turn {
    /// The user's query text.
    pub query: String,
    /// A bounded summary of the answer that was produced.
    pub answer_summary: String,
    /// Entities in play during this turn.
    pub entities: Vec<TurnEntity>,
    pub at: chrono::DateTime<chrono::Utc>,
}

impl Turn {
    pub fn new(query: impl Into<String>, answer_summary: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            answer_summary: answer_summary.into(),
            entities: Vec::new(),
            at: chrono::Utc::now(),
        }
    }

    pub fn with_entity(mut self, kind: EntityKind, name: impl Into<String>) -> Self {
        self.entities.push(TurnEntity::new(kind, name));
        self
    }

    pub fn with_entities(mut self, entities: Vec<TurnEntity>) -> Self {
        self.entities = entities;
        self
    }
}

/// Bounded rolling history for one session.
///
/// `append` drops the oldest turn once capacity is exceeded; `window`
/// returns turns oldest-first. Capacity is fixed at construction.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl ConversationContext {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a completed turn, evicting the oldest past capacity.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// The current window, oldest-first. Length ≤ capacity.
    pub fn window(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// All live sessions for one process.
///
/// Sessions never share state; concurrent cycles for different sessions
/// touch different `ConversationContext` values.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, ConversationContext>,
    window_capacity: usize,
}

impl SessionRegistry {
    pub fn new(window_capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            window_capacity,
        }
    }

    /// Create a new empty session and return its ID.
    pub fn open(&self) -> SessionId {
        let id = SessionId::new();
        self.sessions
            .insert(id, ConversationContext::new(self.window_capacity));
        id
    }

    /// Snapshot a session's window, oldest-first. `None` if unknown.
    pub fn window(&self, id: &SessionId) -> Option<Vec<Turn>> {
        self.sessions.get(id).map(|ctx| ctx.window())
    }

    /// Record a completed turn. Unknown sessions are ignored.
    pub fn record(&self, id: &SessionId, turn: Turn) {
        if let Some(mut ctx) = self.sessions.get_mut(id) {
            ctx.append(turn);
        }
    }

    /// Tear down a session, discarding its history.
    pub fn close(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_beyond_capacity_drops_oldest() {
        let mut ctx = ConversationContext::new(3);
        for i in 0..4 {
            ctx.append(Turn::new(format!("q{i}"), format!("a{i}")));
        }
        let window = ctx.window();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].query, "q1", "oldest turn dropped first");
        assert_eq!(window[2].query, "q3");
    }

    #[test]
    fn zero_capacity_context_never_grows() {
        let mut ctx = ConversationContext::new(0);
        ctx.append(Turn::new("q1", "a1"));
        ctx.append(Turn::new("q2", "a2"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn window_is_oldest_first() {
        let mut ctx = ConversationContext::new(3);
        ctx.append(Turn::new("first", ""));
        ctx.append(Turn::new("second", ""));
        let window = ctx.window();
        assert_eq!(window[0].query, "first");
        assert_eq!(window[1].query, "second");
    }

    #[test]
    fn registry_isolates_sessions() {
        let registry = SessionRegistry::new(3);
        let a = registry.open();
        let b = registry.open();

        registry.record(&a, Turn::new("only in a", ""));

        assert_eq!(registry.window(&a).unwrap().len(), 1);
        assert!(registry.window(&b).unwrap().is_empty());
    }

    #[test]
    fn close_discards_history() {
        let registry = SessionRegistry::new(3);
        let id = registry.open();
        registry.record(&id, Turn::new("q", "a"));

        assert!(registry.close(&id));
        assert!(registry.window(&id).is_none());
        assert!(!registry.close(&id));
    }

    #[test]
    fn record_on_unknown_session_is_ignored() {
        let registry = SessionRegistry::new(3);
        registry.record(&SessionId::new(), Turn::new("q", "a"));
        assert_eq!(registry.session_count(), 0);
    }
}
