//! Per-user conversation sessions

use crate::state_machine::VisitState;
use std::collections::HashMap;

/// In-memory map from user id to that user's visit state.
///
/// Only active sessions are stored; putting `Idle` removes the entry.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<i64, VisitState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a user, `Idle` when no session exists
    pub fn state(&self, user_id: i64) -> VisitState {
        self.sessions.get(&user_id).cloned().unwrap_or_default()
    }

    pub fn is_active(&self, user_id: i64) -> bool {
        self.sessions.contains_key(&user_id)
    }

    pub fn put(&mut self, user_id: i64, state: VisitState) {
        if state.is_active() {
            if self.sessions.insert(user_id, state).is_none() {
                tracing::info!(user_id, "Visit session started");
            }
        } else if self.sessions.remove(&user_id).is_some() {
            tracing::info!(user_id, "Visit session closed");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
