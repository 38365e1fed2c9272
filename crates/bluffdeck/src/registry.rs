//! Session registry: tracks live sessions and routes players to them.

use std::collections::HashMap;

use bluffdeck_protocol::{PlayerId, SessionId};

use crate::session::SessionHandle;

/// Maps session ids to actor handles and players to their session.
///
/// A player can be seated in at most ONE session at a time (key
/// invariant); `bind` enforces it. The registry itself is plain data —
/// the engine serializes access to it.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, SessionHandle>,
    player_sessions: HashMap<PlayerId, SessionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: SessionHandle) {
        self.sessions.insert(handle.session_id().clone(), handle);
    }

    pub fn handle(&self, session_id: &SessionId) -> Option<&SessionHandle> {
        self.sessions.get(session_id)
    }

    /// The handle of the session a player is seated in.
    pub fn session_of(&self, player_id: PlayerId) -> Option<&SessionHandle> {
        let session_id = self.player_sessions.get(&player_id)?;
        self.sessions.get(session_id)
    }

    pub fn is_seated(&self, player_id: PlayerId) -> bool {
        self.player_sessions.contains_key(&player_id)
    }

    /// Records a player's membership. Returns `false` (and changes
    /// nothing) if they are already seated somewhere.
    pub fn bind(&mut self, player_id: PlayerId, session_id: SessionId) -> bool {
        if self.player_sessions.contains_key(&player_id) {
            return false;
        }
        self.player_sessions.insert(player_id, session_id);
        true
    }

    pub fn unbind(&mut self, player_id: PlayerId) -> Option<SessionId> {
        self.player_sessions.remove(&player_id)
    }

    /// Drops a session and every membership pointing at it. The caller
    /// is responsible for telling the actor to shut down first.
    pub fn remove_session(&mut self, session_id: &SessionId) {
        self.sessions.remove(session_id);
        self.player_sessions.retain(|_, sid| sid != session_id);
    }

    /// Cloned handles to all live sessions, for scans that must not
    /// hold the registry lock across awaits.
    pub fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.values().cloned().collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
