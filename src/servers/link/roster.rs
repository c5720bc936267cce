//! Live player roster
//!
//! Tracks the players currently connected to this instance, standing in
//! for the host runtime's connected-player list. The authority resolves
//! every request against it: a request for an id not in the roster is
//! dropped silently, because there is nobody to respond to.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct Roster {
    /// Map from player id to display name.
    players: Mutex<HashMap<i64, String>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connected player.
    pub fn join(&self, player_id: i64, username: &str) {
        let mut players = self.players.lock().unwrap();
        players.insert(player_id, username.to_string());
        tracing::debug!("[link] [roster_join] player={} username={}", player_id, username);
    }

    /// Remove a player on disconnect.
    pub fn leave(&self, player_id: i64) {
        let mut players = self.players.lock().unwrap();
        if players.remove(&player_id).is_some() {
            tracing::debug!("[link] [roster_leave] player={}", player_id);
        }
    }

    /// Resolve a live player's display name, or None if not connected.
    pub fn resolve(&self, player_id: i64) -> Option<String> {
        self.players.lock().unwrap().get(&player_id).cloned()
    }

    pub fn count(&self) -> usize {
        self.players.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_resolve_leave() {
        let roster = Roster::new();
        assert_eq!(roster.resolve(42), None);

        roster.join(42, "alice");
        assert_eq!(roster.resolve(42).as_deref(), Some("alice"));
        assert_eq!(roster.count(), 1);

        roster.leave(42);
        assert_eq!(roster.resolve(42), None);
        assert_eq!(roster.count(), 0);
    }

    #[test]
    fn test_rejoin_updates_name() {
        let roster = Roster::new();
        roster.join(42, "alice");
        roster.join(42, "alice2");
        assert_eq!(roster.resolve(42).as_deref(), Some("alice2"));
        assert_eq!(roster.count(), 1);
    }
}
