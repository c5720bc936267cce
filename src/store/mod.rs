//! Persistence backends for link state
//!
//! Two keys back the whole system, per the platform's key-value
//! contract: a per-player integer flag (0 = not linked, 1 = linked) and
//! one world-global value holding the used-code map. The trait exposes
//! exactly that surface; callers never see backend details.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use crate::ledger::UsedCodes;

pub mod mysql;

pub use mysql::MySqlLinkStore;

/// World-global persisted key for the used-code map. Shared across all
/// running instances of the same world. The per-player link flag has no
/// key name: it is one row per player in the backend.
pub const USED_CODES_KEY: &str = "UsedCodes:usedCodes";

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt ledger payload: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The key-value repository behind the link authority.
///
/// Methods return `impl Future + Send` rather than plain `async fn` so
/// generic callers can spawn them onto the runtime.
pub trait LinkStore: Send + Sync {
    /// Fetches the world-global used-code map. `Ok(None)` means the key
    /// has never been written.
    fn load_used_codes(
        &self,
    ) -> impl Future<Output = Result<Option<UsedCodes>, StoreError>> + Send;

    /// Writes the full used-code map back to the world-global key,
    /// replacing whatever was there.
    fn save_used_codes(
        &self,
        codes: &UsedCodes,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reads a player's link flag. Missing players read as 0.
    fn get_link_flag(
        &self,
        player_id: i64,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Writes a player's link flag.
    fn set_link_flag(
        &self,
        player_id: i64,
        value: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// In-memory store: the no-SQL fallback and the test backend.
///
/// Replay protection through this store is local to the process, which
/// is the documented degraded mode when no shared backend is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    used_codes: Mutex<Option<UsedCodes>>,
    link_flags: Mutex<HashMap<i64, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinkStore for MemoryStore {
    async fn load_used_codes(&self) -> Result<Option<UsedCodes>, StoreError> {
        Ok(self.used_codes.lock().unwrap().clone())
    }

    async fn save_used_codes(&self, codes: &UsedCodes) -> Result<(), StoreError> {
        *self.used_codes.lock().unwrap() = Some(codes.clone());
        Ok(())
    }

    async fn get_link_flag(&self, player_id: i64) -> Result<i64, StoreError> {
        Ok(self
            .link_flags
            .lock()
            .unwrap()
            .get(&player_id)
            .copied()
            .unwrap_or(0))
    }

    async fn set_link_flag(&self, player_id: i64, value: i64) -> Result<(), StoreError> {
        self.link_flags.lock().unwrap().insert(player_id, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::UsedCodeEntry;

    #[tokio::test]
    async fn test_memory_store_link_flag_roundtrip() {
        let store = MemoryStore::new();

        assert_eq!(store.get_link_flag(42).await.unwrap(), 0);
        store.set_link_flag(42, 1).await.unwrap();
        assert_eq!(store.get_link_flag(42).await.unwrap(), 1);
        // Other players unaffected
        assert_eq!(store.get_link_flag(7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_store_used_codes_roundtrip() {
        let store = MemoryStore::new();

        assert!(store.load_used_codes().await.unwrap().is_none());

        let mut codes = UsedCodes::new();
        codes.insert(
            "NXU15W".to_string(),
            UsedCodeEntry {
                username: "alice".to_string(),
                timestamp: 1_700_000_000_000,
            },
        );
        store.save_used_codes(&codes).await.unwrap();

        let loaded = store.load_used_codes().await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["NXU15W"].username, "alice");
    }
}
