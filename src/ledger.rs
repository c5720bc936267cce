//! Used-code ledger
//!
//! Global append-only record of consumed codes, shared across every
//! running instance of the same world through the persistent store. A
//! code, once present, never authenticates anyone again until an
//! operator clears the whole ledger.
//!
//! The ledger is a read-through/write-through cache: loaded once (lazily
//! on first use), and every mutation writes the full updated map back to
//! the store before the cache is considered current. Store failures flip
//! an explicit `degraded` flag and the ledger keeps working in-memory
//! only - replay protection weakens to this process instead of failing
//! the player's request.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::code;
use crate::store::{LinkStore, StoreError};

/// Who consumed a code, and when (epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedCodeEntry {
    pub username: String,
    pub timestamp: i64,
}

/// The persisted shape: normalized code -> consumption record.
pub type UsedCodes = HashMap<String, UsedCodeEntry>;

/// In-process view of the shared used-code map.
#[derive(Debug, Default)]
pub struct Ledger {
    cache: Option<UsedCodes>,
    degraded: bool,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the shared map into the cache if not yet loaded. Store
    /// keys are normalized on the way in; entries with garbage keys are
    /// kept under their uppercased form, matching the issuer contract.
    pub async fn ensure_loaded<S: LinkStore>(&mut self, store: &S) {
        if self.cache.is_some() {
            return;
        }
        match store.load_used_codes().await {
            Ok(Some(stored)) => {
                let mut normalized = UsedCodes::with_capacity(stored.len());
                for (raw_code, entry) in stored {
                    normalized.insert(code::normalize(&raw_code), entry);
                }
                tracing::info!("[link] [ledger_loaded] codes={}", normalized.len());
                self.cache = Some(normalized);
            }
            Ok(None) => {
                self.cache = Some(UsedCodes::new());
            }
            Err(e) => {
                tracing::warn!("[link] [ledger_load_failed] {} - replay protection is local-only", e);
                self.cache = Some(UsedCodes::new());
                self.degraded = true;
            }
        }
    }

    /// True if `code` (any case) has already been consumed. An unloaded
    /// ledger or empty code reads as unused.
    pub fn is_used(&self, code: &str) -> bool {
        if code.is_empty() {
            return false;
        }
        match &self.cache {
            Some(cache) => cache.contains_key(&code::normalize(code)),
            None => false,
        }
    }

    /// Records `code` as consumed by `username` and writes the full
    /// updated map back to the shared store.
    ///
    /// The write-back is read-modify-write over the whole map with no
    /// concurrency token: concurrent writers from other instances are
    /// last-writer-wins, a known limitation carried over from the
    /// original system. A failed write degrades to in-memory-only; the
    /// local cache is updated either way so this instance never re-accepts
    /// the code.
    pub async fn mark_used<S: LinkStore>(&mut self, store: &S, code: &str, username: &str) {
        let normalized = code::normalize(code);
        let mut updated = self.cache.clone().unwrap_or_default();
        updated.insert(
            normalized.clone(),
            UsedCodeEntry {
                username: username.to_string(),
                timestamp: Utc::now().timestamp_millis(),
            },
        );

        match store.save_used_codes(&updated).await {
            Ok(()) => {
                tracing::info!("[link] [code_marked_used] code={} username={}", normalized, username);
            }
            Err(e) => {
                tracing::warn!("[link] [ledger_save_failed] {} - used code not persisted", e);
                self.degraded = true;
            }
        }
        self.cache = Some(updated);
    }

    /// Empties the whole shared ledger. Returns the number of entries
    /// cleared. The cache is only cleared when the store write succeeds;
    /// a failed clear leaves replay protection intact.
    pub async fn clear_all<S: LinkStore>(&mut self, store: &S) -> Result<usize, StoreError> {
        let count = self.cache.as_ref().map(|c| c.len()).unwrap_or(0);
        store.save_used_codes(&UsedCodes::new()).await?;
        self.cache = Some(UsedCodes::new());
        tracing::info!("[link] [ledger_cleared] codes={}", count);
        Ok(count)
    }

    /// Number of consumed codes currently cached.
    pub fn len(&self) -> usize {
        self.cache.as_ref().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once any store operation has failed and the ledger is
    /// running in-memory only.
    pub fn degraded(&self) -> bool {
        self.degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    /// Store that rejects every operation, for outage testing.
    struct DeadStore;

    impl LinkStore for DeadStore {
        async fn load_used_codes(&self) -> Result<Option<UsedCodes>, StoreError> {
            Err(StoreError::Unavailable("dead".into()))
        }
        async fn save_used_codes(&self, _codes: &UsedCodes) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("dead".into()))
        }
        async fn get_link_flag(&self, _player_id: i64) -> Result<i64, StoreError> {
            Err(StoreError::Unavailable("dead".into()))
        }
        async fn set_link_flag(&self, _player_id: i64, _value: i64) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("dead".into()))
        }
    }

    #[tokio::test]
    async fn test_mark_and_check() {
        let store = MemoryStore::new();
        let mut ledger = Ledger::new();
        ledger.ensure_loaded(&store).await;

        assert!(!ledger.is_used("NXU15W"));
        ledger.mark_used(&store, "NXU15W", "alice").await;
        assert!(ledger.is_used("NXU15W"));
        // lookup is case-insensitive
        assert!(ledger.is_used("nxu15w"));
        assert!(!ledger.degraded());
    }

    #[tokio::test]
    async fn test_mark_persists_to_store() {
        let store = MemoryStore::new();
        {
            let mut ledger = Ledger::new();
            ledger.ensure_loaded(&store).await;
            ledger.mark_used(&store, "nxu15w", "alice").await;
        }

        // A fresh ledger (fresh instance) sees the shared state.
        let mut ledger = Ledger::new();
        ledger.ensure_loaded(&store).await;
        assert!(ledger.is_used("NXU15W"));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_load_normalizes_stored_keys() {
        let store = MemoryStore::new();
        let mut seeded = UsedCodes::new();
        seeded.insert(
            "abC123".to_string(),
            UsedCodeEntry { username: "bob".to_string(), timestamp: 0 },
        );
        store.save_used_codes(&seeded).await.unwrap();

        let mut ledger = Ledger::new();
        ledger.ensure_loaded(&store).await;
        assert!(ledger.is_used("ABC123"));
    }

    #[tokio::test]
    async fn test_empty_code_never_used() {
        let store = MemoryStore::new();
        let mut ledger = Ledger::new();
        ledger.ensure_loaded(&store).await;
        assert!(!ledger.is_used(""));
    }

    #[tokio::test]
    async fn test_unloaded_ledger_reads_unused() {
        let ledger = Ledger::new();
        assert!(!ledger.is_used("NXU15W"));
    }

    #[tokio::test]
    async fn test_clear_all_reports_count() {
        let store = MemoryStore::new();
        let mut ledger = Ledger::new();
        ledger.ensure_loaded(&store).await;
        ledger.mark_used(&store, "AAA111", "a").await;
        ledger.mark_used(&store, "BBB222", "b").await;

        let cleared = ledger.clear_all(&store).await.unwrap();
        assert_eq!(cleared, 2);
        assert!(!ledger.is_used("AAA111"));
        assert_eq!(store.load_used_codes().await.unwrap().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_dead_store_degrades_but_still_tracks() {
        let store = DeadStore;
        let mut ledger = Ledger::new();
        ledger.ensure_loaded(&store).await;
        assert!(ledger.degraded());

        // Marks still take effect locally, nothing escapes the ledger.
        ledger.mark_used(&store, "NXU15W", "alice").await;
        assert!(ledger.is_used("NXU15W"));
    }

    #[tokio::test]
    async fn test_dead_store_clear_fails_and_keeps_cache() {
        let live = MemoryStore::new();
        let mut ledger = Ledger::new();
        ledger.ensure_loaded(&live).await;
        ledger.mark_used(&live, "NXU15W", "alice").await;

        let result = ledger.clear_all(&DeadStore).await;
        assert!(result.is_err());
        assert!(ledger.is_used("NXU15W"));
    }
}
