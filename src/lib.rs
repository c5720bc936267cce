//! HWLink - Discord account-link verification authority
//!
//! A Rust reimplementation of the HWLink server component: deterministic
//! shared-secret code verification, a global anti-replay ledger shared
//! across all instances of a world, and idempotent per-player link state.

/// Server configuration (world name, secret key, storage backend)
pub mod config;
/// Deterministic 6-character code derivation and comparison
pub mod code;
/// Used-code ledger: in-memory cache over the shared persistent store
pub mod ledger;
/// Persistence backends (in-memory, MySQL)
pub mod store;
/// Server implementations (link authority)
pub mod servers;
