//! Sync orchestration for a locally-edited configuration document mirrored
//! to a single remote copy.
//!
//! The [`SyncManager`] drives one sync cycle:
//! fetch → decrypt → mask → three-way merge → push → snapshot commit.
//! Concurrent edits on both replicas are reconciled against the last
//! agreed [`Snapshot`] baseline; merges the engine cannot reconcile are
//! surfaced as a [`SyncOutcome::Conflict`] carrying a diff tree, and a
//! caller-chosen resolution re-enters through
//! [`SyncManager::apply_resolved_config`].
//!
//! The engine owns no I/O of its own beyond the snapshot and config files:
//! the network transport and the interactive PIN prompt are injected
//! behind the [`ConfigTransport`] and [`PinPrompt`] traits.
//!
//! A manager instance holds mutable cross-call state (tracked remote
//! version, the as-fetched remote, a cached DEK) and must not be invoked
//! concurrently; callers serialize `sync`/`apply_resolved_config` calls.

mod config;
mod error;
mod manager;
mod pin;
mod snapshot;
mod store;
mod transport;

pub use config::{EncryptionMode, EngineConfig, SyncOptions};
pub use error::{EngineError, EngineResult};
pub use manager::{SyncManager, SyncOutcome, MAX_PIN_ATTEMPTS, PUSH_CONFLICT_RETRIES};
pub use pin::{PinPrompt, PinReason};
pub use snapshot::{Snapshot, SnapshotStore};
pub use store::{JsonFileStore, LocalConfigStore};
pub use transport::{
    ConfigTransport, EncryptionFields, PushOutcome, RemoteConfig, RemoteEncryption,
};
