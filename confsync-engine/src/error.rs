//! Engine error types.
//!
//! None of these escape the public `sync`/`apply_resolved_config` entry
//! points as `Err`; the orchestrator folds them into a
//! [`SyncOutcome::Failed`](crate::SyncOutcome) with the display message.
//! Merge conflicts are not errors; they are a first-class outcome.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while driving a sync cycle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The named document (local, remote, resolved) is not a JSON object.
    #[error("{0} configuration is not a valid object")]
    InvalidDocument(String),

    /// The stored encryption preference is not one of `auto`, `sse`,
    /// `e2ee`. Detected before any network call.
    #[error("invalid encryption method '{0}' in local configuration (expected auto, sse, or e2ee)")]
    InvalidEncryptionMethod(String),

    /// The remote reports a client-side encryption version this engine
    /// does not understand.
    #[error("remote configuration uses unsupported encryption version {0}")]
    UnsupportedEncryptionVersion(u32),

    #[error("end-to-end encryption requires a PIN prompt, but none is configured")]
    MissingPinHandler,

    /// The PIN prompt returned nothing or an empty string (cancellation).
    #[error("no PIN provided")]
    InvalidPin,

    #[error("maximum PIN attempts exceeded")]
    MaxRetryExceeded,

    /// Optimistic-concurrency rejection that survived the automatic retry.
    #[error("remote configuration is changing too frequently, try again later")]
    RemoteConflict,

    /// Opaque transport failure (timeouts included), passed through.
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Crypto(#[from] confsync_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
