//! The transport seam to the remote config store.
//!
//! The engine never talks to the network itself; a [`ConfigTransport`]
//! implementation (HTTP client, test fake) performs the actual calls and
//! reports structured results, including optimistic-concurrency
//! rejections.

use crate::error::EngineResult;
use async_trait::async_trait;

/// Remote operations the engine depends on.
#[async_trait]
pub trait ConfigTransport: Send + Sync {
    /// Fetches the remote document. `None` means no remote document
    /// exists (never created, or deleted).
    async fn fetch_config(&self) -> EngineResult<Option<RemoteConfig>>;

    /// Writes `document` if the remote is still at `base_version`;
    /// otherwise reports the conflict with the remote's current version.
    async fn update_config(
        &self,
        document: &str,
        base_version: u64,
        encryption: &EncryptionFields,
    ) -> EngineResult<PushOutcome>;
}

/// A fetched remote document. `config` is either plaintext JSON or a
/// base64 ciphertext, depending on `encryption`.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub version: u64,
    pub config: String,
    pub encryption: Option<RemoteEncryption>,
}

/// Remote-reported client-side encryption state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteEncryption {
    pub version: u32,
    pub salt: String,
    pub wrapped_dek: String,
}

/// Encryption fields accompanying a push.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptionFields {
    pub version: u32,
    pub salt: Option<String>,
    pub wrapped_dek: Option<String>,
}

impl EncryptionFields {
    pub fn plaintext() -> Self {
        Self {
            version: 0,
            salt: None,
            wrapped_dek: None,
        }
    }
}

/// Outcome of an optimistic-concurrency push.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Accepted { version: u64 },
    Conflict { current_version: u64 },
}
