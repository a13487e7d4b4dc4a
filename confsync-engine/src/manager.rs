//! The sync orchestrator.
//!
//! One `sync()` call drives a full cycle:
//! read local → resolve encryption intent → load snapshot → fetch remote
//! → decrypt → mask → merge → (conflict: stop and report) → write local →
//! push → commit snapshot. `apply_resolved_config()` re-enters after a
//! caller has resolved a reported conflict; it pushes the resolution
//! without merging.
//!
//! All awaited I/O is sequential. The manager is deliberately `&mut self`
//! on both entry points: it carries cross-call state (tracked remote
//! version, the as-fetched remote, a cached DEK) that concurrent calls
//! would corrupt.

use crate::config::{EncryptionMode, EngineConfig, SyncOptions};
use crate::error::{EngineError, EngineResult};
use crate::pin::{PinPrompt, PinReason};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::store::LocalConfigStore;
use crate::transport::{
    ConfigTransport, EncryptionFields, PushOutcome, RemoteConfig, RemoteEncryption,
};
use chrono::Utc;
use confsync_crypto::{
    decode_salt, generate_payload, unwrap_dek, CryptoError, EncryptionVersion, SymmetricKey,
};
use confsync_merge::{mask_for_merge, mask_for_push, merge3, DiffNode};
use confsync_value::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Automatic full-cycle retries after an optimistic-concurrency push
/// rejection. Exactly one: the retry re-fetches and re-merges; a second
/// consecutive rejection is surfaced to the caller.
pub const PUSH_CONFLICT_RETRIES: u32 = 1;

/// Total PIN attempts allowed when unwrapping a DEK (one initial prompt
/// plus three retries).
pub const MAX_PIN_ATTEMPTS: u32 = 4;

/// Result of a sync cycle. Never an `Err`: failures arrive as `Failed`
/// with a human-readable message, and unresolvable merges as `Conflict`
/// with the diff tree for external resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncOutcome {
    Success { message: String },
    Conflict { diff: DiffNode },
    Failed { message: String },
}

/// DEK cached from a previous unwrap or envelope generation, keyed by the
/// exact wrapped-DEK string it came from. A rotation changes the wrapped
/// string and invalidates the cache implicitly.
struct CachedDek {
    wrapped: String,
    dek: SymmetricKey,
}

/// Per-instance mutable state. The remote-describing fields are reset at
/// the start of every `sync()`; the DEK cache intentionally survives.
#[derive(Default)]
struct SyncState {
    current_remote_version: u64,
    /// The as-fetched, decrypted remote, before masking. Needed later to
    /// restore remote-owned secret fields on push.
    original_remote: Option<Value>,
    remote_encryption: Option<RemoteEncryption>,
    cached_dek: Option<CachedDek>,
}

/// Drives sync cycles against one remote document.
pub struct SyncManager {
    transport: Arc<dyn ConfigTransport>,
    local_store: Arc<dyn LocalConfigStore>,
    snapshot_store: SnapshotStore,
    pin_prompt: Option<Arc<dyn PinPrompt>>,
    config: EngineConfig,
    state: SyncState,
}

/// Internal control flow for the push-conflict retry loop.
enum SyncStep {
    Done(SyncOutcome),
    PushRejected,
}

impl SyncManager {
    pub fn new(
        transport: Arc<dyn ConfigTransport>,
        local_store: Arc<dyn LocalConfigStore>,
        snapshot_store: SnapshotStore,
        config: EngineConfig,
    ) -> Self {
        Self {
            transport,
            local_store,
            snapshot_store,
            pin_prompt: None,
            config,
            state: SyncState::default(),
        }
    }

    /// Attaches the interactive PIN prompt used for end-to-end encryption.
    pub fn with_pin_prompt(mut self, prompt: Arc<dyn PinPrompt>) -> Self {
        self.pin_prompt = Some(prompt);
        self
    }

    /// Runs one sync cycle, retrying the whole cycle once if the push is
    /// rejected by optimistic concurrency.
    pub async fn sync(&mut self, options: &SyncOptions) -> SyncOutcome {
        let mut attempt = 0;
        loop {
            match self.sync_once(options).await {
                Ok(SyncStep::Done(outcome)) => return outcome,
                Ok(SyncStep::PushRejected) => {
                    if attempt < PUSH_CONFLICT_RETRIES {
                        attempt += 1;
                        debug!(
                            version = self.state.current_remote_version,
                            "push rejected, re-running sync cycle"
                        );
                        continue;
                    }
                    return SyncOutcome::Failed {
                        message: EngineError::RemoteConflict.to_string(),
                    };
                }
                Err(e) => {
                    warn!("sync failed: {e}");
                    return SyncOutcome::Failed {
                        message: e.to_string(),
                    };
                }
            }
        }
    }

    /// Pushes a caller-resolved configuration after a reported conflict.
    ///
    /// No merging happens here; the caller has already chosen the
    /// content. Locally-owned fields are still kept local, and the push
    /// is still masked against the original remote.
    pub async fn apply_resolved_config(
        &mut self,
        resolved: &Value,
        options: &SyncOptions,
    ) -> SyncOutcome {
        match self.apply_resolved_inner(resolved, options).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("applying resolved configuration failed: {e}");
                SyncOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn sync_once(&mut self, options: &SyncOptions) -> EngineResult<SyncStep> {
        // Remote-describing state is per-cycle; only the DEK cache
        // carries over.
        self.state.current_remote_version = 0;
        self.state.original_remote = None;
        self.state.remote_encryption = None;

        // 1. Local document.
        let mut local = self.local_store.read().await?;
        if !local.is_object() {
            return Err(EngineError::InvalidDocument("local".to_string()));
        }

        // 2. A forced intent is persisted before resolution so later
        // reads agree with it.
        if let Some(forced) = options.encryption {
            let stored = local
                .get_path(&self.config.encryption_mode_path)
                .and_then(Value::as_str);
            if stored != Some(forced.as_str()) {
                local.set_path(
                    &self.config.encryption_mode_path,
                    Value::string(forced.as_str()),
                );
                self.local_store.write(&local).await?;
            }
        }

        // 3. Effective intent: explicit > stored > auto. An unrecognized
        // stored value fails the cycle before any network call.
        let mode = self.resolve_mode(options, &local)?;

        // 4. Merge baseline.
        let snapshot = self.snapshot_store.load().await?;

        // 5. Remote document.
        let Some(remote_cfg) = self.transport.fetch_config().await? else {
            return self.seed_remote(&local, &snapshot, mode).await;
        };

        self.state.current_remote_version = remote_cfg.version;
        let (remote_value, remote_enc_version) = self.decode_remote(&remote_cfg).await?;
        self.state.original_remote = Some(remote_value.clone());
        self.state.remote_encryption = remote_cfg.encryption.clone();

        // 7. Locally-owned fields never look remote-changed.
        let effective_remote = mask_for_merge(&remote_value, &local, &self.config.owned_paths);
        let merged = merge3(&snapshot.data, &local, &effective_remote);
        if merged.conflict {
            info!("merge conflict detected, surfacing for resolution");
            let diff = merged
                .diff
                .expect("a conflicting merge always carries a diff");
            return Ok(SyncStep::Done(SyncOutcome::Conflict { diff }));
        }

        // 8. Write local if the merge changed it; push if the remote
        // must change (content or encryption state).
        if merged.value != local {
            debug!("merge changed the local document, writing it back");
            self.local_store.write(&merged.value).await?;
        }

        let push_candidate =
            mask_for_push(&merged.value, &remote_value, &self.config.owned_paths, true);

        let remote_encrypted = remote_enc_version == EncryptionVersion::V1;
        let want_encrypted = match mode {
            EncryptionMode::Auto => remote_encrypted,
            EncryptionMode::E2ee => true,
            EncryptionMode::Sse => false,
        };

        if want_encrypted != remote_encrypted || push_candidate != remote_value {
            let document = serde_json::to_string(&push_candidate)?;
            let (payload, fields) = self.build_push_payload(&document, want_encrypted).await?;
            match self
                .transport
                .update_config(&payload, self.state.current_remote_version, &fields)
                .await?
            {
                PushOutcome::Accepted { version } => {
                    debug!(version, "push accepted");
                    self.state.current_remote_version = version;
                    self.record_pushed_encryption(&fields);
                }
                PushOutcome::Conflict { current_version } => {
                    self.state.current_remote_version = current_version;
                    return Ok(SyncStep::PushRejected);
                }
            }
        }

        // 9. Commit the new baseline.
        self.snapshot_store
            .save(&Snapshot {
                version: self.state.current_remote_version,
                updated_at: Utc::now(),
                data: merged.value,
            })
            .await?;
        info!(
            version = self.state.current_remote_version,
            "sync completed"
        );
        Ok(SyncStep::Done(SyncOutcome::Success {
            message: "configuration synchronized".to_string(),
        }))
    }

    /// The remote never existed or was deleted: local is the truth.
    /// Identical behavior either way; only the success message differs.
    async fn seed_remote(
        &mut self,
        local: &Value,
        snapshot: &Snapshot,
        mode: EncryptionMode,
    ) -> EngineResult<SyncStep> {
        info!("no remote configuration found, seeding from local");

        // Owned secrets are stripped even on first seed: masked against
        // an empty remote they simply vanish from the payload.
        let empty = Value::empty_object();
        let push_value = mask_for_push(local, &empty, &self.config.owned_paths, true);

        let want_encrypted = mode == EncryptionMode::E2ee;
        let document = serde_json::to_string(&push_value)?;
        let (payload, fields) = self.build_push_payload(&document, want_encrypted).await?;

        match self.transport.update_config(&payload, 0, &fields).await? {
            PushOutcome::Conflict { current_version } => {
                self.state.current_remote_version = current_version;
                Ok(SyncStep::PushRejected)
            }
            PushOutcome::Accepted { version } => {
                self.state.current_remote_version = version;
                self.record_pushed_encryption(&fields);

                let message = if snapshot.version == 0 {
                    "initialized remote configuration from local"
                } else {
                    "re-seeded remote configuration after remote loss"
                };
                self.snapshot_store
                    .save(&Snapshot {
                        version,
                        updated_at: Utc::now(),
                        data: local.clone(),
                    })
                    .await?;
                info!(version, "{message}");
                Ok(SyncStep::Done(SyncOutcome::Success {
                    message: message.to_string(),
                }))
            }
        }
    }

    async fn apply_resolved_inner(
        &mut self,
        resolved: &Value,
        options: &SyncOptions,
    ) -> EngineResult<SyncOutcome> {
        if !resolved.is_object() {
            return Err(EngineError::InvalidDocument("resolved".to_string()));
        }
        let local = self.local_store.read().await?;
        if !local.is_object() {
            return Err(EngineError::InvalidDocument("local".to_string()));
        }

        // The resolution decides shared content; locally-owned fields
        // keep their current on-disk values.
        let disk_value = mask_for_merge(resolved, &local, &self.config.owned_paths);
        self.local_store.write(&disk_value).await?;

        // Original remote from the immediately preceding sync, or a
        // fresh fetch when applied cold.
        let original_remote = match self.state.original_remote.clone() {
            Some(value) => value,
            None => match self.transport.fetch_config().await? {
                Some(remote_cfg) => {
                    self.state.current_remote_version = remote_cfg.version;
                    let (value, _) = self.decode_remote(&remote_cfg).await?;
                    self.state.remote_encryption = remote_cfg.encryption.clone();
                    value
                }
                None => {
                    self.state.current_remote_version = 0;
                    Value::empty_object()
                }
            },
        };

        let push_value =
            mask_for_push(&disk_value, &original_remote, &self.config.owned_paths, true);
        let want_encrypted = match options.encryption {
            Some(EncryptionMode::E2ee) => true,
            Some(EncryptionMode::Sse) => false,
            Some(EncryptionMode::Auto) | None => self
                .state
                .remote_encryption
                .as_ref()
                .map_or(false, |e| e.version == EncryptionVersion::V1.wire()),
        };

        let document = serde_json::to_string(&push_value)?;
        let (payload, fields) = self.build_push_payload(&document, want_encrypted).await?;
        match self
            .transport
            .update_config(&payload, self.state.current_remote_version, &fields)
            .await?
        {
            // No automatic retry here: there is no merge to re-run, the
            // caller must look at the newer remote first.
            PushOutcome::Conflict { current_version } => {
                self.state.current_remote_version = current_version;
                Err(EngineError::RemoteConflict)
            }
            PushOutcome::Accepted { version } => {
                self.state.current_remote_version = version;
                self.record_pushed_encryption(&fields);
                self.snapshot_store
                    .save(&Snapshot {
                        version,
                        updated_at: Utc::now(),
                        data: disk_value,
                    })
                    .await?;
                info!(version, "resolved configuration applied");
                Ok(SyncOutcome::Success {
                    message: "resolved configuration applied".to_string(),
                })
            }
        }
    }

    fn resolve_mode(
        &self,
        options: &SyncOptions,
        local: &Value,
    ) -> EngineResult<EncryptionMode> {
        if let Some(mode) = options.encryption {
            return Ok(mode);
        }
        match local.get_path(&self.config.encryption_mode_path) {
            None => Ok(EncryptionMode::Auto),
            Some(stored) => {
                let text = stored.as_str().unwrap_or_default();
                EncryptionMode::parse(text)
                    .ok_or_else(|| EngineError::InvalidEncryptionMethod(text.to_string()))
            }
        }
    }

    /// Decrypts and parses a fetched remote document.
    async fn decode_remote(
        &mut self,
        remote: &RemoteConfig,
    ) -> EngineResult<(Value, EncryptionVersion)> {
        let (enc_version, text) = match &remote.encryption {
            None => (EncryptionVersion::None, remote.config.clone()),
            Some(enc) => {
                let version = EncryptionVersion::from_wire(enc.version)
                    .ok_or(EngineError::UnsupportedEncryptionVersion(enc.version))?;
                match version {
                    EncryptionVersion::None => (version, remote.config.clone()),
                    EncryptionVersion::V1 => {
                        let dek = self.ensure_dek(&enc.salt, &enc.wrapped_dek).await?;
                        (version, confsync_crypto::decrypt(&remote.config, &dek)?)
                    }
                }
            }
        };

        let value: Value = serde_json::from_str(&text)?;
        if !value.is_object() {
            return Err(EngineError::InvalidDocument("remote".to_string()));
        }
        Ok((value, enc_version))
    }

    /// Obtains the DEK for an encrypted remote, from cache or by
    /// prompting for the PIN with bounded retries.
    async fn ensure_dek(
        &mut self,
        salt_b64: &str,
        wrapped_dek: &str,
    ) -> EngineResult<SymmetricKey> {
        if let Some(cached) = &self.state.cached_dek {
            if cached.wrapped == wrapped_dek {
                return Ok(cached.dek.clone());
            }
        }

        let prompt = self
            .pin_prompt
            .clone()
            .ok_or(EngineError::MissingPinHandler)?;
        let salt = decode_salt(salt_b64)?;

        for attempt in 0..MAX_PIN_ATTEMPTS {
            let reason = if attempt == 0 {
                PinReason::Decrypt
            } else {
                PinReason::Retry
            };
            let pin = match prompt.ask_pin(reason, attempt).await {
                Some(pin) if !pin.is_empty() => pin,
                _ => return Err(EngineError::InvalidPin),
            };

            match unwrap_dek(wrapped_dek, &pin, &salt) {
                Ok(dek) => {
                    self.state.cached_dek = Some(CachedDek {
                        wrapped: wrapped_dek.to_string(),
                        dek: dek.clone(),
                    });
                    return Ok(dek);
                }
                Err(CryptoError::DecryptionFailed) => {
                    warn!(attempt, "PIN attempt failed");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(EngineError::MaxRetryExceeded)
    }

    /// Builds the wire payload for a push: plaintext, re-encryption under
    /// the remote's existing DEK, or a brand-new envelope.
    async fn build_push_payload(
        &mut self,
        document: &str,
        want_encrypted: bool,
    ) -> EngineResult<(String, EncryptionFields)> {
        if !want_encrypted {
            return Ok((document.to_string(), EncryptionFields::plaintext()));
        }

        let existing = self
            .state
            .remote_encryption
            .clone()
            .filter(|e| e.version == EncryptionVersion::V1.wire());

        if let Some(enc) = existing {
            // Same DEK, same wrapped blob: no rotation, and the cache
            // means no extra prompt after a decrypt in the same cycle.
            let dek = self.ensure_dek(&enc.salt, &enc.wrapped_dek).await?;
            let ciphertext = confsync_crypto::encrypt(document, &dek)?;
            let fields = EncryptionFields {
                version: EncryptionVersion::V1.wire(),
                salt: Some(enc.salt),
                wrapped_dek: Some(enc.wrapped_dek),
            };
            return Ok((ciphertext, fields));
        }

        // No remote E2E state yet: choose a new PIN, fresh envelope.
        let prompt = self
            .pin_prompt
            .clone()
            .ok_or(EngineError::MissingPinHandler)?;
        let pin = match prompt.ask_pin(PinReason::Setup, 0).await {
            Some(pin) if !pin.is_empty() => pin,
            _ => return Err(EngineError::InvalidPin),
        };

        let (envelope, dek) = generate_payload(document, &pin)?;
        self.state.cached_dek = Some(CachedDek {
            wrapped: envelope.wrapped_dek.clone(),
            dek,
        });
        let fields = EncryptionFields {
            version: envelope.version.wire(),
            salt: Some(envelope.salt),
            wrapped_dek: Some(envelope.wrapped_dek),
        };
        Ok((envelope.ciphertext, fields))
    }

    /// Tracks what the remote's encryption state became after an
    /// accepted push, so a follow-up call in this instance agrees.
    fn record_pushed_encryption(&mut self, fields: &EncryptionFields) {
        self.state.remote_encryption = match (&fields.salt, &fields.wrapped_dek) {
            (Some(salt), Some(wrapped_dek))
                if fields.version == EncryptionVersion::V1.wire() =>
            {
                Some(RemoteEncryption {
                    version: fields.version,
                    salt: salt.clone(),
                    wrapped_dek: wrapped_dek.clone(),
                })
            }
            _ => None,
        };
    }
}
