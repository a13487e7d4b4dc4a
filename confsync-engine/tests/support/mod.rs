//! In-memory fakes for the transport, local store, and PIN prompt seams.
#![allow(dead_code)]

use async_trait::async_trait;
use confsync_engine::{
    ConfigTransport, EncryptionFields, EngineResult, LocalConfigStore, PinPrompt, PinReason,
    PushOutcome, RemoteConfig, RemoteEncryption, SnapshotStore,
};
use confsync_value::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, Once};
use tempfile::TempDir;

/// Routes engine logs to the test writer, honoring `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Builds a `Value` tree from a `serde_json::json!` literal.
pub fn value(json: serde_json::Value) -> Value {
    Value::from(json)
}

/// A snapshot store backed by a fresh temp directory. The directory guard
/// must outlive the store.
pub fn temp_snapshot_store() -> (TempDir, SnapshotStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = SnapshotStore::new(dir.path().join("snapshot.json"));
    (dir, store)
}

/// One recorded `update_config` call, accepted or not.
#[derive(Clone, Debug)]
pub struct PushRecord {
    pub document: String,
    pub base_version: u64,
    pub encryption: EncryptionFields,
}

struct TransportState {
    remote: Option<RemoteConfig>,
    /// Number of upcoming pushes to reject with a version bump, as if a
    /// concurrent writer got there first.
    scripted_conflicts: u32,
    fetch_count: u32,
    pushes: Vec<PushRecord>,
}

/// In-memory remote config store with optimistic concurrency.
pub struct MemoryTransport {
    state: Mutex<TransportState>,
}

impl MemoryTransport {
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(TransportState {
                remote: None,
                scripted_conflicts: 0,
                fetch_count: 0,
                pushes: Vec::new(),
            }),
        }
    }

    pub fn with_remote(version: u64, config: &str, encryption: Option<RemoteEncryption>) -> Self {
        let transport = Self::empty();
        transport.state.lock().unwrap().remote = Some(RemoteConfig {
            version,
            config: config.to_string(),
            encryption,
        });
        transport
    }

    pub fn reject_next_pushes(&self, count: u32) {
        self.state.lock().unwrap().scripted_conflicts = count;
    }

    pub fn fetch_count(&self) -> u32 {
        self.state.lock().unwrap().fetch_count
    }

    pub fn pushes(&self) -> Vec<PushRecord> {
        self.state.lock().unwrap().pushes.clone()
    }

    pub fn remote(&self) -> Option<RemoteConfig> {
        self.state.lock().unwrap().remote.clone()
    }
}

#[async_trait]
impl ConfigTransport for MemoryTransport {
    async fn fetch_config(&self) -> EngineResult<Option<RemoteConfig>> {
        let mut state = self.state.lock().unwrap();
        state.fetch_count += 1;
        Ok(state.remote.clone())
    }

    async fn update_config(
        &self,
        document: &str,
        base_version: u64,
        encryption: &EncryptionFields,
    ) -> EngineResult<PushOutcome> {
        let mut state = self.state.lock().unwrap();
        state.pushes.push(PushRecord {
            document: document.to_string(),
            base_version,
            encryption: encryption.clone(),
        });

        if state.scripted_conflicts > 0 {
            state.scripted_conflicts -= 1;
            // Simulate another writer landing first: same content, newer
            // version.
            let current = match &mut state.remote {
                Some(remote) => {
                    remote.version += 1;
                    remote.version
                }
                None => 0,
            };
            return Ok(PushOutcome::Conflict {
                current_version: current,
            });
        }

        let current = state.remote.as_ref().map_or(0, |r| r.version);
        if base_version != current {
            return Ok(PushOutcome::Conflict {
                current_version: current,
            });
        }

        let version = current + 1;
        let remote_encryption = match (&encryption.salt, &encryption.wrapped_dek) {
            (Some(salt), Some(wrapped_dek)) if encryption.version == 1 => {
                Some(RemoteEncryption {
                    version: encryption.version,
                    salt: salt.clone(),
                    wrapped_dek: wrapped_dek.clone(),
                })
            }
            _ => None,
        };
        state.remote = Some(RemoteConfig {
            version,
            config: document.to_string(),
            encryption: remote_encryption,
        });
        Ok(PushOutcome::Accepted { version })
    }
}

/// In-memory local config document with a write counter.
pub struct MemoryConfigStore {
    value: Mutex<Value>,
    write_count: Mutex<u32>,
}

impl MemoryConfigStore {
    pub fn new(initial: Value) -> Self {
        Self {
            value: Mutex::new(initial),
            write_count: Mutex::new(0),
        }
    }

    pub fn value(&self) -> Value {
        self.value.lock().unwrap().clone()
    }

    pub fn set_value(&self, value: Value) {
        *self.value.lock().unwrap() = value;
    }

    pub fn write_count(&self) -> u32 {
        *self.write_count.lock().unwrap()
    }
}

#[async_trait]
impl LocalConfigStore for MemoryConfigStore {
    async fn read(&self) -> EngineResult<Value> {
        Ok(self.value.lock().unwrap().clone())
    }

    async fn write(&self, value: &Value) -> EngineResult<()> {
        *self.value.lock().unwrap() = value.clone();
        *self.write_count.lock().unwrap() += 1;
        Ok(())
    }
}

/// PIN prompt answering from a scripted queue and logging every call.
pub struct ScriptedPinPrompt {
    responses: Mutex<VecDeque<Option<String>>>,
    calls: Mutex<Vec<(PinReason, u32)>>,
}

impl ScriptedPinPrompt {
    pub fn new(responses: Vec<Option<&str>>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(PinReason, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PinPrompt for ScriptedPinPrompt {
    async fn ask_pin(&self, reason: PinReason, attempt: u32) -> Option<String> {
        self.calls.lock().unwrap().push((reason, attempt));
        self.responses.lock().unwrap().pop_front().flatten()
    }
}
