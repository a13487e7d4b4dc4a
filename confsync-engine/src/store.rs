//! The local plaintext configuration document.

use crate::error::EngineResult;
use async_trait::async_trait;
use confsync_value::Value;
use std::path::PathBuf;

/// Read/write access to the local configuration document.
///
/// The host application may back this with a commented-JSON parser that
/// attaches annotations to the returned tree; the engine carries those
/// annotations through merges and hands them back on write.
#[async_trait]
pub trait LocalConfigStore: Send + Sync {
    async fn read(&self) -> EngineResult<Value>;
    async fn write(&self, value: &Value) -> EngineResult<()>;
}

/// Plain-JSON file store. No annotations survive a round trip here;
/// hosts wanting comment preservation supply their own implementation.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LocalConfigStore for JsonFileStore {
    async fn read(&self) -> EngineResult<Value> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Value::empty_object());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&text)?)
    }

    async fn write(&self, value: &Value) -> EngineResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_string_pretty(value)?).await?;
        Ok(())
    }
}
