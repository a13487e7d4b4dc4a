//! Versioned merge-base snapshot, persisted between sync runs.

use crate::error::EngineResult;
use chrono::{DateTime, Utc};
use confsync_value::Value;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// The last value both replicas are known to have agreed on, together
/// with the remote version it was committed at. Written whole at the end
/// of every successful sync; it is the commit record for "we are caught
/// up to remote version N with this content".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    pub data: Value,
}

impl Snapshot {
    /// Baseline for a replica that has never completed a sync.
    pub fn empty() -> Self {
        Self {
            version: 0,
            updated_at: Utc::now(),
            data: Value::empty_object(),
        }
    }
}

/// On-disk snapshot persistence.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the snapshot baseline.
    ///
    /// A missing file yields the empty version-0 baseline. A legacy file
    /// holding a bare value (no `version`/`data` wrapper) is accepted as
    /// version 0 with that value as data.
    pub async fn load(&self) -> EngineResult<Snapshot> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no snapshot at {}, starting from empty baseline", self.path.display());
                return Ok(Snapshot::empty());
            }
            Err(e) => return Err(e.into()),
        };

        let raw: serde_json::Value = serde_json::from_str(&text)?;
        let is_wrapper = raw
            .as_object()
            .map_or(false, |o| o.contains_key("version") && o.contains_key("data"));
        if is_wrapper {
            Ok(serde_json::from_value(raw)?)
        } else {
            Ok(Snapshot {
                version: 0,
                updated_at: Utc::now(),
                data: raw.into(),
            })
        }
    }

    /// Commits a new baseline, replacing any previous one.
    pub async fn save(&self, snapshot: &Snapshot) -> EngineResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let text = serde_json::to_string_pretty(snapshot)?;
        tokio::fs::write(&self.path, text).await?;
        debug!(
            version = snapshot.version,
            "snapshot committed to {}",
            self.path.display()
        );
        Ok(())
    }
}
