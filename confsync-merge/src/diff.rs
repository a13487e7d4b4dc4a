//! Merge outcome and per-node diff reporting types.

use confsync_value::Value;
use serde::Serialize;

/// Per-node classification of snapshot vs merged value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStatus {
    /// No change relative to the snapshot baseline.
    Clean,
    /// Absent in the snapshot, present in the result.
    Added,
    /// Present in the snapshot, absent from the result.
    Deleted,
    /// Present on both sides with different content.
    Modified,
    /// Local and remote diverged in a way the engine cannot reconcile.
    Conflict,
}

/// One node of the "what changed" report, mirroring the object structure
/// of the merged inputs. Only non-`Clean` nodes are retained; a clean
/// subtree produces no node at all.
///
/// Conflict leaves carry all three input values so a caller (or a human)
/// can choose a resolution. Object nodes carry only their non-clean
/// children. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffNode {
    pub key: String,
    pub status: ConflictStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_value: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DiffNode>,
}

/// Result of a three-way merge.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeResult {
    /// The merged document. On conflict, conflicting nodes default to the
    /// local value so no local data is lost pending resolution.
    pub value: Value,
    /// True iff any node in the tree has status [`ConflictStatus::Conflict`].
    pub conflict: bool,
    /// The change report; `None` when the merge left everything clean.
    pub diff: Option<DiffNode>,
}
