//! The recursive three-way merge.
//!
//! Decision order per node, first match wins:
//!
//! 1. local == remote            → no divergence; take local.
//! 2. snapshot == local          → only remote changed; take remote.
//! 3. snapshot == remote         → only local changed; take local.
//! 4. both sides are objects     → recurse per key over the union.
//! 5. otherwise                  → hard conflict; keep local pending
//!                                 resolution.
//!
//! Arrays are atomic: a divergent array is never recursed into and falls
//! through to rule 5. A type-shape change (object on one side, scalar or
//! array on the other) is likewise a rule-5 conflict.

use crate::diff::{ConflictStatus, DiffNode, MergeResult};
use confsync_value::{Object, Value, ValueKind};

const ROOT_KEY: &str = "root";

/// Merges `local` and `remote` against their common `snapshot` baseline.
///
/// Pure and deterministic: equal inputs always produce the identical
/// result, so a merge can be replayed after a failed push.
pub fn merge3(snapshot: &Value, local: &Value, remote: &Value) -> MergeResult {
    let entry = merge_entry(Some(snapshot), Some(local), Some(remote), ROOT_KEY);
    MergeResult {
        value: entry.value.unwrap_or_else(Value::null),
        conflict: entry.conflict,
        diff: entry.diff,
    }
}

/// Per-key merge outcome. `value: None` means "this key is absent from
/// the merged parent".
struct MergedEntry {
    value: Option<Value>,
    conflict: bool,
    diff: Option<DiffNode>,
}

fn merge_entry(
    snapshot: Option<&Value>,
    local: Option<&Value>,
    remote: Option<&Value>,
    key: &str,
) -> MergedEntry {
    // Rule 1: both sides agree. Whatever the snapshot says, there is
    // nothing to reconcile.
    if local == remote {
        let status = derive_status(snapshot, local);
        return MergedEntry {
            value: local.cloned(),
            conflict: false,
            diff: leaf(key, status, snapshot, local, remote),
        };
    }

    // Rule 2: only remote changed. Adopt remote, but graft local's node
    // annotations back on where content is unchanged, since comment metadata
    // only exists on the local in-memory tree.
    if snapshot == local {
        let value = remote.map(|r| adopt_remote(local, r));
        let status = derive_status(snapshot, value.as_ref());
        return MergedEntry {
            value,
            conflict: false,
            diff: leaf(key, status, snapshot, local, remote),
        };
    }

    // Rule 3: only local changed.
    if snapshot == remote {
        let status = derive_status(snapshot, local);
        return MergedEntry {
            value: local.cloned(),
            conflict: false,
            diff: leaf(key, status, snapshot, local, remote),
        };
    }

    // Rule 4: both changed but both are objects (and the snapshot is an
    // object, null, or absent): merge key-by-key.
    if let (Some(local_node), Some(remote_node)) = (local, remote) {
        if let (ValueKind::Object(local_obj), ValueKind::Object(remote_obj)) =
            (&local_node.kind, &remote_node.kind)
        {
            let snapshot_obj = match snapshot.map(|s| &s.kind) {
                Some(ValueKind::Object(obj)) => Some(obj),
                None | Some(ValueKind::Null) => None,
                _ => {
                    // Snapshot was a scalar or array: both sides changed
                    // its shape, possibly differently. Rule 5.
                    return conflict_entry(key, snapshot, local, remote);
                }
            };
            return merge_objects(
                snapshot_obj,
                local_obj,
                remote_obj,
                local_node,
                snapshot,
                key,
            );
        }
    }

    // Rule 5: incompatible divergence (scalar/array on at least one side).
    conflict_entry(key, snapshot, local, remote)
}

fn merge_objects(
    snapshot_obj: Option<&Object>,
    local_obj: &Object,
    remote_obj: &Object,
    local_node: &Value,
    snapshot: Option<&Value>,
    key: &str,
) -> MergedEntry {
    // Union of keys: local's order first, then remote's new keys, then
    // any snapshot-only keys. Order drives diff node ordering.
    let mut keys: Vec<&str> = local_obj.keys().collect();
    keys.extend(remote_obj.keys().filter(|k| !local_obj.contains_key(k)));
    if let Some(snap) = snapshot_obj {
        keys.extend(
            snap.keys()
                .filter(|k| !local_obj.contains_key(k) && !remote_obj.contains_key(k)),
        );
    }

    let mut merged = Object::new();
    let mut children = Vec::new();
    let mut conflict = false;

    for child_key in keys {
        let entry = merge_entry(
            snapshot_obj.and_then(|o| o.get(child_key)),
            local_obj.get(child_key),
            remote_obj.get(child_key),
            child_key,
        );
        conflict |= entry.conflict;
        if let Some(value) = entry.value {
            merged.insert(child_key.to_string(), value);
        }
        if let Some(node) = entry.diff {
            children.push(node);
        }
    }

    let mut value = Value::object(merged);
    value.annotation = local_node.annotation.clone();

    let status = if conflict {
        ConflictStatus::Conflict
    } else {
        derive_status(snapshot, Some(&value))
    };

    let diff = if status == ConflictStatus::Clean {
        None
    } else {
        Some(DiffNode {
            key: key.to_string(),
            status,
            snapshot_value: None,
            local_value: None,
            remote_value: None,
            children,
        })
    };

    MergedEntry {
        value: Some(value),
        conflict,
        diff,
    }
}

fn conflict_entry(
    key: &str,
    snapshot: Option<&Value>,
    local: Option<&Value>,
    remote: Option<&Value>,
) -> MergedEntry {
    MergedEntry {
        value: local.cloned(),
        conflict: true,
        diff: Some(DiffNode {
            key: key.to_string(),
            status: ConflictStatus::Conflict,
            snapshot_value: snapshot.cloned(),
            local_value: local.cloned(),
            remote_value: remote.cloned(),
            children: Vec::new(),
        }),
    }
}

/// Rebuilds a remote-won subtree, preferring remote's content but keeping
/// local's annotations wherever the content survived unchanged. Keys that
/// remote dropped are dropped.
fn adopt_remote(local: Option<&Value>, remote: &Value) -> Value {
    if let (Some(ValueKind::Object(local_obj)), ValueKind::Object(remote_obj)) =
        (local.map(|l| &l.kind), &remote.kind)
    {
        let mut out = Object::new();
        for (key, remote_child) in remote_obj.iter() {
            out.insert(
                key.to_string(),
                adopt_remote(local_obj.get(key), remote_child),
            );
        }
        let mut value = Value::object(out);
        value.annotation = local
            .and_then(|l| l.annotation.clone())
            .or_else(|| remote.annotation.clone());
        return value;
    }

    let mut value = remote.clone();
    if let Some(local_node) = local {
        if local_node == remote && local_node.annotation.is_some() {
            value.annotation = local_node.annotation.clone();
        }
    }
    value
}

/// Classifies a node by comparing the snapshot baseline with the final
/// merged value.
fn derive_status(snapshot: Option<&Value>, merged: Option<&Value>) -> ConflictStatus {
    match (snapshot, merged) {
        (None, None) => ConflictStatus::Clean,
        (Some(s), Some(m)) if s == m => ConflictStatus::Clean,
        (None, Some(_)) => ConflictStatus::Added,
        (Some(_), None) => ConflictStatus::Deleted,
        (Some(_), Some(_)) => ConflictStatus::Modified,
    }
}

/// Builds a leaf diff node, or nothing when the status is clean.
fn leaf(
    key: &str,
    status: ConflictStatus,
    snapshot: Option<&Value>,
    local: Option<&Value>,
    remote: Option<&Value>,
) -> Option<DiffNode> {
    if status == ConflictStatus::Clean {
        return None;
    }
    Some(DiffNode {
        key: key.to_string(),
        status,
        snapshot_value: snapshot.cloned(),
        local_value: local.cloned(),
        remote_value: remote.cloned(),
        children: Vec::new(),
    })
}
