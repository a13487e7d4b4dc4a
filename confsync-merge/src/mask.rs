//! Locally-owned field masking.
//!
//! Some config paths are owned unilaterally by the local replica: the
//! stored access token, device-local preferences. The remote copy never
//! legitimately changes them, so they must not participate in conflict
//! detection, and the local values must never be transmitted in place of
//! what the remote already holds.

use confsync_value::Value;

/// Prepares a fetched remote document for merging: every owned path is
/// overwritten with the local replica's value (or removed when the local
/// document lacks it), so the merge engine never sees an owned field as
/// "changed on remote".
pub fn mask_for_merge(remote: &Value, local: &Value, owned_paths: &[String]) -> Value {
    overlay(remote, local, owned_paths, false)
}

/// Prepares a merged document for pushing: every owned path is restored
/// to whatever `original_remote` held (or removed when it held nothing),
/// so owned secrets never leak to the remote store.
///
/// With `cleanup_empty_parents`, ancestor objects emptied by a removal
/// are pruned rather than pushed as empty shells.
pub fn mask_for_push(
    merged: &Value,
    original_remote: &Value,
    owned_paths: &[String],
    cleanup_empty_parents: bool,
) -> Value {
    overlay(merged, original_remote, owned_paths, cleanup_empty_parents)
}

/// Copies `source`'s value at each path onto a clone of `target`,
/// deleting paths that `source` lacks.
fn overlay(target: &Value, source: &Value, paths: &[String], cleanup: bool) -> Value {
    let mut out = target.clone();
    for path in paths {
        match source.get_path(path) {
            Some(value) => out.set_path(path, value.clone()),
            None => {
                out.remove_path(path, cleanup);
            }
        }
    }
    out
}
