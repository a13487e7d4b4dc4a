//! Three-way merge and field masking for config sync.
//!
//! [`merge3`] is a pure, deterministic function over
//! `{snapshot, local, remote}` document trees. It either produces a merged
//! value (auto-merge) or flags a conflict and reports the divergence as a
//! [`DiffNode`] tree for external resolution. A single `sync` run detects
//! at most one conflict result; the diff tree carries every conflicting
//! node at once.
//!
//! The [`mask`] module keeps locally-owned fields (secrets, device-local
//! preferences) out of merge comparison and out of pushed payloads.

mod diff;
pub mod mask;
mod merge;

pub use diff::{ConflictStatus, DiffNode, MergeResult};
pub use mask::{mask_for_merge, mask_for_push};
pub use merge::merge3;
