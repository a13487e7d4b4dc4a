//! Document value model for confsync.
//!
//! Configuration documents, snapshot baselines, and merge diffs all share
//! one tree type: [`Value`], a tagged union over the JSON shapes with
//! insertion-ordered object keys.
//!
//! Two properties matter for sync correctness:
//!
//! 1. **Equality is structural.** Two values compare equal when their data
//!    is deeply equal. Object key *order* does not affect equality (it only
//!    drives iteration order, which the diff builder relies on), and node
//!    annotations never affect equality.
//! 2. **Annotations ride along.** A node may carry an opaque [`Annotation`]
//!    (comment/formatting metadata recovered from a commented document).
//!    The engine never inspects it; it clones with the node and the merge
//!    engine carries it across clean merges. Annotations are in-memory
//!    only and are dropped when a value is serialized to the wire.

mod object;
mod path;
mod value;

pub use object::Object;
pub use value::{Annotation, Value, ValueKind};
