//! Dotted-path access into object trees.
//!
//! Paths like `"auth.accessToken"` address nested object keys. Array
//! indexing is deliberately unsupported: the merge engine treats arrays as
//! atomic, and the masking layer only ever addresses object fields.

use crate::{Object, Value, ValueKind};

impl Value {
    /// Resolves a dotted path, returning the node if every segment exists
    /// and every intermediate is an object.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            None => self.as_object()?.get(path),
            Some((head, rest)) => self.as_object()?.get(head)?.get_path(rest),
        }
    }

    /// Sets the value at a dotted path, creating intermediate objects as
    /// needed. A non-object intermediate (including this node itself) is
    /// replaced by an empty object.
    pub fn set_path(&mut self, path: &str, value: Value) {
        if !self.is_object() {
            self.kind = ValueKind::Object(Object::new());
        }
        match path.split_once('.') {
            None => {
                self.as_object_mut()
                    .expect("node was just made an object")
                    .insert(path.to_string(), value);
            }
            Some((head, rest)) => {
                let obj = self.as_object_mut().expect("node was just made an object");
                if !obj.get(head).map_or(false, Value::is_object) {
                    obj.insert(head.to_string(), Value::empty_object());
                }
                obj.get_mut(head)
                    .expect("intermediate was just inserted")
                    .set_path(rest, value);
            }
        }
    }

    /// Removes the value at a dotted path, returning it if it was present.
    ///
    /// With `cleanup_empty_parents`, intermediate objects left empty by the
    /// removal are themselves removed, bottom-up.
    pub fn remove_path(&mut self, path: &str, cleanup_empty_parents: bool) -> Option<Value> {
        let obj = self.as_object_mut()?;
        match path.split_once('.') {
            None => obj.remove(path),
            Some((head, rest)) => {
                let child = obj.get_mut(head)?;
                let removed = child.remove_path(rest, cleanup_empty_parents)?;
                if cleanup_empty_parents
                    && child.as_object().map_or(false, Object::is_empty)
                {
                    obj.remove(head);
                }
                Some(removed)
            }
        }
    }
}
