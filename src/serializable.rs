//! The per-type read-method contract shared by components, assets and
//! value objects.

use serde_json::Value;

/// Reads one named member from its JSON node.
pub type ReadMethod<T> = fn(&mut T, &Value);

/// Ordered mapping from JSON key to the reader for that member.
pub type ReadMethodMap<T> = [(&'static str, ReadMethod<T>)];

/// An object whose fields are loaded key by key through a read-method map.
///
/// Implementors usually keep the map in an associated const:
///
/// ```ignore
/// impl ItemStack {
///     fn read_count(&mut self, json: &Value) { stream::read(&mut self.count, json); }
///     const READ_METHODS: &'static ReadMethodMap<Self> = &[("Count", Self::read_count)];
/// }
/// ```
pub trait Serializable {
    fn read_methods() -> &'static ReadMethodMap<Self>
    where
        Self: Sized;

    /// Runs once after every key of an object has been dispatched.
    fn after_load(&mut self) {}

    /// Writes every member under the keys the read-method map accepts.
    fn write(&self) -> Value;
}
