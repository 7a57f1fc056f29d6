use std::fmt::Display;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Ordered argument representations produced by a key-mapping function.
///
/// A mapper reduces a call's actual arguments to the parts that define its
/// cache identity. Parts are rendered up front, so values only need to be
/// `Display`; anything without a stable textual form must be reduced by the
/// mapper before it gets here. Positional and named parts are kept in the
/// order they are added, and a call that passes a value positionally keys
/// differently from one that passes it by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappedArgs {
    parts: Vec<String>,
}

impl MappedArgs {
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Display) -> Self {
        self.parts.push(value.to_string());
        self
    }

    /// Append a named `name=value` argument.
    pub fn named(mut self, name: &str, value: impl Display) -> Self {
        self.parts.push(format!("{}={}", name, value));
        self
    }

    /// Render the parts as a single comma-separated list.
    pub fn render(&self) -> String {
        self.parts.join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Render a namespace and its mapped arguments as a human-legible key,
/// e.g. `add(1, 2, scale=10)`. This is the key form used by persistent
/// backends, where the key doubles as a storage locator.
pub fn legible_key(namespace: &str, args: &MappedArgs) -> String {
    format!("{}({})", namespace, args.render())
}

/// Hash-derived key for in-memory caches.
///
/// Combines a hash of the namespace with a hash of the rendered argument
/// list. Collisions are accepted as negligibly probable; persistent backends
/// use [`legible_key`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransientKey(u64);

impl TransientKey {
    pub fn derive(namespace: &str, args: &MappedArgs) -> Self {
        let mut hasher = DefaultHasher::new();
        namespace.hash(&mut hasher);
        args.render().hash(&mut hasher);
        Self(hasher.finish())
    }
}
