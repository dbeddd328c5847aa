use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Identity of a cacheable blob.
///
/// Two keys that compare equal address the same entry. A key's
/// [`dependencies`](Self::dependencies) name the "more primitive" keys it is
/// derived from: invalidating any of them also invalidates this key, and so
/// on transitively.
///
/// Dependencies must never include the key itself and must not form cycles.
/// That would be a bug in how keys are built, not something the store
/// attempts to survive.
///
/// # Examples
///
/// ```
/// use gallery_store::CacheKey;
///
/// #[derive(Clone, Debug, PartialEq, Eq, Hash, derive_more::Display)]
/// enum Key {
///     #[display("{_0}")]
///     Original(String),
///     #[display("{_0} x {_1}")]
///     Repeated(String, usize),
/// }
///
/// impl CacheKey for Key {
///     fn dependencies(&self) -> Vec<Self> {
///         match self {
///             Key::Original(_) => vec![],
///             Key::Repeated(name, _) => vec![Key::Original(name.clone())],
///         }
///     }
/// }
/// ```
pub trait CacheKey: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static {
    /// Keys whose invalidation must cascade to this one.
    fn dependencies(&self) -> Vec<Self>;
}
