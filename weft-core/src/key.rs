//! Type identities and domain markers.

use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    sync::{Mutex, OnceLock, PoisonError},
};

/// Identity of a Rust type, including `dyn Trait` capability types.
///
/// Equality and hashing only look at the [`TypeId`]; the name is carried
/// for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// The key of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name with every module path stripped.
    ///
    /// `dyn game::Living` becomes `dyn Living` and `(a::B, c::D)` becomes
    /// `(B, D)`.
    pub fn short_name(&self) -> &'static str {
        let name = self.name;
        if !name.contains(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':')) {
            return name.rsplit("::").next().unwrap_or(name);
        }

        // Compound names are stripped once per type and kept for the
        // lifetime of the process.
        static SHORT_NAMES: OnceLock<Mutex<HashMap<TypeId, &'static str>>> = OnceLock::new();
        let mut names = SHORT_NAMES
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *names
            .entry(self.id)
            .or_insert_with(|| -> &'static str { Box::leak(strip_paths(name).into_boxed_str()) })
    }

    /// Whether this key identifies `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

fn strip_paths(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut path_start = 0;
    let mut rest = name;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("::") {
            out.truncate(path_start);
            rest = tail;
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            path_start = out.len();
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Marks a type as participating in a binding domain.
///
/// The code loader routes each marked type to the domain registered under
/// the same marker. Custom domains pick their own name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainMarker(&'static str);

impl DomainMarker {
    /// Aspect interception.
    pub const ASPECT: Self = Self("aspect");
    /// Event subscription.
    pub const EVENT: Self = Self("event");
    /// Message (opcode) handling.
    pub const MESSAGE: Self = Self("message");
    /// Input handling.
    pub const INPUT: Self = Self("input");
    /// Dependency injection policy.
    pub const INJECT: Self = Self("inject");
    /// Object pool callbacks.
    pub const POOL: Self = Self("pool");
    /// Generic exported functions.
    pub const API: Self = Self("api");

    /// A marker for a custom domain.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The marker name.
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for DomainMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
