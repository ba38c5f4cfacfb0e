//! Static registration table for type symbols.
//!
//! Types are never discovered at runtime. Each one is registered with a
//! builder that produces its [`ClassSymbol`]; the table runs the builder
//! lazily, exactly once, and hands out the cached snapshot until the entry
//! is invalidated (hot reload) or replaced.
//!
//! With the `inventory` feature, modules can submit a [`SymbolSource`]
//! from anywhere in the program and [`SymbolTable::collect`] gathers them.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};
use weft_core::{ClassSymbol, MethodSymbol, TypeKey};

type SymbolBuilder = Arc<dyn Fn() -> ClassSymbol + Send + Sync + 'static>;

/// A statically declared symbol builder.
///
/// # Example
///
/// ```rust,ignore
/// fn describe_player() -> ClassSymbol { ... }
///
/// inventory::submit! { SymbolSource::of::<Player>(describe_player) }
/// ```
#[derive(Clone, Copy)]
pub struct SymbolSource {
    key: fn() -> TypeKey,
    build: fn() -> ClassSymbol,
}

impl SymbolSource {
    /// A source describing `T`.
    pub const fn of<T: ?Sized + 'static>(build: fn() -> ClassSymbol) -> Self {
        Self {
            key: TypeKey::of::<T>,
            build,
        }
    }

    /// The described type.
    pub fn key(&self) -> TypeKey {
        (self.key)()
    }

    /// Run the builder.
    pub fn build(&self) -> ClassSymbol {
        (self.build)()
    }
}

#[cfg(feature = "inventory")]
inventory::collect!(SymbolSource);

struct SymbolSlot {
    builder: SymbolBuilder,
    cached: OnceLock<Arc<ClassSymbol>>,
}

impl SymbolSlot {
    fn new(builder: SymbolBuilder) -> Self {
        Self {
            builder,
            cached: OnceLock::new(),
        }
    }

    fn get(&self, key: TypeKey) -> Arc<ClassSymbol> {
        self.cached
            .get_or_init(|| {
                let symbol = (self.builder)();
                if symbol.key() != key {
                    tracing::warn!(
                        ty = %key,
                        built = %symbol.key(),
                        "symbol builder describes a different type"
                    );
                }
                tracing::debug!(ty = %key, methods = symbol.methods().len(), "symbol built");
                Arc::new(symbol)
            })
            .clone()
    }
}

/// Registration table of every type the runtime knows about.
#[derive(Default)]
pub struct SymbolTable {
    slots: HashMap<TypeKey, SymbolSlot>,
    order: Vec<TypeKey>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gather every [`SymbolSource`] submitted through `inventory`.
    #[cfg(feature = "inventory")]
    pub fn collect() -> Self {
        let mut table = Self::new();
        for source in inventory::iter::<SymbolSource> {
            table.register_source(source);
        }
        table
    }

    /// Register `T` with a builder.
    ///
    /// Returns `false`, keeping the existing entry, if `T` is already
    /// registered. Use [`replace`](Self::replace) to swap definitions.
    pub fn register<T, F>(&mut self, build: F) -> bool
    where
        T: ?Sized + 'static,
        F: Fn() -> ClassSymbol + Send + Sync + 'static,
    {
        self.insert(TypeKey::of::<T>(), Arc::new(build))
    }

    /// Register a prebuilt symbol.
    pub fn register_symbol(&mut self, symbol: ClassSymbol) -> bool {
        let key = symbol.key();
        self.insert(key, Arc::new(move || symbol.clone()))
    }

    /// Register a static source.
    pub fn register_source(&mut self, source: &SymbolSource) -> bool {
        let source = *source;
        self.insert(source.key(), Arc::new(move || source.build()))
    }

    fn insert(&mut self, key: TypeKey, builder: SymbolBuilder) -> bool {
        if self.slots.contains_key(&key) {
            tracing::warn!(ty = %key, "type already registered, keeping the first definition");
            return false;
        }
        self.slots.insert(key, SymbolSlot::new(builder));
        self.order.push(key);
        true
    }

    /// Swap the definition of `T` (hot reload).
    ///
    /// The next access rebuilds the symbol from the new builder. Registers
    /// `T` if it was unknown.
    pub fn replace<T, F>(&mut self, build: F)
    where
        T: ?Sized + 'static,
        F: Fn() -> ClassSymbol + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        if self.slots.insert(key, SymbolSlot::new(Arc::new(build))).is_none() {
            self.order.push(key);
        }
    }

    /// Drop the cached symbol of `ty`; the next access rebuilds it.
    pub fn invalidate(&mut self, ty: TypeKey) -> bool {
        match self.slots.get_mut(&ty) {
            Some(slot) => {
                slot.cached = OnceLock::new();
                true
            }
            None => false,
        }
    }

    /// The symbol of `ty`, built on first access.
    pub fn symbol(&self, ty: TypeKey) -> Option<Arc<ClassSymbol>> {
        self.slots.get(&ty).map(|slot| slot.get(ty))
    }

    /// Declared methods of `ty`, in declaration order.
    pub fn methods(&self, ty: TypeKey) -> Vec<MethodSymbol> {
        self.symbol(ty)
            .map(|symbol| symbol.methods().to_vec())
            .unwrap_or_default()
    }

    /// Whether `ty` is registered and instantiable.
    pub fn is_instantiable(&self, ty: TypeKey) -> bool {
        self.symbol(ty).is_some_and(|symbol| symbol.is_instantiable())
    }

    /// `ty` followed by its declared capabilities.
    pub fn applicable_types(&self, ty: TypeKey) -> Vec<TypeKey> {
        match self.symbol(ty) {
            Some(symbol) => symbol.applicable_types().collect(),
            None => vec![ty],
        }
    }

    /// Registered types, in registration order.
    pub fn types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.order.iter().copied()
    }

    /// Whether `ty` is registered.
    pub fn contains(&self, ty: TypeKey) -> bool {
        self.slots.contains_key(&ty)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
