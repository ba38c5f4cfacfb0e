//! # Symbol Model
//!
//! A [`ClassSymbol`] is the read-only snapshot of one type: its domain
//! markers, declared capabilities, class-level tags and methods. Symbols are
//! built once through [`ClassSymbolBuilder`] and then only read; a hot
//! reloaded type gets a brand new symbol.
//!
//! # Example
//!
//! ```rust
//! use weft_core::{Behaviour, ClassSymbol, DomainMarker, InjectTag, Invoker, MethodSymbol};
//!
//! struct Player { hp: u32 }
//!
//! let symbol = ClassSymbol::builder::<Player>()
//!     .marker(DomainMarker::INJECT)
//!     .tag(InjectTag::new(Behaviour::Awake))
//!     .method(MethodSymbol::instance("awake", Invoker::method(|p: &mut Player| p.hp = 100)))
//!     .build();
//!
//! assert!(symbol.method("awake").is_some());
//! assert!(symbol.has_marker(DomainMarker::INJECT));
//! ```

use crate::{
    invoke::Invoker,
    key::{DomainMarker, TypeKey},
    tag::{Tag, TagKind},
};
use std::borrow::Cow;

/// Read access to the tags attached to a class or method.
pub trait Attributed {
    /// Tags declared directly on this member.
    fn declared_tags(&self) -> &[Tag];

    /// Tags inherited from a capability declaration.
    fn inherited_tags(&self) -> &[Tag];

    /// Every tag, optionally including inherited ones.
    fn tags(&self, include_inherited: bool) -> impl Iterator<Item = &Tag> {
        let inherited: &[Tag] = if include_inherited {
            self.inherited_tags()
        } else {
            &[]
        };
        self.declared_tags().iter().chain(inherited)
    }

    /// Every tag of kind `T`.
    fn attributes<T: TagKind>(&self, include_inherited: bool) -> Vec<&T> {
        self.tags(include_inherited)
            .filter_map(T::from_tag)
            .collect()
    }

    /// The first tag of kind `T`.
    fn attribute<T: TagKind>(&self, include_inherited: bool) -> Option<&T> {
        self.tags(include_inherited).find_map(T::from_tag)
    }
}

/// One declared method of a type.
#[derive(Debug, Clone)]
pub struct MethodSymbol {
    name: Cow<'static, str>,
    is_static: bool,
    tags: Vec<Tag>,
    inherited: Vec<Tag>,
    invoker: Option<Invoker>,
}

impl MethodSymbol {
    /// An instance method (called with the object as receiver).
    pub fn instance(name: impl Into<Cow<'static, str>>, invoker: Invoker) -> Self {
        Self::declare(name, false).with_invoker(invoker)
    }

    /// A static function.
    pub fn function(name: impl Into<Cow<'static, str>>, invoker: Invoker) -> Self {
        Self::declare(name, true).with_invoker(invoker)
    }

    /// A declaration without an invocable body.
    pub fn declare(name: impl Into<Cow<'static, str>>, is_static: bool) -> Self {
        Self {
            name: name.into(),
            is_static,
            tags: Vec::new(),
            inherited: Vec::new(),
            invoker: None,
        }
    }

    /// Attach the invocable body.
    pub fn with_invoker(mut self, invoker: Invoker) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Attach a tag.
    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Attach a tag inherited from a capability declaration.
    pub fn inherit(mut self, tag: impl Into<Tag>) -> Self {
        self.inherited.push(tag.into());
        self
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the method is static.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// The invocable body, if any.
    pub fn invoker(&self) -> Option<&Invoker> {
        self.invoker.as_ref()
    }
}

impl Attributed for MethodSymbol {
    fn declared_tags(&self) -> &[Tag] {
        &self.tags
    }

    fn inherited_tags(&self) -> &[Tag] {
        &self.inherited
    }
}

/// Read-only snapshot of one type.
#[derive(Debug, Clone)]
pub struct ClassSymbol {
    key: TypeKey,
    instantiable: bool,
    markers: Vec<DomainMarker>,
    capabilities: Vec<TypeKey>,
    tags: Vec<Tag>,
    inherited: Vec<Tag>,
    methods: Vec<MethodSymbol>,
}

impl ClassSymbol {
    /// Start describing `T`.
    pub fn builder<T: ?Sized + 'static>() -> ClassSymbolBuilder {
        ClassSymbolBuilder::new(TypeKey::of::<T>())
    }

    /// Identity of the described type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Whether the host may create instances of the type.
    pub fn is_instantiable(&self) -> bool {
        self.instantiable
    }

    /// Domain markers, in declaration order.
    pub fn markers(&self) -> &[DomainMarker] {
        &self.markers
    }

    /// Whether the type participates in `marker`'s domain.
    pub fn has_marker(&self, marker: DomainMarker) -> bool {
        self.markers.contains(&marker)
    }

    /// Declared capabilities, in declaration order.
    pub fn capabilities(&self) -> &[TypeKey] {
        &self.capabilities
    }

    /// The type itself followed by its capabilities.
    pub fn applicable_types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        std::iter::once(self.key).chain(self.capabilities.iter().copied())
    }

    /// Declared methods, in declaration order.
    pub fn methods(&self) -> &[MethodSymbol] {
        &self.methods
    }

    /// The first method named `name`.
    pub fn method(&self, name: &str) -> Option<&MethodSymbol> {
        self.methods.iter().find(|m| m.name() == name)
    }
}

impl Attributed for ClassSymbol {
    fn declared_tags(&self) -> &[Tag] {
        &self.tags
    }

    fn inherited_tags(&self) -> &[Tag] {
        &self.inherited
    }
}

/// Builder for [`ClassSymbol`].
#[derive(Debug)]
pub struct ClassSymbolBuilder {
    symbol: ClassSymbol,
}

impl ClassSymbolBuilder {
    /// Describe the type identified by `key`.
    pub fn new(key: TypeKey) -> Self {
        Self {
            symbol: ClassSymbol {
                key,
                instantiable: true,
                markers: Vec::new(),
                capabilities: Vec::new(),
                tags: Vec::new(),
                inherited: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    /// Mark the type as a static holder of functions (not instantiable).
    pub fn static_class(mut self) -> Self {
        self.symbol.instantiable = false;
        self
    }

    /// Set whether the type is instantiable.
    pub fn instantiable(mut self, instantiable: bool) -> Self {
        self.symbol.instantiable = instantiable;
        self
    }

    /// Add a domain marker.
    pub fn marker(mut self, marker: DomainMarker) -> Self {
        if !self.symbol.markers.contains(&marker) {
            self.symbol.markers.push(marker);
        }
        self
    }

    /// Declare a capability (usually a `dyn Trait`).
    pub fn capability<C: ?Sized + 'static>(mut self) -> Self {
        let key = TypeKey::of::<C>();
        if key != self.symbol.key && !self.symbol.capabilities.contains(&key) {
            self.symbol.capabilities.push(key);
        }
        self
    }

    /// Attach a class-level tag.
    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.symbol.tags.push(tag.into());
        self
    }

    /// Attach a class-level tag inherited from a capability declaration.
    pub fn inherit(mut self, tag: impl Into<Tag>) -> Self {
        self.symbol.inherited.push(tag.into());
        self
    }

    /// Add a method.
    pub fn method(mut self, method: MethodSymbol) -> Self {
        self.symbol.methods.push(method);
        self
    }

    /// Finish.
    pub fn build(self) -> ClassSymbol {
        self.symbol
    }
}
