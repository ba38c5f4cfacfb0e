//! # Binding Processors
//!
//! One [`Processor`] per built-in domain. A processor keeps the Code Info
//! of every type it loaded and mirrors it into the domain's controller.
//!
//! # Reload
//!
//! Reload is remove-then-add and not atomic: the old entries are evicted,
//! then the new ones are installed. If the new symbol cannot be described,
//! the old Code Info and entries stay in place.
//!
//! A load whose every entry collides fails with [`LoadError::Rejected`] and
//! stores no Code Info, so `lookup` never reports a type the controllers
//! do not know.

use crate::{
    code_info::{
        ApiCodeInfo, AspectCodeInfo, BindingSet, CodeInfo, Describe, EventCodeInfo,
        InjectCodeInfo, InputCodeInfo, MessageCodeInfo, PoolCodeInfo,
    },
    controllers::{Controllers, TableKey},
    loader::BindingProcessor,
};
use std::{collections::HashMap, sync::Arc};
use weft_core::{ClassSymbol, DomainMarker, LoadError, TypeKey};

/// A descriptor that can be mirrored into [`Controllers`].
pub trait Install: Describe {
    /// Number of entries the descriptor declares.
    fn declared(&self) -> usize;

    /// Install every entry. Colliding entries are logged and skipped.
    fn install(&self, controllers: &mut Controllers) -> usize;

    /// Remove every entry declared by `class`.
    fn evict(class: TypeKey, controllers: &mut Controllers) -> usize;
}

impl<K> Install for BindingSet<K>
where
    K: TableKey,
    Self: Describe,
{
    fn declared(&self) -> usize {
        self.bindings.len()
    }

    fn install(&self, controllers: &mut Controllers) -> usize {
        let table = K::table(controllers);
        let mut installed = 0;
        for binding in &self.bindings {
            match table.insert(
                binding.key.clone(),
                self.class,
                binding.function.clone(),
                binding.invoker.clone(),
            ) {
                Ok(()) => installed += 1,
                Err(collision) => tracing::warn!(
                    domain = %Self::MARKER,
                    ty = %self.class,
                    function = %binding.function,
                    %collision,
                    "binding rejected"
                ),
            }
        }
        installed
    }

    fn evict(class: TypeKey, controllers: &mut Controllers) -> usize {
        K::table(controllers).remove_owner(class)
    }
}

impl Install for InjectCodeInfo {
    fn declared(&self) -> usize {
        1
    }

    fn install(&self, controllers: &mut Controllers) -> usize {
        match controllers.injection.register(self) {
            Ok(_) => 1,
            Err(collision) => {
                tracing::warn!(
                    domain = %Self::MARKER,
                    ty = %self.class,
                    %collision,
                    "bean rejected"
                );
                0
            }
        }
    }

    fn evict(class: TypeKey, controllers: &mut Controllers) -> usize {
        usize::from(controllers.injection.remove(class).is_some())
    }
}

/// Binding processor of one built-in domain.
pub struct Processor<D> {
    infos: HashMap<TypeKey, Arc<D>>,
    strict: bool,
}

impl<D> Default for Processor<D> {
    fn default() -> Self {
        Self {
            infos: HashMap::new(),
            strict: false,
        }
    }
}

impl<D: Install> Processor<D> {
    /// Create an empty processor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail a whole class on its first malformed method.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Stored Code Info of `ty`.
    pub fn get(&self, ty: TypeKey) -> Option<&Arc<D>> {
        self.infos.get(&ty)
    }

    /// Number of loaded types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether no type is loaded.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

impl<D: Install> BindingProcessor<Controllers> for Processor<D> {
    fn marker(&self) -> DomainMarker {
        D::MARKER
    }

    fn load(
        &mut self,
        ctx: &mut Controllers,
        symbol: &ClassSymbol,
        reload: bool,
    ) -> Result<(), LoadError> {
        let ty = symbol.key();
        if !reload && self.infos.contains_key(&ty) {
            return Err(LoadError::Duplicate {
                owner: ty.short_name(),
                domain: D::MARKER,
            });
        }

        let info = Arc::new(D::describe(symbol, self.strict)?);
        if self.infos.remove(&ty).is_some() {
            let evicted = D::evict(ty, ctx);
            tracing::debug!(domain = %D::MARKER, %ty, evicted, "evicted previous entries");
        }
        let installed = info.install(ctx);
        if installed == 0 && info.declared() > 0 {
            return Err(LoadError::Rejected {
                owner: ty.short_name(),
                domain: D::MARKER,
            });
        }
        tracing::debug!(domain = %D::MARKER, %ty, installed, "entries installed");
        self.infos.insert(ty, info);
        Ok(())
    }

    fn unload(&mut self, ctx: &mut Controllers, ty: TypeKey) -> bool {
        if self.infos.remove(&ty).is_none() {
            return false;
        }
        let evicted = D::evict(ty, ctx);
        tracing::debug!(domain = %D::MARKER, %ty, evicted, "unloaded");
        true
    }

    fn cleanup(&mut self, ctx: &mut Controllers) {
        for (ty, _) in self.infos.drain() {
            D::evict(ty, ctx);
        }
    }

    fn lookup(&self, symbol: &ClassSymbol) -> Option<CodeInfo> {
        self.infos.get(&symbol.key()).cloned().map(D::into_code_info)
    }
}

/// Aspect domain.
pub type AspectProcessor = Processor<AspectCodeInfo>;
/// Event domain.
pub type EventProcessor = Processor<EventCodeInfo>;
/// Message domain.
pub type MessageProcessor = Processor<MessageCodeInfo>;
/// Input domain.
pub type InputProcessor = Processor<InputCodeInfo>;
/// Injection domain.
pub type InjectProcessor = Processor<InjectCodeInfo>;
/// Pool domain.
pub type PoolProcessor = Processor<PoolCodeInfo>;
/// Api domain.
pub type ApiProcessor = Processor<ApiCodeInfo>;
