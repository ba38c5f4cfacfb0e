//! Injection policies.
//!
//! The injection domain stores no invokers. It records, per target type,
//! the behaviour at which an external autowiring step should populate the
//! type's dependencies, and a bean descriptor that step can resolve by
//! type or by name.

use crate::{code_info::InjectCodeInfo, table::Collision};
use std::{borrow::Cow, collections::HashMap};
use weft_core::{Behaviour, TypeKey};

/// An injectable participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bean {
    /// Registration id, unique for the controller's lifetime.
    pub id: u64,
    /// Bean name.
    pub name: Cow<'static, str>,
    /// Bean type.
    pub ty: TypeKey,
    /// Behaviour at which dependencies are populated.
    pub policy: Behaviour,
}

/// Target type → activation policy.
#[derive(Debug, Default)]
pub struct InjectController {
    beans: HashMap<TypeKey, Bean>,
    names: HashMap<Cow<'static, str>, TypeKey>,
    next_id: u64,
}

impl InjectController {
    /// Record the policy of `info.class`.
    ///
    /// Rejected if the type or the bean name is already registered.
    pub fn register(&mut self, info: &InjectCodeInfo) -> Result<&Bean, Collision> {
        if let Some(existing) = self.beans.get(&info.class) {
            return Err(Collision {
                key: format!("{:?}", info.class),
                owner: existing.ty.short_name(),
                function: existing.name.to_string(),
            });
        }
        if let Some(ty) = self.names.get(&info.bean_name) {
            return Err(Collision {
                key: info.bean_name.to_string(),
                owner: ty.short_name(),
                function: info.bean_name.to_string(),
            });
        }

        let bean = Bean {
            id: self.next_id,
            name: info.bean_name.clone(),
            ty: info.class,
            policy: info.policy,
        };
        self.next_id += 1;
        tracing::debug!(ty = %bean.ty, name = %bean.name, policy = %bean.policy, "bean registered");
        self.names.insert(bean.name.clone(), bean.ty);
        Ok(self.beans.entry(info.class).or_insert(bean))
    }

    /// Forget `ty`.
    pub fn remove(&mut self, ty: TypeKey) -> Option<Bean> {
        let bean = self.beans.remove(&ty)?;
        self.names.remove(&bean.name);
        Some(bean)
    }

    /// Activation policy of `ty`.
    pub fn policy_of(&self, ty: TypeKey) -> Option<Behaviour> {
        self.beans.get(&ty).map(|bean| bean.policy)
    }

    /// Whether `ty`'s dependencies should be populated at `behaviour`.
    pub fn should_activate(&self, ty: TypeKey, behaviour: Behaviour) -> bool {
        self.policy_of(ty) == Some(behaviour)
    }

    /// Bean descriptor of `ty`.
    pub fn bean(&self, ty: TypeKey) -> Option<&Bean> {
        self.beans.get(&ty)
    }

    /// Bean descriptor registered as `name`.
    pub fn bean_by_name(&self, name: &str) -> Option<&Bean> {
        self.names.get(name).and_then(|ty| self.beans.get(ty))
    }

    /// Every bean, in registration order.
    pub fn beans(&self) -> Vec<&Bean> {
        let mut beans: Vec<_> = self.beans.values().collect();
        beans.sort_by_key(|bean| bean.id);
        beans
    }

    /// Number of beans.
    pub fn len(&self) -> usize {
        self.beans.len()
    }

    /// Whether no bean is registered.
    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    /// Forget every bean.
    pub fn clear(&mut self) {
        self.beans.clear();
        self.names.clear();
    }
}
