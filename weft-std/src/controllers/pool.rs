//! Object pool callbacks.

use crate::{
    code_info::PoolKey,
    table::{Delivery, DispatchStats, DispatchTable, deliver},
};
use std::any::Any;
use weft_core::{DispatchError, DomainMarker, PoolAction, TypeKey};

/// Runs the callbacks registered for a pooled type.
///
/// Callbacks receive the pooled object as their receiver. Pools fire
/// constantly, so a type without callbacks is only logged at `debug`.
#[derive(Default)]
pub struct PoolController {
    pub(super) table: DispatchTable<PoolKey>,
    stats: DispatchStats,
}

impl PoolController {
    /// Run every `action` callback for `instance`'s type.
    pub fn process<T: Any>(
        &self,
        action: PoolAction,
        instance: &mut T,
    ) -> Result<Delivery, DispatchError> {
        let key = PoolKey {
            target: TypeKey::of::<T>(),
            action,
        };
        deliver(
            &self.table,
            &self.stats,
            DomainMarker::POOL,
            &[&key],
            Some(instance as &mut dyn Any),
            &[],
            false,
        )
    }

    /// Installed callbacks.
    pub fn table(&self) -> &DispatchTable<PoolKey> {
        &self.table
    }

    /// Call counters.
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }
}
