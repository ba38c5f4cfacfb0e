//! Event subscriptions.

use crate::{
    code_info::EventKey,
    table::{Delivery, DispatchStats, DispatchTable, deliver},
};
use std::any::Any;
use weft_core::{DispatchError, DomainMarker, TypeKey};

/// Routes published events to their subscribers.
///
/// An event is resolved by id first; if nothing is subscribed to the id,
/// by the payload's type. A miss is logged and dropped.
#[derive(Default)]
pub struct EventController {
    pub(super) table: DispatchTable<EventKey>,
    stats: DispatchStats,
}

impl EventController {
    /// Publish `payload` under `id`.
    pub fn publish<P: Any>(&self, id: i32, payload: &P) -> Result<Delivery, DispatchError> {
        let keys = [&EventKey::Id(id), &EventKey::Type(TypeKey::of::<P>())];
        deliver(
            &self.table,
            &self.stats,
            DomainMarker::EVENT,
            &keys,
            None,
            &[payload as &dyn Any],
            true,
        )
    }

    /// Publish `payload` to the subscribers of its type.
    pub fn publish_payload<P: Any>(&self, payload: &P) -> Result<Delivery, DispatchError> {
        deliver(
            &self.table,
            &self.stats,
            DomainMarker::EVENT,
            &[&EventKey::Type(TypeKey::of::<P>())],
            None,
            &[payload as &dyn Any],
            true,
        )
    }

    /// Installed subscriptions.
    pub fn table(&self) -> &DispatchTable<EventKey> {
        &self.table
    }

    /// Call counters.
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }
}
