//! Message handlers.

use crate::{
    code_info::MessageKey,
    table::{Delivery, DispatchStats, DispatchTable, deliver},
};
use std::any::Any;
use weft_core::{DispatchError, DomainMarker, TypeKey};

/// Routes incoming messages by opcode, falling back to the message type.
#[derive(Default)]
pub struct MessageController {
    pub(super) table: DispatchTable<MessageKey>,
    stats: DispatchStats,
}

impl MessageController {
    /// Deliver `message` received under `opcode`.
    ///
    /// An unknown opcode with no handler for the message type is logged,
    /// counted and dropped.
    pub fn send<M: Any>(&self, opcode: u32, message: &M) -> Result<Delivery, DispatchError> {
        let keys = [&MessageKey::Opcode(opcode), &MessageKey::Type(TypeKey::of::<M>())];
        deliver(
            &self.table,
            &self.stats,
            DomainMarker::MESSAGE,
            &keys,
            None,
            &[message as &dyn Any],
            true,
        )
    }

    /// Deliver `message` to the handlers of its type.
    pub fn send_message<M: Any>(&self, message: &M) -> Result<Delivery, DispatchError> {
        deliver(
            &self.table,
            &self.stats,
            DomainMarker::MESSAGE,
            &[&MessageKey::Type(TypeKey::of::<M>())],
            None,
            &[message as &dyn Any],
            true,
        )
    }

    /// Installed handlers.
    pub fn table(&self) -> &DispatchTable<MessageKey> {
        &self.table
    }

    /// Call counters.
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }
}
