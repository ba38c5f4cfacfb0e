//! Input handlers.

use crate::{
    code_info::InputKey,
    table::{Delivery, DispatchStats, DispatchTable, deliver},
};
use std::any::Any;
use weft_core::{DispatchError, DomainMarker, InputCode, InputOp, TypeKey};

/// Routes host input by (code, operation), falling back to the payload type.
#[derive(Default)]
pub struct InputController {
    pub(super) table: DispatchTable<InputKey>,
    stats: DispatchStats,
}

impl InputController {
    /// Deliver operation `op` on `code`.
    pub fn on_input<P: Any>(
        &self,
        code: InputCode,
        op: InputOp,
        payload: &P,
    ) -> Result<Delivery, DispatchError> {
        let keys = [&InputKey::Code(code, op), &InputKey::Type(TypeKey::of::<P>())];
        deliver(
            &self.table,
            &self.stats,
            DomainMarker::INPUT,
            &keys,
            None,
            &[payload as &dyn Any],
            true,
        )
    }

    /// Deliver `payload` to the handlers of its type.
    pub fn on_payload<P: Any>(&self, payload: &P) -> Result<Delivery, DispatchError> {
        deliver(
            &self.table,
            &self.stats,
            DomainMarker::INPUT,
            &[&InputKey::Type(TypeKey::of::<P>())],
            None,
            &[payload as &dyn Any],
            true,
        )
    }

    /// Installed handlers.
    pub fn table(&self) -> &DispatchTable<InputKey> {
        &self.table
    }

    /// Call counters.
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }
}
