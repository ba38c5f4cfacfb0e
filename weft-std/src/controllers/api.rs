//! Exported functions.

use crate::{
    code_info::ApiKey,
    table::{Delivery, DispatchStats, DispatchTable, deliver},
};
use std::any::Any;
use weft_core::{DispatchError, DomainMarker};

/// Name → function table. Each name is exported by exactly one function.
pub struct ApiController {
    pub(super) table: DispatchTable<ApiKey>,
    stats: DispatchStats,
}

impl Default for ApiController {
    fn default() -> Self {
        Self {
            table: DispatchTable::exclusive(),
            stats: DispatchStats::default(),
        }
    }
}

impl ApiController {
    /// Call the function exported as `name`.
    pub fn call(&self, name: &str, args: &[&dyn Any]) -> Result<Delivery, DispatchError> {
        deliver(&self.table, &self.stats, DomainMarker::API, &[name], None, args, true)
    }

    /// Whether a function is exported as `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    /// Installed functions.
    pub fn table(&self) -> &DispatchTable<ApiKey> {
        &self.table
    }

    /// Call counters.
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }
}
