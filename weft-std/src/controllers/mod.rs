//! # Controllers
//!
//! One controller per built-in domain. Each owns the dispatch table its
//! binding processor fills and exposes the domain's runtime surface.
//!
//! | Controller | Entry point | Key |
//! |------------|-------------|-----|
//! | [`AspectController`] | `weave` | (target, cut, access) |
//! | [`EventController`] | `publish` | id, then payload type |
//! | [`MessageController`] | `send` | opcode, then message type |
//! | [`InputController`] | `on_input` | (code, op), then payload type |
//! | [`InjectController`] | `policy_of` | target type |
//! | [`PoolController`] | `process` | (target, action) |
//! | [`ApiController`] | `call` | exported name |

mod api;
mod aspect;
mod event;
mod inject;
mod input;
mod message;
mod pool;

pub use api::ApiController;
pub use aspect::AspectController;
pub use event::EventController;
pub use inject::{Bean, InjectController};
pub use input::InputController;
pub use message::MessageController;
pub use pool::PoolController;

use crate::{
    code_info::{ApiKey, AspectKey, EventKey, InputKey, MessageKey, PoolKey},
    table::DispatchTable,
};
use std::{fmt, hash::Hash};

/// Every built-in controller.
#[derive(Default)]
pub struct Controllers {
    /// Aspect weaving.
    pub aspects: AspectController,
    /// Event subscriptions.
    pub events: EventController,
    /// Message handlers.
    pub messages: MessageController,
    /// Input handlers.
    pub inputs: InputController,
    /// Injection policies.
    pub injection: InjectController,
    /// Pool callbacks.
    pub pools: PoolController,
    /// Exported functions.
    pub apis: ApiController,
}

impl Controllers {
    /// Create empty controllers.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A key type with a dispatch table in [`Controllers`].
pub trait TableKey: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static {
    /// The table holding this key.
    fn table(controllers: &mut Controllers) -> &mut DispatchTable<Self>;
}

macro_rules! table_key {
    ($($key:ty => $field:ident),* $(,)?) => {
        $(
            impl TableKey for $key {
                fn table(controllers: &mut Controllers) -> &mut DispatchTable<Self> {
                    &mut controllers.$field.table
                }
            }
        )*
    };
}

table_key! {
    AspectKey => aspects,
    EventKey => events,
    MessageKey => messages,
    InputKey => inputs,
    PoolKey => pools,
    ApiKey => apis,
}
