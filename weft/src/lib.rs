//! # weft - Declarative Binding-and-Dispatch Runtime
//!
//! Types declare, through tags on their methods, which lifecycle
//! behaviours, events, messages, inputs, pool steps and exported functions
//! they handle. The runtime scans those declarations once, installs them
//! into per-domain dispatch tables, and routes calls to them, weaving
//! aspect advice around lifecycle behaviours.
//!
//! ## Quick Start
//!
//! ```rust
//! use weft::prelude::*;
//!
//! struct Door {
//!     opened: u32,
//! }
//!
//! struct DoorAudit;
//!
//! let mut runtime = Runtime::new();
//! runtime.register::<Door, _>(|| {
//!     ClassSymbol::builder::<Door>()
//!         .method(MethodSymbol::instance(
//!             "start",
//!             Invoker::method(|door: &mut Door| door.opened += 1),
//!         ))
//!         .build()
//! });
//! runtime.register::<DoorAudit, _>(|| {
//!     ClassSymbol::builder::<DoorAudit>()
//!         .static_class()
//!         .marker(DomainMarker::ASPECT)
//!         .method(
//!             MethodSymbol::function(
//!                 "after_start",
//!                 Invoker::advice(|door: &mut Door, _| door.opened *= 10),
//!             )
//!             .tag(AspectTag::new::<Door>(Behaviour::Start, AccessType::After)),
//!         )
//!         .build()
//! });
//! assert!(runtime.load_all().is_clean());
//!
//! let mut door = Door { opened: 0 };
//! runtime.dispatch(Behaviour::Start, &mut door).unwrap();
//! assert_eq!(door.opened, 10);
//! ```
//!
//! ## Static registration
//!
//! With the `inventory` feature (on by default), [`submit_symbol!`] lets
//! any module declare its types and [`SymbolTable::collect`] gathers them:
//!
//! ```rust,ignore
//! fn describe_door() -> ClassSymbol { ... }
//!
//! weft::submit_symbol!(Door => describe_door);
//!
//! let runtime = Runtime::new().with_symbols(SymbolTable::collect());
//! ```

#![deny(clippy::pub_use, clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use weft_core::{
    // Tags
    AccessType,
    ApiTag,
    AspectTag,
    // Symbols
    Attributed,
    Behaviour,
    // Error types
    BoxError,
    ClassSymbol,
    ClassSymbolBuilder,
    CutPoint,
    DispatchError,
    DomainMarker,
    EventTag,
    InjectTag,
    InputCode,
    InputOp,
    InputOps,
    InputTag,
    // Invocation
    IntoOutcome,
    Invocation,
    InvokeError,
    Invoker,
    JoinPoint,
    LoadError,
    MessageTag,
    MethodSymbol,
    PoolAction,
    PoolTag,
    Proceed,
    ScanError,
    Tag,
    TagKind,
    TypeKey,
    WeftError,
};

// Registration and dispatch
pub use weft_std::{
    config::{Domains, RuntimeConfig},
    loader::{BindingProcessor, CodeLoader, ScanReport},
    runtime::Runtime,
    symbols::{SymbolSource, SymbolTable},
    table::{Delivery, DispatchStats},
};

/// Typed per-domain descriptors.
pub mod code_info {
    #![allow(clippy::wildcard_imports)]
    pub use weft_std::code_info::*;
}

/// Per-domain controllers.
pub mod controllers {
    #![allow(clippy::wildcard_imports)]
    pub use weft_std::controllers::*;
}

/// Code loader and custom domains.
pub mod loader {
    #![allow(clippy::wildcard_imports)]
    pub use weft_std::loader::*;
}

/// Binding processors of the built-in domains.
pub mod processors {
    #![allow(clippy::wildcard_imports)]
    pub use weft_std::processors::*;
}

/// Dispatch tables.
pub mod table {
    #![allow(clippy::wildcard_imports)]
    pub use weft_std::table::*;
}

/// Phase sequencer.
pub mod phase {
    #![allow(clippy::wildcard_imports)]
    pub use weft_std::phase::*;
}

/// Symbol registration.
pub mod symbols {
    #![allow(clippy::wildcard_imports)]
    pub use weft_std::symbols::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use weft_std::testing::*;
}

/// Prelude module - common imports for weft.
///
/// # Usage
///
/// ```rust
/// use weft::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AccessType, ApiTag, AspectTag, Behaviour, BoxError, ClassSymbol, CutPoint, Delivery,
        DispatchError, DomainMarker, EventTag, InjectTag, InputOp, InputOps, InputTag, Invocation,
        Invoker, JoinPoint, MessageTag, MethodSymbol, PoolAction, PoolTag, Runtime, RuntimeConfig,
        SymbolTable, TypeKey,
        phase::{ParallelPhase, Phase, PhaseQueue, SequentialPhase, Step},
    };
}

/// Submit a [`SymbolSource`] for [`SymbolTable::collect`].
///
/// `$build` must be a `fn() -> ClassSymbol` item.
#[cfg(feature = "inventory")]
#[macro_export]
macro_rules! submit_symbol {
    ($ty:ty => $build:path) => {
        $crate::inventory::submit! {
            $crate::SymbolSource::of::<$ty>($build)
        }
    };
}

#[cfg(feature = "inventory")]
pub use inventory;
