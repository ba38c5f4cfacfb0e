//! # weft-core
//!
//! Core vocabulary for the weft binding-and-dispatch runtime.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! modules that only declare bindings and never own a runtime.
//!
//! # Pipeline
//!
//! weft wires every subsystem through one pipeline:
//!
//! ## Scan ([`ClassSymbol`])
//!
//! A type is described once, up front, by a static registration: its domain
//! markers, declared capabilities, and methods with their [`Tag`]s.
//!
//! ## Describe (Code Info)
//!
//! Each binding domain turns a symbol into a typed descriptor of the
//! bindings it cares about. Lives in `weft-std`.
//!
//! ## Register (Dispatch tables)
//!
//! Binding processors install descriptor entries into the domain's
//! controller, rejecting collisions.
//!
//! ## Dispatch ([`Invoker`])
//!
//! Controllers resolve a key and call the registered [`Invoker`]s, weaving
//! aspect advice around lifecycle behaviours.
//!
//! # Error Types
//!
//! - [`WeftError`] - Top-level error type
//! - [`ScanError`] - Malformed or incomplete tags
//! - [`LoadError`] - Rejected loads and registrations
//! - [`DispatchError`] - Handler faults
//! - [`InvokeError`] - Receiver and argument mismatches

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod invoke;
mod key;
mod symbol;
mod tag;

// Re-exports
pub use error::{BoxError, DispatchError, InvokeError, LoadError, ScanError, WeftError};
pub use invoke::{IntoOutcome, Invocation, Invoker, JoinPoint, Proceed};
pub use key::{DomainMarker, TypeKey};
pub use symbol::{Attributed, ClassSymbol, ClassSymbolBuilder, MethodSymbol};
pub use tag::{
    AccessType, ApiTag, AspectTag, Behaviour, CutPoint, EventTag, InjectTag, InputCode, InputOp,
    InputOps, InputTag, MessageTag, PoolAction, PoolTag, Tag, TagKind,
};
