//! Error types for weft.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`WeftError`] - Top-level error type for all weft operations
//! - [`ScanError`] - A tag is malformed or missing a required parameter
//! - [`LoadError`] - A domain refused to load a type
//! - [`DispatchError`] - A registered handler faulted during invocation
//! - [`InvokeError`] - A receiver or argument did not match the invoker
//!
//! Lookup misses are deliberately absent: an event, message or input that
//! resolves to no entry is logged and dropped, never surfaced as an error.

use crate::key::DomainMarker;
use thiserror::Error;

/// A boxed error type for handler faults.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all weft operations.
#[derive(Error, Debug)]
pub enum WeftError {
    /// A tag could not be turned into a descriptor.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// A domain refused to load a type.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// A handler faulted during dispatch.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// An invoker was called with the wrong shapes.
    #[error("invoke error: {0}")]
    Invoke(#[from] InvokeError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// A tag or member that could not be described.
///
/// Scan errors are local: the offending member is skipped and scanning of
/// the rest of the type (and of every other type) continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A tag is missing a parameter its domain requires.
    #[error("`{owner}::{member}`: missing required parameter `{parameter}`")]
    MissingParameter {
        /// Declaring type.
        owner: &'static str,
        /// Method (or `<class>`) carrying the tag.
        member: String,
        /// Name of the absent parameter.
        parameter: &'static str,
    },

    /// A tag carries a parameter value its domain cannot use.
    #[error("`{owner}::{member}`: malformed tag: {reason}")]
    Malformed {
        /// Declaring type.
        owner: &'static str,
        /// Method (or `<class>`) carrying the tag.
        member: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A handler tag sits on an instance method.
    #[error("`{owner}::{member}`: handler for `{domain}` must be static")]
    NotStatic {
        /// Declaring type.
        owner: &'static str,
        /// Offending method.
        member: String,
        /// Domain whose tag was found.
        domain: DomainMarker,
    },

    /// A tag that may appear at most once appears several times.
    #[error("`{owner}::{member}`: `{tag}` may appear at most once")]
    Repeated {
        /// Declaring type.
        owner: &'static str,
        /// Method (or `<class>`) carrying the tags.
        member: String,
        /// Tag description.
        tag: String,
    },

    /// A tagged method has no invocable handle.
    #[error("`{owner}::{member}`: tagged method has no invoker")]
    MissingInvoker {
        /// Declaring type.
        owner: &'static str,
        /// Offending method.
        member: String,
    },
}

/// A domain refused to load (or register) something.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The type already has Code Info in this domain and `reload` was not set.
    #[error("`{owner}` is already registered in domain `{domain}`")]
    Duplicate {
        /// The type that was loaded twice.
        owner: &'static str,
        /// The domain that rejected it.
        domain: DomainMarker,
    },

    /// The type could not be described.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// No domain is registered under the marker.
    #[error("no domain registered for marker `{0}`")]
    MissingDomain(DomainMarker),

    /// A domain is already registered under the marker.
    #[error("domain `{0}` is already registered")]
    DomainExists(DomainMarker),

    /// The type is unknown to the symbol table.
    #[error("no symbol registered for `{0}`")]
    UnknownType(&'static str),

    /// Every entry the type declared collided with an installed one.
    #[error("every entry of `{owner}` was rejected by domain `{domain}`")]
    Rejected {
        /// The type whose entries collided.
        owner: &'static str,
        /// The domain that rejected them.
        domain: DomainMarker,
    },
}

/// A registered handler faulted.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A woven call faulted; AfterThrowing handlers have already been notified.
    #[error("`{target}` faulted at `{cut}`")]
    Invocation {
        /// Target type of the call.
        target: &'static str,
        /// Behaviour or method name of the call.
        cut: String,
        /// The original fault.
        #[source]
        source: BoxError,
    },

    /// A domain handler (event, message, input, pool, api) faulted.
    #[error("`{domain}` handler `{function}` faulted")]
    Handler {
        /// Domain of the handler.
        domain: DomainMarker,
        /// Declaring function.
        function: String,
        /// The original fault.
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    /// The fault raised by the handler.
    pub fn fault(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            DispatchError::Invocation { source, .. } | DispatchError::Handler { source, .. } => {
                source.as_ref()
            }
        }
    }
}

/// An invoker received a receiver or argument of the wrong type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    /// The invoker needs a receiver but none was supplied.
    #[error("missing receiver of type `{expected}`")]
    MissingReceiver {
        /// Expected receiver type.
        expected: &'static str,
    },

    /// The receiver has a different type.
    #[error("receiver is not a `{expected}`")]
    ReceiverMismatch {
        /// Expected receiver type.
        expected: &'static str,
    },

    /// Fewer arguments than the invoker needs.
    #[error("missing argument {index} of type `{expected}`")]
    MissingArgument {
        /// Zero-based argument position.
        index: usize,
        /// Expected argument type.
        expected: &'static str,
    },

    /// An argument has a different type.
    #[error("argument {index} is not a `{expected}`")]
    ArgumentMismatch {
        /// Zero-based argument position.
        index: usize,
        /// Expected argument type.
        expected: &'static str,
    },

    /// Advice was called outside a woven call.
    #[error("advice invoked without a join point")]
    MissingJoinPoint,

    /// `proceed` was called from a handler that does not wrap a call.
    #[error("proceed called outside an `Around` handler")]
    NotAround,
}

// Convenience conversions
impl From<BoxError> for WeftError {
    fn from(err: BoxError) -> Self {
        WeftError::Custom(err)
    }
}
