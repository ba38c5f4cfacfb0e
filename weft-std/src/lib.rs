//! # weft-std
//!
//! Standard implementations for the weft binding-and-dispatch runtime.
//!
//! This crate provides:
//! - **Symbols**: [`symbols::SymbolTable`], lazily built class descriptions
//! - **Code Info**: [`code_info`], typed per-domain descriptors
//! - **Loading**: [`loader::CodeLoader`] and the [`processors`] of the built-in domains
//! - **Controllers**: [`controllers`], dispatch and aspect weaving
//! - **Phases**: [`phase`], cooperative step sequencing
//! - **Runtime**: [`runtime::Runtime`], everything owned behind one value

#![deny(clippy::pub_use, clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core vocabulary
pub use weft_core;

// Modules
pub mod code_info;
pub mod config;
pub mod controllers;
pub mod loader;
pub mod phase;
pub mod processors;
pub mod runtime;
pub mod symbols;
pub mod table;
pub mod testing;

#[cfg(feature = "inventory")]
pub use inventory;
