//! # Chainkit Core
//!
//! Core abstractions and runtime for composable chains in Rust.
//!
//! This crate provides the [`Chain`] and [`Memory`] traits, the
//! [`ChainExecutor`] that enforces the invocation contract (input
//! preparation, memory integration, output validation, streaming
//! accumulation) and the [`Layer`] abstraction for wrapping chains with
//! cross-cutting concerns.

pub mod chain;
pub mod error;
pub mod layer;
pub mod memory;
pub mod runtime;
pub mod strategy;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports
pub use chain::{Chain, OutputStream, TextStream};
pub use error::ChainError;
pub use layer::{Identity, Layer, LayeredChain};
pub use memory::Memory;
pub use runtime::{ChainExecutor, ChainExecutorBuilder};
pub use strategy::{AccumulationStrategy, ConcatAll, PrimaryKeyConcat};
pub use types::*;

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, ChainError>;
