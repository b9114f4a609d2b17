//! # Chainkit
//!
//! Composable chains with memory and streaming for Rust.
//!
//! A chain declares the named inputs it needs and the named outputs it
//! produces. Chainkit wraps any chain in an executor that validates both
//! sides, merges recalled conversational memory into the inputs, persists
//! each completed turn back to memory, and offers synchronous and
//! streaming invocation.
//!
//! ## Features
//!
//! - **One contract, four call shapes**: `invoke`, `invoke_stream`, `run`, `run_stream`
//! - **Memory integration**: recalled values override caller inputs, turns are saved once
//! - **Streaming accumulation**: partial outputs are folded and persisted on completion
//! - **Composable layers**: stack logging, retry and timeouts around any chain
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! chainkit = { version = "0.1", features = ["layers"] }
//! ```
//!
//! ```ignore
//! use chainkit::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(chain: impl Chain, memory: Arc<dyn Memory>) -> Result<()> {
//! let executor = ChainExecutor::builder(chain)
//!     .layer(LoggingLayer::new())
//!     .memory(memory)
//!     .finish();
//!
//! let answer = executor.run("What is Rust?").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Includes `layers`
//! - `layers`: Built-in layers (logging, retry, timeout)
//! - `test-utils`: In-memory chain and memory fakes for tests
//! - `full`: All features enabled

// Re-export core types and traits
pub use chainkit_core::*;

// Re-export layers under `layers` module
#[cfg(feature = "chainkit-layer")]
pub mod layers {
    //! Built-in chain layers.
    pub use chainkit_layer::*;
}

// Convenience re-exports at root level for common types
pub use chainkit_core::{
    chain::{Chain, OutputStream, TextStream},
    error::ChainError,
    layer::{Layer, LayeredChain},
    memory::Memory,
    runtime::{ChainExecutor, ChainExecutorBuilder},
    types::{ChainInfo, ChainInput, Inputs, InvocationContext, Outputs, Value},
    Result,
};

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use chainkit::prelude::*;
    //! ```

    pub use crate::{
        Chain, ChainError, ChainExecutor, ChainInput, Inputs, Layer, Memory, Outputs, Result,
        Value,
    };

    #[cfg(feature = "chainkit-layer")]
    pub use crate::layers::*;
}
