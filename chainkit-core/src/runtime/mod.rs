//! Runtime layer for chains.
//!
//! This module provides the execution layer that sits between callers and
//! a chain's own execution hooks.
//!
//! The runtime layer is responsible for:
//! - Binding single values and merging recalled memory into inputs
//! - Validating inputs and outputs against the declared keys
//! - Accumulating streamed outputs and persisting them on completion
//! - Shaping results for `invoke`, `invoke_stream`, `run` and `run_stream`

pub mod executor;
pub mod stream;
pub mod validation;

pub use executor::{ChainExecutor, ChainExecutorBuilder};
pub use stream::{AccumulatingStream, OutputAccumulator};
