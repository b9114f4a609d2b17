//! Layer trait and abstractions.
//!
//! Layers wrap a chain with cross-cutting concerns like logging, retry or
//! deadlines. A layered chain is itself a [`Chain`], so layers stack.

use crate::chain::{Chain, OutputStream};
use crate::error::ChainError;
use crate::types::*;
use async_trait::async_trait;

/// Layer trait for wrapping chains.
///
/// Each layer wraps an inner chain and returns a new chain with enhanced
/// behavior. Key declarations are expected to pass through unchanged.
pub trait Layer<C: Chain> {
    /// The type of the layered chain
    type LayeredChain: Chain;

    /// Wrap the inner chain with this layer
    fn layer(&self, inner: C) -> Self::LayeredChain;
}

/// Helper trait for layered chains.
///
/// Provides default forwarding implementations for every chain method.
/// Implementers only override the methods they want to intercept and then
/// forward their `Chain` impl to the `layered_*` methods.
#[async_trait]
pub trait LayeredChain: Sized + Chain {
    /// The inner chain type
    type Inner: Chain;

    /// Get a reference to the inner chain
    fn inner(&self) -> &Self::Inner;

    /// Default implementation for chain_type - forwards to inner
    fn layered_chain_type(&self) -> &str {
        self.inner().chain_type()
    }

    /// Default implementation for input_keys - forwards to inner
    fn layered_input_keys(&self) -> Vec<String> {
        self.inner().input_keys()
    }

    /// Default implementation for output_keys - forwards to inner
    fn layered_output_keys(&self) -> Vec<String> {
        self.inner().output_keys()
    }

    /// Default implementation for execute - forwards to inner
    async fn layered_execute(&self, inputs: &Inputs) -> Result<Outputs, ChainError> {
        self.inner().execute(inputs).await
    }

    /// Default implementation for execute_stream - forwards to inner
    async fn layered_execute_stream(
        &self,
        inputs: &Inputs,
    ) -> Result<Box<OutputStream>, ChainError> {
        self.inner().execute_stream(inputs).await
    }
}

/// Layer that leaves the chain untouched.
///
/// Useful as a placeholder when a layer is chosen conditionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<C: Chain> Layer<C> for Identity {
    type LayeredChain = C;

    fn layer(&self, inner: C) -> Self::LayeredChain {
        inner
    }
}
