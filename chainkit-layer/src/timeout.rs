//! Timeout layer bounding chain executions.
//!
//! Chains themselves impose no deadlines; wrap them with this layer when a
//! hanging execution hook must not stall the caller.

use async_trait::async_trait;
use chainkit_core::chain::{Chain, OutputStream};
use chainkit_core::error::ChainError;
use chainkit_core::layer::{Layer, LayeredChain};
use chainkit_core::types::*;
use std::fmt::Debug;
use std::time::Duration;

/// Timeout layer configuration
#[derive(Debug, Clone)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    /// Create a timeout layer with the given deadline
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Configured deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TimeoutLayer {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl<C: Chain> Layer<C> for TimeoutLayer {
    type LayeredChain = TimeoutChain<C>;

    fn layer(&self, inner: C) -> Self::LayeredChain {
        TimeoutChain {
            inner,
            timeout: self.timeout,
        }
    }
}

/// Chain wrapped with a deadline
#[derive(Debug)]
pub struct TimeoutChain<C> {
    inner: C,
    timeout: Duration,
}

impl<C: Chain> TimeoutChain<C> {
    fn elapsed(&self, operation: &str) -> ChainError {
        tracing::warn!(
            "chain {} {} exceeded {:?}",
            self.inner.chain_type(),
            operation,
            self.timeout
        );
        ChainError::timeout(format!(
            "chain '{}' {} exceeded {:?}",
            self.inner.chain_type(),
            operation,
            self.timeout
        ))
    }
}

#[async_trait]
impl<C: Chain> LayeredChain for TimeoutChain<C> {
    type Inner = C;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_execute(&self, inputs: &Inputs) -> Result<Outputs, ChainError> {
        tokio::time::timeout(self.timeout, self.inner.execute(inputs))
            .await
            .map_err(|_| self.elapsed("execute"))?
    }

    async fn layered_execute_stream(
        &self,
        inputs: &Inputs,
    ) -> Result<Box<OutputStream>, ChainError> {
        // Bounds opening the stream; consumers control how long they read it
        tokio::time::timeout(self.timeout, self.inner.execute_stream(inputs))
            .await
            .map_err(|_| self.elapsed("execute_stream"))?
    }
}

#[async_trait]
impl<C: Chain> Chain for TimeoutChain<C> {
    fn chain_type(&self) -> &str {
        LayeredChain::layered_chain_type(self)
    }

    fn input_keys(&self) -> Vec<String> {
        LayeredChain::layered_input_keys(self)
    }

    fn output_keys(&self) -> Vec<String> {
        LayeredChain::layered_output_keys(self)
    }

    async fn execute(&self, inputs: &Inputs) -> Result<Outputs, ChainError> {
        LayeredChain::layered_execute(self, inputs).await
    }

    async fn execute_stream(&self, inputs: &Inputs) -> Result<Box<OutputStream>, ChainError> {
        LayeredChain::layered_execute_stream(self, inputs).await
    }
}
