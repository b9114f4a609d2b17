//! Logging layer for chain executions.

use chainkit_core::chain::{Chain, OutputStream};
use chainkit_core::error::ChainError;
use chainkit_core::layer::{Layer, LayeredChain};
use chainkit_core::types::*;
use async_trait::async_trait;
use std::fmt::Debug;

/// Logging layer that logs chain executions.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[Chainkit]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Chain> Layer<C> for LoggingLayer {
    type LayeredChain = LoggingChain<C>;

    fn layer(&self, inner: C) -> Self::LayeredChain {
        LoggingChain {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Chain wrapped with logging
#[derive(Debug)]
pub struct LoggingChain<C> {
    inner: C,
    prefix: String,
}

impl<C> LoggingChain<C> {
    /// Prefix put in front of every log line
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[async_trait]
impl<C: Chain> LayeredChain for LoggingChain<C> {
    type Inner = C;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_execute(&self, inputs: &Inputs) -> Result<Outputs, ChainError> {
        tracing::debug!(
            "{} execute request: chain={}, inputs={}",
            self.prefix,
            self.inner.chain_type(),
            inputs.len()
        );

        let start = std::time::Instant::now();
        let result = self.inner.execute(inputs).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(outputs) => {
                tracing::debug!(
                    "{} execute success: chain={}, outputs={}, elapsed={:?}",
                    self.prefix,
                    self.inner.chain_type(),
                    outputs.len(),
                    elapsed
                );
            }
            Err(e) => {
                tracing::error!(
                    "{} execute error: chain={}, error={:?}, elapsed={:?}",
                    self.prefix,
                    self.inner.chain_type(),
                    e,
                    elapsed
                );
            }
        }

        result
    }

    async fn layered_execute_stream(
        &self,
        inputs: &Inputs,
    ) -> Result<Box<OutputStream>, ChainError> {
        tracing::debug!(
            "{} execute_stream request: chain={}, inputs={}",
            self.prefix,
            self.inner.chain_type(),
            inputs.len()
        );

        let start = std::time::Instant::now();
        let result = self.inner.execute_stream(inputs).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::debug!(
                    "{} execute_stream opened: chain={}, elapsed={:?}",
                    self.prefix,
                    self.inner.chain_type(),
                    elapsed
                );
            }
            Err(e) if e.is_unsupported() => {
                tracing::debug!(
                    "{} execute_stream unsupported: chain={}",
                    self.prefix,
                    self.inner.chain_type()
                );
            }
            Err(e) => {
                tracing::error!(
                    "{} execute_stream error: chain={}, error={:?}, elapsed={:?}",
                    self.prefix,
                    self.inner.chain_type(),
                    e,
                    elapsed
                );
            }
        }

        result
    }
}

#[async_trait]
impl<C: Chain> Chain for LoggingChain<C> {
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
