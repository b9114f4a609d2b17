//! Retry layer with exponential backoff.

use async_trait::async_trait;
use chainkit_core::chain::{Chain, OutputStream};
use chainkit_core::error::ChainError;
use chainkit_core::layer::{Layer, LayeredChain};
use chainkit_core::types::*;
use std::fmt::Debug;
use std::time::Duration;

/// Retry layer configuration
#[derive(Debug, Clone)]
pub struct RetryLayer {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
}

impl RetryLayer {
    /// Create a new retry layer with default settings
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set initial delay
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Set maximum delay
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate delay for a given attempt
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }
}

impl Default for RetryLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Chain> Layer<C> for RetryLayer {
    type LayeredChain = RetryChain<C>;

    fn layer(&self, inner: C) -> Self::LayeredChain {
        RetryChain {
            inner,
            config: self.clone(),
        }
    }
}

/// Chain wrapped with retry logic
#[derive(Debug)]
pub struct RetryChain<C> {
    inner: C,
    config: RetryLayer,
}

impl<C: Chain> RetryChain<C> {
    /// Execute with retry logic
    async fn execute_with_retry<T, F, Fut>(&self, mut operation: F) -> Result<T, ChainError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ChainError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !e.is_retryable() || attempt >= self.config.max_retries {
                        return Err(e);
                    }

                    let delay = self.config.calculate_delay(attempt);
                    tracing::debug!(
                        "Retry attempt {}/{} for chain {}, waiting {:?}",
                        attempt + 1,
                        self.config.max_retries,
                        self.inner.chain_type(),
                        delay
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl<C: Chain> LayeredChain for RetryChain<C> {
    type Inner = C;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_execute(&self, inputs: &Inputs) -> Result<Outputs, ChainError> {
        self.execute_with_retry(|| async move { self.inner.execute(inputs).await })
            .await
    }

    async fn layered_execute_stream(
        &self,
        inputs: &Inputs,
    ) -> Result<Box<OutputStream>, ChainError> {
        // Only opening the stream is retried, never mid-stream
        self.execute_with_retry(|| async move { self.inner.execute_stream(inputs).await })
            .await
    }
}

#[async_trait]
impl<C: Chain> Chain for RetryChain<C> {
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
