//! Chain trait and core abstractions.

use crate::error::ChainError;
use crate::types::*;
use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::sync::Arc;

/// Stream type alias for partial chain outputs
pub type OutputStream = dyn Stream<Item = Result<Outputs, ChainError>> + Send + Unpin;

/// Stream type alias for the single-output text produced by `run_stream`
pub type TextStream = dyn Stream<Item = Result<String, ChainError>> + Send + Unpin;

/// Core chain trait.
///
/// A chain declares the keys it consumes and produces and implements the
/// computation itself. Validation, memory integration and result shaping are
/// handled by [`ChainExecutor`](crate::runtime::ChainExecutor), so
/// implementations only describe their domain logic here.
#[async_trait]
pub trait Chain: Send + Sync + Debug + 'static {
    /// Identifier of the chain family
    fn chain_type(&self) -> &str;

    /// Input keys this chain expects, in declaration order.
    ///
    /// Must return the same sequence for the lifetime of the instance.
    fn input_keys(&self) -> Vec<String>;

    /// Output keys this chain guarantees to produce, in declaration order.
    ///
    /// The first key is the one streamed incrementally by `execute_stream`.
    fn output_keys(&self) -> Vec<String>;

    /// Run the chain and return every output at once
    async fn execute(&self, inputs: &Inputs) -> Result<Outputs, ChainError>;

    /// Run the chain and return a stream of partial outputs.
    ///
    /// Chains without incremental production keep the default, which fails
    /// with [`ChainError::Unsupported`].
    async fn execute_stream(&self, _inputs: &Inputs) -> Result<Box<OutputStream>, ChainError> {
        Err(streaming_unsupported(self.chain_type()))
    }

    /// Static description of this chain
    fn info(&self) -> ChainInfo {
        ChainInfo {
            chain_type: self.chain_type().to_string(),
            input_keys: self.input_keys(),
            output_keys: self.output_keys(),
        }
    }
}

/// Error returned by chains that cannot stream
pub(crate) fn streaming_unsupported(chain_type: &str) -> ChainError {
    ChainError::unsupported(format!("chain '{}' does not support streaming", chain_type))
}

#[async_trait]
impl<C: Chain + ?Sized> Chain for Arc<C> {
    fn chain_type(&self) -> &str {
        (**self).chain_type()
    }

    fn input_keys(&self) -> Vec<String> {
        (**self).input_keys()
    }

    fn output_keys(&self) -> Vec<String> {
        (**self).output_keys()
    }

    async fn execute(&self, inputs: &Inputs) -> Result<Outputs, ChainError> {
        (**self).execute(inputs).await
    }

    async fn execute_stream(&self, inputs: &Inputs) -> Result<Box<OutputStream>, ChainError> {
        (**self).execute_stream(inputs).await
    }

    fn info(&self) -> ChainInfo {
        (**self).info()
    }
}
