//! EchoChain: copies one input to one output.

use crate::chain::{Chain, OutputStream};
use crate::error::ChainError;
use crate::types::*;
use async_trait::async_trait;

/// Chain that echoes its single input as its single output.
///
/// Streaming emits the echoed text word by word, keeping the separating
/// spaces, so the concatenated stream equals the sync result.
#[derive(Debug, Clone)]
pub struct EchoChain {
    input_key: String,
    output_key: String,
}

impl EchoChain {
    /// Create an echo chain
    pub fn new(input_key: impl Into<String>, output_key: impl Into<String>) -> Self {
        Self {
            input_key: input_key.into(),
            output_key: output_key.into(),
        }
    }

    fn text(&self, inputs: &Inputs) -> Result<String, ChainError> {
        inputs
            .get(&self.input_key)
            .map(stringify_value)
            .ok_or_else(|| ChainError::execution(format!("input '{}' not provided", self.input_key)))
    }
}

#[async_trait]
impl Chain for EchoChain {
    fn chain_type(&self) -> &str {
        "echo"
    }

    fn input_keys(&self) -> Vec<String> {
        vec![self.input_key.clone()]
    }

    fn output_keys(&self) -> Vec<String> {
        vec![self.output_key.clone()]
    }

    async fn execute(&self, inputs: &Inputs) -> Result<Outputs, ChainError> {
        let text = self.text(inputs)?;
        Ok(Outputs::from([(self.output_key.clone(), text)]))
    }

    async fn execute_stream(&self, inputs: &Inputs) -> Result<Box<OutputStream>, ChainError> {
        let text = self.text(inputs)?;
        let output_key = self.output_key.clone();

        let stream = async_stream::stream! {
            let words: Vec<String> = text.split_inclusive(' ').map(str::to_string).collect();
            for word in words {
                yield Ok::<Outputs, ChainError>(Outputs::from([(output_key.clone(), word)]));
            }
        };

        Ok(Box::new(Box::pin(stream)))
    }
}
