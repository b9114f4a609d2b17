//! ScriptedChain: fixed keys with scripted sync outputs and stream elements.

use crate::chain::{streaming_unsupported, Chain, OutputStream};
use crate::error::ChainError;
use crate::types::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Step {
    Emit(Outputs),
    Fail(String),
}

/// Chain whose behavior is scripted up front.
///
/// `execute` returns the configured outputs (or fails), and `execute_stream`
/// replays the scripted steps. Without any scripted step the chain keeps
/// the default unsupported streaming behavior.
#[derive(Debug)]
pub struct ScriptedChain {
    chain_type: String,
    input_keys: Vec<String>,
    output_keys: Vec<String>,
    outputs: Outputs,
    steps: Vec<Step>,
    failure: Option<String>,
    execute_calls: AtomicUsize,
    stream_calls: AtomicUsize,
    seen_inputs: Mutex<Vec<Inputs>>,
}

fn to_outputs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Outputs
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl ScriptedChain {
    /// Create a chain declaring the given keys
    pub fn new(input_keys: &[&str], output_keys: &[&str]) -> Self {
        Self {
            chain_type: "scripted".to_string(),
            input_keys: input_keys.iter().map(|k| k.to_string()).collect(),
            output_keys: output_keys.iter().map(|k| k.to_string()).collect(),
            outputs: Outputs::new(),
            steps: Vec::new(),
            failure: None,
            execute_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            seen_inputs: Mutex::new(Vec::new()),
        }
    }

    /// Override the chain type tag
    pub fn with_chain_type(mut self, chain_type: impl Into<String>) -> Self {
        self.chain_type = chain_type.into();
        self
    }

    /// Outputs returned by `execute`
    pub fn with_outputs<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.outputs = to_outputs(pairs);
        self
    }

    /// Append a stream element
    pub fn emit<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.steps.push(Step::Emit(to_outputs(pairs)));
        self
    }

    /// Append a stream error; the stream ends after it
    pub fn fail_stream(mut self, message: impl Into<String>) -> Self {
        self.steps.push(Step::Fail(message.into()));
        self
    }

    /// Make `execute` fail with an execution error
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of `execute` calls
    pub fn execute_count(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    /// Number of `execute_stream` calls
    pub fn stream_count(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Inputs passed to every execution hook call, oldest first
    pub fn seen_inputs(&self) -> Vec<Inputs> {
        self.seen_inputs
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }

    fn record(&self, inputs: &Inputs) {
        if let Ok(mut seen) = self.seen_inputs.lock() {
            seen.push(inputs.clone());
        }
    }
}

#[async_trait]
impl Chain for ScriptedChain {
    fn chain_type(&self) -> &str {
        &self.chain_type
    }

    fn input_keys(&self) -> Vec<String> {
        self.input_keys.clone()
    }

    fn output_keys(&self) -> Vec<String> {
        self.output_keys.clone()
    }

    async fn execute(&self, inputs: &Inputs) -> Result<Outputs, ChainError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.record(inputs);

        match &self.failure {
            Some(message) => Err(ChainError::execution(message.clone())),
            None => Ok(self.outputs.clone()),
        }
    }

    async fn execute_stream(&self, inputs: &Inputs) -> Result<Box<OutputStream>, ChainError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.record(inputs);

        if self.steps.is_empty() {
            return Err(streaming_unsupported(&self.chain_type));
        }

        let steps = self.steps.clone();
        let stream = async_stream::stream! {
            for step in steps {
                match step {
                    Step::Emit(outputs) => yield Ok(outputs),
                    Step::Fail(message) => {
                        yield Err(ChainError::stream(message));
                        break;
                    }
                }
            }
        };

        Ok(Box::new(Box::pin(stream)))
    }
}
