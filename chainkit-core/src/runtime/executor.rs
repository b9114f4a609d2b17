//! ChainExecutor implementation.
//!
//! This module implements the ChainExecutor, which wraps a [`Chain`] with
//! input preparation, memory integration, output validation and result
//! shaping for both the synchronous and the streaming invocation paths.

use crate::chain::{Chain, OutputStream, TextStream};
use crate::error::ChainError;
use crate::layer::Layer;
use crate::memory::Memory;
use crate::runtime::stream::{AccumulatingStream, OutputAccumulator};
use crate::runtime::validation::{validate_inputs, validate_outputs};
use crate::strategy::{AccumulationStrategy, PrimaryKeyConcat};
use crate::types::*;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;

/// Type-erased chain that can be shared across threads
type BoxedChain = Arc<dyn Chain>;

/// Builder for composing a chain with layers and memory.
///
/// # Example
///
/// ```ignore
/// let executor = ChainExecutor::builder(my_chain)
///     .layer(LoggingLayer::new())
///     .layer(TimeoutLayer::new(Duration::from_secs(30)))
///     .memory(Arc::new(my_memory))
///     .finish();
/// ```
pub struct ChainExecutorBuilder<C> {
    chain: C,
    memory: Option<Arc<dyn Memory>>,
    accumulation: Option<Arc<dyn AccumulationStrategy>>,
}

impl<C: Chain> ChainExecutorBuilder<C> {
    /// Create a new builder with a chain
    pub fn new(chain: C) -> Self {
        Self {
            chain,
            memory: None,
            accumulation: None,
        }
    }

    /// Add a layer to wrap the chain
    ///
    /// Each call creates a new concrete type by wrapping the previous chain.
    pub fn layer<L>(self, layer: L) -> ChainExecutorBuilder<L::LayeredChain>
    where
        L: Layer<C>,
    {
        ChainExecutorBuilder {
            chain: layer.layer(self.chain),
            memory: self.memory,
            accumulation: self.accumulation,
        }
    }

    /// Attach a shared memory collaborator
    pub fn memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Set a custom accumulation strategy for streamed outputs
    ///
    /// Defaults to [`PrimaryKeyConcat`].
    pub fn accumulation(mut self, strategy: Arc<dyn AccumulationStrategy>) -> Self {
        self.accumulation = Some(strategy);
        self
    }

    /// Finish building and create a ChainExecutor
    pub fn finish(self) -> ChainExecutor {
        let accumulation = self
            .accumulation
            .unwrap_or_else(|| Arc::new(PrimaryKeyConcat::new()));

        ChainExecutor {
            chain: Arc::new(self.chain),
            memory: self.memory,
            accumulation,
        }
    }
}

/// Executes a chain under the invocation contract.
///
/// Every invocation runs `prepare -> execute -> validate -> persist -> shape`.
/// No state is kept between calls other than what lives in the memory, and
/// concurrent calls are not serialized.
#[derive(Clone)]
pub struct ChainExecutor {
    chain: BoxedChain,
    memory: Option<Arc<dyn Memory>>,
    accumulation: Arc<dyn AccumulationStrategy>,
}

impl std::fmt::Debug for ChainExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainExecutor")
            .field("chain", &self.chain)
            .field("memory", &self.memory)
            .field("accumulation", &self.accumulation.name())
            .finish()
    }
}

impl ChainExecutor {
    /// Create a new builder
    pub fn builder<C: Chain>(chain: C) -> ChainExecutorBuilder<C> {
        ChainExecutorBuilder::new(chain)
    }

    /// Create an executor without memory or layers
    pub fn new<C: Chain>(chain: C) -> Self {
        ChainExecutorBuilder::new(chain).finish()
    }

    /// Get chain information
    pub fn info(&self) -> ChainInfo {
        self.chain.info()
    }

    /// Identifier of the wrapped chain family
    pub fn chain_type(&self) -> &str {
        self.chain.chain_type()
    }

    /// Input keys of the wrapped chain
    pub fn input_keys(&self) -> Vec<String> {
        self.chain.input_keys()
    }

    /// Output keys of the wrapped chain
    pub fn output_keys(&self) -> Vec<String> {
        self.chain.output_keys()
    }

    /// Get the attached memory, if any
    pub fn memory(&self) -> Option<&Arc<dyn Memory>> {
        self.memory.as_ref()
    }

    /// Whether a memory is attached
    pub fn has_memory(&self) -> bool {
        self.memory.is_some()
    }

    /// Validate and prepare inputs.
    ///
    /// A single value is bound to the only input key the memory cannot
    /// supply. A mapping is merged with recalled memory values, memory
    /// winning on collisions, and checked for every declared input key.
    pub async fn prepare_inputs(
        &self,
        input: impl Into<ChainInput>,
    ) -> Result<Inputs, ChainError> {
        let mut inputs = match input.into() {
            ChainInput::Single(value) => {
                let key = self.single_input_key()?;
                Inputs::from([(key, value)])
            }
            ChainInput::Map(inputs) => inputs,
        };

        if let Some(memory) = &self.memory {
            let recalled = memory.load_memory_variables(&inputs).await?;
            tracing::trace!(
                chain_type = %self.chain_type(),
                recalled = recalled.len(),
                "merged memory variables"
            );
            inputs.extend(recalled);
        }

        validate_inputs(&self.input_keys(), &inputs)?;
        Ok(inputs)
    }

    /// Run the chain and return its outputs.
    ///
    /// With `return_only_outputs` the chain's outputs are returned as-is,
    /// otherwise every prepared input (stringified) is included as well and
    /// outputs take precedence on shared keys.
    pub async fn invoke(
        &self,
        input: impl Into<ChainInput>,
        return_only_outputs: bool,
    ) -> Result<Outputs, ChainError> {
        let ctx = InvocationContext::new(self.chain_type(), false);
        tracing::debug!(
            invocation_id = %ctx.invocation_id,
            chain_type = %ctx.chain_type,
            "chain invoke started"
        );

        let inputs = self.prepare_inputs(input).await?;
        let outputs = self.chain.execute(&inputs).await?;

        if let Err(err) = validate_outputs(&self.output_keys(), &outputs) {
            tracing::warn!(
                invocation_id = %ctx.invocation_id,
                chain_type = %ctx.chain_type,
                error = %err,
                "chain returned incomplete outputs"
            );
            return Err(err);
        }

        if let Some(memory) = &self.memory {
            memory.save_context(&inputs, &outputs).await?;
        }

        tracing::debug!(
            invocation_id = %ctx.invocation_id,
            outputs = outputs.len(),
            "chain invoke completed"
        );

        if return_only_outputs {
            Ok(outputs)
        } else {
            Ok(merge_over_inputs(&inputs, &outputs))
        }
    }

    /// Run the chain as a stream of partial outputs.
    ///
    /// Preparation errors and a chain without streaming support fail here;
    /// errors while streaming are yielded as stream items. Memory is updated
    /// with the accumulated outputs only after the stream is fully consumed.
    /// A stream that ends without any element still saves, with an empty
    /// outputs mapping.
    pub async fn invoke_stream(
        &self,
        input: impl Into<ChainInput>,
        return_only_outputs: bool,
    ) -> Result<Box<OutputStream>, ChainError> {
        let ctx = InvocationContext::new(self.chain_type(), true);
        tracing::debug!(
            invocation_id = %ctx.invocation_id,
            chain_type = %ctx.chain_type,
            streaming = ctx.streaming,
            "chain stream started"
        );

        let inputs = self.prepare_inputs(input).await?;
        let stream = self.chain.execute_stream(&inputs).await?;

        let accumulator = OutputAccumulator::new(self.output_keys(), Arc::clone(&self.accumulation));
        let stream = AccumulatingStream::new(
            stream,
            accumulator,
            inputs,
            self.memory.clone(),
            return_only_outputs,
            ctx,
        );

        Ok(Box::new(stream))
    }

    /// Run the chain as text in, text out.
    ///
    /// Only valid for chains with exactly one output key.
    pub async fn run(&self, input: impl Into<ChainInput>) -> Result<String, ChainError> {
        let key = self.single_output_key()?;
        let mut outputs = self.invoke(input, false).await?;

        outputs
            .remove(&key)
            .ok_or_else(|| ChainError::invalid_argument(format!("Missing output key: {}", key)))
    }

    /// Stream the single output's value.
    ///
    /// Only valid for chains with exactly one output key.
    pub async fn run_stream(
        &self,
        input: impl Into<ChainInput>,
    ) -> Result<Box<TextStream>, ChainError> {
        let key = self.single_output_key()?;
        let stream = self.invoke_stream(input, false).await?;

        let text = stream.map(move |item| {
            item.and_then(|mut outputs| {
                outputs.remove(&key).ok_or_else(|| {
                    ChainError::invalid_argument(format!("Missing output key: {}", key))
                })
            })
        });

        Ok(Box::new(text))
    }

    fn single_input_key(&self) -> Result<String, ChainError> {
        let memory_variables: HashSet<String> = self
            .memory
            .as_ref()
            .map(|memory| memory.memory_variables().into_iter().collect())
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let mut required: Vec<String> = self
            .input_keys()
            .into_iter()
            .filter(|key| !memory_variables.contains(key) && seen.insert(key.clone()))
            .collect();

        if required.len() != 1 {
            return Err(ChainError::invalid_argument(format!(
                "A single input was passed in, but this chain expects {} inputs ({:?}). \
                 When a chain expects multiple inputs, pass a mapping of key to value instead",
                required.len(),
                required
            )));
        }

        Ok(required.remove(0))
    }

    fn single_output_key(&self) -> Result<String, ChainError> {
        let mut output_keys = self.output_keys();
        if output_keys.len() != 1 {
            return Err(ChainError::invalid_argument(format!(
                "`run` is not supported when there is not exactly one output key. Got {:?}",
                output_keys
            )));
        }
        Ok(output_keys.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{EchoChain, RecordingMemory, ScriptedChain};
    use async_trait::async_trait;
    use futures::StreamExt;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn key_set<V>(map: &std::collections::HashMap<String, V>) -> BTreeSet<String> {
        map.keys().cloned().collect()
    }

    fn set(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[tokio::test]
    async fn test_prepare_single_value() {
        let executor = ChainExecutor::new(ScriptedChain::new(&["a"], &["out"]));

        let inputs = executor.prepare_inputs("hello").await.unwrap();
        assert_eq!(inputs, Inputs::from([("a".to_string(), json!("hello"))]));
    }

    #[tokio::test]
    async fn test_prepare_single_value_ambiguous() {
        let executor = ChainExecutor::new(ScriptedChain::new(&["a", "b"], &["out"]));

        let err = executor.prepare_inputs("hello").await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("[\"a\", \"b\"]"));
    }

    #[tokio::test]
    async fn test_prepare_single_value_no_inputs() {
        let executor = ChainExecutor::new(ScriptedChain::new(&[], &["out"]));

        let err = executor.prepare_inputs("hello").await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_prepare_single_value_with_memory() {
        let memory = Arc::new(RecordingMemory::new().with_variable("history", "Human: hi again"));
        let executor = ChainExecutor::builder(ScriptedChain::new(&["history", "question"], &["text"]))
            .memory(memory.clone())
            .finish();

        let inputs = executor.prepare_inputs("hi").await.unwrap();
        assert_eq!(
            inputs,
            Inputs::from([
                ("history".to_string(), json!("Human: hi again")),
                ("question".to_string(), json!("hi")),
            ])
        );
        assert_eq!(memory.load_count(), 1);
    }

    #[tokio::test]
    async fn test_prepare_memory_overrides_caller_values() {
        let memory = Arc::new(RecordingMemory::new().with_variable("history", "recalled"));
        let executor = ChainExecutor::builder(ScriptedChain::new(&["history", "question"], &["text"]))
            .memory(memory)
            .finish();

        let inputs = executor
            .prepare_inputs(ChainInput::map([("history", "caller"), ("question", "q")]))
            .await
            .unwrap();
        assert_eq!(inputs["history"], json!("recalled"));
        assert_eq!(inputs["question"], json!("q"));
    }

    #[tokio::test]
    async fn test_prepare_missing_keys() {
        let executor = ChainExecutor::new(ScriptedChain::new(&["a", "b", "c"], &["out"]));

        let err = executor
            .prepare_inputs(ChainInput::map([("b", 1)]))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: Missing some input keys: [\"a\", \"c\"]"
        );
    }

    #[tokio::test]
    async fn test_invoke_returns_inputs_and_outputs() {
        let chain = ScriptedChain::new(&["question", "text"], &["text", "source"])
            .with_outputs([("text", "answer"), ("source", "docA")]);
        let executor = ChainExecutor::new(chain);

        let result = executor
            .invoke(ChainInput::map([("question", json!("q")), ("text", json!(7))]), false)
            .await
            .unwrap();

        assert_eq!(key_set(&result), set(&["question", "text", "source"]));
        assert_eq!(result["text"], "answer");
        assert_eq!(result["question"], "q");
    }

    #[tokio::test]
    async fn test_invoke_returns_only_outputs() {
        let chain = ScriptedChain::new(&["question"], &["text", "source"])
            .with_outputs([("text", "answer"), ("source", "docA")]);
        let executor = ChainExecutor::new(chain);

        let result = executor.invoke("q", true).await.unwrap();
        assert_eq!(key_set(&result), set(&["text", "source"]));
    }

    #[tokio::test]
    async fn test_invoke_missing_outputs() {
        let memory = Arc::new(RecordingMemory::new());
        let chain = ScriptedChain::new(&["question"], &["text", "source"])
            .with_outputs([("text", "answer")]);
        let executor = ChainExecutor::builder(chain).memory(memory.clone()).finish();

        let err = executor.invoke("q", true).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: Missing some output keys: [\"source\"]"
        );
        assert_eq!(memory.save_count(), 0);
    }

    #[tokio::test]
    async fn test_invoke_saves_context_once() {
        let memory = Arc::new(RecordingMemory::new().with_variable("history", ""));
        let chain = ScriptedChain::new(&["history", "question"], &["text"])
            .with_outputs([("text", "answer")]);
        let executor = ChainExecutor::builder(chain).memory(memory.clone()).finish();

        executor.invoke("q", false).await.unwrap();

        let saved = memory.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0["question"], json!("q"));
        assert_eq!(saved[0].1["text"], "answer");
    }

    #[tokio::test]
    async fn test_invoke_execute_failure_skips_save() {
        let memory = Arc::new(RecordingMemory::new());
        let chain = ScriptedChain::new(&["question"], &["text"]).failing("backend down");
        let executor = ChainExecutor::builder(chain).memory(memory.clone()).finish();

        let err = executor.invoke("q", false).await.unwrap_err();
        assert!(matches!(err, ChainError::Execution(_)));
        assert_eq!(memory.save_count(), 0);
    }

    #[tokio::test]
    async fn test_invoke_does_not_touch_caller_map() {
        let memory = Arc::new(RecordingMemory::new().with_variable("history", "recalled"));
        let chain = ScriptedChain::new(&["history", "question"], &["text"])
            .with_outputs([("text", "t")]);
        let executor = ChainExecutor::builder(chain).memory(memory).finish();

        let caller: Inputs = Inputs::from([("question".to_string(), json!("q"))]);
        executor.invoke(caller.clone(), true).await.unwrap();

        assert_eq!(caller.len(), 1);
    }

    #[tokio::test]
    async fn test_run_single_output() {
        let executor = ChainExecutor::new(EchoChain::new("question", "answer"));

        let answer = executor.run("what is rust?").await.unwrap();
        assert_eq!(answer, "what is rust?");
    }

    #[tokio::test]
    async fn test_run_rejects_multiple_outputs_before_executing() {
        let chain = Arc::new(
            ScriptedChain::new(&["question"], &["text", "source"])
                .with_outputs([("text", "t"), ("source", "s")]),
        );
        let executor = ChainExecutor::new(Arc::clone(&chain));

        let err = executor.run("q").await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("[\"text\", \"source\"]"));
        assert_eq!(chain.execute_count(), 0);

        let err = executor.run_stream("q").await.err().unwrap();
        assert!(err.is_invalid_argument());
        assert_eq!(chain.stream_count(), 0);
    }

    #[tokio::test]
    async fn test_invoke_stream_unsupported() {
        let chain = ScriptedChain::new(&["question"], &["text"]).with_outputs([("text", "t")]);
        let executor = ChainExecutor::new(chain);

        let err = executor.invoke_stream("q", true).await.err().unwrap();
        assert!(err.is_unsupported());
    }

    /// Chain that only implements synchronous execution
    #[derive(Debug)]
    struct SyncOnlyChain;

    #[async_trait]
    impl Chain for SyncOnlyChain {
        fn chain_type(&self) -> &str {
            "sync_only"
        }

        fn input_keys(&self) -> Vec<String> {
            vec!["question".to_string()]
        }

        fn output_keys(&self) -> Vec<String> {
            vec!["answer".to_string()]
        }

        async fn execute(&self, _inputs: &Inputs) -> Result<Outputs, ChainError> {
            Ok([("answer".to_string(), "sync".to_string())].into_iter().collect())
        }
    }

    #[tokio::test]
    async fn test_default_execute_stream_is_unsupported() {
        let memory = Arc::new(RecordingMemory::new());
        let executor = ChainExecutor::builder(SyncOnlyChain)
            .memory(memory.clone())
            .finish();

        let err = executor.invoke_stream("hi", true).await.err().unwrap();
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("'sync_only'"));

        let err = executor.run_stream("hi").await.err().unwrap();
        assert!(err.is_unsupported());

        assert_eq!(memory.save_count(), 0);
        assert_eq!(executor.run("hi").await.unwrap(), "sync");
    }

    #[tokio::test]
    async fn test_invoke_stream_accumulates_and_saves() {
        let memory = Arc::new(RecordingMemory::new());
        let chain = ScriptedChain::new(&["question"], &["text", "source"])
            .emit([("text", "He"), ("source", "")])
            .emit([("text", "llo"), ("source", "docA")])
            .emit([("text", "!"), ("source", "docB")]);
        let executor = ChainExecutor::builder(chain).memory(memory.clone()).finish();

        let stream = executor.invoke_stream("greet", false).await.unwrap();
        let items: Vec<Outputs> = stream.map(|item| item.unwrap()).collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["question"], "greet");
        assert_eq!(items[2]["source"], "docB");

        let saved = memory.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].1["text"], "Hello!");
        assert_eq!(saved[0].1["source"], "docA");
    }

    #[tokio::test]
    async fn test_invoke_stream_with_concat_all() {
        let memory = Arc::new(RecordingMemory::new());
        let chain = ScriptedChain::new(&["question"], &["text", "source"])
            .emit([("text", "He"), ("source", "a")])
            .emit([("text", "llo"), ("source", "b")]);
        let executor = ChainExecutor::builder(chain)
            .memory(memory.clone())
            .accumulation(Arc::new(crate::strategy::ConcatAll::new()))
            .finish();

        let stream = executor.invoke_stream("q", true).await.unwrap();
        let _: Vec<_> = stream.collect().await;

        assert_eq!(memory.saved()[0].1["source"], "ab");
    }

    #[tokio::test]
    async fn test_invoke_stream_cancelled() {
        let memory = Arc::new(RecordingMemory::new());
        let chain = ScriptedChain::new(&["question"], &["text"])
            .emit([("text", "a")])
            .emit([("text", "b")])
            .emit([("text", "c")]);
        let executor = ChainExecutor::builder(chain).memory(memory.clone()).finish();

        let mut stream = executor.invoke_stream("q", true).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap()["text"], "a");
        drop(stream);

        assert_eq!(memory.save_count(), 0);
    }

    #[tokio::test]
    async fn test_run_stream_unwraps_single_output() {
        let memory = Arc::new(RecordingMemory::new());
        let executor = ChainExecutor::builder(EchoChain::new("question", "answer"))
            .memory(memory.clone())
            .finish();

        let stream = executor.run_stream("hello streaming world").await.unwrap();
        let chunks: Vec<String> = stream.map(|chunk| chunk.unwrap()).collect().await;

        assert_eq!(chunks, vec!["hello ", "streaming ", "world"]);
        assert_eq!(memory.saved()[0].1["answer"], "hello streaming world");
    }
}
