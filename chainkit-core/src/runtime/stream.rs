//! Streaming adapter for chain invocations.
//!
//! [`AccumulatingStream`] wraps the stream returned by a chain's
//! `execute_stream` and, per element: validates it against the declared
//! output keys, folds it into an [`OutputAccumulator`], and forwards it shaped
//! for the caller. Once the inner stream ends the accumulated outputs are
//! persisted to memory. Dropping the stream before that point skips the
//! persist entirely.

use crate::error::ChainError;
use crate::memory::Memory;
use crate::runtime::validation::validate_outputs;
use crate::strategy::AccumulationStrategy;
use crate::types::*;
use futures::future::BoxFuture;
use futures::{ready, FutureExt, Stream};
use pin_project::pin_project;
use std::fmt::Debug;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Fold state for one streaming invocation.
pub struct OutputAccumulator {
    output_keys: Vec<String>,
    strategy: Arc<dyn AccumulationStrategy>,
    outputs: Outputs,
    elements: usize,
}

impl OutputAccumulator {
    /// Create an empty accumulator for a chain's declared output keys
    pub fn new(output_keys: Vec<String>, strategy: Arc<dyn AccumulationStrategy>) -> Self {
        Self {
            output_keys,
            strategy,
            outputs: Outputs::new(),
            elements: 0,
        }
    }

    /// Declared output keys
    pub fn output_keys(&self) -> &[String] {
        &self.output_keys
    }

    /// Fold one element
    pub fn push(&mut self, element: &Outputs) {
        self.strategy
            .fold(&mut self.outputs, element, &self.output_keys);
        self.elements += 1;
    }

    /// Number of elements folded so far
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Current accumulated outputs
    pub fn snapshot(&self) -> Outputs {
        self.outputs.clone()
    }

    /// Consume the accumulator and return the accumulated outputs
    pub fn into_outputs(self) -> Outputs {
        self.outputs
    }
}

impl Debug for OutputAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputAccumulator")
            .field("output_keys", &self.output_keys)
            .field("strategy", &self.strategy.name())
            .field("outputs", &self.outputs)
            .field("elements", &self.elements)
            .finish()
    }
}

enum State {
    Streaming,
    Persisting(BoxFuture<'static, Result<(), ChainError>>),
    Done,
}

/// Stream of shaped outputs with completion-triggered memory persistence.
#[pin_project]
pub struct AccumulatingStream<S> {
    #[pin]
    inner: S,
    accumulator: OutputAccumulator,
    inputs: Arc<Inputs>,
    memory: Option<Arc<dyn Memory>>,
    return_only_outputs: bool,
    ctx: InvocationContext,
    state: State,
}

impl<S> AccumulatingStream<S>
where
    S: Stream<Item = Result<Outputs, ChainError>>,
{
    /// Wrap a chain's raw output stream
    pub fn new(
        inner: S,
        accumulator: OutputAccumulator,
        inputs: Inputs,
        memory: Option<Arc<dyn Memory>>,
        return_only_outputs: bool,
        ctx: InvocationContext,
    ) -> Self {
        Self {
            inner,
            accumulator,
            inputs: Arc::new(inputs),
            memory,
            return_only_outputs,
            ctx,
            state: State::Streaming,
        }
    }

    /// Fold state accumulated so far
    pub fn accumulator(&self) -> &OutputAccumulator {
        &self.accumulator
    }

    /// Whether the stream has finished, successfully or not
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

impl<S> Stream for AccumulatingStream<S>
where
    S: Stream<Item = Result<Outputs, ChainError>>,
{
    type Item = Result<Outputs, ChainError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            match this.state {
                State::Streaming => match ready!(this.inner.as_mut().poll_next(cx)) {
                    Some(Ok(element)) => {
                        if let Err(err) = validate_outputs(this.accumulator.output_keys(), &element)
                        {
                            tracing::warn!(
                                invocation_id = %this.ctx.invocation_id,
                                chain_type = %this.ctx.chain_type,
                                error = %err,
                                "stream element rejected"
                            );
                            *this.state = State::Done;
                            return Poll::Ready(Some(Err(err)));
                        }

                        this.accumulator.push(&element);

                        let item = if *this.return_only_outputs {
                            element
                        } else {
                            merge_over_inputs(this.inputs, &element)
                        };
                        return Poll::Ready(Some(Ok(item)));
                    }
                    Some(Err(err)) => {
                        tracing::debug!(
                            invocation_id = %this.ctx.invocation_id,
                            error = %err,
                            "chain stream failed, skipping memory save"
                        );
                        *this.state = State::Done;
                        return Poll::Ready(Some(Err(err)));
                    }
                    None => {
                        tracing::debug!(
                            invocation_id = %this.ctx.invocation_id,
                            chain_type = %this.ctx.chain_type,
                            elements = this.accumulator.elements(),
                            "chain stream completed"
                        );

                        let Some(memory) = this.memory.take() else {
                            *this.state = State::Done;
                            return Poll::Ready(None);
                        };

                        let inputs = Arc::clone(this.inputs);
                        let outputs = this.accumulator.snapshot();
                        *this.state = State::Persisting(Box::pin(async move {
                            memory.save_context(&inputs, &outputs).await
                        }));
                    }
                },
                State::Persisting(persist) => {
                    let result = ready!(persist.poll_unpin(cx));
                    *this.state = State::Done;

                    return match result {
                        Ok(()) => Poll::Ready(None),
                        Err(err) => Poll::Ready(Some(Err(err))),
                    };
                }
                State::Done => return Poll::Ready(None),
            }
        }
    }
}
