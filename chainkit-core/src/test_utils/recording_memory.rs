//! RecordingMemory: fixed recalled values, records every saved turn.

use crate::error::ChainError;
use crate::memory::Memory;
use crate::types::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Memory that always recalls the same variables and keeps a log of
/// `save_context` calls.
#[derive(Debug, Default)]
pub struct RecordingMemory {
    variables: Inputs,
    saved: Mutex<Vec<(Inputs, Outputs)>>,
    loads: AtomicUsize,
    save_failure: Option<String>,
}

impl RecordingMemory {
    /// Create a memory with no variables
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable recalled on every load
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Make every `save_context` call fail with a memory error
    pub fn failing_save(mut self, message: impl Into<String>) -> Self {
        self.save_failure = Some(message.into());
        self
    }

    /// Every successfully saved turn, oldest first
    pub fn saved(&self) -> Vec<(Inputs, Outputs)> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .unwrap_or_default()
    }

    /// Number of successfully saved turns
    pub fn save_count(&self) -> usize {
        self.saved.lock().map(|saved| saved.len()).unwrap_or_default()
    }

    /// Number of `load_memory_variables` calls
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Memory for RecordingMemory {
    fn memory_variables(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    async fn load_memory_variables(&self, _inputs: &Inputs) -> Result<Inputs, ChainError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.variables.clone())
    }

    async fn save_context(&self, inputs: &Inputs, outputs: &Outputs) -> Result<(), ChainError> {
        if let Some(message) = &self.save_failure {
            return Err(ChainError::memory(message.clone()));
        }

        let mut saved = self
            .saved
            .lock()
            .map_err(|e| ChainError::memory(e.to_string()))?;
        saved.push((inputs.clone(), outputs.clone()));
        Ok(())
    }
}
