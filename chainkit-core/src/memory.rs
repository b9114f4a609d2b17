//! Memory collaborator trait.

use crate::error::ChainError;
use crate::types::*;
use async_trait::async_trait;
use std::fmt::Debug;

/// Conversational memory consulted before and updated after each invocation.
///
/// The executor only goes through these three operations and never inspects
/// what the memory stores. Implementations that cannot handle concurrent
/// access are responsible for their own serialization; invocations of the
/// same executor are not serialized.
#[async_trait]
pub trait Memory: Send + Sync + Debug + 'static {
    /// Keys this memory can supply
    fn memory_variables(&self) -> Vec<String>;

    /// Recall values for the given inputs.
    ///
    /// Returned values overwrite caller inputs with the same key.
    async fn load_memory_variables(&self, inputs: &Inputs) -> Result<Inputs, ChainError>;

    /// Record one completed turn
    async fn save_context(&self, inputs: &Inputs, outputs: &Outputs) -> Result<(), ChainError>;
}
