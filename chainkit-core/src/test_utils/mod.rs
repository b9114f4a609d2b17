//! In-memory implementations for testing.
//!
//! Available behind the `test-utils` feature flag. These are minimal
//! implementations of [`Chain`](crate::Chain) and [`Memory`](crate::Memory)
//! that record how the executor drives them.

mod echo_chain;
mod recording_memory;
mod scripted_chain;

pub use echo_chain::EchoChain;
pub use recording_memory::RecordingMemory;
pub use scripted_chain::ScriptedChain;
