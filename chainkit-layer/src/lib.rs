//! # Chainkit Layers
//!
//! Built-in layers for Chainkit.
//!
//! Currently implemented layers:
//! - `LoggingLayer`: Logs chain executions with timing information
//! - `RetryLayer`: Automatic retry with exponential backoff for retryable errors
//! - `TimeoutLayer`: Deadline for execution and for opening a stream
//!
//! ## Usage
//!
//! ```ignore
//! use chainkit_core::ChainExecutor;
//! use chainkit_layer::{LoggingLayer, RetryLayer, TimeoutLayer};
//!
//! let executor = ChainExecutor::builder(chain)
//!     .layer(TimeoutLayer::new(Duration::from_secs(30)))
//!     .layer(RetryLayer::new().with_max_retries(3))
//!     .layer(LoggingLayer::new())
//!     .finish();
//! ```

pub mod logging;
pub mod retry;
pub mod timeout;

// Re-exports
pub use logging::LoggingLayer;
pub use retry::RetryLayer;
pub use timeout::TimeoutLayer;
