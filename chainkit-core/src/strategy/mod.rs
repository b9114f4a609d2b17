//! Strategy layer for chain-specific behaviors.
//!
//! This module defines strategy patterns for behaviors that vary between
//! chains, such as how streamed partial outputs are accumulated.

pub mod accumulation;

pub use accumulation::{AccumulationStrategy, ConcatAll, PrimaryKeyConcat};
