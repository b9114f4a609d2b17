//! Accumulation strategies for streamed outputs.
//!
//! A streaming chain emits a sequence of partial output mappings. The
//! executor folds them into one accumulated mapping, which is what gets
//! persisted to memory once the stream completes:
//! - PrimaryKeyConcat: the first declared output key is treated as text being
//!   emitted token by token; every other key keeps its first non-blank value
//! - ConcatAll: every key is concatenated

use crate::types::Outputs;

/// Strategy for folding one streamed element into the accumulated outputs.
pub trait AccumulationStrategy: Send + Sync {
    /// Get the strategy name for debugging
    fn name(&self) -> &str;

    /// Fold `element` into `acc`.
    ///
    /// `output_keys` is the chain's declared output keys in declaration order.
    fn fold(&self, acc: &mut Outputs, element: &Outputs, output_keys: &[String]);
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Default strategy.
///
/// Only one key can stream here. A chain with several incrementally produced
/// keys loses everything after the first non-blank value for the others; use
/// [`ConcatAll`] for those.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryKeyConcat;

impl PrimaryKeyConcat {
    /// Create a new primary key strategy
    pub fn new() -> Self {
        Self
    }
}

impl AccumulationStrategy for PrimaryKeyConcat {
    fn name(&self) -> &str {
        "PrimaryKeyConcat"
    }

    fn fold(&self, acc: &mut Outputs, element: &Outputs, output_keys: &[String]) {
        let primary = output_keys.first().map(String::as_str);

        for (key, value) in element {
            if Some(key.as_str()) == primary {
                acc.entry(key.clone()).or_default().push_str(value);
                continue;
            }

            match acc.get_mut(key) {
                // First writer wins, blanks don't count
                Some(existing) if !is_blank(existing) => {}
                Some(existing) => {
                    existing.clone_from(value);
                }
                None => {
                    acc.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

/// Concatenate every key as it streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatAll;

impl ConcatAll {
    /// Create a new concat-all strategy
    pub fn new() -> Self {
        Self
    }
}

impl AccumulationStrategy for ConcatAll {
    fn name(&self) -> &str {
        "ConcatAll"
    }

    fn fold(&self, acc: &mut Outputs, element: &Outputs, _output_keys: &[String]) {
        for (key, value) in element {
            acc.entry(key.clone()).or_default().push_str(value);
        }
    }
}
