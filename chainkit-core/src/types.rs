//! Core types for chain invocations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use serde_json::Value;

/// Named inputs supplied to a chain for one invocation.
pub type Inputs = HashMap<String, Value>;

/// Named outputs produced by a chain for one invocation.
pub type Outputs = HashMap<String, String>;

/// Caller-supplied input for an invocation.
///
/// A `Single` value is only accepted when the chain has exactly one input key
/// left after subtracting the keys its memory can supply.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainInput {
    /// A bare value bound to the one unresolved input key
    Single(Value),
    /// An explicit key to value mapping
    Map(Inputs),
}

impl ChainInput {
    /// Create a single-value input
    pub fn single(value: impl Into<Value>) -> Self {
        Self::Single(value.into())
    }

    /// Create a mapping input from key/value pairs
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        pairs.into_iter().collect()
    }
}

impl From<&str> for ChainInput {
    fn from(s: &str) -> Self {
        Self::Single(Value::String(s.to_string()))
    }
}

impl From<String> for ChainInput {
    fn from(s: String) -> Self {
        Self::Single(Value::String(s))
    }
}

impl From<Value> for ChainInput {
    fn from(value: Value) -> Self {
        Self::Single(value)
    }
}

impl From<Inputs> for ChainInput {
    fn from(inputs: Inputs) -> Self {
        Self::Map(inputs)
    }
}

impl<K, V> FromIterator<(K, V)> for ChainInput
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Static description of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_type: String,
    pub input_keys: Vec<String>,
    pub output_keys: Vec<String>,
}

/// Per-invocation context used for log correlation
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub invocation_id: String,
    pub chain_type: String,
    pub streaming: bool,
}

impl InvocationContext {
    /// Create a new invocation context
    pub fn new(chain_type: impl Into<String>, streaming: bool) -> Self {
        Self {
            invocation_id: uuid::Uuid::new_v4().to_string(),
            chain_type: chain_type.into(),
            streaming,
        }
    }
}

/// Render an input value as the string placed in a combined result.
///
/// Strings are used verbatim; every other value renders as compact JSON.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Stringify every input and overlay `outputs` on top, outputs winning.
pub fn merge_over_inputs(inputs: &Inputs, outputs: &Outputs) -> Outputs {
    let mut result: Outputs = inputs
        .iter()
        .map(|(k, v)| (k.clone(), stringify_value(v)))
        .collect();
    result.extend(outputs.iter().map(|(k, v)| (k.clone(), v.clone())));
    result
}

/// Keys from `expected` absent in `present`, in declaration order.
pub fn missing_keys<'a, V>(
    expected: &'a [String],
    present: &HashMap<String, V>,
) -> Vec<&'a str> {
    expected
        .iter()
        .filter(|key| !present.contains_key(key.as_str()))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stringify_value() {
        assert_eq!(stringify_value(&json!("plain")), "plain");
        assert_eq!(stringify_value(&json!(42)), "42");
        assert_eq!(stringify_value(&json!(true)), "true");
        assert_eq!(stringify_value(&json!(["a", 1])), "[\"a\",1]");
    }

    #[test]
    fn test_merge_over_inputs_outputs_win() {
        let inputs: Inputs = [
            ("question".to_string(), json!("why?")),
            ("text".to_string(), json!("stale")),
            ("count".to_string(), json!(3)),
        ]
        .into_iter()
        .collect();
        let outputs: Outputs = [("text".to_string(), "fresh".to_string())]
            .into_iter()
            .collect();

        let merged = merge_over_inputs(&inputs, &outputs);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["question"], "why?");
        assert_eq!(merged["text"], "fresh");
        assert_eq!(merged["count"], "3");
    }

    #[test]
    fn test_missing_keys_keeps_declaration_order() {
        let expected = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        let present: Outputs = [("a".to_string(), String::new())].into_iter().collect();
        assert_eq!(missing_keys(&expected, &present), vec!["c", "b"]);
    }

    #[test]
    fn test_chain_info_json() {
        let info = ChainInfo {
            chain_type: "qa".to_string(),
            input_keys: vec!["question".to_string()],
            output_keys: vec!["text".to_string(), "source".to_string()],
        };

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(
            value,
            json!({
                "chain_type": "qa",
                "input_keys": ["question"],
                "output_keys": ["text", "source"]
            })
        );

        let parsed: ChainInfo = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn test_chain_input_conversions() {
        assert_eq!(ChainInput::from("hi"), ChainInput::Single(json!("hi")));

        let input = ChainInput::map([("a", "1"), ("b", "2")]);
        match input {
            ChainInput::Map(map) => {
                assert_eq!(map.len(), 2);
                assert_eq!(map["b"], json!("2"));
            }
            ChainInput::Single(_) => panic!("Expected mapping input"),
        }
    }
}
