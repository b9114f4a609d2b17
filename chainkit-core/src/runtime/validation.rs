//! Key validation shared by the sync and streaming paths.

use crate::error::ChainError;
use crate::types::{missing_keys, Inputs, Outputs};

/// Check that all declared inputs are present
pub fn validate_inputs(input_keys: &[String], inputs: &Inputs) -> Result<(), ChainError> {
    let missing = missing_keys(input_keys, inputs);
    if !missing.is_empty() {
        return Err(ChainError::invalid_argument(format!(
            "Missing some input keys: {:?}",
            missing
        )));
    }
    Ok(())
}

/// Check that all declared outputs are present
pub fn validate_outputs(output_keys: &[String], outputs: &Outputs) -> Result<(), ChainError> {
    let missing = missing_keys(output_keys, outputs);
    if !missing.is_empty() {
        return Err(ChainError::invalid_argument(format!(
            "Missing some output keys: {:?}",
            missing
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_inputs_are_named() {
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let inputs: Inputs = [("b".to_string(), json!(1))].into_iter().collect();

        let err = validate_inputs(&keys, &inputs).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "Invalid argument: Missing some input keys: [\"a\", \"c\"]"
        );
    }

    #[test]
    fn test_extra_outputs_are_allowed() {
        let keys = vec!["text".to_string()];
        let outputs: Outputs = [
            ("text".to_string(), "t".to_string()),
            ("extra".to_string(), "e".to_string()),
        ]
        .into_iter()
        .collect();

        assert!(validate_outputs(&keys, &outputs).is_ok());
        assert!(validate_outputs(&keys, &Outputs::new()).is_err());
    }
}
