//! Tool domain traits
//!
//! Contains pure domain logic for validating a call's arguments against a
//! tool's schema. Tools run this lazily, at execute time, so that
//! binding a call never fails.

use super::entities::{ToolCall, ToolSchema};

/// Validator for tool calls
///
/// This is a pure domain trait that validates tool calls
/// against their schemas without any I/O operations.
pub trait ToolValidator {
    /// Validate a tool call against its schema
    fn validate(&self, call: &ToolCall, schema: &ToolSchema) -> Result<(), String>;
}

/// Default implementation of ToolValidator
///
/// Rejects missing required parameters, unknown parameters, and values
/// whose JSON type contradicts the declared type hint.
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, call: &ToolCall, schema: &ToolSchema) -> Result<(), String> {
        for param in &schema.parameters {
            match call.arguments.get(&param.name) {
                None | Some(serde_json::Value::Null) if param.required => {
                    return Err(format!(
                        "Missing required parameter '{}' for tool '{}'",
                        param.name, schema.name
                    ));
                }
                Some(serde_json::Value::Null) => {}
                Some(value) if !type_matches(&param.param_type, value) => {
                    return Err(format!(
                        "Parameter '{}' for tool '{}' must be of type {}",
                        param.name, schema.name, param.param_type
                    ));
                }
                _ => {}
            }
        }

        for arg_name in call.arguments.keys() {
            if schema.parameter(arg_name).is_none() {
                return Err(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    arg_name, schema.name
                ));
            }
        }

        Ok(())
    }
}

fn type_matches(param_type: &str, value: &serde_json::Value) -> bool {
    match param_type {
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "string" | "path" => value.is_string(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::ToolParameter;

    fn schema() -> ToolSchema {
        ToolSchema::new("test", "test tool")
            .with_parameter(ToolParameter::new("path", "A required path", true).with_type("path"))
            .with_parameter(ToolParameter::new("limit", "Optional count", false).with_type("integer"))
    }

    #[test]
    fn test_validator_missing_required() {
        let call = ToolCall::new("test");
        let result = DefaultToolValidator.validate(&call, &schema());
        assert!(result.unwrap_err().contains("Missing required parameter 'path'"));
    }

    #[test]
    fn test_validator_unknown_param() {
        let call = ToolCall::new("test")
            .with_arg("path", "a.txt")
            .with_arg("unknown_param", "value");
        let result = DefaultToolValidator.validate(&call, &schema());
        assert!(result.unwrap_err().contains("Unknown parameter"));
    }

    #[test]
    fn test_validator_wrong_type() {
        let call = ToolCall::new("test")
            .with_arg("path", "a.txt")
            .with_arg("limit", "ten");
        let result = DefaultToolValidator.validate(&call, &schema());
        assert!(result.unwrap_err().contains("must be of type integer"));
    }

    #[test]
    fn test_validator_valid_call() {
        let call = ToolCall::new("test")
            .with_arg("path", "a.txt")
            .with_arg("limit", 5);
        assert!(DefaultToolValidator.validate(&call, &schema()).is_ok());
    }
}
