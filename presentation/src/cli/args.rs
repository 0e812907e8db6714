//! Parsing of `--arg` / `--args-json` into a [`ToolCall`].

use serde_json::Value;
use warden_domain::ToolCall;

/// Parse `KEY=VALUE` (string value) or `KEY:=JSON` (raw JSON value).
///
/// The first `=` splits key from value, so values may contain `=`.
pub fn parse_arg(input: &str) -> Result<(String, Value), String> {
    let Some((key, value)) = input.split_once('=') else {
        return Err(format!("expected KEY=VALUE or KEY:=JSON, got '{}'", input));
    };

    if let Some(key) = key.strip_suffix(':') {
        if key.is_empty() {
            return Err(format!("missing key in '{}'", input));
        }
        let value = serde_json::from_str(value)
            .map_err(|e| format!("invalid JSON for '{}': {}", key, e))?;
        return Ok((key.to_string(), value));
    }

    if key.is_empty() {
        return Err(format!("missing key in '{}'", input));
    }
    Ok((key.to_string(), Value::String(value.to_string())))
}

/// Build a call from an optional JSON object plus individual overrides.
pub fn build_call(
    tool: &str,
    args_json: Option<&str>,
    args: &[(String, Value)],
) -> Result<ToolCall, String> {
    let mut call = match args_json {
        Some(json) => {
            let value: Value =
                serde_json::from_str(json).map_err(|e| format!("invalid --args-json: {}", e))?;
            if !value.is_object() {
                return Err("--args-json must be a JSON object".to_string());
            }
            ToolCall::from_json(tool, value)
        }
        None => ToolCall::new(tool),
    };

    for (key, value) in args {
        call = call.with_arg(key.clone(), value.clone());
    }
    Ok(call)
}
