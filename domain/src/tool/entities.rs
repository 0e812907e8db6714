//! Tool domain entities: what a tool looks like to the model, and what a
//! bound call to it carries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coarse classification of what a tool does to the world.
///
/// The kind decides whether a tool may skip the confirmation gate:
/// read-only kinds never ask a human, because confirming an operation with
/// no side effects buys no safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Reads local state (e.g., read_file)
    Read,
    /// Modifies files in place (e.g., write_file, edit_file)
    Edit,
    /// Removes resources
    Delete,
    /// Renames or relocates resources
    Move,
    /// Searches local state (e.g., glob_search, grep_search)
    Search,
    /// Runs arbitrary processes (e.g., run_command)
    Execute,
    /// Reaches out to the network (e.g., web_fetch)
    Fetch,
    /// Pure reasoning aids with no effect (e.g., scratchpads)
    Think,
    /// Anything else; treated as mutating
    Other,
}

impl ToolKind {
    /// Kinds that never mutate state
    pub const READ_ONLY: &'static [ToolKind] = &[ToolKind::Read, ToolKind::Search, ToolKind::Think];

    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::Read => "read",
            ToolKind::Edit => "edit",
            ToolKind::Delete => "delete",
            ToolKind::Move => "move",
            ToolKind::Search => "search",
            ToolKind::Execute => "execute",
            ToolKind::Fetch => "fetch",
            ToolKind::Think => "think",
            ToolKind::Other => "other",
        }
    }

    /// Whether tools of this kind are declared non-mutating.
    pub fn is_read_only(&self) -> bool {
        Self::READ_ONLY.contains(self)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Whether this parameter is required
    pub required: bool,
    /// Parameter type hint (e.g., "string", "path", "number")
    pub param_type: String,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: "string".to_string(),
        }
    }

    pub fn with_type(mut self, param_type: impl Into<String>) -> Self {
        self.param_type = param_type.into();
        self
    }

    /// Whether the parameter names a filesystem path.
    pub fn is_path(&self) -> bool {
        self.param_type == "path"
    }

    /// JSON Schema type for this parameter's type hint.
    fn json_type(&self) -> &'static str {
        match self.param_type.as_str() {
            "number" => "number",
            "integer" => "integer",
            "boolean" => "boolean",
            _ => "string",
        }
    }
}

/// Model-facing description of a capability.
///
/// The description may embed usage guidance for the model; it is forwarded
/// verbatim and never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique name of the tool (e.g., "read_file")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Parameter specifications, in declaration order
    pub parameters: Vec<ToolParameter>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Names of the required parameters.
    ///
    /// Always a subset of the declared parameter keys, since `required` is a
    /// property of each declared parameter.
    pub fn required(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Names of the parameters typed as paths.
    pub fn path_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.is_path())
            .map(|p| p.name.as_str())
    }

    /// Values a call binds to this schema's path parameters.
    ///
    /// These are the locations surfaced to whoever confirms the call.
    pub fn affected_locations(&self, call: &ToolCall) -> Vec<String> {
        self.path_parameters()
            .filter_map(|name| call.get_string(name))
            .filter(|value| !value.trim().is_empty())
            .map(String::from)
            .collect()
    }

    /// Provider-neutral function-calling schema (JSON Schema `object`).
    pub fn to_function_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.json_type(),
                    "description": param.description,
                }),
            );
        }

        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": self.required(),
            }
        })
    }
}

/// A call to a tool with arguments, as emitted by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call
    pub tool_name: String,
    /// Arguments passed to the tool
    pub arguments: HashMap<String, serde_json::Value>,
    /// Provider-assigned call id, echoed back with the result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: HashMap::new(),
            call_id: None,
        }
    }

    /// Build a call from a JSON object of arguments.
    ///
    /// Non-object values yield a call without arguments.
    pub fn from_json(tool_name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let arguments = match arguments {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        Self {
            tool_name: tool_name.into(),
            arguments,
            call_id: None,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_call_id(mut self, id: impl Into<String>) -> Self {
        self.call_id = Some(id.into());
        self
    }

    /// Get a raw argument value
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.arguments.get(key)
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required, non-empty string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        match self.get_string(key) {
            Some(s) if !s.trim().is_empty() => Ok(s),
            Some(_) => Err(format!("Argument '{}' must not be empty", key)),
            None => Err(format!("Missing required argument: {}", key)),
        }
    }

    /// Get an optional i64 argument
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.arguments.get(key).and_then(|v| v.as_i64())
    }

    /// Get an optional u64 argument
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.arguments.get(key).and_then(|v| v.as_u64())
    }

    /// Get an optional bool argument
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.arguments.get(key).and_then(|v| v.as_bool())
    }
}
