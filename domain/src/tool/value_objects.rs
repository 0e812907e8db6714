//! Tool domain value objects: immutable result and error types
//!
//! These types form the **output side** of an invocation. Every run ends in
//! exactly one [`ToolResult`]: success when `error` is `None`, failure when it
//! is set. Authorization-tier failures (policy denial, declined
//! confirmation) and execution-tier failures (missing file, HTTP error) use
//! the same shape, so the agent loop has one handling path.

use serde::{Deserialize, Serialize};

/// Discriminant of a tool failure.
///
/// Serialized with the names the agent loop matches on (`"FileNotFoundError"`,
/// `"PolicyDenied"`, ...). The set is open: tools may report
/// [`ExecutionError`](ToolErrorKind::ExecutionError) for anything that does
/// not fit a more specific kind.
///
/// | Kind | Tier | Retryable? |
/// |------|------|-----------|
/// | `PolicyDenied` | authorization | No |
/// | `CancelledError` | authorization / execution | No |
/// | `InvalidArgumentError` | execution | Yes: the model can fix its call |
/// | `ToolNotFoundError` | execution | Yes: the model can pick another name |
/// | `FileNotFoundError` | execution | Yes |
/// | `EditTargetNotFound` / `EditTargetAmbiguous` | execution | Yes |
/// | everything else | execution | No |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolErrorKind {
    #[serde(rename = "FileNotFoundError")]
    FileNotFound,
    #[serde(rename = "FileExistsError")]
    FileExists,
    #[serde(rename = "EditTargetNotFound")]
    EditTargetNotFound,
    #[serde(rename = "EditTargetAmbiguous")]
    EditTargetAmbiguous,
    #[serde(rename = "ShellExecutionError")]
    ShellExecution,
    #[serde(rename = "InvalidUrlError")]
    InvalidUrl,
    #[serde(rename = "UnsupportedProtocolError")]
    UnsupportedProtocol,
    #[serde(rename = "HttpError")]
    Http,
    #[serde(rename = "TimeoutError")]
    Timeout,
    #[serde(rename = "CancelledError")]
    Cancelled,
    #[serde(rename = "PolicyDenied")]
    PolicyDenied,
    #[serde(rename = "InvalidArgumentError")]
    InvalidArgument,
    #[serde(rename = "ToolNotFoundError")]
    ToolNotFound,
    #[serde(rename = "PermissionDeniedError")]
    PermissionDenied,
    #[serde(rename = "ExecutionError")]
    ExecutionError,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::FileNotFound => "FileNotFoundError",
            ToolErrorKind::FileExists => "FileExistsError",
            ToolErrorKind::EditTargetNotFound => "EditTargetNotFound",
            ToolErrorKind::EditTargetAmbiguous => "EditTargetAmbiguous",
            ToolErrorKind::ShellExecution => "ShellExecutionError",
            ToolErrorKind::InvalidUrl => "InvalidUrlError",
            ToolErrorKind::UnsupportedProtocol => "UnsupportedProtocolError",
            ToolErrorKind::Http => "HttpError",
            ToolErrorKind::Timeout => "TimeoutError",
            ToolErrorKind::Cancelled => "CancelledError",
            ToolErrorKind::PolicyDenied => "PolicyDenied",
            ToolErrorKind::InvalidArgument => "InvalidArgumentError",
            ToolErrorKind::ToolNotFound => "ToolNotFoundError",
            ToolErrorKind::PermissionDenied => "PermissionDeniedError",
            ToolErrorKind::ExecutionError => "ExecutionError",
        }
    }

    /// Failures raised before any side effect occurred.
    pub fn is_authorization(&self) -> bool {
        matches!(self, ToolErrorKind::PolicyDenied | ToolErrorKind::Cancelled)
    }

    /// Whether the model can reasonably correct its call and retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ToolErrorKind::InvalidArgument
                | ToolErrorKind::ToolNotFound
                | ToolErrorKind::FileNotFound
                | ToolErrorKind::EditTargetNotFound
                | ToolErrorKind::EditTargetAmbiguous
        )
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error that occurred during authorization or execution of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error kind; serialized as `type`
    #[serde(rename = "type")]
    pub kind: ToolErrorKind,
    /// Human-readable error message
    pub message: String,
    /// HTTP status code, set only for [`ToolErrorKind::Http`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn file_not_found(path: impl AsRef<str>) -> Self {
        Self::new(
            ToolErrorKind::FileNotFound,
            format!("File not found: {}", path.as_ref()),
        )
    }

    pub fn file_exists(path: impl AsRef<str>) -> Self {
        Self::new(
            ToolErrorKind::FileExists,
            format!("File already exists: {}", path.as_ref()),
        )
    }

    pub fn edit_target_not_found(path: impl AsRef<str>) -> Self {
        Self::new(
            ToolErrorKind::EditTargetNotFound,
            format!(
                "Text to replace was not found in {}. Re-read the file and copy the exact text, including whitespace.",
                path.as_ref()
            ),
        )
    }

    pub fn edit_target_ambiguous(path: impl AsRef<str>, occurrences: usize) -> Self {
        Self::new(
            ToolErrorKind::EditTargetAmbiguous,
            format!(
                "Text to replace matches {} locations in {}. Include more surrounding context so it matches exactly once.",
                occurrences,
                path.as_ref()
            ),
        )
    }

    pub fn shell(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ShellExecution, message)
    }

    pub fn invalid_url(url: impl AsRef<str>, reason: impl std::fmt::Display) -> Self {
        Self::new(
            ToolErrorKind::InvalidUrl,
            format!("Invalid URL '{}': {}", url.as_ref(), reason),
        )
    }

    pub fn unsupported_protocol(scheme: impl AsRef<str>) -> Self {
        Self::new(
            ToolErrorKind::UnsupportedProtocol,
            format!(
                "Unsupported protocol '{}': only http and https are allowed",
                scheme.as_ref()
            ),
        )
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ToolErrorKind::Http,
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn timeout(operation: impl AsRef<str>) -> Self {
        Self::new(
            ToolErrorKind::Timeout,
            format!("Operation timed out: {}", operation.as_ref()),
        )
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Cancelled, message)
    }

    pub fn policy_denied(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::PolicyDenied, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArgument, message)
    }

    pub fn tool_not_found(name: impl AsRef<str>) -> Self {
        Self::new(
            ToolErrorKind::ToolNotFound,
            format!("Tool not found: {}", name.as_ref()),
        )
    }

    pub fn permission_denied(resource: impl AsRef<str>) -> Self {
        Self::new(
            ToolErrorKind::PermissionDenied,
            format!("Permission denied: {}", resource.as_ref()),
        )
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ExecutionError, message)
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (status {})", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// Structured metadata about tool execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResultMetadata {
    /// Duration of execution in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Number of bytes processed/returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    /// For file operations: the affected path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// For command execution: exit code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// For search operations: number of matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_count: Option<usize>,
}

/// Outcome of one invocation.
///
/// `llm_content` is what the model sees; `return_display` is what the user
/// sees. On failure both carry the error text, so the agent loop can feed
/// it back to the model unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that produced this result
    pub tool_name: String,
    /// Text surfaced to the model
    pub llm_content: String,
    /// Text surfaced to the user
    pub return_display: String,
    /// Set if and only if the call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    /// Metadata about the execution
    #[serde(default)]
    pub metadata: ToolResultMetadata,
}

impl ToolResult {
    /// Create a successful result shown identically to model and user
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        let output = output.into();
        Self {
            tool_name: tool_name.into(),
            return_display: output.clone(),
            llm_content: output,
            error: None,
            metadata: ToolResultMetadata::default(),
        }
    }

    /// Replace the user-facing text, keeping the model-facing content.
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.return_display = display.into();
        self
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        let tool_name = tool_name.into();
        let text = format!("Error executing {}: {}", tool_name, error.message);
        Self {
            tool_name,
            llm_content: text.clone(),
            return_display: text,
            error: Some(error),
            metadata: ToolResultMetadata::default(),
        }
    }

    /// Add metadata to the result
    pub fn with_metadata(mut self, metadata: ToolResultMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add duration metadata
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.metadata.duration_ms = Some(duration_ms);
        self
    }

    /// Add path metadata
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.metadata.path = Some(path.into());
        self
    }

    /// Check if execution was successful
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Get the error
    pub fn error(&self) -> Option<&ToolError> {
        self.error.as_ref()
    }

    /// Error kind, if the call failed
    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}
