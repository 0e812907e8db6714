//! File operation tools: read_file, write_file, edit_file

use super::builtin::BuiltinTool;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use warden_application::{ExecutionParams, OutputSink};
use warden_domain::{
    ToolCall, ToolError, ToolErrorKind, ToolKind, ToolParameter, ToolResult, ToolResultMetadata,
    ToolSchema, truncate_output,
};

/// Tool name constants
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const EDIT_FILE: &str = "edit_file";

/// Maximum file size to read (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

/// Map an I/O error on `path` into the tool error taxonomy.
pub(crate) fn io_error(path: &str, action: &str, e: std::io::Error) -> ToolError {
    match e.kind() {
        ErrorKind::NotFound => ToolError::file_not_found(path),
        ErrorKind::PermissionDenied => ToolError::permission_denied(path),
        ErrorKind::AlreadyExists => ToolError::file_exists(path),
        _ => ToolError::execution_failed(format!("Failed to {} {}: {}", action, path, e)),
    }
}

fn path_metadata(path: &str) -> ToolResultMetadata {
    ToolResultMetadata {
        path: Some(path.to_string()),
        ..Default::default()
    }
}

/// Write `content` to `path`, refusing to clobber an existing file unless
/// `overwrite` is set.
async fn write_contents(
    path: &std::path::Path,
    display_path: &str,
    content: &str,
    overwrite: bool,
) -> Result<(), ToolError> {
    let mut options = fs::OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options
        .open(path)
        .await
        .map_err(|e| io_error(display_path, "open", e))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| io_error(display_path, "write", e))?;
    file.flush()
        .await
        .map_err(|e| io_error(display_path, "write", e))
}

// ==================== read_file ====================

/// Reads a UTF-8 text file, optionally a window of its lines.
pub struct ReadFileTool {
    params: Arc<ExecutionParams>,
    schema: ToolSchema,
}

impl ReadFileTool {
    pub fn new(params: Arc<ExecutionParams>) -> Self {
        let schema = ToolSchema::new(
            READ_FILE,
            "Read the contents of a text file. Use offset and limit to read a range of lines from large files.",
        )
        .with_parameter(ToolParameter::new("path", "Path to the file to read", true).with_type("path"))
        .with_parameter(
            ToolParameter::new("offset", "Line number to start reading from (0-indexed)", false)
                .with_type("integer"),
        )
        .with_parameter(
            ToolParameter::new("limit", "Maximum number of lines to read", false)
                .with_type("integer"),
        );
        Self { params, schema }
    }
}

/// Lines `offset..offset + limit` of `content`; everything when unbounded.
/// Positions where `needle` starts in `haystack`, overlapping hits included.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        count += 1;
        let hit = start + pos;
        start = hit + haystack[hit..].chars().next().map_or(1, char::len_utf8);
    }
    count
}

fn select_lines(content: &str, offset: usize, limit: Option<usize>) -> String {
    if offset == 0 && limit.is_none() {
        return content.to_string();
    }
    content
        .lines()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl BuiltinTool for ReadFileTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Read
    }

    async fn run(
        &self,
        call: &ToolCall,
        _cancel: &CancellationToken,
        _on_output: Option<&OutputSink>,
    ) -> Result<ToolResult, ToolError> {
        let path_str = call.require_string("path").map_err(ToolError::invalid_argument)?;
        let path = self.params.resolve_path(path_str);

        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| io_error(path_str, "read", e))?;
        if !metadata.is_file() {
            return Err(ToolError::invalid_argument(format!(
                "'{}' is not a file",
                path_str
            )));
        }
        if metadata.len() > MAX_READ_SIZE {
            return Err(ToolError::invalid_argument(format!(
                "File too large ({} bytes). Maximum size is {} bytes",
                metadata.len(),
                MAX_READ_SIZE
            )));
        }

        let raw = fs::read(&path)
            .await
            .map_err(|e| io_error(path_str, "read", e))?;
        let content = String::from_utf8(raw).map_err(|_| {
            ToolError::execution_failed(format!("'{}' is not valid UTF-8 text", path_str))
        })?;

        let offset = call.get_u64("offset").unwrap_or(0) as usize;
        let limit = call.get_u64("limit").map(|l| l as usize);
        let selected = select_lines(&content, offset, limit);
        let line_count = selected.lines().count();
        let (output, truncated) = truncate_output(&selected, self.params.max_output_bytes);

        let display = if truncated {
            format!("Read {} lines from {} (truncated)", line_count, path_str)
        } else {
            format!("Read {} lines from {}", line_count, path_str)
        };

        Ok(ToolResult::success(READ_FILE, output)
            .with_display(display)
            .with_metadata(ToolResultMetadata {
                bytes: Some(selected.len()),
                ..path_metadata(path_str)
            }))
    }
}

// ==================== write_file ====================

/// Creates or replaces a whole file.
pub struct WriteFileTool {
    params: Arc<ExecutionParams>,
    schema: ToolSchema,
}

impl WriteFileTool {
    pub fn new(params: Arc<ExecutionParams>) -> Self {
        let schema = ToolSchema::new(
            WRITE_FILE,
            "Write content to a file. Creates the file if it doesn't exist, or overwrites it unless overwrite is false.",
        )
        .with_parameter(ToolParameter::new("path", "Path to the file to write", true).with_type("path"))
        .with_parameter(ToolParameter::new("content", "Content to write to the file", true))
        .with_parameter(
            ToolParameter::new("create_dirs", "Create parent directories if they don't exist", false)
                .with_type("boolean"),
        )
        .with_parameter(
            ToolParameter::new("overwrite", "Replace an existing file (default: true)", false)
                .with_type("boolean"),
        );
        Self { params, schema }
    }
}

#[async_trait]
impl BuiltinTool for WriteFileTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Edit
    }

    fn describe(&self, call: &ToolCall) -> String {
        let path = call.get_string("path").unwrap_or_default();
        let bytes = call.get_string("content").map(str::len).unwrap_or(0);
        format!("Write {} bytes to {}", bytes, path)
    }

    async fn run(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
        _on_output: Option<&OutputSink>,
    ) -> Result<ToolResult, ToolError> {
        let path_str = call.require_string("path").map_err(ToolError::invalid_argument)?;
        let content = call.get_string("content").unwrap_or_default();
        let create_dirs = call.get_bool("create_dirs").unwrap_or(false);
        let overwrite = call.get_bool("overwrite").unwrap_or(true);
        let path = self.params.resolve_path(path_str);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
            && !fs::try_exists(parent).await.unwrap_or(false)
        {
            if !create_dirs {
                return Err(ToolError::new(
                    ToolErrorKind::FileNotFound,
                    format!("Parent directory does not exist: {}", parent.display()),
                ));
            }
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(path_str, "create parent directories of", e))?;
        }

        if cancel.is_cancelled() {
            return Err(ToolError::cancelled("Cancelled before writing"));
        }

        write_contents(&path, path_str, content, overwrite).await?;

        let bytes = content.len();
        Ok(ToolResult::success(
            WRITE_FILE,
            format!("Successfully wrote {} bytes to {}", bytes, path_str),
        )
        .with_metadata(ToolResultMetadata {
            bytes: Some(bytes),
            ..path_metadata(path_str)
        }))
    }
}

// ==================== edit_file ====================

/// Replaces an exact text occurrence inside a file.
///
/// An empty `old_string` creates a new file holding `new_string`.
pub struct EditFileTool {
    params: Arc<ExecutionParams>,
    schema: ToolSchema,
}

impl EditFileTool {
    pub fn new(params: Arc<ExecutionParams>) -> Self {
        let schema = ToolSchema::new(
            EDIT_FILE,
            "Replace text in a file. old_string must match exactly once, including whitespace and indentation, unless replace_all is true. An empty old_string creates a new file.",
        )
        .with_parameter(ToolParameter::new("path", "Path to the file to edit", true).with_type("path"))
        .with_parameter(ToolParameter::new("old_string", "Exact text to replace", true))
        .with_parameter(ToolParameter::new("new_string", "Replacement text", true))
        .with_parameter(
            ToolParameter::new("replace_all", "Replace every occurrence instead of exactly one", false)
                .with_type("boolean"),
        );
        Self { params, schema }
    }
}

#[async_trait]
impl BuiltinTool for EditFileTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Edit
    }

    fn describe(&self, call: &ToolCall) -> String {
        let path = call.get_string("path").unwrap_or_default();
        match call.get_string("old_string") {
            Some("") => format!("Create {}", path),
            _ => format!("Edit {}", path),
        }
    }

    async fn run(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
        _on_output: Option<&OutputSink>,
    ) -> Result<ToolResult, ToolError> {
        let path_str = call.require_string("path").map_err(ToolError::invalid_argument)?;
        let old_string = call.get_string("old_string").unwrap_or_default();
        let new_string = call.get_string("new_string").unwrap_or_default();
        let replace_all = call.get_bool("replace_all").unwrap_or(false);
        let path = self.params.resolve_path(path_str);

        if old_string.is_empty() {
            if cancel.is_cancelled() {
                return Err(ToolError::cancelled("Cancelled before writing"));
            }
            write_contents(&path, path_str, new_string, false).await?;
            return Ok(ToolResult::success(EDIT_FILE, format!("Created new file {}", path_str))
                .with_metadata(ToolResultMetadata {
                    bytes: Some(new_string.len()),
                    ..path_metadata(path_str)
                }));
        }

        if old_string == new_string {
            return Err(ToolError::invalid_argument(
                "old_string and new_string are identical; nothing to change",
            ));
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| io_error(path_str, "read", e))?;

        // Overlapping hits ("aa" in "aaa") make a single replacement ambiguous
        let occurrences = count_occurrences(&content, old_string);
        if occurrences == 0 {
            return Err(ToolError::edit_target_not_found(path_str));
        }
        if occurrences > 1 && !replace_all {
            return Err(ToolError::edit_target_ambiguous(path_str, occurrences));
        }

        let (updated, replaced) = if replace_all {
            let replaced = content.matches(old_string).count();
            (content.replace(old_string, new_string), replaced)
        } else {
            (content.replacen(old_string, new_string, 1), 1)
        };

        if cancel.is_cancelled() {
            return Err(ToolError::cancelled("Cancelled before writing"));
        }
        write_contents(&path, path_str, &updated, true).await?;

        Ok(ToolResult::success(
            EDIT_FILE,
            format!("Replaced {} occurrence(s) in {}", replaced, path_str),
        )
        .with_metadata(ToolResultMetadata {
            bytes: Some(updated.len()),
            match_count: Some(replaced),
            ..path_metadata(path_str)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    fn params() -> Arc<ExecutionParams> {
        Arc::new(ExecutionParams::default())
    }

    async fn run(tool: &dyn BuiltinTool, call: ToolCall) -> Result<ToolResult, ToolError> {
        tool.run(&call, &CancellationToken::new(), None).await
    }

    #[tokio::test]
    async fn test_read_file_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std_fs::write(&path, "Hello, World!\n").unwrap();

        let call = ToolCall::new(READ_FILE).with_arg("path", path.to_str().unwrap());
        let result = run(&ReadFileTool::new(params()), call).await.unwrap();

        assert!(result.is_success());
        assert!(result.llm_content.contains("Hello, World!"));
        assert!(result.return_display.starts_with("Read 1 lines"));
    }

    #[tokio::test]
    async fn test_read_file_not_found() {
        let call = ToolCall::new(READ_FILE).with_arg("path", "/nonexistent/file.txt");
        let err = run(&ReadFileTool::new(params()), call).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::FileNotFound);
    }

    #[tokio::test]
    async fn test_read_file_with_offset_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt");
        std_fs::write(&path, "line1\nline2\nline3\nline4\nline5\n").unwrap();

        let call = ToolCall::new(READ_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("offset", 1)
            .with_arg("limit", 2);
        let result = run(&ReadFileTool::new(params()), call).await.unwrap();

        assert_eq!(result.llm_content, "line2\nline3");
    }

    #[tokio::test]
    async fn test_read_file_resolves_relative_to_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::write(dir.path().join("rel.txt"), "relative").unwrap();
        let params = Arc::new(ExecutionParams::default().with_working_dir(dir.path()));

        let call = ToolCall::new(READ_FILE).with_arg("path", "rel.txt");
        let result = run(&ReadFileTool::new(params), call).await.unwrap();
        assert_eq!(result.llm_content, "relative");
    }

    #[tokio::test]
    async fn test_read_file_truncates_large_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std_fs::write(&path, "x".repeat(500)).unwrap();
        let params = Arc::new(ExecutionParams::default().with_max_output_bytes(100));

        let call = ToolCall::new(READ_FILE).with_arg("path", path.to_str().unwrap());
        let result = run(&ReadFileTool::new(params), call).await.unwrap();

        assert!(result.llm_content.contains("[output truncated: 100 of 500 bytes shown]"));
        assert!(result.return_display.ends_with("(truncated)"));
    }

    #[tokio::test]
    async fn test_write_file_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");

        let call = ToolCall::new(WRITE_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("content", "Hello, World!");
        let result = run(&WriteFileTool::new(params()), call).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.metadata.bytes, Some(13));
        assert_eq!(std_fs::read_to_string(&path).unwrap(), "Hello, World!");
    }

    #[tokio::test]
    async fn test_write_file_create_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("test.txt");

        let call = ToolCall::new(WRITE_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("content", "content")
            .with_arg("create_dirs", true);
        run(&WriteFileTool::new(params()), call).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_write_file_parent_not_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("file.txt");

        let call = ToolCall::new(WRITE_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("content", "content");
        let err = run(&WriteFileTool::new(params()), call).await.unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::FileNotFound);
        assert!(err.message.contains("Parent directory does not exist"));
    }

    #[tokio::test]
    async fn test_write_file_without_overwrite_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.txt");
        std_fs::write(&path, "original").unwrap();

        let call = ToolCall::new(WRITE_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("content", "replacement")
            .with_arg("overwrite", false);
        let err = run(&WriteFileTool::new(params()), call).await.unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::FileExists);
        assert_eq!(std_fs::read_to_string(&path).unwrap(), "original");
    }

    #[tokio::test]
    async fn test_write_file_cancelled_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.txt");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let call = ToolCall::new(WRITE_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("content", "x");
        let err = WriteFileTool::new(params())
            .run(&call, &cancel, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::Cancelled);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_edit_file_replaces_single_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edit.txt");
        std_fs::write(&path, "fn main() {\n    old();\n}\n").unwrap();

        let call = ToolCall::new(EDIT_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("old_string", "old();")
            .with_arg("new_string", "new();");
        let result = run(&EditFileTool::new(params()), call).await.unwrap();

        assert_eq!(result.metadata.match_count, Some(1));
        assert_eq!(
            std_fs::read_to_string(&path).unwrap(),
            "fn main() {\n    new();\n}\n"
        );
    }

    #[tokio::test]
    async fn test_edit_file_ambiguous_leaves_file_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ambiguous.txt");
        std_fs::write(&path, "test\ntest\ntest").unwrap();

        let call = ToolCall::new(EDIT_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("old_string", "test")
            .with_arg("new_string", "done");
        let err = run(&EditFileTool::new(params()), call).await.unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::EditTargetAmbiguous);
        assert!(err.message.contains("matches 3 locations"));
        assert_eq!(std_fs::read_to_string(&path).unwrap(), "test\ntest\ntest");
    }

    #[tokio::test]
    async fn test_edit_file_overlapping_matches_are_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlap.txt");
        std_fs::write(&path, "aaa").unwrap();

        let call = ToolCall::new(EDIT_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("old_string", "aa")
            .with_arg("new_string", "b");
        let err = run(&EditFileTool::new(params()), call).await.unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::EditTargetAmbiguous);
        assert_eq!(std_fs::read_to_string(&path).unwrap(), "aaa");
    }

    #[test]
    fn test_count_occurrences() {
        assert_eq!(count_occurrences("aaa", "aa"), 2);
        assert_eq!(count_occurrences("test\ntest", "test"), 2);
        assert_eq!(count_occurrences("héhé", "é"), 2);
        assert_eq!(count_occurrences("abc", "x"), 0);
    }

    #[tokio::test]
    async fn test_edit_file_replace_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all.txt");
        std_fs::write(&path, "a-a-a").unwrap();

        let call = ToolCall::new(EDIT_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("old_string", "a")
            .with_arg("new_string", "b")
            .with_arg("replace_all", true);
        let result = run(&EditFileTool::new(params()), call).await.unwrap();

        assert_eq!(result.metadata.match_count, Some(3));
        assert_eq!(std_fs::read_to_string(&path).unwrap(), "b-b-b");
    }

    #[tokio::test]
    async fn test_edit_file_target_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nomatch.txt");
        std_fs::write(&path, "hello").unwrap();

        let call = ToolCall::new(EDIT_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("old_string", "goodbye")
            .with_arg("new_string", "farewell");
        let err = run(&EditFileTool::new(params()), call).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::EditTargetNotFound);
    }

    #[tokio::test]
    async fn test_edit_file_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");

        let call = ToolCall::new(EDIT_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("old_string", "x")
            .with_arg("new_string", "y");
        let err = run(&EditFileTool::new(params()), call).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::FileNotFound);
    }

    #[tokio::test]
    async fn test_edit_file_empty_old_string_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.txt");

        let call = ToolCall::new(EDIT_FILE)
            .with_arg("path", path.to_str().unwrap())
            .with_arg("old_string", "")
            .with_arg("new_string", "brand new");
        run(&EditFileTool::new(params()), call.clone()).await.unwrap();
        assert_eq!(std_fs::read_to_string(&path).unwrap(), "brand new");

        let err = run(&EditFileTool::new(params()), call).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::FileExists);
    }

    #[test]
    fn test_describe_prompts() {
        let edit = EditFileTool::new(params());
        let call = ToolCall::new(EDIT_FILE)
            .with_arg("path", "src/lib.rs")
            .with_arg("old_string", "");
        assert_eq!(edit.describe(&call), "Create src/lib.rs");

        let write = WriteFileTool::new(params());
        let call = ToolCall::new(WRITE_FILE)
            .with_arg("path", "out.txt")
            .with_arg("content", "abc");
        assert_eq!(write.describe(&call), "Write 3 bytes to out.txt");
        assert_eq!(write.locations(&call), vec!["out.txt".to_string()]);
    }
}
