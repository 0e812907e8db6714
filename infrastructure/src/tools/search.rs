//! Search tools: glob_search, grep_search
//!
//! Both walk the filesystem synchronously on the blocking pool and check
//! the cancellation token between entries.

use super::builtin::BuiltinTool;
use async_trait::async_trait;
use glob::glob;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warden_application::{ExecutionParams, OutputSink};
use warden_domain::{
    ToolCall, ToolError, ToolKind, ToolParameter, ToolResult, ToolResultMetadata, ToolSchema,
    truncate_output,
};

/// Tool name constants
pub const GLOB_SEARCH: &str = "glob_search";
pub const GREP_SEARCH: &str = "grep_search";

/// Maximum number of results to return
const MAX_RESULTS: usize = 1000;

/// Maximum file size for grep (5 MB)
const MAX_GREP_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Upper bound on `context_lines`
const MAX_CONTEXT_LINES: usize = 100;

fn base_dir(params: &ExecutionParams, requested: Option<&str>) -> PathBuf {
    match requested {
        Some(dir) => params.resolve_path(dir),
        None => params
            .working_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn cancelled_search() -> ToolError {
    ToolError::cancelled("Search cancelled")
}

/// Run a filesystem scan on the blocking pool.
async fn scan<T, F>(f: F) -> Result<T, ToolError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ToolError::execution_failed(format!("Search task failed: {}", e)))?
}

// ==================== glob_search ====================

pub struct GlobSearchTool {
    params: Arc<ExecutionParams>,
    schema: ToolSchema,
}

impl GlobSearchTool {
    pub fn new(params: Arc<ExecutionParams>) -> Self {
        let schema = ToolSchema::new(
            GLOB_SEARCH,
            "Search for files matching a glob pattern (e.g., '**/*.rs', 'src/*.txt')",
        )
        .with_parameter(ToolParameter::new("pattern", "Glob pattern to match files", true))
        .with_parameter(
            ToolParameter::new(
                "base_dir",
                "Base directory to search from (default: working directory)",
                false,
            )
            .with_type("path"),
        )
        .with_parameter(
            ToolParameter::new(
                "max_results",
                "Maximum number of results to return (default: 1000)",
                false,
            )
            .with_type("integer"),
        );
        Self { params, schema }
    }
}

struct GlobMatches {
    paths: Vec<String>,
    limited: bool,
    unreadable: usize,
}

fn glob_files(
    full_pattern: &str,
    max_results: usize,
    cancel: &CancellationToken,
) -> Result<GlobMatches, ToolError> {
    let entries = glob(full_pattern)
        .map_err(|e| ToolError::invalid_argument(format!("Invalid glob pattern: {}", e)))?;

    let mut matches = GlobMatches {
        paths: Vec::new(),
        limited: false,
        unreadable: 0,
    };

    for entry in entries {
        if cancel.is_cancelled() {
            return Err(cancelled_search());
        }
        if matches.paths.len() >= max_results {
            matches.limited = true;
            break;
        }
        match entry {
            Ok(path) => matches.paths.push(path.display().to_string()),
            Err(_) => matches.unreadable += 1,
        }
    }

    Ok(matches)
}

#[async_trait]
impl BuiltinTool for GlobSearchTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Search
    }

    async fn run(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
        _on_output: Option<&OutputSink>,
    ) -> Result<ToolResult, ToolError> {
        let pattern = call.require_string("pattern").map_err(ToolError::invalid_argument)?;
        let max_results = call
            .get_u64("max_results")
            .map(|n| n as usize)
            .unwrap_or(MAX_RESULTS)
            .min(MAX_RESULTS);

        let full_pattern = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            let base = base_dir(&self.params, call.get_string("base_dir"));
            format!("{}/{}", base.display(), pattern)
        };

        let token = cancel.clone();
        let matches = scan(move || glob_files(&full_pattern, max_results, &token)).await?;

        let match_count = matches.paths.len();
        let output = if matches.paths.is_empty() {
            "No files found matching the pattern".to_string()
        } else {
            let mut output = matches.paths.join("\n");
            if matches.limited {
                output.push_str(&format!("\n... (limited to {} results)", max_results));
            }
            if matches.unreadable > 0 {
                output.push_str(&format!(
                    "\n({} paths could not be accessed)",
                    matches.unreadable
                ));
            }
            output
        };
        let (output, _) = truncate_output(&output, self.params.max_output_bytes);

        Ok(ToolResult::success(GLOB_SEARCH, output)
            .with_display(format!("Found {} files matching {}", match_count, pattern))
            .with_metadata(ToolResultMetadata {
                match_count: Some(match_count),
                ..Default::default()
            }))
    }
}

// ==================== grep_search ====================

pub struct GrepSearchTool {
    params: Arc<ExecutionParams>,
    schema: ToolSchema,
}

impl GrepSearchTool {
    pub fn new(params: Arc<ExecutionParams>) -> Self {
        let schema = ToolSchema::new(
            GREP_SEARCH,
            "Search for a regex pattern within file contents",
        )
        .with_parameter(ToolParameter::new("pattern", "Regex pattern to search for", true))
        .with_parameter(
            ToolParameter::new(
                "path",
                "File or directory to search in (default: working directory)",
                false,
            )
            .with_type("path"),
        )
        .with_parameter(ToolParameter::new(
            "file_pattern",
            "Glob pattern to filter files (e.g., '**/*.rs')",
            false,
        ))
        .with_parameter(
            ToolParameter::new(
                "context_lines",
                "Number of context lines before and after match",
                false,
            )
            .with_type("integer"),
        )
        .with_parameter(
            ToolParameter::new("case_insensitive", "Perform case-insensitive search", false)
                .with_type("boolean"),
        );
        Self { params, schema }
    }
}

struct GrepOptions {
    regex: Regex,
    file_pattern: Option<String>,
    context_lines: usize,
}

struct GrepMatches {
    lines: Vec<String>,
    total: usize,
}

/// Collect files under `dir`, optionally filtered by a glob pattern
fn collect_files(dir: &Path, file_pattern: Option<&str>) -> Vec<PathBuf> {
    let pattern = file_pattern.unwrap_or("**/*");
    let full_pattern = format!("{}/{}", dir.display(), pattern);

    match glob(&full_pattern) {
        Ok(paths) => paths.flatten().filter(|p| p.is_file()).collect(),
        Err(_) => Vec::new(),
    }
}

fn format_match(file: &str, lines: &[&str], index: usize, context: usize) -> String {
    if context == 0 {
        return format!("{}:{}: {}", file, index + 1, lines[index]);
    }

    let start = index.saturating_sub(context);
    let end = index.saturating_add(context).saturating_add(1).min(lines.len());
    let mut block = format!("{}:", file);
    for (offset, line) in lines[start..end].iter().enumerate() {
        let line_num = start + offset + 1;
        let marker = if line_num == index + 1 { ">" } else { " " };
        block.push_str(&format!("\n{}{}: {}", marker, line_num, line));
    }
    block
}

fn grep_files(
    root: &Path,
    options: &GrepOptions,
    cancel: &CancellationToken,
) -> Result<GrepMatches, ToolError> {
    let files = if root.is_file() {
        vec![root.to_path_buf()]
    } else {
        collect_files(root, options.file_pattern.as_deref())
    };

    let mut matches = GrepMatches {
        lines: Vec::new(),
        total: 0,
    };

    for file in files {
        if cancel.is_cancelled() {
            return Err(cancelled_search());
        }
        if matches.lines.len() >= MAX_RESULTS {
            break;
        }
        if fs::metadata(&file).is_ok_and(|m| m.len() > MAX_GREP_FILE_SIZE) {
            continue;
        }
        // Binary and unreadable files are skipped
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };

        let lines: Vec<&str> = content.lines().collect();
        let display = file.display().to_string();
        for (index, line) in lines.iter().enumerate() {
            if !options.regex.is_match(line) {
                continue;
            }
            matches.total += 1;
            if matches.lines.len() < MAX_RESULTS {
                matches
                    .lines
                    .push(format_match(&display, &lines, index, options.context_lines));
            }
        }
    }

    Ok(matches)
}

#[async_trait]
impl BuiltinTool for GrepSearchTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Search
    }

    async fn run(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
        _on_output: Option<&OutputSink>,
    ) -> Result<ToolResult, ToolError> {
        let pattern = call.require_string("pattern").map_err(ToolError::invalid_argument)?;
        let root = base_dir(&self.params, call.get_string("path"));
        if !root.exists() {
            return Err(ToolError::file_not_found(root.display().to_string()));
        }

        let case_insensitive = call.get_bool("case_insensitive").unwrap_or(false);
        let regex_pattern = if case_insensitive {
            format!("(?i){}", pattern)
        } else {
            pattern.to_string()
        };
        let regex = Regex::new(&regex_pattern)
            .map_err(|e| ToolError::invalid_argument(format!("Invalid regex pattern: {}", e)))?;

        let options = GrepOptions {
            regex,
            file_pattern: call.get_string("file_pattern").map(String::from),
            context_lines: call
                .get_u64("context_lines")
                .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX))
                .min(MAX_CONTEXT_LINES),
        };

        let token = cancel.clone();
        let scan_root = root.clone();
        let matches = scan(move || grep_files(&scan_root, &options, &token)).await?;

        let output = if matches.lines.is_empty() {
            "No matches found".to_string()
        } else {
            let mut output = matches.lines.join("\n");
            if matches.total > matches.lines.len() {
                output.push_str(&format!("\n... (limited to {} matches)", MAX_RESULTS));
            }
            output
        };
        let (output, _) = truncate_output(&output, self.params.max_output_bytes);

        Ok(ToolResult::success(GREP_SEARCH, output)
            .with_display(format!("Found {} matches for /{}/", matches.total, pattern))
            .with_metadata(ToolResultMetadata {
                match_count: Some(matches.total),
                path: Some(root.display().to_string()),
                ..Default::default()
            }))
    }
}
