//! web_fetch tool: Fetch a URL and extract text content

use crate::tools::builtin::BuiltinTool;
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use warden_application::{ExecutionParams, OutputSink};
use warden_domain::{
    ToolCall, ToolError, ToolKind, ToolParameter, ToolResult, ToolResultMetadata, ToolSchema,
    truncate_output,
};

/// Tool name constant
pub const WEB_FETCH: &str = "web_fetch";

/// Maximum response body size (5 MB)
const MAX_BODY_SIZE: usize = 5 * 1024 * 1024;

const USER_AGENT: &str = concat!("warden/", env!("CARGO_PKG_VERSION"), " (Agent Tool)");

pub struct WebFetchTool {
    params: Arc<ExecutionParams>,
    schema: ToolSchema,
    client: reqwest::Client,
}

impl WebFetchTool {
    pub fn new(params: Arc<ExecutionParams>) -> Self {
        let schema = ToolSchema::new(
            WEB_FETCH,
            "Fetch a web page over http or https and extract its readable text content.",
        )
        .with_parameter(ToolParameter::new("url", "The URL to fetch", true))
        .with_parameter(
            ToolParameter::new("max_length", "Maximum length of extracted text in bytes", false)
                .with_type("integer"),
        )
        .with_parameter(
            ToolParameter::new("timeout_secs", "Timeout in seconds", false).with_type("integer"),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            params,
            schema,
            client,
        }
    }
}

/// Parse `raw` and reject anything but http(s).
pub fn parse_url(raw: &str) -> Result<Url, ToolError> {
    let url = Url::parse(raw.trim()).map_err(|e| ToolError::invalid_url(raw, e))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ToolError::unsupported_protocol(other)),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ToolError::invalid_url(raw, "missing host"));
    }
    Ok(url)
}

struct Fetched {
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

impl WebFetchTool {
    async fn fetch(&self, url: Url, timeout: Duration) -> Result<Fetched, ToolError> {
        let display = url.to_string();
        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(&display, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::http(
                status.as_u16(),
                format!(
                    "HTTP error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        if let Some(length) = response.content_length()
            && length > MAX_BODY_SIZE as u64
        {
            return Err(ToolError::execution_failed(format!(
                "Response too large: {} bytes (max: {} bytes)",
                length, MAX_BODY_SIZE
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| request_error(&display, timeout, e))?
        {
            if body.len() + chunk.len() > MAX_BODY_SIZE {
                return Err(ToolError::execution_failed(format!(
                    "Response too large: more than {} bytes",
                    MAX_BODY_SIZE
                )));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Fetched {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

fn request_error(url: &str, timeout: Duration, e: reqwest::Error) -> ToolError {
    if e.is_timeout() {
        ToolError::timeout(format!("fetching {} exceeded {} seconds", url, timeout.as_secs()))
    } else {
        ToolError::execution_failed(format!("Failed to fetch URL: {}", e))
    }
}

#[async_trait]
impl BuiltinTool for WebFetchTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Fetch
    }

    fn locations(&self, call: &ToolCall) -> Vec<String> {
        call.get_string("url").map(String::from).into_iter().collect()
    }

    fn describe(&self, call: &ToolCall) -> String {
        format!("Fetch {}", call.get_string("url").unwrap_or_default())
    }

    async fn run(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
        _on_output: Option<&OutputSink>,
    ) -> Result<ToolResult, ToolError> {
        let raw_url = call.require_string("url").map_err(ToolError::invalid_argument)?;
        let url = parse_url(raw_url)?;
        let max_length = call
            .get_u64("max_length")
            .map(|v| v as usize)
            .unwrap_or(self.params.max_output_bytes)
            .min(self.params.max_output_bytes);
        let timeout = call
            .get_u64("timeout_secs")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(self.params.fetch_timeout);

        debug!(url = %url, "Fetching");
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ToolError::cancelled(format!("Fetch cancelled: {}", raw_url)));
            }
            fetched = self.fetch(url, timeout) => fetched?,
        };

        let body = String::from_utf8_lossy(&fetched.body);
        let text = if fetched.content_type.contains("text/html")
            || fetched.content_type.contains("application/xhtml")
        {
            html_to_text(&body)
        } else {
            body.into_owned()
        };

        let (output, truncated) = truncate_output(&text, max_length);

        Ok(ToolResult::success(
            WEB_FETCH,
            format!(
                "## Fetched: {}\n\nStatus: {} | Content-Type: {} | Size: {} bytes{}\n\n{}",
                raw_url,
                fetched.status,
                fetched.content_type,
                text.len(),
                if truncated { " (truncated)" } else { "" },
                output,
            ),
        )
        .with_display(format!("Fetched {} ({} bytes)", raw_url, fetched.body.len()))
        .with_metadata(ToolResultMetadata {
            bytes: Some(fetched.body.len()),
            path: Some(raw_url.to_string()),
            ..Default::default()
        }))
    }
}

/// Extract readable text from HTML, skipping scripts, styles and similar.
pub fn html_to_text(html: &str) -> String {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);
    let skip_tags = ["script", "style", "noscript", "svg"];

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());
    let root = body.unwrap_or_else(|| document.root_element());

    clean_whitespace(&collect_element_text(root, &skip_tags).join(" "))
}

fn collect_element_text(element: scraper::ElementRef, skip_tags: &[&str]) -> Vec<String> {
    if skip_tags.contains(&element.value().name()) {
        return Vec::new();
    }

    let mut parts = Vec::new();
    for child in element.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            scraper::Node::Element(_) => {
                if let Some(child_el) = scraper::ElementRef::wrap(child) {
                    parts.extend(collect_element_text(child_el, skip_tags));
                }
            }
            _ => {}
        }
    }
    parts
}

/// Collapse runs of spaces, keep at most one blank line.
fn clean_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_whitespace = false;
    let mut newline_count = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push('\n');
            }
            prev_was_whitespace = true;
        } else if ch.is_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
            }
            prev_was_whitespace = true;
            newline_count = 0;
        } else {
            result.push(ch);
            prev_was_whitespace = false;
            newline_count = 0;
        }
    }

    result.trim().to_string()
}
