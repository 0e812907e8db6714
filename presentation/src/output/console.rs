//! Console output for invocation reports and policy explanations

use colored::Colorize;
use serde::Serialize;
use warden_application::InvocationReport;
use warden_domain::{
    InvocationState, PolicyAction, PolicyConfig, PolicyExplanation, ToolErrorKind, ToolKind,
};

/// Formats runtime results for console display
pub struct ConsoleFormatter;

/// JSON view of a `policy check`.
#[derive(Serialize)]
struct CheckView<'a> {
    #[serde(flatten)]
    explanation: &'a PolicyExplanation,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ToolKind>,
    /// Whether the call would run without waiting for confirmation
    unattended: bool,
}

fn unattended(explanation: &PolicyExplanation, kind: Option<ToolKind>) -> bool {
    match explanation.action {
        PolicyAction::Allow => true,
        PolicyAction::Ask => kind.is_some_and(|k| k.is_read_only()),
        PolicyAction::Deny => false,
    }
}

impl ConsoleFormatter {
    /// One-line summary of how the invocation ended.
    pub fn status_line(report: &InvocationReport) -> String {
        let timing = format!("({} ms)", report.duration_ms).dimmed();
        match report.state {
            InvocationState::Succeeded => format!(
                "{} {} {}",
                "✓".green().bold(),
                report.tool_name.bold(),
                timing
            ),
            InvocationState::Cancelled => {
                let outcome = match report.result.error_kind() {
                    Some(ToolErrorKind::Timeout) => "timed out",
                    _ => "cancelled",
                };
                format!(
                    "{} {} {} {}",
                    "⊘".yellow().bold(),
                    report.tool_name.bold(),
                    outcome,
                    timing
                )
            }
            _ => {
                let kind = report
                    .result
                    .error_kind()
                    .map(|k| k.as_str())
                    .unwrap_or("ExecutionError");
                format!(
                    "{} {} failed: {} {}",
                    "✗".red().bold(),
                    report.tool_name.bold(),
                    kind.red(),
                    timing
                )
            }
        }
    }

    /// Status line followed by the result body.
    ///
    /// On success the body is the full content; the user-facing summary is
    /// shown above it when the two differ.
    pub fn format_report(report: &InvocationReport) -> String {
        let mut output = Self::status_line(report);
        output.push('\n');

        let result = &report.result;
        match result.error() {
            Some(error) => {
                output.push_str(&Self::indent(&error.message, "  "));
                output.push('\n');
            }
            None => {
                if result.return_display != result.llm_content {
                    output.push_str(&format!("{}\n", result.return_display.dimmed()));
                }
                if !result.llm_content.is_empty() {
                    output.push('\n');
                    output.push_str(&result.llm_content);
                    if !result.llm_content.ends_with('\n') {
                        output.push('\n');
                    }
                }
            }
        }
        output
    }

    /// Format as JSON
    pub fn format_report_json(report: &InvocationReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Function-calling schemas as a JSON array.
    pub fn format_schemas(schemas: &[serde_json::Value]) -> String {
        serde_json::to_string_pretty(schemas).unwrap_or_else(|_| "[]".to_string())
    }

    /// Explain which clause decides a call. `kind` is `None` for unknown tools.
    pub fn format_explanation(explanation: &PolicyExplanation, kind: Option<ToolKind>) -> String {
        let action = match explanation.action {
            PolicyAction::Allow => "allow".green().bold(),
            PolicyAction::Ask => "ask".yellow().bold(),
            PolicyAction::Deny => "deny".red().bold(),
        };

        let mut output = format!(
            "{} {} {}",
            explanation.tool_name.bold(),
            "→".dimmed(),
            action
        );
        if let Some(risk) = explanation.risk {
            output.push_str(&format!(" (risk: {})", risk));
        }
        output.push_str(&format!("  {}\n", format!("via {}", explanation.matched).dimmed()));

        match kind {
            None => output.push_str(&format!(
                "{}\n",
                "Tool is not registered; the call would fail with ToolNotFoundError".yellow()
            )),
            Some(kind) => {
                output.push_str(&format!("{} {}\n", "Kind:".cyan(), kind.as_str()));
                if explanation.action == PolicyAction::Ask && kind.is_read_only() {
                    output.push_str(&format!(
                        "{}\n",
                        "Read-only tool: runs without confirmation".dimmed()
                    ));
                }
            }
        }
        output
    }

    /// Format a policy check as JSON
    pub fn format_explanation_json(
        explanation: &PolicyExplanation,
        kind: Option<ToolKind>,
    ) -> String {
        let view = CheckView {
            explanation,
            kind,
            unattended: unattended(explanation, kind),
        };
        serde_json::to_string_pretty(&view).unwrap_or_else(|_| "{}".to_string())
    }

    /// Effective policy as JSON
    pub fn format_policy(config: &PolicyConfig) -> String {
        serde_json::to_string_pretty(config).unwrap_or_else(|_| "{}".to_string())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
