//! Terminal responder for confirmation requests.
//!
//! When a call needs approval, the user sees (on stderr, so stdout stays
//! clean for results):
//!
//! ```text
//! ───────────────────────────────────────────────
//!   ⚠️  Confirmation required #1  [risk: high]
//! ───────────────────────────────────────────────
//!   Tool:      write_file
//!   Action:    Write 42 bytes to config.toml
//!   Affects:   config.toml
//!
//! Allow? [y/N]
//! ```
//!
//! Anything other than `y` / `yes` declines, including EOF and read errors.

use async_trait::async_trait;
use colored::{ColoredString, Colorize};
use std::io::{self, Write};
use warden_application::ConfirmationResponder;
use warden_domain::{ConfirmationDecision, ConfirmationRequest, RiskLevel};

const RULE: &str = "───────────────────────────────────────────────";

/// Prompts on the terminal and reads a y/N answer from stdin.
///
/// The bus delivers requests to a responder one at a time, so concurrent
/// invocations never interleave their prompts.
pub struct ConsoleConfirmationResponder;

impl ConsoleConfirmationResponder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleConfirmationResponder {
    fn default() -> Self {
        Self::new()
    }
}

fn risk_label(risk: RiskLevel) -> ColoredString {
    let label = format!("[risk: {}]", risk);
    match risk {
        RiskLevel::Low => label.green(),
        RiskLevel::Medium => label.yellow(),
        RiskLevel::High => label.red().bold(),
    }
}

/// Render the prompt block for `request`, without the trailing question.
pub fn render_request(request: &ConfirmationRequest) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("{}\n", RULE.yellow().bold()));
    out.push_str(&format!(
        "  {} {}  {}\n",
        "⚠️  Confirmation required".yellow().bold(),
        request.id,
        risk_label(request.risk)
    ));
    out.push_str(&format!("{}\n", RULE.yellow().bold()));
    out.push_str(&format!("  {:<10} {}\n", "Tool:".cyan(), request.tool_name));
    out.push_str(&format!("  {:<10} {}\n", "Action:".cyan(), request.prompt));
    if !request.locations.is_empty() {
        out.push_str(&format!(
            "  {:<10} {}\n",
            "Affects:".cyan(),
            request.locations.join(", ")
        ));
    }
    out
}

/// Interpret one line of user input.
pub fn parse_answer(input: &str) -> ConfirmationDecision {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => ConfirmationDecision::Approved,
        _ => ConfirmationDecision::Declined,
    }
}

fn read_answer() -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "\n{} ", "Allow? [y/N]".magenta().bold())?;
    stderr.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input)
}

#[async_trait]
impl ConfirmationResponder for ConsoleConfirmationResponder {
    async fn confirm(&self, request: &ConfirmationRequest) -> ConfirmationDecision {
        eprint!("{}", render_request(request));

        let decision = match tokio::task::spawn_blocking(read_answer).await {
            Ok(Ok(input)) => parse_answer(&input),
            Ok(Err(e)) => {
                eprintln!("{} {}", "Could not read answer:".red(), e);
                ConfirmationDecision::Declined
            }
            Err(_) => ConfirmationDecision::Declined,
        };

        match decision {
            ConfirmationDecision::Approved => eprintln!("{}", "✓ Approved".green()),
            ConfirmationDecision::Declined => eprintln!("{}", "✗ Declined".red()),
        }
        decision
    }
}
