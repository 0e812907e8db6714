//! CLI command definitions

use crate::cli::args::{build_call, parse_arg};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use warden_application::ConfirmationMode;
use warden_domain::ToolCall;

/// Output format for reports and explanations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored when the terminal supports it
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// CLI arguments for warden
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(author, version, about = "Policy-checked, human-confirmable tool execution")]
#[command(long_about = r#"
Warden runs the tools an agent asks for (file edits, shell commands, searches,
web fetches) behind a policy that allows, asks about, or denies each call.

Every call goes through the same lifecycle:
1. Validate: arguments are checked against the tool's schema
2. Authorize: the first matching policy rule decides allow / ask / deny
3. Confirm: `ask` decisions wait for an answer on the confirmation bus
4. Execute: the tool runs, cancellable at any time with Ctrl-C

Configuration files are loaded from (in priority order):
1. WARDEN_* environment variables (WARDEN_TOOLS__COMMAND_TIMEOUT_SECS=30)
2. --config <path>     Explicit config file
3. ./warden.toml       Project-level config
4. ~/.config/warden/config.toml   Global config

Example:
  warden run read_file -a path=src/main.rs
  warden run edit_file -a path=notes.txt -a old_string=foo -a new_string=bar
  warden run run_command -a "command=cargo fmt --check" -a timeout_secs:=60 --yes
  warden policy check write_file -a path=.env
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the function-calling schemas of the registered tools
    Schemas {
        /// Only tools that never mutate state
        #[arg(long)]
        read_only: bool,
    },

    /// Inspect the active policy
    #[command(subcommand)]
    Policy(PolicyCommand),

    /// Run one tool call through validation, policy and confirmation
    Run(RunArgs),
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Show which rule decides a call, without running it
    Check {
        /// Tool name
        tool: String,

        #[command(flatten)]
        call: CallArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print the effective policy as JSON
    Show,
}

/// Tool arguments as given on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct CallArgs {
    /// Argument as KEY=VALUE (string) or KEY:=JSON (raw JSON value)
    #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE", value_parser = parse_arg)]
    pub args: Vec<(String, Value)>,

    /// All arguments as one JSON object; --arg entries override its keys
    #[arg(long, value_name = "JSON")]
    pub args_json: Option<String>,
}

impl CallArgs {
    /// Bind these arguments to `tool`.
    pub fn to_call(&self, tool: &str) -> Result<ToolCall, String> {
        build_call(tool, self.args_json.as_deref(), &self.args)
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Tool name
    pub tool: String,

    #[command(flatten)]
    pub call: CallArgs,

    /// Approve every confirmation request
    #[arg(short = 'y', long, conflicts_with = "no")]
    pub yes: bool,

    /// Decline every confirmation request
    #[arg(long)]
    pub no: bool,

    /// Give up after this many seconds; reported as TimeoutError
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl RunArgs {
    /// Confirmation mode forced by `--yes` / `--no`, if any.
    pub fn confirmation_override(&self) -> Option<ConfirmationMode> {
        if self.yes {
            Some(ConfirmationMode::AutoApprove)
        } else if self.no {
            Some(ConfirmationMode::AutoDecline)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("warden").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_with_args() {
        let cli = parse(&[
            "run",
            "write_file",
            "-a",
            "path=notes.txt",
            "--arg",
            "create_dirs:=true",
            "--yes",
        ]);
        let Some(Command::Run(run)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(run.tool, "write_file");
        assert_eq!(
            run.confirmation_override(),
            Some(ConfirmationMode::AutoApprove)
        );

        let call = run.call.to_call(&run.tool).unwrap();
        assert_eq!(call.get_string("path"), Some("notes.txt"));
        assert_eq!(call.get_bool("create_dirs"), Some(true));
    }

    #[test]
    fn test_yes_and_no_conflict() {
        let result = Cli::try_parse_from(["warden", "run", "read_file", "--yes", "--no"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["schemas", "--read-only", "-vv", "--no-config"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_config);
        assert!(matches!(cli.command, Some(Command::Schemas { read_only: true })));
    }

    #[test]
    fn test_policy_check() {
        let cli = parse(&["policy", "check", "run_command", "-a", "command=rm -rf /", "-o", "json"]);
        let Some(Command::Policy(PolicyCommand::Check { tool, call, output })) = cli.command else {
            panic!("expected policy check");
        };
        assert_eq!(tool, "run_command");
        assert_eq!(output, OutputFormat::Json);
        assert_eq!(
            call.to_call(&tool).unwrap().get_string("command"),
            Some("rm -rf /")
        );
    }

    #[test]
    fn test_show_config_without_subcommand() {
        let cli = parse(&["--show-config"]);
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }
}
