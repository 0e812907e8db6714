//! CLI entrypoint for warden
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warden_application::{
    AutoApproveResponder, AutoDeclineResponder, ConfirmationBus, ConfirmationMode,
    ConfirmationResponder, InvocationReport, InvocationRuntime, ToolContext, ToolRegistry,
};
use warden_domain::{PolicyEngine, ToolKind, ToolSchema};
use warden_infrastructure::{ConfigLoader, FileConfig, JsonlAuditLogger, builtin_registry};
use warden_presentation::{
    Cli, Command, ConsoleConfirmationResponder, ConsoleFormatter, OutputFormat, PolicyCommand,
    RunArgs,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    // stdout carries results; diagnostics go to stderr
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    // === Dependency Injection ===
    let registry = Arc::new(builtin_registry(config.execution_params()));
    let policy = Arc::new(PolicyEngine::new(config.policy_config()?)?);
    info!(
        tools = registry.len(),
        rules = policy.config().rules.len(),
        "Starting warden"
    );

    match cli.command {
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Schemas { read_only }) => {
            println!("{}", schemas(&registry, read_only));
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Policy(PolicyCommand::Show)) => {
            println!("{}", ConsoleFormatter::format_policy(policy.config()));
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Policy(PolicyCommand::Check { tool, call, output })) => {
            let call = call.to_call(&tool).map_err(anyhow::Error::msg)?;
            let explanation = policy.explain(&call.tool_name, &call.arguments);
            let kind = registry.get(&tool).map(|t| t.kind());
            let text = match output {
                OutputFormat::Text => ConsoleFormatter::format_explanation(&explanation, kind),
                OutputFormat::Json => ConsoleFormatter::format_explanation_json(&explanation, kind),
            };
            print!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Run(args)) => run(args, &config, registry, policy).await,
    }
}

fn schemas(registry: &ToolRegistry, read_only: bool) -> String {
    let schemas: Vec<_> = if read_only {
        registry
            .function_schemas_for(ToolKind::READ_ONLY)
            .iter()
            .map(ToolSchema::to_function_schema)
            .collect()
    } else {
        registry.function_schemas_json()
    };
    ConsoleFormatter::format_schemas(&schemas)
}

fn responder(mode: ConfirmationMode) -> Arc<dyn ConfirmationResponder> {
    match mode {
        ConfirmationMode::Interactive => {
            if !std::io::stdin().is_terminal() {
                warn!("stdin is not a terminal; confirmations will read from piped input");
            }
            Arc::new(ConsoleConfirmationResponder::new())
        }
        ConfirmationMode::AutoApprove => Arc::new(AutoApproveResponder),
        ConfirmationMode::AutoDecline => Arc::new(AutoDeclineResponder),
    }
}

async fn run(
    args: RunArgs,
    config: &FileConfig,
    registry: Arc<ToolRegistry>,
    policy: Arc<PolicyEngine>,
) -> Result<ExitCode> {
    let call = args.call.to_call(&args.tool).map_err(anyhow::Error::msg)?;

    let mode = args
        .confirmation_override()
        .unwrap_or_else(|| config.confirmation_mode());
    info!(mode = %mode, "Confirmation mode");

    let bus = ConfirmationBus::new();
    let _responder = bus.attach_responder(responder(mode));
    let context = ToolContext::new(bus, policy);

    let mut runtime = InvocationRuntime::new(registry);
    if let Some(path) = &config.logging.audit_log {
        match JsonlAuditLogger::new(path) {
            Some(logger) => runtime = runtime.with_audit_logger(Arc::new(logger)),
            None => warn!("Audit logging disabled"),
        }
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling");
            on_signal.cancel();
        }
    });
    let deadline = args.timeout.map(Duration::from_secs);
    let deadline_hit = Arc::new(AtomicBool::new(false));
    if let Some(deadline) = deadline {
        let on_deadline = cancel.clone();
        let hit = Arc::clone(&deadline_hit);
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            warn!("Deadline of {}s reached; cancelling", deadline.as_secs());
            hit.store(true, Ordering::Relaxed);
            on_deadline.cancel();
        });
    }
    let settle = |report: InvocationReport| match deadline {
        Some(deadline) if deadline_hit.load(Ordering::Relaxed) => {
            report.deadline_exceeded(deadline)
        }
        _ => report,
    };

    let report = match args.output {
        OutputFormat::Text => {
            let streamed = Arc::new(AtomicBool::new(false));
            let seen = Arc::clone(&streamed);
            let sink = move |chunk: &str| {
                seen.store(true, Ordering::Relaxed);
                eprint!("{}", chunk);
            };
            let report = settle(runtime.run_call(call, &context, &cancel, Some(&sink)).await);
            if streamed.load(Ordering::Relaxed) {
                println!("{}", ConsoleFormatter::status_line(&report));
            } else {
                print!("{}", ConsoleFormatter::format_report(&report));
            }
            report
        }
        OutputFormat::Json => {
            let report = settle(runtime.run_call(call, &context, &cancel, None).await);
            println!("{}", ConsoleFormatter::format_report_json(&report));
            report
        }
    };

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
