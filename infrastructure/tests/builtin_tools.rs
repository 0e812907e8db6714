//! Built-in tools driven through the full invocation lifecycle against a
//! real temporary directory.

use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warden_application::{
    AutoApproveResponder, AutoDeclineResponder, ConfirmationBus, ExecutionParams,
    InvocationRuntime, ToolContext,
};
use warden_domain::{
    InvocationState, PolicyAction, PolicyCondition, PolicyConfig, PolicyEngine, PolicyRule,
    RiskLevel, ToolCall, ToolErrorKind,
};
use warden_infrastructure::{JsonlAuditLogger, builtin_registry};

struct Harness {
    runtime: InvocationRuntime,
    context: ToolContext,
}

fn harness(dir: &Path, policy: PolicyConfig) -> Harness {
    let params = ExecutionParams::default().with_working_dir(dir);
    let registry = Arc::new(builtin_registry(params));
    let policy = Arc::new(PolicyEngine::new(policy).unwrap());
    Harness {
        runtime: InvocationRuntime::new(registry),
        context: ToolContext::new(ConfirmationBus::new(), policy),
    }
}

fn write(path: &str, content: &str) -> ToolCall {
    ToolCall::new("write_file")
        .with_arg("path", path)
        .with_arg("content", content)
}

fn read(path: &str) -> ToolCall {
    ToolCall::new("read_file").with_arg("path", path)
}

fn edit(path: &str, old: &str, new: &str) -> ToolCall {
    ToolCall::new("edit_file")
        .with_arg("path", path)
        .with_arg("old_string", old)
        .with_arg("new_string", new)
}

#[tokio::test]
async fn write_edit_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), PolicyConfig::allow_all());
    let cancel = CancellationToken::new();

    let report = h
        .runtime
        .run_call(write("notes.txt", "original content"), &h.context, &cancel, None)
        .await;
    assert_eq!(report.state, InvocationState::Succeeded);

    let report = h
        .runtime
        .run_call(edit("notes.txt", "original", "modified"), &h.context, &cancel, None)
        .await;
    assert_eq!(report.state, InvocationState::Succeeded);
    assert_eq!(report.result.metadata.match_count, Some(1));

    let report = h
        .runtime
        .run_call(read("notes.txt"), &h.context, &cancel, None)
        .await;
    assert_eq!(report.result.llm_content, "modified content");
    assert!(report.result.metadata.duration_ms.is_some());
}

#[tokio::test]
async fn ambiguous_edit_fails_and_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("repeat.txt"), "test\ntest\ntest").unwrap();
    let h = harness(dir.path(), PolicyConfig::allow_all());

    let report = h
        .runtime
        .run_call(
            edit("repeat.txt", "test", "done"),
            &h.context,
            &CancellationToken::new(),
            None,
        )
        .await;

    assert_eq!(report.state, InvocationState::Failed);
    assert_eq!(
        report.result.error_kind(),
        Some(ToolErrorKind::EditTargetAmbiguous)
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("repeat.txt")).unwrap(),
        "test\ntest\ntest"
    );
}

#[tokio::test]
async fn concurrent_reads_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    std::fs::write(dir.path().join("c.txt"), "gamma").unwrap();
    let h = harness(dir.path(), PolicyConfig::allow_all());

    let reports = h
        .runtime
        .run_batch(
            vec![read("a.txt"), read("missing.txt"), read("c.txt")],
            &h.context,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].result.llm_content, "alpha");
    assert_eq!(
        reports[1].result.error_kind(),
        Some(ToolErrorKind::FileNotFound)
    );
    assert_eq!(reports[2].result.llm_content, "gamma");

    let json = serde_json::to_value(&reports[1].result).unwrap();
    assert_eq!(json["error"]["type"], "FileNotFoundError");
}

#[tokio::test]
async fn missing_argument_is_invalid_argument() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), PolicyConfig::allow_all());

    let report = h
        .runtime
        .run_call(
            ToolCall::new("write_file").with_arg("path", "x.txt"),
            &h.context,
            &CancellationToken::new(),
            None,
        )
        .await;

    assert_eq!(report.state, InvocationState::Failed);
    assert_eq!(
        report.result.error_kind(),
        Some(ToolErrorKind::InvalidArgument)
    );
    assert!(report.result.llm_content.contains("content"));
}

#[tokio::test]
async fn path_condition_denies_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let policy = PolicyConfig::allow_all().with_rule(
        PolicyRule::deny("write_file").with_condition(PolicyCondition::contains("path", "secret")),
    );
    let h = harness(dir.path(), policy);

    let report = h
        .runtime
        .run_call(
            write("secret.txt", "token"),
            &h.context,
            &CancellationToken::new(),
            None,
        )
        .await;

    assert_eq!(report.result.error_kind(), Some(ToolErrorKind::PolicyDenied));
    assert!(!dir.path().join("secret.txt").exists());
}

#[tokio::test]
async fn declined_write_never_touches_disk_but_reads_still_run() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("present.txt"), "here").unwrap();
    let h = harness(dir.path(), PolicyConfig::new(PolicyAction::Ask));
    let _responder = h
        .context
        .confirmation_bus
        .attach_responder(Arc::new(AutoDeclineResponder));
    let cancel = CancellationToken::new();

    let report = h
        .runtime
        .run_call(write("blocked.txt", "x"), &h.context, &cancel, None)
        .await;
    assert_eq!(report.state, InvocationState::Cancelled);
    assert!(!dir.path().join("blocked.txt").exists());

    let report = h
        .runtime
        .run_call(read("present.txt"), &h.context, &cancel, None)
        .await;
    assert_eq!(report.state, InvocationState::Succeeded);
    assert_eq!(report.result.llm_content, "here");
}

fn audit_records(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn approved_write_is_audited() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.jsonl");
    let logger = Arc::new(JsonlAuditLogger::new(&audit_path).unwrap());

    let policy =
        PolicyConfig::allow_all().with_rule(PolicyRule::ask("write_file", RiskLevel::High));
    let mut h = harness(dir.path(), policy);
    h.runtime = h.runtime.with_audit_logger(logger.clone());
    let _responder = h
        .context
        .confirmation_bus
        .attach_responder(Arc::new(AutoApproveResponder));

    let report = h
        .runtime
        .run_call(
            write("approved.txt", "yes").with_call_id("call_9"),
            &h.context,
            &CancellationToken::new(),
            None,
        )
        .await;
    assert_eq!(report.state, InvocationState::Succeeded);
    drop(h);
    drop(logger);

    let records = audit_records(&audit_path);
    let types: Vec<&str> = records
        .iter()
        .map(|r| r["type"].as_str().unwrap())
        .collect();
    assert_eq!(
        types,
        vec![
            "policy_decision",
            "confirmation_requested",
            "confirmation_resolved",
            "tool_completed"
        ]
    );
    assert!(records.iter().all(|r| r["call_id"] == "call_9"));
    // The request is logged with the id the bus answers it under
    let request_id = &records[1]["request_id"];
    assert!(request_id.as_u64().is_some_and(|id| id > 0));
    assert_eq!(&records[2]["request_id"], request_id);
    assert_eq!(records[2]["decision"], "approved");
}

#[tokio::test]
async fn read_only_tool_audits_the_policy_action() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    let audit_path = dir.path().join("audit.jsonl");
    let logger = Arc::new(JsonlAuditLogger::new(&audit_path).unwrap());

    let policy = PolicyConfig::allow_all().with_rule(PolicyRule::ask("read_file", RiskLevel::Low));
    let mut h = harness(dir.path(), policy);
    h.runtime = h.runtime.with_audit_logger(logger.clone());

    // No responder: a confirmation would be declined
    let report = h
        .runtime
        .run_call(
            read("notes.txt").with_call_id("call_2"),
            &h.context,
            &CancellationToken::new(),
            None,
        )
        .await;
    assert_eq!(report.state, InvocationState::Succeeded);
    drop(h);
    drop(logger);

    let records = audit_records(&audit_path);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["type"], "policy_decision");
    assert_eq!(records[0]["action"], "ask");
    assert_eq!(records[0]["call_id"], "call_2");
    assert!(
        records[0]["detail"]
            .as_str()
            .unwrap()
            .contains("confirmation skipped")
    );
    assert_eq!(records[1]["type"], "tool_completed");
}

#[cfg(unix)]
#[tokio::test]
async fn cancelling_a_running_command_ends_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), PolicyConfig::allow_all());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let report = h
        .runtime
        .run_call(
            ToolCall::new("run_command").with_arg("command", "sleep 30"),
            &h.context,
            &cancel,
            None,
        )
        .await;

    assert_eq!(report.state, InvocationState::Cancelled);
    assert_eq!(report.result.error_kind(), Some(ToolErrorKind::Cancelled));
    assert!(report.duration_ms < 10_000);
}
