//! End-to-end lifecycle tests for the invocation runtime, using in-memory
//! tools whose effects are observable through counters.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use warden_application::{
    AutoApproveResponder, AutoDeclineResponder, ConfirmationBus, DeclarativeTool,
    InvocationRuntime, OutputSink, ToolContext, ToolInvocation, ToolRegistry,
};
use warden_domain::{
    ConfirmationDecision, InvocationState, PolicyCondition, PolicyConfig, PolicyEngine,
    PolicyRule, RiskLevel, ToolCall, ToolError, ToolErrorKind, ToolKind, ToolParameter,
    ToolResult, ToolSchema,
};

#[derive(Clone)]
enum Behavior {
    Echo,
    Fail(ToolError),
    Panic,
    Hang,
}

struct MockTool {
    schema: ToolSchema,
    kind: ToolKind,
    behavior: Behavior,
    executions: Arc<AtomicUsize>,
}

impl MockTool {
    fn new(name: &str, kind: ToolKind, behavior: Behavior) -> Self {
        Self {
            schema: ToolSchema::new(name, format!("mock {}", name))
                .with_parameter(ToolParameter::new("path", "Target", false).with_type("path")),
            kind,
            behavior,
            executions: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct MockInvocation {
    call: ToolCall,
    context: ToolContext,
    schema: ToolSchema,
    kind: ToolKind,
    behavior: Behavior,
    executions: Arc<AtomicUsize>,
}

impl DeclarativeTool for MockTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn create_invocation(&self, call: ToolCall, context: ToolContext) -> Box<dyn ToolInvocation> {
        Box::new(MockInvocation {
            call,
            context,
            schema: self.schema.clone(),
            kind: self.kind,
            behavior: self.behavior.clone(),
            executions: Arc::clone(&self.executions),
        })
    }
}

#[async_trait]
impl ToolInvocation for MockInvocation {
    fn call(&self) -> &ToolCall {
        &self.call
    }

    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn context(&self) -> &ToolContext {
        &self.context
    }

    fn locations(&self) -> Vec<String> {
        self.schema.affected_locations(&self.call)
    }

    async fn execute(
        self: Box<Self>,
        _cancel: &CancellationToken,
        on_output: Option<&OutputSink>,
    ) -> ToolResult {
        let this = *self;
        this.executions.fetch_add(1, Ordering::SeqCst);
        match this.behavior {
            Behavior::Echo => {
                let path = this.call.get_string("path").unwrap_or("-").to_string();
                if let Some(sink) = on_output {
                    sink("working");
                }
                ToolResult::success(&this.call.tool_name, path)
            }
            Behavior::Fail(error) => ToolResult::failure(&this.call.tool_name, error),
            Behavior::Panic => panic!("mock tool exploded"),
            Behavior::Hang => {
                // Ignores the token; the runtime must still resolve promptly
                tokio::time::sleep(Duration::from_secs(3600)).await;
                ToolResult::success(&this.call.tool_name, "unreachable")
            }
        }
    }
}

struct Harness {
    runtime: InvocationRuntime,
    context: ToolContext,
    write_executions: Arc<AtomicUsize>,
    read_executions: Arc<AtomicUsize>,
}

fn harness(policy: PolicyConfig, extra: Vec<MockTool>) -> Harness {
    let write = MockTool::new("write_file", ToolKind::Edit, Behavior::Echo);
    let read = MockTool::new("read_file", ToolKind::Read, Behavior::Echo);
    let write_executions = Arc::clone(&write.executions);
    let read_executions = Arc::clone(&read.executions);

    let mut registry = ToolRegistry::new()
        .with_tool(Arc::new(write))
        .with_tool(Arc::new(read));
    for tool in extra {
        registry.register(Arc::new(tool));
    }

    let context = ToolContext::new(
        ConfirmationBus::new(),
        Arc::new(PolicyEngine::new(policy).unwrap()),
    );
    Harness {
        runtime: InvocationRuntime::new(Arc::new(registry)),
        context,
        write_executions,
        read_executions,
    }
}

fn write(path: &str) -> ToolCall {
    ToolCall::new("write_file").with_arg("path", path)
}

fn precedence_policy() -> PolicyConfig {
    PolicyConfig::allow_all()
        .with_rule(
            PolicyRule::deny("write_file").with_condition(PolicyCondition::contains("path", "secret")),
        )
        .with_rule(
            PolicyRule::ask("write_file", RiskLevel::High)
                .with_condition(PolicyCondition::contains("path", "config")),
        )
}

#[tokio::test]
async fn policy_precedence_through_should_confirm_execute() {
    let h = harness(precedence_policy(), vec![]);
    let tool = h.runtime.registry().get("write_file").unwrap();
    let cancel = CancellationToken::new();

    let denied = tool
        .create_invocation(write("secret.txt"), h.context.clone())
        .should_confirm_execute(&cancel)
        .await;
    assert!(denied.is_err());

    let ask = tool
        .create_invocation(write("config.txt"), h.context.clone())
        .should_confirm_execute(&cancel)
        .await
        .unwrap()
        .expect("config writes need confirmation");
    assert_eq!(ask.risk, RiskLevel::High);
    assert_eq!(ask.locations, vec!["config.txt"]);

    let allowed = tool
        .create_invocation(write("normal.txt"), h.context.clone())
        .should_confirm_execute(&cancel)
        .await
        .unwrap();
    assert!(allowed.is_none());
}

#[tokio::test]
async fn denial_surfaces_as_policy_denied_result() {
    let h = harness(precedence_policy(), vec![]);
    let report = h
        .runtime
        .run_call(write("secret.txt"), &h.context, &CancellationToken::new(), None)
        .await;

    assert_eq!(report.state, InvocationState::Cancelled);
    assert_eq!(report.result.error_kind(), Some(ToolErrorKind::PolicyDenied));
    assert!(report.result.llm_content.contains("blocked by policy"));
    assert_eq!(
        report.history,
        vec![
            InvocationState::Created,
            InvocationState::Authorizing,
            InvocationState::Cancelled
        ]
    );
    assert_eq!(h.write_executions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wildcard_ask_skips_read_only_tools() {
    let h = harness(
        PolicyConfig::allow_all().with_rule(PolicyRule::ask("*", RiskLevel::Low)),
        vec![],
    );
    let cancel = CancellationToken::new();

    let write_tool = h.runtime.registry().get("write_file").unwrap();
    let request = write_tool
        .create_invocation(write("a.txt"), h.context.clone())
        .should_confirm_execute(&cancel)
        .await
        .unwrap();
    assert_eq!(request.map(|r| r.risk), Some(RiskLevel::Low));

    let read_tool = h.runtime.registry().get("read_file").unwrap();
    let request = read_tool
        .create_invocation(ToolCall::new("read_file").with_arg("path", "a.txt"), h.context.clone())
        .should_confirm_execute(&cancel)
        .await
        .unwrap();
    assert!(request.is_none());

    // No subscriber is attached, yet the read still runs
    let report = h
        .runtime
        .run_call(ToolCall::new("read_file").with_arg("path", "a.txt"), &h.context, &cancel, None)
        .await;
    assert!(report.is_success());
}

#[tokio::test]
async fn deny_applies_to_read_only_tools() {
    let h = harness(
        PolicyConfig::allow_all().with_rule(PolicyRule::deny("read_file")),
        vec![],
    );
    let report = h
        .runtime
        .run_call(ToolCall::new("read_file"), &h.context, &CancellationToken::new(), None)
        .await;
    assert_eq!(report.result.error_kind(), Some(ToolErrorKind::PolicyDenied));
    assert_eq!(h.read_executions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_before_start_never_executes() {
    let h = harness(PolicyConfig::allow_all(), vec![]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = h.runtime.run_call(write("new.txt"), &h.context, &cancel, None).await;

    assert_eq!(report.state, InvocationState::Cancelled);
    assert_eq!(report.result.error_kind(), Some(ToolErrorKind::Cancelled));
    assert_eq!(h.write_executions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn declining_responder_cancels_every_ask_call() {
    let h = harness(
        PolicyConfig::new(warden_domain::PolicyAction::Ask),
        vec![],
    );
    let _responder = h
        .context
        .confirmation_bus
        .attach_responder(Arc::new(AutoDeclineResponder));
    let cancel = CancellationToken::new();

    for path in ["a.txt", "b.txt", "c.txt"] {
        let report = h.runtime.run_call(write(path), &h.context, &cancel, None).await;
        assert_eq!(report.state, InvocationState::Cancelled);
        assert_eq!(report.result.error_kind(), Some(ToolErrorKind::Cancelled));
        assert!(report.result.llm_content.contains("declined by user"));
        assert!(report.history.contains(&InvocationState::Confirming));
    }
    assert_eq!(h.write_executions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn approving_responder_lets_ask_calls_run() {
    let h = harness(precedence_policy(), vec![]);
    let _responder = h
        .context
        .confirmation_bus
        .attach_responder(Arc::new(AutoApproveResponder));

    let report = h
        .runtime
        .run_call(write("config.toml"), &h.context, &CancellationToken::new(), None)
        .await;

    assert_eq!(report.state, InvocationState::Succeeded);
    assert_eq!(report.result.llm_content, "config.toml");
    assert_eq!(
        report.history,
        vec![
            InvocationState::Created,
            InvocationState::Authorizing,
            InvocationState::Confirming,
            InvocationState::Executing,
            InvocationState::Succeeded
        ]
    );
}

#[tokio::test]
async fn no_subscriber_declines_instead_of_hanging() {
    let h = harness(PolicyConfig::new(warden_domain::PolicyAction::Ask), vec![]);
    let report = tokio::time::timeout(
        Duration::from_secs(5),
        h.runtime
            .run_call(write("a.txt"), &h.context, &CancellationToken::new(), None),
    )
    .await
    .unwrap();
    assert_eq!(report.result.error_kind(), Some(ToolErrorKind::Cancelled));
}

#[tokio::test]
async fn cancel_while_confirming() {
    let h = harness(PolicyConfig::new(warden_domain::PolicyAction::Ask), vec![]);
    let mut subscription = h.context.confirmation_bus.subscribe();
    let cancel = CancellationToken::new();

    let run = {
        let runtime = h.runtime.clone();
        let context = h.context.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { runtime.run_call(write("a.txt"), &context, &cancel, None).await })
    };

    let request = subscription.next().await.unwrap();
    assert_eq!(request.tool_name, "write_file");
    cancel.cancel();

    let report = run.await.unwrap();
    assert_eq!(report.state, InvocationState::Cancelled);
    assert!(report.result.llm_content.contains("awaiting confirmation"));
    assert!(!subscription.respond(request.id, ConfirmationDecision::Approved));
    assert_eq!(h.write_executions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_during_execution_resolves_promptly() {
    let h = harness(
        PolicyConfig::allow_all(),
        vec![MockTool::new("slow", ToolKind::Execute, Behavior::Hang)],
    );
    let cancel = CancellationToken::new();

    let run = {
        let runtime = h.runtime.clone();
        let context = h.context.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { runtime.run_call(ToolCall::new("slow"), &context, &cancel, None).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.state, InvocationState::Cancelled);
    assert_eq!(report.result.error_kind(), Some(ToolErrorKind::Cancelled));
}

#[tokio::test]
async fn deadline_cancellation_reports_timeout() {
    let h = harness(
        PolicyConfig::allow_all(),
        vec![MockTool::new("slow", ToolKind::Execute, Behavior::Hang)],
    );
    let deadline = Duration::from_millis(20);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        h.runtime
            .run_call(ToolCall::new("slow"), &h.context, &cancel, None),
    )
    .await
    .unwrap()
    .deadline_exceeded(deadline);

    assert_eq!(report.state, InvocationState::Cancelled);
    assert_eq!(report.result.error_kind(), Some(ToolErrorKind::Timeout));
    assert!(report.result.llm_content.contains("deadline"));
    assert!(report.result.metadata.duration_ms.is_some());

    // Finished before the deadline: left alone
    let report = h
        .runtime
        .run_call(write("notes.txt"), &h.context, &CancellationToken::new(), None)
        .await
        .deadline_exceeded(deadline);
    assert!(report.is_success());
}

#[tokio::test]
async fn panics_become_execution_errors() {
    let h = harness(
        PolicyConfig::allow_all(),
        vec![MockTool::new("buggy", ToolKind::Other, Behavior::Panic)],
    );
    let report = h
        .runtime
        .run_call(ToolCall::new("buggy"), &h.context, &CancellationToken::new(), None)
        .await;

    assert_eq!(report.state, InvocationState::Failed);
    assert_eq!(report.result.error_kind(), Some(ToolErrorKind::ExecutionError));
    assert!(report.result.llm_content.contains("mock tool exploded"));
}

#[tokio::test]
async fn tool_errors_mark_the_invocation_failed() {
    let h = harness(
        PolicyConfig::allow_all(),
        vec![MockTool::new(
            "fetcher",
            ToolKind::Fetch,
            Behavior::Fail(ToolError::http(503, "Service Unavailable")),
        )],
    );
    let report = h
        .runtime
        .run_call(ToolCall::new("fetcher"), &h.context, &CancellationToken::new(), None)
        .await;

    assert_eq!(report.state, InvocationState::Failed);
    assert_eq!(report.result.error().unwrap().status, Some(503));
}

#[tokio::test]
async fn unknown_tool_is_a_typed_failure() {
    let h = harness(PolicyConfig::allow_all(), vec![]);
    let report = h
        .runtime
        .run_call(ToolCall::new("delete_everything"), &h.context, &CancellationToken::new(), None)
        .await;

    assert_eq!(report.state, InvocationState::Failed);
    assert_eq!(report.result.error_kind(), Some(ToolErrorKind::ToolNotFound));
    assert_eq!(report.history, vec![InvocationState::Created, InvocationState::Failed]);
}

#[tokio::test]
async fn batch_results_are_isolated_and_in_submission_order() {
    let h = harness(
        PolicyConfig::allow_all(),
        vec![MockTool::new(
            "broken",
            ToolKind::Read,
            Behavior::Fail(ToolError::file_not_found("missing.txt")),
        )],
    );
    let calls = vec![
        ToolCall::new("read_file").with_arg("path", "one.txt"),
        ToolCall::new("broken").with_arg("path", "missing.txt"),
        ToolCall::new("read_file").with_arg("path", "three.txt"),
    ];

    let reports = h
        .runtime
        .run_batch(calls, &h.context, &CancellationToken::new())
        .await;

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].result.llm_content, "one.txt");
    assert_eq!(reports[1].result.error_kind(), Some(ToolErrorKind::FileNotFound));
    assert_eq!(reports[2].result.llm_content, "three.txt");
    assert_eq!(h.read_executions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn partial_output_reaches_the_sink() {
    let h = harness(PolicyConfig::allow_all(), vec![]);
    let seen = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
    let sink = {
        let seen = Arc::clone(&seen);
        move |text: &str| seen.lock().unwrap().push(text.to_string())
    };

    let report = h
        .runtime
        .run_call(write("a.txt"), &h.context, &CancellationToken::new(), Some(&sink))
        .await;

    assert!(report.is_success());
    assert_eq!(*seen.lock().unwrap(), vec!["working"]);
    assert!(report.result.metadata.duration_ms.is_some());
}
