//! Policy subdomain: deciding whether a proposed call may run.
//!
//! A [`PolicyConfig`] is an ordered list of [`PolicyRule`]s plus a default
//! action. The [`PolicyEngine`] walks the rules in declaration order and the
//! first match wins:
//!
//! | Action | Engine result | Runtime behavior |
//! |--------|---------------|------------------|
//! | `allow` | `Ok(PolicyDecision::Allow)` | execute immediately |
//! | `ask` | `Ok(PolicyDecision::Ask { risk })` | confirm over the bus, then execute |
//! | `deny` | `Err(PolicyDenied)` | terminal `PolicyDenied` result, nothing runs |
//!
//! Declare specific rules before broad ones: a `deny` for writes under
//! `secret/` must come before an `ask` for all writes.
//!
//! Conditions ([`PolicyCondition`]) test call-time argument values, never
//! schema defaults, so one tool can be allowed for one call and denied for
//! the next.

pub mod config;
pub mod engine;
pub mod risk;
pub mod rule;

pub use config::{PolicyConfig, PolicyConfigError};
pub use engine::{MatchedRule, PolicyDecision, PolicyDenied, PolicyEngine, PolicyExplanation};
pub use risk::RiskLevel;
pub use rule::{ConditionOperator, PolicyAction, PolicyCondition, PolicyRule, ToolMatcher};
