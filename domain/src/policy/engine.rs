//! First-match-wins policy evaluation.
//!
//! ```text
//! rules[0] ──match?──▶ action
//!    │ no
//! rules[1] ──match?──▶ action
//!    │ no
//!   ...
//! default_action
//! ```
//!
//! `deny` is reported as `Err(PolicyDenied)` rather than as a decision
//! value: a caller cannot mistake it for "go ahead" without handling the
//! error.

use super::config::{PolicyConfig, PolicyConfigError};
use super::risk::RiskLevel;
use super::rule::{ConditionOperator, PolicyAction, PolicyRule};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Outcome of a non-denied evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Proceed without confirmation
    Allow,
    /// Proceed only after confirmation at this risk level
    Ask { risk: RiskLevel },
}

impl PolicyDecision {
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, PolicyDecision::Ask { .. })
    }
}

/// Which clause produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "index")]
pub enum MatchedRule {
    /// 1-based index into `rules`
    Rule(usize),
    Default,
}

impl std::fmt::Display for MatchedRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchedRule::Rule(index) => write!(f, "rule #{}", index),
            MatchedRule::Default => write!(f, "default action"),
        }
    }
}

/// The call must not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Tool '{tool_name}' is blocked by policy ({matched}){}", reason_suffix(.reason))]
pub struct PolicyDenied {
    pub tool_name: String,
    pub matched: MatchedRule,
    /// Description of the denying rule, if it has one
    pub reason: Option<String>,
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
}

/// Audit view of an evaluation, including the denied case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyExplanation {
    pub tool_name: String,
    pub matched: MatchedRule,
    pub action: PolicyAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
}

struct CompiledRule {
    rule: PolicyRule,
    /// One entry per condition; `Some` only for `matches` conditions
    patterns: Vec<Option<Regex>>,
}

impl CompiledRule {
    fn compile(rule: PolicyRule, index: usize) -> Result<Self, PolicyConfigError> {
        let mut patterns = Vec::with_capacity(rule.conditions.len());
        for condition in &rule.conditions {
            if condition.operator == ConditionOperator::Matches {
                let Some(pattern) = condition.value.as_str() else {
                    return Err(PolicyConfigError::NonStringPattern {
                        index,
                        param: condition.param.clone(),
                    });
                };
                let re = Regex::new(pattern).map_err(|e| PolicyConfigError::InvalidPattern {
                    index,
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?;
                patterns.push(Some(re));
            } else {
                patterns.push(None);
            }
        }
        Ok(Self { rule, patterns })
    }

    fn matches(&self, tool_name: &str, arguments: &HashMap<String, Value>) -> bool {
        self.rule.tool.matches(tool_name)
            && self
                .rule
                .conditions
                .iter()
                .zip(&self.patterns)
                .all(|(condition, pattern)| condition.evaluate(arguments, pattern.as_ref()))
    }
}

/// Pure decision function over a validated [`PolicyConfig`].
///
/// Immutable once built; to change policy, construct a new engine and hand
/// it to subsequent invocations.
pub struct PolicyEngine {
    default_action: PolicyAction,
    default_risk: RiskLevel,
    rules: Vec<CompiledRule>,
    config: PolicyConfig,
}

impl PolicyEngine {
    /// Validate and compile a rule set.
    pub fn new(config: PolicyConfig) -> Result<Self, PolicyConfigError> {
        config.validate()?;
        let rules = config
            .rules
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, rule)| CompiledRule::compile(rule, i + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            default_action: config.default_action,
            default_risk: config.default_risk,
            rules,
            config,
        })
    }

    /// Engine that allows everything; useful for trusted or test contexts.
    pub fn allow_all() -> Self {
        Self {
            default_action: PolicyAction::Allow,
            default_risk: RiskLevel::Low,
            rules: Vec::new(),
            config: PolicyConfig::allow_all(),
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Decide whether a call proceeds, needs confirmation, or is denied.
    pub fn evaluate(
        &self,
        tool_name: &str,
        arguments: &HashMap<String, Value>,
    ) -> Result<PolicyDecision, PolicyDenied> {
        let (matched, rule) = self.find(tool_name, arguments);
        let action = rule.map_or(self.default_action, |r| r.action);

        match action {
            PolicyAction::Allow => Ok(PolicyDecision::Allow),
            PolicyAction::Ask => Ok(PolicyDecision::Ask {
                risk: rule.and_then(|r| r.risk).unwrap_or(self.default_risk),
            }),
            PolicyAction::Deny => Err(PolicyDenied {
                tool_name: tool_name.to_string(),
                matched,
                reason: rule.and_then(|r| r.description.clone()),
            }),
        }
    }

    /// Report which clause decides a call, without failing on denial.
    pub fn explain(&self, tool_name: &str, arguments: &HashMap<String, Value>) -> PolicyExplanation {
        let (matched, rule) = self.find(tool_name, arguments);
        let action = rule.map_or(self.default_action, |r| r.action);
        let risk = match action {
            PolicyAction::Ask => Some(rule.and_then(|r| r.risk).unwrap_or(self.default_risk)),
            _ => None,
        };

        PolicyExplanation {
            tool_name: tool_name.to_string(),
            matched,
            action,
            risk,
        }
    }

    fn find(
        &self,
        tool_name: &str,
        arguments: &HashMap<String, Value>,
    ) -> (MatchedRule, Option<&PolicyRule>) {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, compiled)| compiled.matches(tool_name, arguments))
            .map(|(i, compiled)| (MatchedRule::Rule(i + 1), Some(&compiled.rule)))
            .unwrap_or((MatchedRule::Default, None))
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("default_action", &self.default_action)
            .field("rules", &self.rules.len())
            .finish()
    }
}
