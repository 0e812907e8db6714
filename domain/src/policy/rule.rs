//! Policy rules and parameter conditions.

use super::risk::RiskLevel;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// What a matching rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    /// Proceed without asking
    Allow,
    /// Proceed only after confirmation
    Ask,
    /// Never proceed
    Deny,
}

impl PolicyAction {
    pub fn as_str(&self) -> &str {
        match self {
            PolicyAction::Allow => "allow",
            PolicyAction::Ask => "ask",
            PolicyAction::Deny => "deny",
        }
    }
}

impl std::fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PolicyAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allow" => Ok(PolicyAction::Allow),
            "ask" => Ok(PolicyAction::Ask),
            "deny" => Ok(PolicyAction::Deny),
            other => Err(format!("unknown policy action: {}", other)),
        }
    }
}

/// Which tools a rule applies to: `"*"` or one exact name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ToolMatcher {
    Any,
    Exact(String),
}

impl ToolMatcher {
    pub fn matches(&self, tool_name: &str) -> bool {
        match self {
            ToolMatcher::Any => true,
            ToolMatcher::Exact(name) => name == tool_name,
        }
    }
}

impl From<String> for ToolMatcher {
    fn from(s: String) -> Self {
        if s == "*" {
            ToolMatcher::Any
        } else {
            ToolMatcher::Exact(s)
        }
    }
}

impl From<&str> for ToolMatcher {
    fn from(s: &str) -> Self {
        ToolMatcher::from(s.to_string())
    }
}

impl From<ToolMatcher> for String {
    fn from(m: ToolMatcher) -> Self {
        match m {
            ToolMatcher::Any => "*".to_string(),
            ToolMatcher::Exact(name) => name,
        }
    }
}

impl std::fmt::Display for ToolMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolMatcher::Any => write!(f, "*"),
            ToolMatcher::Exact(name) => write!(f, "{}", name),
        }
    }
}

/// Comparison applied by a [`PolicyCondition`].
///
/// String operators compare against the parameter's text; non-string JSON
/// values are compared using their JSON rendering. Numeric operators parse
/// both sides as numbers and are false if either side is not numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Contains,
    NotContains,
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    /// Regular expression search
    Matches,
    GreaterThan,
    LessThan,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionOperator::Contains => "contains",
            ConditionOperator::NotContains => "not_contains",
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::StartsWith => "starts_with",
            ConditionOperator::EndsWith => "ends_with",
            ConditionOperator::Matches => "matches",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
        }
    }

    /// Result when the parameter is absent from the call.
    fn on_absent(&self) -> bool {
        matches!(self, ConditionOperator::NotContains | ConditionOperator::NotEquals)
    }
}

/// A predicate on one call-time parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCondition {
    /// Parameter name in the call's arguments
    pub param: String,
    pub operator: ConditionOperator,
    /// Comparison value
    pub value: Value,
}

impl PolicyCondition {
    pub fn new(
        param: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            param: param.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn contains(param: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(param, ConditionOperator::Contains, value.into())
    }

    pub fn equals(param: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(param, ConditionOperator::Equals, value)
    }

    pub fn matches(param: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(param, ConditionOperator::Matches, pattern.into())
    }

    /// Evaluate against bound call arguments.
    ///
    /// `pattern` must be the compiled form of `value` when the operator is
    /// [`ConditionOperator::Matches`]; it is ignored otherwise.
    pub fn evaluate(&self, arguments: &HashMap<String, Value>, pattern: Option<&Regex>) -> bool {
        let Some(actual) = arguments.get(&self.param).filter(|v| !v.is_null()) else {
            return self.operator.on_absent();
        };

        let actual_text = value_text(actual);
        let expected_text = value_text(&self.value);

        match self.operator {
            ConditionOperator::Contains => actual_text.contains(expected_text.as_str()),
            ConditionOperator::NotContains => !actual_text.contains(expected_text.as_str()),
            ConditionOperator::Equals => actual_text == expected_text,
            ConditionOperator::NotEquals => actual_text != expected_text,
            ConditionOperator::StartsWith => actual_text.starts_with(expected_text.as_str()),
            ConditionOperator::EndsWith => actual_text.ends_with(expected_text.as_str()),
            ConditionOperator::Matches => pattern.is_some_and(|re| re.is_match(&actual_text)),
            ConditionOperator::GreaterThan => {
                compare_numbers(actual, &self.value).is_some_and(|(a, b)| a > b)
            }
            ConditionOperator::LessThan => {
                compare_numbers(actual, &self.value).is_some_and(|(a, b)| a < b)
            }
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn compare_numbers(actual: &Value, expected: &Value) -> Option<(f64, f64)> {
    Some((as_number(actual)?, as_number(expected)?))
}

/// One authorization clause.
///
/// A rule matches when its tool matcher accepts the tool name and every
/// condition holds for the call's arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub tool: ToolMatcher,
    pub action: PolicyAction,
    /// Required when `action` is `ask`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PolicyCondition>,
    /// Free-form note, echoed in denial messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PolicyRule {
    pub fn new(tool: impl Into<ToolMatcher>, action: PolicyAction) -> Self {
        Self {
            tool: tool.into(),
            action,
            risk: None,
            conditions: Vec::new(),
            description: None,
        }
    }

    pub fn allow(tool: impl Into<ToolMatcher>) -> Self {
        Self::new(tool, PolicyAction::Allow)
    }

    pub fn ask(tool: impl Into<ToolMatcher>, risk: RiskLevel) -> Self {
        Self::new(tool, PolicyAction::Ask).with_risk(risk)
    }

    pub fn deny(tool: impl Into<ToolMatcher>) -> Self {
        Self::new(tool, PolicyAction::Deny)
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn with_condition(mut self, condition: PolicyCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
