//! The full rule set and its validation.

use super::risk::RiskLevel;
use super::rule::{ConditionOperator, PolicyAction, PolicyRule, ToolMatcher, as_number};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rule-set validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyConfigError {
    #[error("rule #{index} ({tool}) has action 'ask' but no risk level")]
    AskWithoutRisk { index: usize, tool: String },

    #[error("rule #{index} has an empty tool matcher")]
    EmptyToolMatcher { index: usize },

    #[error("rule #{index} has a condition with an empty parameter name")]
    EmptyConditionParam { index: usize },

    #[error("rule #{index}: 'matches' condition on '{param}' needs a string pattern")]
    NonStringPattern { index: usize, param: String },

    #[error("rule #{index}: '{operator}' condition on '{param}' needs a numeric value")]
    NonNumericValue {
        index: usize,
        param: String,
        operator: String,
    },

    #[error("rule #{index} has an invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        reason: String,
    },
}

/// Ordered rules plus the action applied when none match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub default_action: PolicyAction,
    /// Risk reported when the default action is `ask`
    pub default_risk: RiskLevel,
    pub rules: Vec<PolicyRule>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_action: PolicyAction::Ask,
            default_risk: RiskLevel::Medium,
            rules: Vec::new(),
        }
    }
}

impl PolicyConfig {
    pub fn new(default_action: PolicyAction) -> Self {
        Self {
            default_action,
            ..Self::default()
        }
    }

    /// Policy that lets every call through unattended.
    pub fn allow_all() -> Self {
        Self::new(PolicyAction::Allow)
    }

    // ==================== Builder Methods ====================

    pub fn with_default_risk(mut self, risk: RiskLevel) -> Self {
        self.default_risk = risk;
        self
    }

    pub fn with_rule(mut self, rule: PolicyRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Check structural invariants of every rule.
    ///
    /// Rule indices in errors are 1-based, matching how rules read in a
    /// config file.
    pub fn validate(&self) -> Result<(), PolicyConfigError> {
        for (i, rule) in self.rules.iter().enumerate() {
            let index = i + 1;

            if matches!(&rule.tool, ToolMatcher::Exact(name) if name.trim().is_empty()) {
                return Err(PolicyConfigError::EmptyToolMatcher { index });
            }

            if rule.action == PolicyAction::Ask && rule.risk.is_none() {
                return Err(PolicyConfigError::AskWithoutRisk {
                    index,
                    tool: rule.tool.to_string(),
                });
            }

            for condition in &rule.conditions {
                if condition.param.trim().is_empty() {
                    return Err(PolicyConfigError::EmptyConditionParam { index });
                }
                match condition.operator {
                    ConditionOperator::Matches => {
                        let Some(pattern) = condition.value.as_str() else {
                            return Err(PolicyConfigError::NonStringPattern {
                                index,
                                param: condition.param.clone(),
                            });
                        };
                        if let Err(e) = regex::Regex::new(pattern) {
                            return Err(PolicyConfigError::InvalidPattern {
                                index,
                                pattern: pattern.to_string(),
                                reason: e.to_string(),
                            });
                        }
                    }
                    ConditionOperator::GreaterThan | ConditionOperator::LessThan
                        if as_number(&condition.value).is_none() =>
                    {
                        return Err(PolicyConfigError::NonNumericValue {
                            index,
                            param: condition.param.clone(),
                            operator: condition.operator.as_str().to_string(),
                        });
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}
