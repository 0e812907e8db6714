//! Policy configuration from TOML (`[policy]` section)
//!
//! ```toml
//! [policy]
//! default_action = "ask"
//! default_risk = "medium"
//!
//! [[policy.rules]]
//! tool = "write_file"
//! action = "deny"
//! description = "secrets stay untouched"
//! conditions = [{ param = "path", operator = "contains", value = "secret" }]
//!
//! [[policy.rules]]
//! tool = "*"
//! action = "ask"
//! risk = "low"
//! ```
//!
//! Rules are kept in file order; the first matching rule wins.

use serde::{Deserialize, Serialize};
use warden_domain::{PolicyAction, PolicyConfig, PolicyRule, RiskLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePolicyConfig {
    /// Action when no rule matches
    pub default_action: PolicyAction,
    /// Risk reported when the default action is `ask`
    pub default_risk: RiskLevel,
    pub rules: Vec<PolicyRule>,
}

impl Default for FilePolicyConfig {
    fn default() -> Self {
        let defaults = PolicyConfig::default();
        Self {
            default_action: defaults.default_action,
            default_risk: defaults.default_risk,
            rules: defaults.rules,
        }
    }
}

impl FilePolicyConfig {
    /// Domain rule set, not yet validated.
    pub fn to_policy_config(&self) -> PolicyConfig {
        PolicyConfig {
            default_action: self.default_action,
            default_risk: self.default_risk,
            rules: self.rules.clone(),
        }
    }
}
