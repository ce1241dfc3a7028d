//! Severity classification of compliance rule ids.
//!
//! A [`SeverityRules`] registry is an ordered list of substring rules. The
//! built-in entries come first and cannot be removed; configured entries are
//! appended after them, so configuration can only add matches.

use plancheck_shared::{RiskCategory, SeverityRuleConfig};

/// One case-sensitive substring rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityRule {
    pub pattern: String,
    pub category: RiskCategory,
    /// Matching violations count toward the explicit approval-blocker total.
    pub blocker: bool,
}

impl SeverityRule {
    pub fn new(pattern: impl Into<String>, category: RiskCategory, blocker: bool) -> Self {
        Self {
            pattern: pattern.into(),
            category,
            blocker,
        }
    }

    fn matches(&self, rule_id: &str) -> bool {
        rule_id.contains(self.pattern.as_str())
    }
}

impl From<&SeverityRuleConfig> for SeverityRule {
    fn from(config: &SeverityRuleConfig) -> Self {
        Self::new(config.pattern.clone(), config.category, config.blocker)
    }
}

#[derive(Debug, Clone)]
pub struct SeverityRules {
    rules: Vec<SeverityRule>,
}

impl Default for SeverityRules {
    /// Ductile-detailing clauses (IS 13920) are critical; ids tagged
    /// `CRITICAL` are critical and block approval.
    fn default() -> Self {
        Self {
            rules: vec![
                SeverityRule::new("13920", RiskCategory::Critical, false),
                SeverityRule::new("CRITICAL", RiskCategory::Critical, true),
            ],
        }
    }
}

impl SeverityRules {
    /// Built-in rules followed by `extra`.
    pub fn with_rules(extra: impl IntoIterator<Item = SeverityRule>) -> Self {
        let mut rules = Self::default();
        rules.rules.extend(extra);
        rules
    }

    /// Built-in rules followed by the configured ones.
    pub fn from_config(configured: &[SeverityRuleConfig]) -> Self {
        Self::with_rules(configured.iter().map(SeverityRule::from))
    }

    /// `Critical` if any matching rule says so, else `Warning`.
    pub fn classify(&self, rule_id: &str) -> RiskCategory {
        let critical = self
            .rules
            .iter()
            .any(|r| r.category == RiskCategory::Critical && r.matches(rule_id));
        if critical {
            RiskCategory::Critical
        } else {
            RiskCategory::Warning
        }
    }

    pub fn is_blocker(&self, rule_id: &str) -> bool {
        self.rules.iter().any(|r| r.blocker && r.matches(rule_id))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_classification() {
        let rules = SeverityRules::default();
        assert_eq!(rules.classify("IS-13920-4"), RiskCategory::Critical);
        assert_eq!(rules.classify("CRITICAL-IS-456"), RiskCategory::Critical);
        assert_eq!(rules.classify("IS-456-26.5"), RiskCategory::Warning);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let rules = SeverityRules::default();
        assert_eq!(rules.classify("critical-is-456"), RiskCategory::Warning);
        assert!(!rules.is_blocker("Critical-IS-456"));
    }

    #[test]
    fn only_critical_tag_blocks() {
        let rules = SeverityRules::default();
        assert!(rules.is_blocker("CRITICAL-IS-1893"));
        assert!(!rules.is_blocker("IS-13920-6.3"));
    }

    #[test]
    fn configured_rules_only_add_matches() {
        let rules = SeverityRules::from_config(&[
            SeverityRuleConfig {
                pattern: "NBC-4".into(),
                category: RiskCategory::Critical,
                blocker: true,
            },
            SeverityRuleConfig {
                pattern: "13920".into(),
                category: RiskCategory::Warning,
                blocker: false,
            },
        ]);

        assert_eq!(rules.len(), 4);
        assert_eq!(rules.classify("NBC-4.2"), RiskCategory::Critical);
        assert!(rules.is_blocker("NBC-4.2"));
        // A later Warning rule cannot downgrade a built-in Critical match.
        assert_eq!(rules.classify("IS-13920-7"), RiskCategory::Critical);
    }
}
