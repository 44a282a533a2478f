//! The built-in rule set.

use crate::ProviderDefaultTags;
use provider_lint_core::RuleBox;
use tracing::warn;

/// Name of the built-in rule set.
pub const RULESET_NAME: &str = "provider";

/// A named, versioned collection of rules.
pub struct RuleSet {
    /// Rule set name.
    pub name: &'static str,
    /// Rule set version.
    pub version: &'static str,
    rules: Vec<RuleBox>,
}

impl RuleSet {
    /// Returns the built-in rule set.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            name: RULESET_NAME,
            version: env!("CARGO_PKG_VERSION"),
            rules: all_rules(),
        }
    }

    /// Returns the rules in this set.
    #[must_use]
    pub fn rules(&self) -> &[RuleBox] {
        &self.rules
    }

    /// Consumes the set, returning its rules.
    #[must_use]
    pub fn into_rules(self) -> Vec<RuleBox> {
        self.rules
    }

    /// Keeps only the rules whose names are listed, warning about unknown names.
    #[must_use]
    pub fn select(self, names: &[&str]) -> Vec<RuleBox> {
        for name in names {
            if !self.rules.iter().any(|r| r.name() == *name) {
                warn!("Unknown rule: {}", name);
            }
        }
        self.rules
            .into_iter()
            .filter(|r| names.contains(&r.name()))
            .collect()
    }
}

/// Returns all available rules.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![Box::new(ProviderDefaultTags::new())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules() {
        let set = RuleSet::builtin();
        assert_eq!(set.name, "provider");
        assert!(!set.version.is_empty());
        assert!(!set.rules().is_empty());
    }

    #[test]
    fn select_filters_by_name() {
        let selected = RuleSet::builtin().select(&["provider_default_tags", "nonexistent"]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name(), "provider_default_tags");

        assert!(RuleSet::builtin().select(&["nonexistent"]).is_empty());
    }
}
