//! Consent types - state and pattern rules shared between gate and config

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::TrackedEvent;

/// The category every event falls back to when no rule matches.
pub const DEFAULT_CATEGORY: &str = "analytics";

/// Category that is always present and granted.
pub const NECESSARY_CATEGORY: &str = "necessary";

/// Current grant status per consent category.
///
/// Absent categories are treated as denied. The `necessary` category is
/// always present and defaults to granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentState {
    #[serde(flatten)]
    categories: HashMap<String, bool>,
}

impl Default for ConsentState {
    fn default() -> Self {
        let mut categories = HashMap::new();
        categories.insert(NECESSARY_CATEGORY.to_string(), true);
        Self { categories }
    }
}

impl ConsentState {
    /// Build a state from explicit grants, forcing `necessary` to exist.
    pub fn from_grants(grants: HashMap<String, bool>) -> Self {
        let mut state = Self::default();
        state.merge(grants);
        state
    }

    /// Whether a category is currently granted. Deny-by-default.
    pub fn is_granted(&self, category: &str) -> bool {
        self.categories.get(category).copied().unwrap_or(false)
    }

    /// Merge a partial update; untouched categories keep their prior value.
    pub fn merge(&mut self, partial: HashMap<String, bool>) {
        for (category, granted) in partial {
            self.categories.insert(category, granted);
        }
        // `necessary` must never disappear
        self.categories
            .entry(NECESSARY_CATEGORY.to_string())
            .or_insert(true);
    }

    /// All known categories and their grant status.
    pub fn grants(&self) -> &HashMap<String, bool> {
        &self.categories
    }
}

/// Pattern rules mapping events to consent categories.
///
/// A pattern is either an exact event key (`"checkout::purchase"`), a bare
/// area name (`"checkout"`), or an area wildcard (`"checkout::*"`).
/// Precedence: exact key > area > wildcard > `default_category`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRules {
    /// Pattern -> category
    #[serde(default)]
    pub mapping: HashMap<String, String>,

    /// Category used when no pattern matches
    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for ConsentRules {
    fn default() -> Self {
        Self {
            mapping: HashMap::new(),
            default_category: default_category(),
        }
    }
}

impl ConsentRules {
    /// Resolve the consent category for an event.
    pub fn resolve<'a>(&'a self, event: &TrackedEvent) -> &'a str {
        if let Some(category) = self.mapping.get(event.key.as_str()) {
            return category;
        }
        if let Some(category) = self.mapping.get(event.area.as_str()) {
            return category;
        }
        let wildcard = format!("{}::*", event.area);
        if let Some(category) = self.mapping.get(&wildcard) {
            return category;
        }
        &self.default_category
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Payload;

    fn event(area: &str, name: &str) -> TrackedEvent {
        TrackedEvent::new(area, name, Payload::new())
    }

    #[test]
    fn test_necessary_granted_by_default() {
        let state = ConsentState::default();
        assert!(state.is_granted("necessary"));
        assert!(!state.is_granted("analytics"));
    }

    #[test]
    fn test_merge_keeps_untouched_categories() {
        let mut state = ConsentState::default();
        state.merge(HashMap::from([("analytics".to_string(), true)]));
        state.merge(HashMap::from([("marketing".to_string(), false)]));

        assert!(state.is_granted("analytics"));
        assert!(!state.is_granted("marketing"));
        assert!(state.is_granted("necessary"));
    }

    #[test]
    fn test_merge_cannot_remove_necessary() {
        let mut state = ConsentState::default();
        state.merge(HashMap::from([("necessary".to_string(), false)]));
        // Explicit revocation is honored, but the category stays present
        assert!(state.grants().contains_key("necessary"));
        assert!(!state.is_granted("necessary"));
    }

    #[test]
    fn test_resolve_precedence() {
        let rules = ConsentRules {
            mapping: HashMap::from([
                ("checkout::purchase".to_string(), "necessary".to_string()),
                ("checkout".to_string(), "marketing".to_string()),
                ("checkout::*".to_string(), "analytics".to_string()),
            ]),
            default_category: "analytics".to_string(),
        };

        // Exact key wins over area and wildcard
        assert_eq!(rules.resolve(&event("checkout", "purchase")), "necessary");
        // Area wins over wildcard
        assert_eq!(rules.resolve(&event("checkout", "refund")), "marketing");
    }

    #[test]
    fn test_resolve_wildcard_then_default() {
        let rules = ConsentRules {
            mapping: HashMap::from([("nav::*".to_string(), "marketing".to_string())]),
            default_category: "analytics".to_string(),
        };

        assert_eq!(rules.resolve(&event("nav", "click")), "marketing");
        assert_eq!(rules.resolve(&event("search", "query")), "analytics");
    }
}
