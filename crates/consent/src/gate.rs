//! ConsentGate - per-event permission decisions

use std::collections::HashMap;
use std::sync::RwLock;

use contracts::{ConsentRules, ConsentState, TrackedEvent};
use tracing::debug;

/// Gate that maps events to consent categories and checks grants.
///
/// State is owned exclusively by the gate and only ever leaves as a copy.
/// Pure decision function apart from `update`.
pub struct ConsentGate {
    state: RwLock<ConsentState>,
    rules: ConsentRules,
}

impl ConsentGate {
    pub fn new(initial: ConsentState, rules: ConsentRules) -> Self {
        Self {
            state: RwLock::new(initial),
            rules,
        }
    }

    /// Resolve the consent category an event falls under.
    ///
    /// Precedence: exact key > area > `area::*` wildcard > default.
    pub fn resolve_category<'a>(&'a self, event: &TrackedEvent) -> &'a str {
        self.rules.resolve(event)
    }

    /// Whether delivery of this event is currently permitted.
    pub fn is_allowed(&self, event: &TrackedEvent) -> bool {
        let category = self.resolve_category(event);
        let allowed = self
            .state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_granted(category);

        if !allowed {
            debug!(event = %event.key, category, "consent denied, dropping event");
        }

        allowed
    }

    /// Merge a partial consent update; unspecified categories keep their
    /// prior value.
    pub fn update(&self, partial: HashMap<String, bool>) {
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .merge(partial);
    }

    /// Defensive copy of the current state.
    pub fn state(&self) -> ConsentState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for ConsentGate {
    fn default() -> Self {
        Self::new(ConsentState::default(), ConsentRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Payload;

    fn event(area: &str, name: &str) -> TrackedEvent {
        TrackedEvent::new(area, name, Payload::new())
    }

    fn gate_with(mapping: &[(&str, &str)], default_category: &str) -> ConsentGate {
        let rules = ConsentRules {
            mapping: mapping
                .iter()
                .map(|(pattern, category)| (pattern.to_string(), category.to_string()))
                .collect(),
            default_category: default_category.to_string(),
        };
        ConsentGate::new(ConsentState::default(), rules)
    }

    #[test]
    fn test_deny_by_default() {
        let gate = ConsentGate::default();
        // Default category is analytics, which nobody granted
        assert!(!gate.is_allowed(&event("nav", "page_view")));
    }

    #[test]
    fn test_necessary_events_pass_without_any_grant() {
        let gate = gate_with(&[("session", "necessary")], "analytics");
        assert!(gate.is_allowed(&event("session", "start")));
    }

    #[test]
    fn test_update_grants_category() {
        let gate = ConsentGate::default();
        assert!(!gate.is_allowed(&event("nav", "click")));

        gate.update(HashMap::from([("analytics".to_string(), true)]));
        assert!(gate.is_allowed(&event("nav", "click")));
    }

    #[test]
    fn test_exact_key_beats_area_mapping() {
        let gate = gate_with(
            &[("checkout::purchase", "necessary"), ("checkout", "marketing")],
            "analytics",
        );

        // Exact key resolves to the always-granted necessary category
        assert!(gate.is_allowed(&event("checkout", "purchase")));
        // Sibling event in the same area resolves to ungranted marketing
        assert!(!gate.is_allowed(&event("checkout", "refund")));
    }

    #[test]
    fn test_area_beats_wildcard() {
        let gate = gate_with(
            &[("cart", "necessary"), ("cart::*", "marketing")],
            "analytics",
        );
        assert_eq!(gate.resolve_category(&event("cart", "add")), "necessary");
    }

    #[test]
    fn test_wildcard_beats_default() {
        let gate = gate_with(&[("nav::*", "necessary")], "analytics");
        assert!(gate.is_allowed(&event("nav", "scroll")));
        assert!(!gate.is_allowed(&event("search", "query")));
    }

    #[test]
    fn test_state_is_a_copy() {
        let gate = ConsentGate::default();
        let mut copy = gate.state();
        copy.merge(HashMap::from([("analytics".to_string(), true)]));

        // Mutating the copy must not affect the gate
        assert!(!gate.is_allowed(&event("nav", "click")));
    }

    #[test]
    fn test_update_survives_poisoned_lock() {
        let gate = ConsentGate::default();

        // Panic while holding the write guard to poison the lock
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = gate.state.write().unwrap();
            panic!("poison");
        }));
        assert!(gate.state.is_poisoned());

        gate.update(HashMap::from([("analytics".to_string(), true)]));
        assert!(gate.is_allowed(&event("nav", "click")));
        assert!(gate.state().is_granted("analytics"));
    }

    #[test]
    fn test_update_preserves_unspecified_categories() {
        let gate = ConsentGate::default();
        gate.update(HashMap::from([("analytics".to_string(), true)]));
        gate.update(HashMap::from([("marketing".to_string(), true)]));

        let state = gate.state();
        assert!(state.is_granted("analytics"));
        assert!(state.is_granted("marketing"));
        assert!(state.is_granted("necessary"));
    }
}
