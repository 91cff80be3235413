//! The allocation state machine: pre-resolved pass-through, sticky lookup,
//! weighted random walk.

use crate::store::{AllocationKey, AllocationStore};
use flagkit_catalog::VariationGroup;
use std::sync::Arc;
use tracing::debug;

/// Upper bound of the draw range; allocation weights are 0–100.
pub const MAX_ALLOCATION: f64 = 100.0;

/// The visitor identity allocation records are keyed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorIdentity {
    pub visitor_id: String,
    pub custom_visitor_id: Option<String>,
}

impl VisitorIdentity {
    pub fn new(visitor_id: impl Into<String>, custom_visitor_id: Option<String>) -> Self {
        Self {
            visitor_id: visitor_id.into(),
            custom_visitor_id,
        }
    }

    fn key_for(&self, group_id: &str) -> AllocationKey {
        AllocationKey::new(
            self.visitor_id.clone(),
            self.custom_visitor_id.clone(),
            group_id,
        )
    }
}

/// Source of the allocation draw. The resolver draws exactly once per sync
/// pass and hands the value to every group resolution in that pass.
pub trait DrawSource: Send + Sync {
    /// A uniformly distributed value in `[0, MAX_ALLOCATION)`.
    fn draw(&self) -> f64;
}

/// Production draw.
pub struct RandomDraw;

impl DrawSource for RandomDraw {
    fn draw(&self) -> f64 {
        rand::random::<f64>() * MAX_ALLOCATION
    }
}

/// Deterministic draw for tests and reproducible runs.
pub struct FixedDraw(pub f64);

impl DrawSource for FixedDraw {
    fn draw(&self) -> f64 {
        self.0
    }
}

/// Selects one variation per group, consulting the allocation store for
/// stickiness.
pub struct AllocationEngine {
    store: Arc<dyn AllocationStore>,
}

impl AllocationEngine {
    pub fn new(store: Arc<dyn AllocationStore>) -> Self {
        Self { store }
    }

    /// Resolve a group to a variation id, or `None` when the group yields
    /// no variation this sync.
    ///
    /// Pre-resolved groups return their variation immediately: no store
    /// access, no randomness. Client-allocable groups first honor an
    /// existing store record (a returning visitor keeps their variation
    /// regardless of `draw`), then walk the variations in parse order
    /// accumulating allocation weights until the cumulative sum reaches
    /// `draw`. Weights summing short of the range mean a draw past the last
    /// threshold allocates nothing; that is catalog-authored behavior, not
    /// an error. A winning draw is persisted before returning so it sticks
    /// for future syncs of the same identity.
    pub fn resolve(
        &self,
        group: &mut VariationGroup,
        visitor: &VisitorIdentity,
        draw: f64,
    ) -> Option<String> {
        if let Some(resolved) = &group.resolved_variation_id {
            return Some(resolved.clone());
        }

        let key = visitor.key_for(&group.id);

        if let Some(existing) = self.store.get(&key) {
            if group.has_variation(&existing) {
                debug!(
                    group = %group.id,
                    visitor = %visitor.visitor_id,
                    variation = %existing,
                    "sticky allocation reused"
                );
                group.resolved_variation_id = Some(existing.clone());
                group.mark_selected(&existing);
                return Some(existing);
            }
            // The recorded variation left the catalog; fall through and
            // allocate fresh.
            debug!(
                group = %group.id,
                variation = %existing,
                "recorded variation no longer in group, reallocating"
            );
        }

        let mut cumulative = 0.0;
        let mut winner = None;
        for variation in &group.variations {
            cumulative += variation.allocation as f64;
            if cumulative >= draw {
                winner = Some(variation.id.clone());
                break;
            }
        }

        let Some(winner) = winner else {
            debug!(
                group = %group.id,
                visitor = %visitor.visitor_id,
                draw,
                cumulative,
                "draw past cumulative allocation, no variation"
            );
            return None;
        };

        self.store.put(&key, &winner);
        debug!(
            group = %group.id,
            visitor = %visitor.visitor_id,
            variation = %winner,
            draw,
            "variation allocated"
        );
        group.resolved_variation_id = Some(winner.clone());
        group.mark_selected(&winner);
        Some(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAllocationStore;
    use flagkit_catalog::Variation;
    use std::collections::HashMap;

    fn make_group(weights: &[(&str, u32)]) -> VariationGroup {
        VariationGroup {
            id: "vg1".to_string(),
            campaign_id: "c1".to_string(),
            targeting: None,
            variations: weights
                .iter()
                .map(|(id, allocation)| Variation {
                    id: id.to_string(),
                    group_id: "vg1".to_string(),
                    allocation: *allocation,
                    modifications: HashMap::new(),
                    selected: false,
                })
                .collect(),
            resolved_variation_id: None,
        }
    }

    fn make_engine() -> (AllocationEngine, Arc<InMemoryAllocationStore>) {
        let store = Arc::new(InMemoryAllocationStore::new());
        (AllocationEngine::new(store.clone()), store)
    }

    fn visitor() -> VisitorIdentity {
        VisitorIdentity::new("visitor-1", None)
    }

    #[test]
    fn test_pre_resolved_short_circuits() {
        let (engine, store) = make_engine();
        let mut group = make_group(&[("a", 100)]);
        group.resolved_variation_id = Some("server_choice".to_string());

        let result = engine.resolve(&mut group, &visitor(), 99.0);
        assert_eq!(result.as_deref(), Some("server_choice"));
        // No store access on the pre-resolved path.
        assert!(store.is_empty());
    }

    #[test]
    fn test_weighted_walk_is_deterministic() {
        let (engine, _) = make_engine();

        let mut group = make_group(&[("first", 30), ("second", 70)]);
        assert_eq!(
            engine.resolve(&mut group, &visitor(), 25.0).as_deref(),
            Some("first")
        );

        let mut group = make_group(&[("first", 30), ("second", 70)]);
        assert_eq!(
            engine
                .resolve(&mut group, &VisitorIdentity::new("visitor-2", None), 95.0)
                .as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_short_weights_can_allocate_nothing() {
        let (engine, store) = make_engine();
        let mut group = make_group(&[("a", 30), ("b", 30)]);

        let result = engine.resolve(&mut group, &visitor(), 80.0);
        assert!(result.is_none());
        assert!(group.resolved_variation_id.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_winner_is_persisted_and_sticky() {
        let (engine, store) = make_engine();
        let v = visitor();

        let mut group = make_group(&[("a", 50), ("b", 50)]);
        assert_eq!(engine.resolve(&mut group, &v, 10.0).as_deref(), Some("a"));
        assert_eq!(store.len(), 1);

        // A fresh parse of the same catalog and a draw that would pick "b":
        // the store record wins.
        let mut group = make_group(&[("a", 50), ("b", 50)]);
        assert_eq!(engine.resolve(&mut group, &v, 90.0).as_deref(), Some("a"));
        assert!(group.variations[0].selected);
        assert!(!group.variations[1].selected);
    }

    #[test]
    fn test_stale_record_triggers_reallocation() {
        let (engine, store) = make_engine();
        let v = visitor();
        store.put(&AllocationKey::new("visitor-1", None, "vg1"), "gone");

        let mut group = make_group(&[("a", 50), ("b", 50)]);
        assert_eq!(engine.resolve(&mut group, &v, 90.0).as_deref(), Some("b"));
        // The fresh winner replaced the stale record.
        assert_eq!(
            store.get(&AllocationKey::new("visitor-1", None, "vg1")).as_deref(),
            Some("b")
        );
    }

    #[test]
    fn test_identities_do_not_share_stickiness() {
        let (engine, _) = make_engine();

        let mut group = make_group(&[("a", 50), ("b", 50)]);
        let first = engine.resolve(&mut group, &visitor(), 10.0);
        assert_eq!(first.as_deref(), Some("a"));

        let other = VisitorIdentity::new("visitor-1", Some("crm-7".to_string()));
        let mut group = make_group(&[("a", 50), ("b", 50)]);
        let second = engine.resolve(&mut group, &other, 90.0);
        assert_eq!(second.as_deref(), Some("b"));
    }

    #[test]
    fn test_selection_invariant() {
        let (engine, _) = make_engine();
        let mut group = make_group(&[("a", 50), ("b", 50)]);
        engine.resolve(&mut group, &visitor(), 60.0);

        let selected: Vec<_> = group.variations.iter().filter(|v| v.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "b");
        assert_eq!(group.resolved_variation_id.as_deref(), Some("b"));
    }
}
