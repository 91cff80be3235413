//! Per-sync resolution: one walk over the catalog producing the merged
//! modification table.

use flagkit_allocation::{AllocationEngine, VisitorIdentity};
use flagkit_catalog::{Catalog, Modification, VariationGroup};
use flagkit_core::{DecisionMode, VisitorContext};
use flagkit_targeting::evaluate;
use std::collections::HashMap;
use tracing::debug;

/// Resolve every campaign in catalog order into a flag-key → Modification
/// table. Later campaigns overwrite earlier ones sharing a key.
///
/// In [`DecisionMode::Server`] the rule trees are ignored: the server
/// already applied targeting, and every group's resolved-or-allocated
/// variation merges. In [`DecisionMode::Client`] group order within a
/// campaign is a priority list: the first group whose targeting is
/// satisfied contributes and ends that campaign's walk.
///
/// `draw` is the pass-wide allocation draw, produced once by the caller.
pub fn resolve_all(
    catalog: &mut Catalog,
    context: &VisitorContext,
    visitor: &VisitorIdentity,
    mode: DecisionMode,
    draw: f64,
    allocation: &AllocationEngine,
) -> HashMap<String, Modification> {
    let mut table = HashMap::new();

    for campaign in &mut catalog.campaigns {
        match mode {
            DecisionMode::Server => {
                for group in &mut campaign.variation_groups {
                    merge_group(&mut table, group, visitor, draw, allocation);
                }
            }
            DecisionMode::Client => {
                for group in &mut campaign.variation_groups {
                    let satisfied = group
                        .targeting
                        .as_ref()
                        .map_or(false, |tree| evaluate(tree, context));
                    if !satisfied {
                        continue;
                    }
                    merge_group(&mut table, group, visitor, draw, allocation);
                    // First satisfied group wins the campaign.
                    break;
                }
            }
        }
    }

    debug!(flags = table.len(), mode = ?mode, "resolution pass complete");
    table
}

fn merge_group(
    table: &mut HashMap<String, Modification>,
    group: &mut VariationGroup,
    visitor: &VisitorIdentity,
    draw: f64,
    allocation: &AllocationEngine,
) {
    let Some(variation_id) = allocation.resolve(group, visitor, draw) else {
        return;
    };
    let Some(variation) = group.variation(&variation_id) else {
        // A resolved id pointing outside the group degrades to nothing.
        debug!(
            group = %group.id,
            variation = %variation_id,
            "resolved variation missing from group, contributes nothing"
        );
        return;
    };

    for key in variation.modifications.keys() {
        if let Some(modification) = variation.modification(key) {
            table.insert(key.clone(), modification);
        }
    }
}
