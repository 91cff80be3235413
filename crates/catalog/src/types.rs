//! Catalog domain types: Campaign → VariationGroup → Variation → Modification.
//!
//! Campaigns and variations are held in vectors because their order is
//! load-bearing: group order is the resolver's priority list, variation
//! order drives the weighted allocation walk.

use chrono::{DateTime, Utc};
use flagkit_core::FlagValue;
use flagkit_targeting::TargetingGroups;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Allocation weight meaning "always", used when the wire omits one.
pub const DEFAULT_ALLOCATION: u32 = 100;

/// A parsed campaign catalog. Immutable between syncs and replaced
/// wholesale on each successful sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub campaigns: Vec<Campaign>,
    pub fetched_at: DateTime<Utc>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            campaigns: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }
}

/// A named experiment: an ordered list of variation groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub variation_groups: Vec<VariationGroup>,
}

impl Campaign {
    pub fn group(&self, id: &str) -> Option<&VariationGroup> {
        self.variation_groups.iter().find(|g| g.id == id)
    }
}

/// The unit of traffic allocation and targeting within a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationGroup {
    pub id: String,
    pub campaign_id: String,
    /// Eligibility rule for client-side decisioning. `None` never satisfies;
    /// "always eligible" groups arrive in the pre-resolved shape instead.
    pub targeting: Option<TargetingGroups>,
    pub variations: Vec<Variation>,
    /// Set when the server already allocated, or once client-side
    /// allocation has run for this sync.
    pub resolved_variation_id: Option<String>,
}

impl VariationGroup {
    pub fn variation(&self, id: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id == id)
    }

    pub fn has_variation(&self, id: &str) -> bool {
        self.variations.iter().any(|v| v.id == id)
    }

    /// Invariant: at most one variation is selected at a time.
    pub fn mark_selected(&mut self, variation_id: &str) {
        for variation in &mut self.variations {
            variation.selected = variation.id == variation_id;
        }
    }
}

/// One arm of a variation group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variation {
    pub id: String,
    /// Non-owning back-reference for traceability.
    pub group_id: String,
    /// Allocation weight, 0–100.
    pub allocation: u32,
    pub modifications: HashMap<String, FlagValue>,
    pub selected: bool,
}

impl Variation {
    /// Attribute one of this variation's flag values to its origin.
    pub fn modification(&self, key: &str) -> Option<Modification> {
        self.modifications.get(key).map(|value| Modification {
            key: key.to_string(),
            variation_group_id: self.group_id.clone(),
            variation_id: self.id.clone(),
            value: value.clone(),
        })
    }
}

/// A flag key/value pair attributed to the variation that produced it.
/// The externally visible unit: the active table maps flag key → Modification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub key: String,
    pub variation_group_id: String,
    pub variation_id: String,
    pub value: FlagValue,
}
