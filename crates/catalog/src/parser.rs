//! Resilient catalog parsing.
//!
//! Recursive descent where every level returns an `Option`: a malformed
//! sub-object is logged and skipped, its siblings parse on. Zero valid
//! campaigns is a valid empty catalog. The only fatal case is a payload
//! with no recognizable campaigns container at all; failing that sync
//! leaves the caller's previous table untouched.

use crate::payload::{CampaignPayload, TargetingPayload, VariationGroupPayload, VariationPayload};
use crate::types::{Campaign, Catalog, Variation, VariationGroup, DEFAULT_ALLOCATION};
use chrono::Utc;
use flagkit_core::{FlagError, FlagResult, FlagValue};
use flagkit_targeting::{Targeting, TargetingGroups, TargetingList};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Parse a catalog payload: either a bare array of campaign objects or an
/// object with a `campaigns` array.
pub fn parse_catalog(payload: &Value) -> FlagResult<Catalog> {
    let entries = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("campaigns") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => {
                return Err(FlagError::Parse(format!(
                    "'campaigns' is {}, expected an array",
                    json_kind(other)
                )))
            }
            None => return Err(FlagError::Parse("payload has no 'campaigns' field".to_string())),
        },
        other => {
            return Err(FlagError::Parse(format!(
                "catalog payload is {}, expected an object or array",
                json_kind(other)
            )))
        }
    };

    let campaigns: Vec<Campaign> = entries.iter().filter_map(parse_campaign).collect();
    debug!(
        received = entries.len(),
        parsed = campaigns.len(),
        "catalog parsed"
    );
    Ok(Catalog {
        campaigns,
        fetched_at: Utc::now(),
    })
}

fn parse_campaign(value: &Value) -> Option<Campaign> {
    let payload: CampaignPayload = match serde_json::from_value(value.clone()) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "malformed campaign skipped");
            return None;
        }
    };

    let variation_groups = payload
        .variation_groups
        .iter()
        .filter_map(|group| parse_group(&payload.id, group))
        .collect();

    Some(Campaign {
        id: payload.id,
        variation_groups,
    })
}

fn parse_group(campaign_id: &str, value: &Value) -> Option<VariationGroup> {
    let payload: VariationGroupPayload = match serde_json::from_value(value.clone()) {
        Ok(p) => p,
        Err(err) => {
            warn!(campaign = %campaign_id, error = %err, "malformed variation group skipped");
            return None;
        }
    };

    // A present-but-unparseable targeting node drops the group: its
    // eligibility cannot be established, so it must not run.
    let targeting = match &payload.targeting {
        None | Some(Value::Null) => None,
        Some(node) => match parse_targeting(&payload.id, node) {
            Some(tree) => Some(tree),
            None => return None,
        },
    };

    // Shape detection: singular "variation" = pre-resolved by the server,
    // "variations" array = allocated client-side.
    let (variations, resolved_variation_id) = if let Some(node) = &payload.variation {
        match parse_variation(&payload.id, node, true) {
            Some(variation) => {
                let id = variation.id.clone();
                (vec![variation], Some(id))
            }
            None => {
                warn!(group = %payload.id, "pre-resolved variation malformed, group skipped");
                return None;
            }
        }
    } else if let Some(nodes) = &payload.variations {
        let parsed: Vec<Variation> = nodes
            .iter()
            .filter_map(|node| parse_variation(&payload.id, node, false))
            .collect();
        (parsed, None)
    } else {
        warn!(group = %payload.id, "variation group carries neither 'variation' nor 'variations', skipped");
        return None;
    };

    Some(VariationGroup {
        id: payload.id,
        campaign_id: campaign_id.to_string(),
        targeting,
        variations,
        resolved_variation_id,
    })
}

fn parse_variation(group_id: &str, value: &Value, selected: bool) -> Option<Variation> {
    let payload: VariationPayload = match serde_json::from_value(value.clone()) {
        Ok(p) => p,
        Err(err) => {
            warn!(group = %group_id, error = %err, "malformed variation skipped");
            return None;
        }
    };

    let modifications = payload
        .modifications
        .as_ref()
        .map(|node| parse_modifications(&payload.id, node))
        .unwrap_or_default();

    Some(Variation {
        id: payload.id,
        group_id: group_id.to_string(),
        allocation: payload.allocation.unwrap_or(DEFAULT_ALLOCATION),
        modifications,
        selected,
    })
}

/// Parse a variation's modification block. Values outside
/// boolean/number/string are dropped with a diagnostic, never fatal.
fn parse_modifications(variation_id: &str, value: &Value) -> HashMap<String, FlagValue> {
    let Value::Object(entries) = value else {
        warn!(variation = %variation_id, "modifications block is not an object, ignored");
        return HashMap::new();
    };

    let mut modifications = HashMap::with_capacity(entries.len());
    for (key, raw) in entries {
        match serde_json::from_value::<FlagValue>(raw.clone()) {
            Ok(parsed) => {
                modifications.insert(key.clone(), parsed);
            }
            Err(_) => {
                warn!(
                    variation = %variation_id,
                    key = %key,
                    kind = json_kind(raw),
                    "modification value must be boolean, number, or string; dropped"
                );
            }
        }
    }
    modifications
}

/// Parse the 3-level rule tree. Returns `None` when any predicate is
/// malformed: a partially parsed rule would evaluate looser than written.
fn parse_targeting(group_id: &str, value: &Value) -> Option<TargetingGroups> {
    let payload: TargetingPayload = match serde_json::from_value(value.clone()) {
        Ok(p) => p,
        Err(err) => {
            warn!(group = %group_id, error = %err, "malformed targeting node, group dropped");
            return None;
        }
    };

    let mut groups = Vec::with_capacity(payload.targeting_groups.len());
    for list in payload.targeting_groups {
        if list.targetings.is_empty() {
            warn!(group = %group_id, "empty targeting list skipped");
            continue;
        }
        let mut targetings = Vec::with_capacity(list.targetings.len());
        for node in list.targetings {
            match serde_json::from_value::<Targeting>(node) {
                Ok(predicate) => targetings.push(predicate),
                Err(err) => {
                    warn!(group = %group_id, error = %err, "malformed targeting predicate, group dropped");
                    return None;
                }
            }
        }
        groups.push(TargetingList::new(targetings));
    }
    Some(TargetingGroups::new(groups))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
