//! Wire-shape view structs, kept separate from the domain types.
//!
//! The parser deserializes one node at a time so a malformed sub-object is
//! skipped without failing its siblings; fields that hold child collections
//! stay `serde_json::Value` for the recursive descent to pick apart.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct CampaignPayload {
    pub id: String,
    #[serde(default)]
    pub variation_groups: Vec<Value>,
}

/// Group shape is detected by field presence: a singular `variation` object
/// means the server pre-resolved the group; a `variations` array means the
/// client allocates.
#[derive(Debug, Deserialize)]
pub struct VariationGroupPayload {
    pub id: String,
    #[serde(default)]
    pub targeting: Option<Value>,
    #[serde(default)]
    pub variation: Option<Value>,
    #[serde(default)]
    pub variations: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct VariationPayload {
    pub id: String,
    #[serde(default)]
    pub allocation: Option<u32>,
    #[serde(default)]
    pub modifications: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct TargetingPayload {
    #[serde(default)]
    pub targeting_groups: Vec<TargetingListPayload>,
}

#[derive(Debug, Deserialize)]
pub struct TargetingListPayload {
    #[serde(default)]
    pub targetings: Vec<Value>,
}
