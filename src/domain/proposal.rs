use serde::{Deserialize, Serialize};

/// An advertised connection offer from a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalItem {
    pub provider_id: String,
    pub service_type: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub ip_type: String,
    #[serde(default)]
    pub quality_level: u8,
    #[serde(default)]
    pub price_per_gib: f64,
    #[serde(default)]
    pub price_per_hour: f64,
}

/// Wire shape of the engine's proposal payload.
///
/// The engine serializes `proposals` as null when it has nothing cached, so
/// the field stays optional; absence of proposals is not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalsResponse {
    #[serde(default)]
    pub proposals: Option<Vec<ProposalItem>>,
}

/// Proposal query options. `filter_id` selects a saved filter preset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetProposalsRequest {
    pub refresh: bool,
    pub filter_id: Option<i64>,
    pub service_type: Option<String>,
    pub quality_min: Option<f64>,
}
