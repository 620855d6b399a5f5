use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub resource_id: String,
    pub resource_type: String,
    /// Instance type, VM size, machine type or service tier.
    pub size: String,
    pub state: String,
    pub cost_per_hour: f64,
    pub utilization: Option<f64>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecommendation {
    pub kind: String,
    pub resource_id: Option<String>,
    pub resource_type: Option<String>,
    pub current_size: Option<String>,
    pub recommended_size: Option<String>,
    pub instances_count: Option<u32>,
    pub estimated_savings: f64,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RightsizingOpportunity {
    pub resource_name: String,
    pub resource_id: String,
    pub current_size: String,
    pub recommended_size: String,
    pub cpu_utilization: f64,
    pub memory_utilization: f64,
    pub network_utilization: f64,
    pub monthly_savings: f64,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusedResource {
    pub resource_id: String,
    pub resource_type: String,
    pub size_gb: Option<u32>,
    pub status: String,
    pub monthly_cost: f64,
    pub recommendation: String,
}

pub(crate) fn tags<const N: usize>(entries: [(&str, &str); N]) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
