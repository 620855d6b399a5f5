use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNKNOWN_RESOURCE_TYPE: &str = "unknown";

/// Aggregate outcome of one `optimize(provider, strategy)` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub provider: String,
    pub resource_type: String,
    pub current_cost: f64,
    pub optimized_cost: f64,
    pub savings: f64,
    pub recommendations: Vec<String>,
    pub confidence_score: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProactiveCycleOutcome {
    pub summary: String,
    #[serde(rename = "notify")]
    pub notify_status: BTreeMap<String, bool>,
    pub count: usize,
}

/// Caller-supplied organisation details forwarded to the summarizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgContext {
    #[serde(default)]
    pub name: String,
}

impl OrgContext {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
