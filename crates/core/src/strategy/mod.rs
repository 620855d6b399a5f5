//! Pure optimization strategies: cost data in, recommendations and a
//! confidence score out.

pub mod cost;

use crate::domain::cost::CostSnapshot;
use std::fmt;

pub use cost::{
    CostOptimizationStrategy, CostStrategyConfig, DEFAULT_MIN_SAVINGS_THRESHOLD, STRATEGY_NAME,
};

/// A strategy must not mutate its input and must be callable concurrently
/// with disjoint snapshots.
pub trait OptimizationStrategy: Send + Sync {
    fn strategy_name(&self) -> &str;

    fn optimize(&self, snapshot: &CostSnapshot) -> StrategyOutput;

    fn calculate_confidence(&self, snapshot: &CostSnapshot) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutput {
    /// `None` or empty is reported as "unknown" by the agent.
    pub resource_type: Option<String>,
    pub current_cost: f64,
    pub optimized_cost: f64,
    pub savings: f64,
    pub recommendations: Vec<String>,
    pub confidence_score: f64,
    pub detailed_recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub description: String,
    pub savings: f64,
    pub confidence: f64,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationKind {
    Rightsizing,
    UnusedResources,
    Reservations,
    StorageOptimization,
    SpotInstances,
    HybridBenefit,
    PreemptibleInstances,
}

impl RecommendationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rightsizing => "rightsizing",
            Self::UnusedResources => "unused_resources",
            Self::Reservations => "reservations",
            Self::StorageOptimization => "storage_optimization",
            Self::SpotInstances => "spot_instances",
            Self::HybridBenefit => "hybrid_benefit",
            Self::PreemptibleInstances => "preemptible_instances",
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}
