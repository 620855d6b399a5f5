use crate::domain::cost::CostSnapshot;
use crate::strategy::{
    OptimizationStrategy, Priority, Recommendation, RecommendationKind, StrategyOutput,
};

pub const STRATEGY_NAME: &str = "cost_optimization";
pub const DEFAULT_MIN_SAVINGS_THRESHOLD: f64 = 10.0;

const RESOURCE_TYPE: &str = "multi-service";

// Fixed-threshold rules on total cost.
const RIGHTSIZING_MIN_COST: f64 = 500.0;
const UNUSED_MIN_COST: f64 = 200.0;
const UNUSED_SAVINGS_CAP: f64 = 150.0;
const RESERVATION_MIN_COST: f64 = 800.0;
const STORAGE_MIN_COST: f64 = 300.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CostStrategyConfig {
    /// Candidates saving less than this are dropped.
    pub min_savings_threshold: f64,
}

impl Default for CostStrategyConfig {
    fn default() -> Self {
        Self {
            min_savings_threshold: DEFAULT_MIN_SAVINGS_THRESHOLD,
        }
    }
}

/// Rightsizing, unused resources, reservations, storage tiering, plus one
/// provider-specific discount for the known backends.
#[derive(Debug, Clone, Default)]
pub struct CostOptimizationStrategy {
    config: CostStrategyConfig,
}

impl CostOptimizationStrategy {
    pub fn new(config: CostStrategyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CostStrategyConfig {
        &self.config
    }

    fn generate_recommendations(&self, snapshot: &CostSnapshot) -> Vec<Recommendation> {
        let total_cost = snapshot.total_cost;
        let mut candidates = Vec::new();

        if total_cost > RIGHTSIZING_MIN_COST {
            candidates.push(Recommendation {
                kind: RecommendationKind::Rightsizing,
                description: "Rightsize overprovisioned instances to save ~15% of compute costs"
                    .to_string(),
                savings: total_cost * 0.15,
                confidence: 0.8,
                priority: Priority::High,
            });
        }

        if total_cost > UNUSED_MIN_COST {
            candidates.push(Recommendation {
                kind: RecommendationKind::UnusedResources,
                description: "Remove unused storage volumes, snapshots, and IP addresses"
                    .to_string(),
                savings: (total_cost * 0.08).min(UNUSED_SAVINGS_CAP),
                confidence: 0.9,
                priority: Priority::Medium,
            });
        }

        if total_cost > RESERVATION_MIN_COST {
            candidates.push(Recommendation {
                kind: RecommendationKind::Reservations,
                description: "Purchase reserved instances or committed use discounts for consistent workloads"
                    .to_string(),
                savings: total_cost * 0.25,
                confidence: 0.7,
                priority: Priority::Low,
            });
        }

        if total_cost > STORAGE_MIN_COST {
            candidates.push(Recommendation {
                kind: RecommendationKind::StorageOptimization,
                description: "Optimize storage classes and implement lifecycle policies".to_string(),
                savings: total_cost * 0.05,
                confidence: 0.75,
                priority: Priority::Medium,
            });
        }

        candidates.extend(provider_specific(snapshot));

        candidates
            .into_iter()
            .filter(|rec| rec.savings >= self.config.min_savings_threshold)
            .collect()
    }
}

fn provider_specific(snapshot: &CostSnapshot) -> Option<Recommendation> {
    let total_cost = snapshot.total_cost;
    let rec = match snapshot.provider.as_str() {
        "aws" => Recommendation {
            kind: RecommendationKind::SpotInstances,
            description: "Use Spot Instances for fault-tolerant workloads (up to 90% savings)"
                .to_string(),
            savings: total_cost * 0.30,
            confidence: 0.6,
            priority: Priority::Medium,
        },
        "azure" => Recommendation {
            kind: RecommendationKind::HybridBenefit,
            description: "Apply Azure Hybrid Benefit for Windows Server and SQL Server licenses"
                .to_string(),
            savings: total_cost * 0.40,
            confidence: 0.8,
            priority: Priority::High,
        },
        "gcp" => Recommendation {
            kind: RecommendationKind::PreemptibleInstances,
            description: "Use Preemptible VMs for batch processing and fault-tolerant workloads"
                .to_string(),
            savings: total_cost * 0.35,
            confidence: 0.65,
            priority: Priority::Medium,
        },
        _ => return None,
    };
    Some(rec)
}

impl OptimizationStrategy for CostOptimizationStrategy {
    fn strategy_name(&self) -> &str {
        STRATEGY_NAME
    }

    fn optimize(&self, snapshot: &CostSnapshot) -> StrategyOutput {
        tracing::debug!(provider = %snapshot.provider, "applying cost optimization strategy");

        let total_cost = snapshot.total_cost;
        let detailed = self.generate_recommendations(snapshot);
        let savings: f64 = detailed.iter().map(|rec| rec.savings).sum();

        StrategyOutput {
            resource_type: Some(RESOURCE_TYPE.to_string()),
            current_cost: total_cost,
            optimized_cost: (total_cost - savings).max(0.0),
            savings,
            recommendations: detailed.iter().map(|rec| rec.description.clone()).collect(),
            confidence_score: self.calculate_confidence(snapshot),
            detailed_recommendations: detailed,
        }
    }

    /// Data-quality heuristic; independent of the candidate list.
    fn calculate_confidence(&self, snapshot: &CostSnapshot) -> f64 {
        let mut score = 0.0;

        if snapshot.total_cost > 0.0 {
            score += 0.3;
        }

        if snapshot.resource_count > 10 {
            score += 0.2;
        } else if snapshot.resource_count > 0 {
            score += 0.1;
        }

        if snapshot.has_service_breakdown() {
            score += 0.2;
        }

        if snapshot.has_group_breakdown() {
            score += 0.15;
        }

        // Assumed historical context.
        score += 0.15;

        f64::min(score, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cost::breakdown;
    use std::collections::BTreeMap;

    fn snapshot(provider: &str, total_cost: f64, resource_count: u64) -> CostSnapshot {
        CostSnapshot {
            provider: provider.to_string(),
            total_cost,
            resource_count,
            period: "2026-01-01 to 2026-01-31".to_string(),
            service_breakdown: BTreeMap::new(),
            group_breakdown: BTreeMap::new(),
        }
    }

    fn savings_of(output: &StrategyOutput, kind: RecommendationKind) -> Option<f64> {
        output
            .detailed_recommendations
            .iter()
            .find(|rec| rec.kind == kind)
            .map(|rec| rec.savings)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn rich_aws_snapshot_yields_every_candidate() {
        let mut snap = snapshot("aws", 1000.0, 50);
        snap.service_breakdown = breakdown([("EC2", 700.0), ("S3", 300.0)]);
        snap.group_breakdown = breakdown([("us-east-1", 1000.0)]);

        let out = CostOptimizationStrategy::default().optimize(&snap);

        assert_eq!(out.detailed_recommendations.len(), 5);
        assert!(approx(savings_of(&out, RecommendationKind::Rightsizing).unwrap(), 150.0));
        assert!(approx(savings_of(&out, RecommendationKind::UnusedResources).unwrap(), 80.0));
        assert!(approx(savings_of(&out, RecommendationKind::Reservations).unwrap(), 250.0));
        assert!(approx(savings_of(&out, RecommendationKind::StorageOptimization).unwrap(), 50.0));
        assert!(approx(savings_of(&out, RecommendationKind::SpotInstances).unwrap(), 300.0));
        assert!(approx(out.savings, 830.0));
        assert!(approx(out.optimized_cost, 170.0));
        assert!(approx(out.confidence_score, 1.0));
        assert_eq!(out.resource_type.as_deref(), Some("multi-service"));
        assert_eq!(out.recommendations.len(), 5);
    }

    #[test]
    fn low_cost_unknown_provider_yields_nothing() {
        let out = CostOptimizationStrategy::default().optimize(&snapshot("onprem", 100.0, 2));
        assert!(out.recommendations.is_empty());
        assert_eq!(out.savings, 0.0);
        assert_eq!(out.optimized_cost, 100.0);
    }

    #[test]
    fn unused_resource_savings_are_capped() {
        let out = CostOptimizationStrategy::default().optimize(&snapshot("onprem", 5000.0, 1));
        assert!(approx(savings_of(&out, RecommendationKind::UnusedResources).unwrap(), 150.0));
    }

    #[test]
    fn provider_bonus_matches_backend() {
        let strategy = CostOptimizationStrategy::default();

        let azure = strategy.optimize(&snapshot("azure", 100.0, 1));
        assert!(approx(savings_of(&azure, RecommendationKind::HybridBenefit).unwrap(), 40.0));
        assert_eq!(azure.detailed_recommendations.len(), 1);

        let gcp = strategy.optimize(&snapshot("gcp", 100.0, 1));
        assert!(approx(savings_of(&gcp, RecommendationKind::PreemptibleInstances).unwrap(), 35.0));
    }

    #[test]
    fn threshold_drops_small_candidates() {
        // 250 triggers unused resources (20.0) and, for aws, spot (75.0).
        let strategy = CostOptimizationStrategy::new(CostStrategyConfig {
            min_savings_threshold: 50.0,
        });
        let out = strategy.optimize(&snapshot("aws", 250.0, 5));
        assert_eq!(out.detailed_recommendations.len(), 1);
        assert_eq!(out.detailed_recommendations[0].kind, RecommendationKind::SpotInstances);

        // Spot would save 9.0, under the default threshold.
        let out = CostOptimizationStrategy::default().optimize(&snapshot("aws", 30.0, 5));
        assert!(out.detailed_recommendations.is_empty());
        assert_eq!(out.savings, 0.0);
    }

    #[test]
    fn confidence_weights_by_data_quality() {
        let strategy = CostOptimizationStrategy::default();

        // Only the constant historical factor.
        assert!(approx(strategy.calculate_confidence(&snapshot("aws", 0.0, 0)), 0.15));
        // Cost + few resources.
        assert!(approx(strategy.calculate_confidence(&snapshot("aws", 10.0, 3)), 0.55));
        // Cost + many resources.
        assert!(approx(strategy.calculate_confidence(&snapshot("aws", 10.0, 11)), 0.65));

        let mut snap = snapshot("azure", 10.0, 11);
        snap.group_breakdown = breakdown([("rg-production", 10.0)]);
        assert!(approx(strategy.calculate_confidence(&snap), 0.8));
    }

    #[test]
    fn optimize_leaves_input_untouched() {
        let snap = snapshot("gcp", 900.0, 20);
        let before = snap.clone();
        let _ = CostOptimizationStrategy::default().optimize(&snap);
        assert_eq!(snap, before);
    }
}
