use crate::domain::cost::{breakdown, CostSnapshot, DateRange};
use crate::domain::inventory::{
    tags, ProviderRecommendation, ResourceRecord, RightsizingOpportunity, UnusedResource,
};
use crate::provider::{ensure_authenticated, resolve_range, AuthState, CloudProvider};

pub const PROVIDER_ID: &str = "aws";

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub profile: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            profile: "default".to_string(),
        }
    }
}

/// Stub Cost Explorer backend with a fixed account profile.
#[derive(Debug, Default)]
pub struct AwsProvider {
    config: AwsConfig,
    auth: AuthState,
}

impl AwsProvider {
    pub fn new(config: AwsConfig) -> Self {
        Self {
            config,
            auth: AuthState::default(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }
}

#[async_trait::async_trait]
impl CloudProvider for AwsProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_ID
    }

    async fn authenticate(&self) -> bool {
        tracing::info!(
            profile = %self.config.profile,
            region = %self.config.region,
            "authenticating with AWS"
        );
        self.auth.record(true)
    }

    async fn get_cost_data(&self, range: Option<DateRange>) -> anyhow::Result<CostSnapshot> {
        ensure_authenticated(self, &self.auth).await;
        let range = resolve_range(range);

        Ok(CostSnapshot {
            provider: PROVIDER_ID.to_string(),
            total_cost: 1250.75,
            resource_count: 45,
            period: range.period(),
            service_breakdown: breakdown([("EC2", 850.50), ("RDS", 275.25), ("S3", 125.00)]),
            group_breakdown: breakdown([("us-east-1", 900.00), ("us-west-2", 350.75)]),
        })
    }

    async fn get_resource_inventory(&self) -> anyhow::Result<Vec<ResourceRecord>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![
            ResourceRecord {
                resource_id: "i-1234567890abcdef0".to_string(),
                resource_type: "EC2".to_string(),
                size: "t3.large".to_string(),
                state: "running".to_string(),
                cost_per_hour: 0.0832,
                utilization: Some(25.5),
                tags: tags([("Environment", "production"), ("Team", "data-science")]),
            },
            ResourceRecord {
                resource_id: "db-instance-1".to_string(),
                resource_type: "RDS".to_string(),
                size: "db.t3.medium".to_string(),
                state: "available".to_string(),
                cost_per_hour: 0.068,
                utilization: Some(45.2),
                tags: tags([("Environment", "production"), ("Application", "analytics")]),
            },
        ])
    }

    async fn get_recommendations(&self) -> anyhow::Result<Vec<ProviderRecommendation>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![
            ProviderRecommendation {
                kind: "rightsizing".to_string(),
                resource_id: Some("i-1234567890abcdef0".to_string()),
                resource_type: Some("EC2".to_string()),
                current_size: Some("t3.large".to_string()),
                recommended_size: Some("t3.medium".to_string()),
                instances_count: None,
                estimated_savings: 45.50,
                confidence: 0.85,
                reason: "Low CPU utilization detected over 30 days".to_string(),
            },
            ProviderRecommendation {
                kind: "unused_resource".to_string(),
                resource_id: Some("vol-0987654321fedcba0".to_string()),
                resource_type: Some("EBS Volume".to_string()),
                current_size: None,
                recommended_size: None,
                instances_count: None,
                estimated_savings: 25.00,
                confidence: 0.95,
                reason: "Unattached EBS volume".to_string(),
            },
        ])
    }

    async fn get_rightsizing_opportunities(&self) -> anyhow::Result<Vec<RightsizingOpportunity>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![RightsizingOpportunity {
            resource_name: "i-1234567890abcdef0".to_string(),
            resource_id: "i-1234567890abcdef0".to_string(),
            current_size: "t3.large".to_string(),
            recommended_size: "t3.medium".to_string(),
            cpu_utilization: 25.5,
            memory_utilization: 30.2,
            network_utilization: 15.1,
            monthly_savings: 45.50,
            confidence_score: 0.85,
        }])
    }

    async fn get_unused_resources(&self) -> anyhow::Result<Vec<UnusedResource>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![
            UnusedResource {
                resource_id: "vol-0987654321fedcba0".to_string(),
                resource_type: "EBS Volume".to_string(),
                size_gb: Some(100),
                status: "available".to_string(),
                monthly_cost: 25.00,
                recommendation: "Delete unused volume".to_string(),
            },
            UnusedResource {
                resource_id: "ami-0123456789abcdef0".to_string(),
                resource_type: "AMI".to_string(),
                size_gb: Some(8),
                status: "available".to_string(),
                monthly_cost: 5.00,
                recommendation: "Consider deregistering old AMI".to_string(),
            },
        ])
    }
}
