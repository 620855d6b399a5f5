use crate::domain::cost::{breakdown, CostSnapshot, DateRange};
use crate::domain::inventory::{
    tags, ProviderRecommendation, ResourceRecord, RightsizingOpportunity, UnusedResource,
};
use crate::provider::{ensure_authenticated, resolve_range, AuthState, CloudProvider};

pub const PROVIDER_ID: &str = "gcp";

const INSTANCE_1: &str = "projects/my-project/zones/us-central1-a/instances/instance-1";

#[derive(Debug, Clone, Default)]
pub struct GcpConfig {
    pub project_id: Option<String>,
    pub credentials_path: Option<String>,
}

/// Stub Cloud Billing backend. Login needs a project id.
#[derive(Debug, Default)]
pub struct GcpProvider {
    config: GcpConfig,
    auth: AuthState,
}

impl GcpProvider {
    pub fn new(config: GcpConfig) -> Self {
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
impl CloudProvider for GcpProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_ID
    }

    async fn authenticate(&self) -> bool {
        let Some(project_id) = self.config.project_id.as_deref() else {
            tracing::error!("failed to authenticate with GCP: no project id configured");
            return self.auth.record(false);
        };
        tracing::info!(
            %project_id,
            application_default = self.config.credentials_path.is_none(),
            "authenticating with GCP"
        );
        self.auth.record(true)
    }

    async fn get_cost_data(&self, range: Option<DateRange>) -> anyhow::Result<CostSnapshot> {
        ensure_authenticated(self, &self.auth).await;
        let range = resolve_range(range);

        Ok(CostSnapshot {
            provider: PROVIDER_ID.to_string(),
            total_cost: 875.50,
            resource_count: 32,
            period: range.period(),
            service_breakdown: breakdown([
                ("Compute Engine", 520.25),
                ("Cloud SQL", 180.75),
                ("Cloud Storage", 95.50),
                ("BigQuery", 79.00),
            ]),
            group_breakdown: breakdown([
                ("us-central1", 450.00),
                ("us-east1", 300.25),
                ("europe-west1", 125.25),
            ]),
        })
    }

    async fn get_resource_inventory(&self) -> anyhow::Result<Vec<ResourceRecord>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![
            ResourceRecord {
                resource_id: INSTANCE_1.to_string(),
                resource_type: "Compute Engine".to_string(),
                size: "n1-standard-2".to_string(),
                state: "RUNNING".to_string(),
                cost_per_hour: 0.095,
                utilization: Some(28.7),
                tags: tags([("environment", "production"), ("team", "analytics")]),
            },
            ResourceRecord {
                resource_id: "projects/my-project/instances/db-instance-1".to_string(),
                resource_type: "Cloud SQL".to_string(),
                size: "db-n1-standard-1".to_string(),
                state: "RUNNABLE".to_string(),
                cost_per_hour: 0.055,
                utilization: Some(40.3),
                tags: tags([("environment", "production"), ("service", "api")]),
            },
        ])
    }

    async fn get_recommendations(&self) -> anyhow::Result<Vec<ProviderRecommendation>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![
            ProviderRecommendation {
                kind: "rightsizing".to_string(),
                resource_id: Some(INSTANCE_1.to_string()),
                resource_type: Some("Compute Engine".to_string()),
                current_size: Some("n1-standard-2".to_string()),
                recommended_size: Some("n1-standard-1".to_string()),
                instances_count: None,
                estimated_savings: 42.75,
                confidence: 0.88,
                reason: "Sustained low CPU utilization and memory usage".to_string(),
            },
            ProviderRecommendation {
                kind: "committed_use_discount".to_string(),
                resource_id: None,
                resource_type: Some("Compute Engine".to_string()),
                current_size: None,
                recommended_size: None,
                instances_count: Some(8),
                estimated_savings: 180.50,
                confidence: 0.95,
                reason: "Consistent usage pattern over 3 months".to_string(),
            },
        ])
    }

    async fn get_rightsizing_opportunities(&self) -> anyhow::Result<Vec<RightsizingOpportunity>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![
            RightsizingOpportunity {
                resource_name: "instance-1".to_string(),
                resource_id: INSTANCE_1.to_string(),
                current_size: "n1-standard-2".to_string(),
                recommended_size: "n1-standard-1".to_string(),
                cpu_utilization: 28.7,
                memory_utilization: 32.4,
                network_utilization: 12.8,
                monthly_savings: 42.75,
                confidence_score: 0.88,
            },
            RightsizingOpportunity {
                resource_name: "analytics-worker".to_string(),
                resource_id: "projects/my-project/zones/us-central1-b/instances/analytics-worker"
                    .to_string(),
                current_size: "n1-highmem-4".to_string(),
                recommended_size: "n1-standard-4".to_string(),
                cpu_utilization: 65.2,
                memory_utilization: 35.1,
                network_utilization: 22.5,
                monthly_savings: 85.20,
                confidence_score: 0.82,
            },
        ])
    }

    async fn get_unused_resources(&self) -> anyhow::Result<Vec<UnusedResource>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![
            UnusedResource {
                resource_id: "projects/my-project/zones/us-central1-a/disks/disk-unused-1"
                    .to_string(),
                resource_type: "Persistent Disk".to_string(),
                size_gb: Some(200),
                status: "unattached".to_string(),
                monthly_cost: 34.00,
                recommendation: "Delete unattached persistent disk".to_string(),
            },
            UnusedResource {
                resource_id: "projects/my-project/global/addresses/address-unused-1".to_string(),
                resource_type: "Static IP".to_string(),
                size_gb: None,
                status: "reserved".to_string(),
                monthly_cost: 7.30,
                recommendation: "Release unused static IP address".to_string(),
            },
            UnusedResource {
                resource_id: "projects/my-project/global/images/old-image-20230101".to_string(),
                resource_type: "Compute Image".to_string(),
                size_gb: Some(10),
                status: "available".to_string(),
                monthly_cost: 2.50,
                recommendation: "Delete old custom image".to_string(),
            },
        ])
    }
}
