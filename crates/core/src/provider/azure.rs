use crate::domain::cost::{breakdown, CostSnapshot, DateRange};
use crate::domain::inventory::{
    tags, ProviderRecommendation, ResourceRecord, RightsizingOpportunity, UnusedResource,
};
use crate::provider::{ensure_authenticated, resolve_range, AuthState, CloudProvider};

pub const PROVIDER_ID: &str = "azure";

const VM_WEB_01: &str =
    "/subscriptions/sub-id/resourceGroups/rg-prod/providers/Microsoft.Compute/virtualMachines/vm-web-01";

#[derive(Debug, Clone, Default)]
pub struct AzureConfig {
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
}

/// Stub Cost Management backend. Login needs a subscription id.
#[derive(Debug, Default)]
pub struct AzureProvider {
    config: AzureConfig,
    auth: AuthState,
}

impl AzureProvider {
    pub fn new(config: AzureConfig) -> Self {
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
impl CloudProvider for AzureProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_ID
    }

    async fn authenticate(&self) -> bool {
        let Some(subscription_id) = self.config.subscription_id.as_deref() else {
            tracing::error!("failed to authenticate with Azure: no subscription id configured");
            return self.auth.record(false);
        };
        tracing::info!(
            %subscription_id,
            tenant_id = self.config.tenant_id.as_deref().unwrap_or("-"),
            "authenticating with Azure"
        );
        self.auth.record(true)
    }

    async fn get_cost_data(&self, range: Option<DateRange>) -> anyhow::Result<CostSnapshot> {
        ensure_authenticated(self, &self.auth).await;
        let range = resolve_range(range);

        Ok(CostSnapshot {
            provider: PROVIDER_ID.to_string(),
            total_cost: 980.25,
            resource_count: 38,
            period: range.period(),
            service_breakdown: breakdown([
                ("Virtual Machines", 650.75),
                ("SQL Database", 200.50),
                ("Storage", 129.00),
            ]),
            group_breakdown: breakdown([("rg-production", 750.00), ("rg-development", 230.25)]),
        })
    }

    async fn get_resource_inventory(&self) -> anyhow::Result<Vec<ResourceRecord>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![
            ResourceRecord {
                resource_id: VM_WEB_01.to_string(),
                resource_type: "Virtual Machine".to_string(),
                size: "Standard_D2s_v3".to_string(),
                state: "running".to_string(),
                cost_per_hour: 0.096,
                utilization: Some(35.2),
                tags: tags([("Environment", "production"), ("Application", "web")]),
            },
            ResourceRecord {
                resource_id: "/subscriptions/sub-id/resourceGroups/rg-prod/providers/Microsoft.Sql/servers/sql-prod/databases/analytics-db".to_string(),
                resource_type: "SQL Database".to_string(),
                size: "S2".to_string(),
                state: "online".to_string(),
                cost_per_hour: 0.045,
                utilization: Some(28.5),
                tags: Default::default(),
            },
        ])
    }

    async fn get_recommendations(&self) -> anyhow::Result<Vec<ProviderRecommendation>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![
            ProviderRecommendation {
                kind: "rightsizing".to_string(),
                resource_id: Some(VM_WEB_01.to_string()),
                resource_type: Some("Virtual Machine".to_string()),
                current_size: Some("Standard_D2s_v3".to_string()),
                recommended_size: Some("Standard_B2s".to_string()),
                instances_count: None,
                estimated_savings: 38.40,
                confidence: 0.80,
                reason: "Consistent low CPU and memory utilization".to_string(),
            },
            ProviderRecommendation {
                kind: "reserved_instance".to_string(),
                resource_id: None,
                resource_type: Some("Virtual Machine".to_string()),
                current_size: None,
                recommended_size: None,
                instances_count: Some(5),
                estimated_savings: 156.00,
                confidence: 0.90,
                reason: "Consistent usage pattern suitable for reservations".to_string(),
            },
        ])
    }

    async fn get_rightsizing_opportunities(&self) -> anyhow::Result<Vec<RightsizingOpportunity>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![RightsizingOpportunity {
            resource_name: "vm-web-01".to_string(),
            resource_id: VM_WEB_01.to_string(),
            current_size: "Standard_D2s_v3".to_string(),
            recommended_size: "Standard_B2s".to_string(),
            cpu_utilization: 35.2,
            memory_utilization: 42.1,
            network_utilization: 18.5,
            monthly_savings: 38.40,
            confidence_score: 0.80,
        }])
    }

    async fn get_unused_resources(&self) -> anyhow::Result<Vec<UnusedResource>> {
        ensure_authenticated(self, &self.auth).await;
        Ok(vec![
            UnusedResource {
                resource_id: "/subscriptions/sub-id/resourceGroups/rg-test/providers/Microsoft.Compute/disks/disk-unused-01".to_string(),
                resource_type: "Managed Disk".to_string(),
                size_gb: Some(128),
                status: "unattached".to_string(),
                monthly_cost: 19.20,
                recommendation: "Delete unattached managed disk".to_string(),
            },
            UnusedResource {
                resource_id: "/subscriptions/sub-id/resourceGroups/rg-old/providers/Microsoft.Network/publicIPAddresses/pip-old-01".to_string(),
                resource_type: "Public IP".to_string(),
                size_gb: None,
                status: "unassigned".to_string(),
                monthly_cost: 3.60,
                recommendation: "Release unassigned public IP".to_string(),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_login_still_returns_cost_data() {
        let provider = AzureProvider::default();
        assert!(!provider.authenticate().await);

        let snapshot = provider.get_cost_data(None).await.unwrap();
        assert!(!provider.is_authenticated());
        assert_eq!(snapshot.provider, "azure");
        assert_eq!(snapshot.total_cost, 980.25);
        assert!(snapshot.group_breakdown.contains_key("rg-production"));
    }

    #[tokio::test]
    async fn configured_subscription_authenticates() {
        let provider = AzureProvider::new(AzureConfig {
            subscription_id: Some("sub-123".to_string()),
            tenant_id: None,
        });
        provider.get_unused_resources().await.unwrap();
        assert!(provider.is_authenticated());
    }
}
