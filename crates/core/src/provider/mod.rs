//! Cost-data backends.
//!
//! Every operation authenticates lazily. A failed authentication is logged and
//! the call proceeds with whatever data the backend can still produce.

pub mod aws;
pub mod azure;
pub mod feed;
pub mod gcp;

use crate::domain::cost::{default_date_range, CostSnapshot, DateRange};
use crate::domain::inventory::{
    ProviderRecommendation, ResourceRecord, RightsizingOpportunity, UnusedResource,
};
use std::sync::atomic::{AtomicBool, Ordering};

pub use aws::{AwsConfig, AwsProvider};
pub use azure::{AzureConfig, AzureProvider};
pub use feed::HttpCostFeedProvider;
pub use gcp::{GcpConfig, GcpProvider};

#[async_trait::async_trait]
pub trait CloudProvider: Send + Sync {
    /// Backend id stamped on snapshots ("aws", "azure", ...).
    fn provider_name(&self) -> &str;

    async fn authenticate(&self) -> bool;

    /// `None` means the trailing 30-day window ending today.
    async fn get_cost_data(&self, range: Option<DateRange>) -> anyhow::Result<CostSnapshot>;

    async fn get_resource_inventory(&self) -> anyhow::Result<Vec<ResourceRecord>>;

    async fn get_recommendations(&self) -> anyhow::Result<Vec<ProviderRecommendation>>;

    async fn get_rightsizing_opportunities(&self) -> anyhow::Result<Vec<RightsizingOpportunity>>;

    async fn get_unused_resources(&self) -> anyhow::Result<Vec<UnusedResource>>;
}

/// Authentication flag shared by backends; set once a login succeeds.
#[derive(Debug, Default)]
pub struct AuthState {
    authenticated: AtomicBool,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    pub fn record(&self, success: bool) -> bool {
        if success {
            self.authenticated.store(true, Ordering::Release);
        }
        success
    }
}

/// No-op after the first successful login.
pub async fn ensure_authenticated<P>(provider: &P, state: &AuthState)
where
    P: CloudProvider + ?Sized,
{
    if state.is_authenticated() {
        return;
    }
    if !provider.authenticate().await {
        tracing::warn!(
            provider = provider.provider_name(),
            "authentication failed; continuing with available data"
        );
    }
}

pub fn resolve_range(range: Option<DateRange>) -> DateRange {
    range.unwrap_or_else(|| default_date_range(chrono::Utc::now().date_naive()))
}
