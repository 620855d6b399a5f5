use crate::config::Settings;
use crate::domain::cost::{CostSnapshot, DateRange};
use crate::domain::inventory::{
    ProviderRecommendation, ResourceRecord, RightsizingOpportunity, UnusedResource,
};
use crate::provider::{resolve_range, CloudProvider};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

pub const PROVIDER_ID: &str = "feed";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/cost_snapshot";
const DEFAULT_RETRIES: u32 = 3;
const MAX_RETRIES: u32 = 10;
// Backoff stops growing at 2^5 = 32s.
const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Pulls a pre-aggregated `CostSnapshot` document from an HTTP JSON feed
/// (a billing export, a FinOps warehouse endpoint, ...).
#[derive(Debug, Clone)]
pub struct HttpCostFeedProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpCostFeedProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_cost_feed_base_url()?.to_string();
        let api_key = settings.cost_feed_api_key.clone();

        let timeout_secs = std::env::var("COST_FEED_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("COST_FEED_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("COST_FEED_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build cost feed http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries: retries.clamp(1, MAX_RETRIES),
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, range: DateRange) -> Result<CostSnapshot> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[
                ("start_date", range.start.to_string()),
                ("end_date", range.end.to_string()),
            ])
            .send()
            .await
            .context("cost feed request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read cost feed response")?;
        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("cost feed response is not valid JSON: {text}"))?;

        if !status.is_success() {
            anyhow::bail!("cost feed HTTP {status}: {raw_json}");
        }

        parse_snapshot(raw_json, range)
    }
}

fn backoff_after(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    Duration::from_secs(1u64 << exponent)
}

fn parse_snapshot(raw_json: Value, range: DateRange) -> Result<CostSnapshot> {
    let mut snapshot = serde_json::from_value::<CostSnapshot>(raw_json)
        .context("failed to parse cost feed response into CostSnapshot")?;
    snapshot.validate()?;
    if snapshot.period.trim().is_empty() {
        snapshot.period = range.period();
    }
    Ok(snapshot)
}

#[async_trait::async_trait]
impl CloudProvider for HttpCostFeedProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_ID
    }

    /// The feed authenticates per request via the api key header.
    async fn authenticate(&self) -> bool {
        true
    }

    async fn get_cost_data(&self, range: Option<DateRange>) -> Result<CostSnapshot> {
        let range = resolve_range(range);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(range).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = backoff_after(attempt);
                    tracing::warn!(attempt, ?backoff, error = %err, "cost feed fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn get_resource_inventory(&self) -> Result<Vec<ResourceRecord>> {
        Ok(Vec::new())
    }

    async fn get_recommendations(&self) -> Result<Vec<ProviderRecommendation>> {
        Ok(Vec::new())
    }

    async fn get_rightsizing_opportunities(&self) -> Result<Vec<RightsizingOpportunity>> {
        Ok(Vec::new())
    }

    async fn get_unused_resources(&self) -> Result<Vec<UnusedResource>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn range() -> DateRange {
        DateRange::parse("2026-01-01", "2026-01-31").unwrap()
    }

    #[test]
    fn parses_feed_document_and_fills_period() {
        let v = json!({
            "provider": "aws",
            "total_cost": 420.0,
            "resource_count": 12,
            "period": "",
            "service_breakdown": {"EC2": 400.0, "S3": 20.0},
        });

        let snapshot = parse_snapshot(v, range()).unwrap();
        assert_eq!(snapshot.provider, "aws");
        assert_eq!(snapshot.period, "2026-01-01 to 2026-01-31");
        assert_eq!(snapshot.service_breakdown.get("EC2").copied(), Some(400.0));
        assert!(snapshot.group_breakdown.is_empty());
    }

    #[test]
    fn backoff_doubles_then_plateaus() {
        assert_eq!(backoff_after(1), Duration::from_secs(1));
        assert_eq!(backoff_after(2), Duration::from_secs(2));
        assert_eq!(backoff_after(6), Duration::from_secs(32));
        assert_eq!(backoff_after(65), Duration::from_secs(32));
        assert_eq!(backoff_after(u32::MAX), Duration::from_secs(32));
    }

    #[test]
    fn rejects_negative_totals_and_wrong_types() {
        let negative = json!({
            "provider": "aws",
            "total_cost": -5.0,
            "resource_count": 1,
            "period": "x",
        });
        assert!(parse_snapshot(negative, range()).is_err());

        let stringly = json!({
            "provider": "aws",
            "total_cost": "12.0",
            "resource_count": 1,
            "period": "x",
        });
        assert!(parse_snapshot(stringly, range()).is_err());
    }
}
