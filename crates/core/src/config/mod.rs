pub mod file;

use anyhow::Context;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::agent::AgentOptions;
use crate::strategy::{CostStrategyConfig, DEFAULT_MIN_SAVINGS_THRESHOLD};

pub use file::ConfigFile;

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub sentry_dsn: Option<String>,
    pub org_name: Option<String>,
    pub min_savings_threshold: Option<f64>,
    pub call_timeout_secs: Option<u64>,

    pub aws_region: Option<String>,
    pub aws_profile: Option<String>,
    pub azure_subscription_id: Option<String>,
    pub azure_tenant_id: Option<String>,
    pub gcp_project_id: Option<String>,
    pub gcp_credentials_path: Option<String>,
    pub cost_feed_base_url: Option<String>,
    pub cost_feed_api_key: Option<String>,

    pub anthropic_api_key: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_channel: Option<String>,
    pub notify_webhook_url: Option<String>,

    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: Option<bool>,
    pub email_from: Option<String>,
    pub email_to: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Environment first; keys it leaves unset come from the config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = ConfigFile::load(path)?;
        Ok(Self::from_env()?.layered_over(&file))
    }

    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            sentry_dsn: var("SENTRY_DSN"),
            org_name: var("ORG_NAME"),
            min_savings_threshold: parse_var(&var, "MIN_SAVINGS_THRESHOLD")?,
            call_timeout_secs: parse_var(&var, "AGENT_CALL_TIMEOUT_SECS")?,
            aws_region: var("AWS_REGION"),
            aws_profile: var("AWS_PROFILE"),
            azure_subscription_id: var("AZURE_SUBSCRIPTION_ID"),
            azure_tenant_id: var("AZURE_TENANT_ID"),
            gcp_project_id: var("GCP_PROJECT_ID"),
            gcp_credentials_path: var("GCP_CREDENTIALS_PATH"),
            cost_feed_base_url: var("COST_FEED_BASE_URL"),
            cost_feed_api_key: var("COST_FEED_API_KEY"),
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            slack_bot_token: var("SLACK_BOT_TOKEN"),
            slack_channel: var("SLACK_CHANNEL"),
            notify_webhook_url: var("NOTIFY_WEBHOOK_URL"),
            smtp_host: var("SMTP_HOST"),
            smtp_port: parse_var(&var, "SMTP_PORT")?,
            smtp_username: var("SMTP_USERNAME"),
            smtp_password: var("SMTP_PASSWORD"),
            smtp_tls: parse_flag(&var, "SMTP_TLS")?,
            email_from: var("EMAIL_FROM"),
            email_to: var("EMAIL_TO"),
        })
    }

    /// Fills every key that is still unset from `file`.
    pub fn layered_over(mut self, file: &ConfigFile) -> Self {
        fill(&mut self.org_name, &file.org_name);

        let providers = &file.providers;
        if let Some(aws) = &providers.aws {
            fill(&mut self.aws_region, &aws.region);
            fill(&mut self.aws_profile, &aws.profile);
        }
        if let Some(azure) = &providers.azure {
            fill(&mut self.azure_subscription_id, &azure.subscription_id);
            fill(&mut self.azure_tenant_id, &azure.tenant_id);
        }
        if let Some(gcp) = &providers.gcp {
            fill(&mut self.gcp_project_id, &gcp.project_id);
            fill(&mut self.gcp_credentials_path, &gcp.credentials_path);
        }

        let optimization = &file.optimization;
        self.min_savings_threshold = self
            .min_savings_threshold
            .or(optimization.thresholds.min_savings_threshold);
        self.call_timeout_secs = self.call_timeout_secs.or(optimization.call_timeout_secs);
        self
    }

    pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
        self.anthropic_api_key
            .as_deref()
            .context("ANTHROPIC_API_KEY is required")
    }

    pub fn require_cost_feed_base_url(&self) -> anyhow::Result<&str> {
        self.cost_feed_base_url
            .as_deref()
            .context("COST_FEED_BASE_URL is required")
    }

    pub fn require_notify_webhook_url(&self) -> anyhow::Result<&str> {
        self.notify_webhook_url
            .as_deref()
            .context("NOTIFY_WEBHOOK_URL is required")
    }

    pub fn org_name(&self) -> &str {
        self.org_name.as_deref().unwrap_or_default()
    }

    pub fn strategy_config(&self) -> CostStrategyConfig {
        CostStrategyConfig {
            min_savings_threshold: self
                .min_savings_threshold
                .unwrap_or(DEFAULT_MIN_SAVINGS_THRESHOLD),
        }
    }

    pub fn agent_options(&self) -> AgentOptions {
        AgentOptions {
            call_timeout: self
                .call_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

fn fill(slot: &mut Option<String>, value: &Option<String>) {
    if slot.is_none() {
        *slot = value.clone().filter(|v| !v.trim().is_empty());
    }
}

fn parse_var<T>(var: impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a number, got {raw:?}"))
        })
        .transpose()
}

fn parse_flag(var: impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<bool>> {
    var(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow::anyhow!("{key} must be a boolean, got {raw:?}")),
        })
        .transpose()
}
