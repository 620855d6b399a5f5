//! Wires the stock collaborators into an agent from [`Settings`].

use crate::agent::OptimizerAgent;
use crate::config::Settings;
use crate::llm::AnthropicSummarizer;
use crate::notify::{EmailNotifier, LogNotifier, SlackNotifier, WebhookNotifier};
use crate::provider::{
    AwsConfig, AwsProvider, AzureConfig, AzureProvider, GcpConfig, GcpProvider,
    HttpCostFeedProvider,
};
use crate::strategy::{CostOptimizationStrategy, STRATEGY_NAME};
use std::sync::Arc;

pub fn default_agent(settings: &Settings) -> anyhow::Result<OptimizerAgent> {
    let mut agent = OptimizerAgent::with_options(settings.agent_options());

    let aws_defaults = AwsConfig::default();
    agent.register_provider(
        crate::provider::aws::PROVIDER_ID,
        Arc::new(AwsProvider::new(AwsConfig {
            region: settings.aws_region.clone().unwrap_or(aws_defaults.region),
            profile: settings.aws_profile.clone().unwrap_or(aws_defaults.profile),
        })),
    );
    agent.register_provider(
        crate::provider::azure::PROVIDER_ID,
        Arc::new(AzureProvider::new(AzureConfig {
            subscription_id: settings.azure_subscription_id.clone(),
            tenant_id: settings.azure_tenant_id.clone(),
        })),
    );
    agent.register_provider(
        crate::provider::gcp::PROVIDER_ID,
        Arc::new(GcpProvider::new(GcpConfig {
            project_id: settings.gcp_project_id.clone(),
            credentials_path: settings.gcp_credentials_path.clone(),
        })),
    );
    if settings.cost_feed_base_url.is_some() {
        agent.register_provider(
            crate::provider::feed::PROVIDER_ID,
            Arc::new(HttpCostFeedProvider::from_settings(settings)?),
        );
    }

    agent.register_strategy(
        STRATEGY_NAME,
        Arc::new(CostOptimizationStrategy::new(settings.strategy_config())),
    );

    agent.register_notifier("log", Arc::new(LogNotifier));
    let slack = SlackNotifier::from_settings(settings);
    if slack.is_configured() {
        agent.register_notifier("slack", Arc::new(slack));
    }
    let email = EmailNotifier::from_settings(settings);
    if email.is_configured() {
        agent.register_notifier("email", Arc::new(email));
    }
    if settings.notify_webhook_url.is_some() {
        agent.register_notifier("webhook", Arc::new(WebhookNotifier::from_settings(settings)?));
    }

    if settings.anthropic_api_key.is_some() {
        agent.register_summarizer(Arc::new(AnthropicSummarizer::from_settings(settings)?));
    }

    tracing::info!(
        providers = ?agent.provider_names(),
        strategies = ?agent.strategy_names(),
        notifiers = ?agent.notifier_names(),
        summarizer = agent.has_summarizer(),
        "optimizer agent ready"
    );
    Ok(agent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_settings_register_stub_clouds_and_log() {
        let agent = default_agent(&Settings::default()).unwrap();
        assert_eq!(agent.provider_names(), vec!["aws", "azure", "gcp"]);
        assert_eq!(agent.strategy_names(), vec!["cost_optimization"]);
        assert_eq!(agent.notifier_names(), vec!["log"]);
        assert!(!agent.has_summarizer());
        assert!(agent.options().call_timeout.is_none());
    }

    #[test]
    fn optional_collaborators_follow_settings() {
        let settings = Settings {
            cost_feed_base_url: Some("http://127.0.0.1:9".to_string()),
            slack_bot_token: Some("xoxb-test".to_string()),
            slack_channel: Some("#finops".to_string()),
            notify_webhook_url: Some("http://127.0.0.1:9/hook".to_string()),
            anthropic_api_key: Some("sk-test".to_string()),
            call_timeout_secs: Some(5),
            ..Settings::default()
        };
        let agent = default_agent(&settings).unwrap();
        assert_eq!(agent.provider_names(), vec!["aws", "azure", "gcp", "feed"]);
        assert_eq!(agent.notifier_names(), vec!["log", "slack", "webhook"]);
        assert!(agent.has_summarizer());
    }

    #[test]
    fn slack_needs_both_token_and_channel() {
        let settings = Settings {
            slack_bot_token: Some("xoxb-test".to_string()),
            ..Settings::default()
        };
        let agent = default_agent(&settings).unwrap();
        assert_eq!(agent.notifier_names(), vec!["log"]);
    }

    #[test]
    fn email_registers_only_when_fully_configured() {
        let mut settings = Settings {
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_username: Some("finops".to_string()),
            smtp_password: Some("secret".to_string()),
            email_from: Some("finops@example.com".to_string()),
            ..Settings::default()
        };
        let agent = default_agent(&settings).unwrap();
        assert_eq!(agent.notifier_names(), vec!["log"]);

        settings.email_to = Some("ops@example.com".to_string());
        let agent = default_agent(&settings).unwrap();
        assert_eq!(agent.notifier_names(), vec!["log", "email"]);
    }

    #[tokio::test]
    async fn stub_clouds_produce_recommendations() {
        let agent = default_agent(&Settings::default()).unwrap();
        let results = agent.get_recommendations(None).await;
        let providers: Vec<_> = results.iter().map(|r| r.provider.as_str()).collect();
        assert_eq!(providers, vec!["aws", "azure", "gcp"]);
        assert!(results.iter().all(|r| r.savings > 0.0));
    }
}
