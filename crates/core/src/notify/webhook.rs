use crate::config::Settings;
use crate::notify::{subject, Notifier, NotifyOptions};
use anyhow::Context;
use serde_json::{json, Map, Value};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Incoming-webhook style channel (Slack/Teams/Mattermost compatible `text`).
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build webhook http client")?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(settings.require_notify_webhook_url()?)
    }
}

fn payload(message: &str, options: &NotifyOptions) -> Value {
    let mut body = Map::new();
    for (k, v) in options {
        body.insert(k.clone(), Value::String(v.clone()));
    }
    body.insert("subject".to_string(), json!(subject(options)));
    body.insert("text".to_string(), json!(message));
    Value::Object(body)
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    fn channel_name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, message: &str, options: &NotifyOptions) -> anyhow::Result<()> {
        let res = self
            .http
            .post(&self.url)
            .json(&payload(message, options))
            .send()
            .await
            .context("webhook request failed")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("webhook HTTP {status}: {text}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_defaults_subject_and_keeps_options() {
        let mut options = NotifyOptions::new();
        options.insert("username".to_string(), "optimizer".to_string());

        let body = payload("found savings", &options);
        assert_eq!(body["text"], "found savings");
        assert_eq!(body["subject"], "Cloud Optimization Update");
        assert_eq!(body["username"], "optimizer");
    }

    #[test]
    fn payload_text_cannot_be_overridden_by_options() {
        let mut options = NotifyOptions::new();
        options.insert("text".to_string(), "spoofed".to_string());
        options.insert("subject".to_string(), "Weekly".to_string());

        let body = payload("real", &options);
        assert_eq!(body["text"], "real");
        assert_eq!(body["subject"], "Weekly");
    }
}
