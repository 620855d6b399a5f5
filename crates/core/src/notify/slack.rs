use crate::config::Settings;
use crate::notify::{Notifier, NotifyOptions};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;

const DEFAULT_BASE_URL: &str = "https://slack.com/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Posts through the Slack Web API `chat.postMessage`.
#[derive(Debug)]
pub struct SlackNotifier {
    token: Option<String>,
    channel: Option<String>,
    base_url: String,

    // Built on first send and reused afterwards.
    http: OnceCell<reqwest::Client>,
}

impl SlackNotifier {
    pub fn new(token: Option<String>, channel: Option<String>) -> Self {
        Self {
            token,
            channel,
            base_url: std::env::var("SLACK_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            http: OnceCell::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.slack_bot_token.clone(), settings.slack_channel.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some() && self.channel.is_some()
    }

    async fn client(&self) -> anyhow::Result<&reqwest::Client> {
        self.http
            .get_or_try_init(|| async {
                reqwest::Client::builder()
                    .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                    .build()
                    .context("failed to build slack http client")
            })
            .await
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    fn channel_name(&self) -> &str {
        "slack"
    }

    async fn send(&self, message: &str, _options: &NotifyOptions) -> anyhow::Result<()> {
        let (Some(token), Some(channel)) = (self.token.as_deref(), self.channel.as_deref()) else {
            anyhow::bail!("Slack client not configured or missing channel");
        };

        let url = format!("{}/chat.postMessage", self.base_url.trim_end_matches('/'));
        let res = self
            .client()
            .await?
            .post(url)
            .bearer_auth(token)
            .json(&PostMessage {
                channel,
                text: message,
            })
            .send()
            .await
            .context("slack request failed")?;

        let status = res.status();
        let body = res
            .json::<PostMessageResponse>()
            .await
            .with_context(|| format!("failed to decode slack response (status={status})"))?;
        body.into_result()
    }
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl PostMessageResponse {
    fn into_result(self) -> anyhow::Result<()> {
        if self.ok {
            return Ok(());
        }
        anyhow::bail!(
            "slack rejected message: {}",
            self.error.as_deref().unwrap_or("unknown_error")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_slack_fails_without_network() {
        let notifier = SlackNotifier::new(Some("xoxb-token".to_string()), None);
        assert!(!notifier.is_configured());
        let err = notifier.send("hello", &NotifyOptions::new()).await.unwrap_err();
        assert!(err.to_string().contains("missing channel"));
    }

    #[test]
    fn api_level_errors_are_failures() {
        let ok: PostMessageResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(ok.into_result().is_ok());

        let rejected: PostMessageResponse =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();
        let err = rejected.into_result().unwrap_err();
        assert!(err.to_string().contains("channel_not_found"));
    }

    #[test]
    fn request_body_has_channel_and_text() {
        let body = serde_json::to_value(PostMessage {
            channel: "#finops",
            text: "save money",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"channel": "#finops", "text": "save money"}));
    }
}
