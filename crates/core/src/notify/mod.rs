//! Delivery channels for the proactive summary.

pub mod email;
pub mod log;
pub mod slack;
pub mod webhook;

use std::collections::BTreeMap;

pub use email::{EmailConfig, EmailNotifier};
pub use log::LogNotifier;
pub use slack::SlackNotifier;
pub use webhook::WebhookNotifier;

/// Per-send hints such as `subject`; channels ignore keys they don't know.
pub type NotifyOptions = BTreeMap<String, String>;

pub const DEFAULT_SUBJECT: &str = "Cloud Optimization Update";

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn channel_name(&self) -> &str;

    /// Any error is recorded by the caller as a failed delivery.
    async fn send(&self, message: &str, options: &NotifyOptions) -> anyhow::Result<()>;
}

pub(crate) fn subject(options: &NotifyOptions) -> &str {
    options
        .get("subject")
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SUBJECT)
}
