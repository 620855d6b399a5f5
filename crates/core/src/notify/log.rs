use crate::notify::{subject, Notifier, NotifyOptions};

/// Emits the message as a tracing event. Always succeeds.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    fn channel_name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &str, options: &NotifyOptions) -> anyhow::Result<()> {
        tracing::info!(subject = subject(options), "{message}");
        Ok(())
    }
}
