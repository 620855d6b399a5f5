use crate::config::Settings;
use crate::notify::{subject, Notifier, NotifyOptions};
use anyhow::Context;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use tokio::sync::OnceCell;

const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone, Default)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    /// Comma-separated recipients.
    pub to: Option<String>,
    /// STARTTLS before login. Defaults to on.
    pub use_tls: Option<bool>,
}

/// Plain-text mail over SMTP with login. Host, credentials, sender and
/// recipient are all required.
pub struct EmailNotifier {
    config: EmailConfig,

    // Built on first send and reused afterwards.
    transport: OnceCell<AsyncSmtpTransport<Tokio1Executor>>,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            transport: OnceCell::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(EmailConfig {
            smtp_host: settings.smtp_host.clone(),
            smtp_port: settings.smtp_port,
            username: settings.smtp_username.clone(),
            password: settings.smtp_password.clone(),
            from: settings.email_from.clone(),
            to: settings.email_to.clone(),
            use_tls: settings.smtp_tls,
        })
    }

    pub fn is_configured(&self) -> bool {
        let c = &self.config;
        [&c.smtp_host, &c.username, &c.password, &c.from, &c.to]
            .iter()
            .all(|v| v.is_some())
    }

    fn build_message(&self, text: &str, subject: &str) -> anyhow::Result<Message> {
        let from = self
            .config
            .from
            .as_deref()
            .context("EMAIL_FROM is required")?;
        let to = self.config.to.as_deref().context("EMAIL_TO is required")?;

        let mut builder = Message::builder()
            .from(from.parse::<Mailbox>().context("invalid sender address")?)
            .subject(subject);
        for rcpt in to.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let mailbox = rcpt
                .parse::<Mailbox>()
                .with_context(|| format!("invalid recipient address {rcpt:?}"))?;
            builder = builder.to(mailbox);
        }

        builder
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())
            .context("failed to build email message")
    }

    fn build_transport(&self) -> anyhow::Result<AsyncSmtpTransport<Tokio1Executor>> {
        let host = self
            .config
            .smtp_host
            .as_deref()
            .context("SMTP_HOST is required")?;
        let creds = Credentials::new(
            self.config.username.clone().unwrap_or_default(),
            self.config.password.clone().unwrap_or_default(),
        );
        let port = self.config.smtp_port.unwrap_or(DEFAULT_SMTP_PORT);

        let builder = if self.config.use_tls.unwrap_or(true) {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .context("failed to create SMTP relay")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        Ok(builder.credentials(creds).port(port).build())
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    fn channel_name(&self) -> &str {
        "email"
    }

    async fn send(&self, message: &str, options: &NotifyOptions) -> anyhow::Result<()> {
        if !self.is_configured() {
            anyhow::bail!("Email notifier is not fully configured");
        }

        let email = self.build_message(message, subject(options))?;
        let transport = self
            .transport
            .get_or_try_init(|| async { self.build_transport() })
            .await?;
        transport
            .send(email)
            .await
            .context("failed to send email via SMTP")?;

        tracing::info!(to = self.config.to.as_deref().unwrap_or_default(), "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> EmailConfig {
        EmailConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_port: Some(2525),
            username: Some("finops".to_string()),
            password: Some("secret".to_string()),
            from: Some("FinOps Bot <finops@example.com>".to_string()),
            to: Some("ops@example.com, cfo@example.com".to_string()),
            use_tls: Some(false),
        }
    }

    #[tokio::test]
    async fn refuses_to_send_when_partially_configured() {
        let notifier = EmailNotifier::new(EmailConfig {
            password: None,
            ..configured()
        });
        assert!(!notifier.is_configured());

        let err = notifier.send("hello", &NotifyOptions::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Email notifier is not fully configured");
    }

    #[test]
    fn message_carries_subject_recipients_and_body() {
        let notifier = EmailNotifier::new(configured());
        assert!(notifier.is_configured());

        let mut options = NotifyOptions::new();
        options.insert("subject".to_string(), "Weekly savings".to_string());
        let message = notifier
            .build_message("Found 3 opportunities", subject(&options))
            .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Weekly savings"));
        assert!(raw.contains("ops@example.com"));
        assert!(raw.contains("cfo@example.com"));
        assert!(raw.contains("Found 3 opportunities"));
    }

    #[test]
    fn default_subject_is_used_without_option() {
        let notifier = EmailNotifier::new(configured());
        let message = notifier
            .build_message("x", subject(&NotifyOptions::new()))
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Cloud Optimization Update"));
    }

    #[test]
    fn malformed_recipient_is_an_error() {
        let notifier = EmailNotifier::new(EmailConfig {
            to: Some("not an address".to_string()),
            ..configured()
        });
        assert!(notifier.build_message("x", "s").is_err());
    }

    #[tokio::test]
    async fn transport_builds_without_connecting() {
        let notifier = EmailNotifier::new(configured());
        assert!(notifier.build_transport().is_ok());
    }
}
