use std::time::Duration;
use thiserror::Error;

/// Registry lookups are fatal to the call that raised them; the collaborator
/// failures are absorbed at the fan-out point that isolates them.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Provider {0} not registered")]
    UnknownProvider(String),

    #[error("Strategy {0} not registered")]
    UnknownStrategy(String),

    #[error("provider {provider} failed: {source:#}")]
    ProviderFailure {
        provider: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("notifier {notifier} failed: {source:#}")]
    NotifierFailure {
        notifier: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("summarizer failed: {0:#}")]
    SummarizerFailure(#[source] anyhow::Error),

    /// Wrapped in the failure of the stage it bounded.
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: String, after: Duration },
}

impl AgentError {
    pub fn is_unknown_name(&self) -> bool {
        matches!(self, Self::UnknownProvider(_) | Self::UnknownStrategy(_))
    }
}
