use crate::llm::{Backend, Summarizer, SummaryContext};

/// Delegates to a host-provided function, e.g. an in-process model gateway.
pub struct CallbackSummarizer<F> {
    f: F,
}

impl<F> CallbackSummarizer<F>
where
    F: Fn(&str, &SummaryContext) -> anyhow::Result<String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<F> Summarizer for CallbackSummarizer<F>
where
    F: Fn(&str, &SummaryContext) -> anyhow::Result<String> + Send + Sync,
{
    fn backend(&self) -> Backend {
        Backend::Callback
    }

    async fn summarize(&self, base_text: &str, context: &SummaryContext) -> anyhow::Result<String> {
        (self.f)(base_text, context)
    }
}
