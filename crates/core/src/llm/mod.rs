pub mod anthropic;
pub mod callback;
pub mod error;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use anthropic::AnthropicSummarizer;
pub use callback::CallbackSummarizer;

#[derive(Debug, Clone, Serialize)]
pub struct SummaryContext {
    pub org: String,
    pub date: DateTime<Utc>,
    pub results: Vec<ResultDigest>,
}

/// Condensed view of one optimization result for prompting.
#[derive(Debug, Clone, Serialize)]
pub struct ResultDigest {
    pub provider: String,
    pub resource_type: String,
    pub savings: f64,
    pub recommendations: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Anthropic,
    Callback,
}

/// Rewrites the deterministic base summary into prose. Failures are absorbed
/// by the agent, which then keeps the base text.
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    fn backend(&self) -> Backend;

    async fn summarize(&self, base_text: &str, context: &SummaryContext) -> anyhow::Result<String>;
}
