//! The optimizer agent: named registries of providers, strategies and
//! notifiers plus an optional summarizer, and the pipelines that chain them.
//!
//! Registration takes `&mut self` and every pipeline operation takes `&self`,
//! so once the agent is shared (typically in an `Arc`) its registries are
//! frozen.

mod boundary;
pub mod registry;
pub mod summary;


use crate::domain::cost::{CostSnapshot, DateRange};
use crate::domain::result::{
    OptimizationResult, OrgContext, ProactiveCycleOutcome, UNKNOWN_RESOURCE_TYPE,
};
use crate::error::AgentError;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::Summarizer;
use crate::notify::{Notifier, NotifyOptions};
use crate::provider::CloudProvider;
use crate::strategy::{OptimizationStrategy, StrategyOutput};
use boundary::{bounded, join_failure};
use chrono::{DateTime, Utc};
use registry::Registry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

pub use summary::NO_OPPORTUNITIES;

#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    /// Upper bound for each provider, notifier and summarizer call.
    pub call_timeout: Option<Duration>,
}

#[derive(Default)]
pub struct OptimizerAgent {
    providers: Registry<dyn CloudProvider>,
    strategies: Registry<dyn OptimizationStrategy>,
    notifiers: Registry<dyn Notifier>,
    summarizer: Option<Arc<dyn Summarizer>>,
    options: AgentOptions,
}

impl OptimizerAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AgentOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub fn register_provider(&mut self, name: impl Into<String>, provider: Arc<dyn CloudProvider>) {
        let name = name.into();
        if self.providers.insert(name.clone(), provider).is_some() {
            tracing::debug!(provider = %name, "replaced registered provider");
        }
    }

    pub fn register_strategy(
        &mut self,
        name: impl Into<String>,
        strategy: Arc<dyn OptimizationStrategy>,
    ) {
        let name = name.into();
        if self.strategies.insert(name.clone(), strategy).is_some() {
            tracing::debug!(strategy = %name, "replaced registered strategy");
        }
    }

    pub fn register_notifier(&mut self, name: impl Into<String>, notifier: Arc<dyn Notifier>) {
        let name = name.into();
        if self.notifiers.insert(name.clone(), notifier).is_some() {
            tracing::debug!(notifier = %name, "replaced registered notifier");
        }
    }

    pub fn register_summarizer(&mut self, summarizer: Arc<dyn Summarizer>) {
        self.summarizer = Some(summarizer);
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.names()
    }

    pub fn strategy_names(&self) -> Vec<String> {
        self.strategies.names()
    }

    pub fn notifier_names(&self) -> Vec<String> {
        self.notifiers.names()
    }

    pub fn has_summarizer(&self) -> bool {
        self.summarizer.is_some()
    }

    pub async fn analyze_costs(
        &self,
        provider_name: &str,
        range: Option<DateRange>,
    ) -> Result<CostSnapshot, AgentError> {
        let provider = self
            .providers
            .get(provider_name)
            .ok_or_else(|| AgentError::UnknownProvider(provider_name.to_string()))?;

        bounded(
            self.options.call_timeout,
            "cost data fetch",
            provider.get_cost_data(range),
        )
        .await
        .map_err(|source| AgentError::ProviderFailure {
            provider: provider_name.to_string(),
            source,
        })
    }

    pub async fn optimize(
        &self,
        provider_name: &str,
        strategy_name: &str,
        range: Option<DateRange>,
    ) -> Result<OptimizationResult, AgentError> {
        let provider = self
            .providers
            .get(provider_name)
            .ok_or_else(|| AgentError::UnknownProvider(provider_name.to_string()))?;
        let strategy = self
            .strategies
            .get(strategy_name)
            .ok_or_else(|| AgentError::UnknownStrategy(strategy_name.to_string()))?;

        self.job(provider_name, provider, strategy, range).run().await
    }

    /// One result per provider. With no name (or a blank one), every provider
    /// is optimized with the first registered strategy (insertion order; later
    /// strategies are never consulted here). Failing providers are logged and
    /// left out.
    pub async fn get_recommendations(
        &self,
        provider_name: Option<&str>,
    ) -> Vec<OptimizationResult> {
        let provider_name = provider_name.filter(|name| !name.trim().is_empty());
        let Some((_, strategy)) = self.strategies.first() else {
            tracing::warn!("no strategy registered; no recommendations produced");
            return Vec::new();
        };

        let targets: Vec<(&str, &Arc<dyn CloudProvider>)> = match provider_name {
            Some(name) => match self.providers.get(name) {
                Some(provider) => vec![(name, provider)],
                None => {
                    tracing::warn!(provider = %name, "provider not registered; skipping");
                    Vec::new()
                }
            },
            None => self.providers.iter().collect(),
        };

        let handles: Vec<_> = targets
            .into_iter()
            .map(|(name, provider)| {
                let job = self.job(name, provider, strategy, None);
                (name.to_string(), tokio::spawn(job.run()))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(AgentError::ProviderFailure {
                    provider: name.clone(),
                    source: join_failure(join_err),
                }),
            };
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => {
                    tracing::warn!(
                        provider = %name,
                        strategy = strategy.strategy_name(),
                        error = %err,
                        "optimization failed; skipping provider"
                    );
                }
            }
        }
        results
    }

    /// Base summary, optionally rewritten by the summarizer. Any summarizer
    /// failure leaves the base summary in place.
    pub async fn summarize_results(
        &self,
        results: &[OptimizationResult],
        org: Option<&OrgContext>,
    ) -> String {
        let base = summary::base_summary(results);
        if results.is_empty() {
            return base;
        }
        let Some(summarizer) = self.summarizer.clone() else {
            return base;
        };

        let backend = summarizer.backend();
        let context = summary::summary_context(results, org, Utc::now());
        let limit = self.options.call_timeout;
        let base_text = base.clone();
        let handle = tokio::spawn(async move {
            bounded(limit, "summarizer", summarizer.summarize(&base_text, &context)).await
        });

        let outcome = match handle.await {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text),
            Ok(Ok(_)) => Err(anyhow::anyhow!("summarizer returned empty text")),
            Ok(Err(err)) => Err(err),
            Err(join_err) => Err(join_failure(join_err)),
        };

        match outcome {
            Ok(text) => text,
            Err(source) => {
                if let Some(diag) = source.downcast_ref::<LlmDiagnosticsError>() {
                    tracing::debug!(
                        stage = diag.stage,
                        raw_output = diag.raw_output.as_deref().unwrap_or_default(),
                        "summarizer diagnostics"
                    );
                }
                let err = AgentError::SummarizerFailure(source);
                tracing::warn!(?backend, error = %err, "falling back to base summary");
                base
            }
        }
    }

    /// Delivers `message` to `channels` (all notifiers when `None` or empty).
    /// Unknown names and failed deliveries are reported as `false`.
    pub async fn notify(
        &self,
        message: &str,
        channels: Option<&[String]>,
        options: &NotifyOptions,
    ) -> BTreeMap<String, bool> {
        let targets = match channels {
            Some(channels) if !channels.is_empty() => channels.to_vec(),
            _ => self.notifiers.names(),
        };

        let mut status = BTreeMap::new();
        let mut seen = BTreeSet::new();
        let mut handles = Vec::new();
        for name in targets {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(notifier) = self.notifiers.get(&name).cloned() else {
                tracing::warn!(notifier = %name, "notifier not registered");
                status.insert(name, false);
                continue;
            };

            let channel = notifier.channel_name().to_string();
            let message = message.to_string();
            let options = options.clone();
            let limit = self.options.call_timeout;
            let handle = tokio::spawn(async move {
                bounded(limit, "notifier send", notifier.send(&message, &options)).await
            });
            handles.push((name, channel, handle));
        }

        for (name, channel, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(join_failure(join_err)),
            };
            let delivered = match outcome {
                Ok(()) => true,
                Err(source) => {
                    let err = AgentError::NotifierFailure {
                        notifier: name.clone(),
                        source,
                    };
                    tracing::warn!(%channel, error = %err, "notification not delivered");
                    false
                }
            };
            status.insert(name, delivered);
        }
        status
    }

    /// recommendations -> summary -> notifications. Never fails; each stage
    /// degrades on its own.
    pub async fn run_proactive_cycle(
        &self,
        provider_name: Option<&str>,
        channels: Option<&[String]>,
        org: Option<&OrgContext>,
    ) -> ProactiveCycleOutcome {
        let results = self.get_recommendations(provider_name).await;
        let summary = self.summarize_results(&results, org).await;
        let notify_status = self.notify(&summary, channels, &NotifyOptions::new()).await;

        let delivered = notify_status.values().filter(|ok| **ok).count();
        tracing::info!(
            count = results.len(),
            delivered,
            channels = notify_status.len(),
            "proactive cycle finished"
        );

        ProactiveCycleOutcome {
            summary,
            notify_status,
            count: results.len(),
        }
    }

    fn job(
        &self,
        provider_name: &str,
        provider: &Arc<dyn CloudProvider>,
        strategy: &Arc<dyn OptimizationStrategy>,
        range: Option<DateRange>,
    ) -> OptimizationJob {
        OptimizationJob {
            provider_name: provider_name.to_string(),
            provider: Arc::clone(provider),
            strategy: Arc::clone(strategy),
            range,
            call_timeout: self.options.call_timeout,
        }
    }
}

/// Owned inputs of one provider -> strategy run, so it can execute on its own task.
struct OptimizationJob {
    provider_name: String,
    provider: Arc<dyn CloudProvider>,
    strategy: Arc<dyn OptimizationStrategy>,
    range: Option<DateRange>,
    call_timeout: Option<Duration>,
}

impl OptimizationJob {
    async fn run(self) -> Result<OptimizationResult, AgentError> {
        let snapshot = bounded(
            self.call_timeout,
            "cost data fetch",
            self.provider.get_cost_data(self.range),
        )
        .await
        .map_err(|source| AgentError::ProviderFailure {
            provider: self.provider_name.clone(),
            source,
        })?;

        let output = self.strategy.optimize(&snapshot);
        Ok(into_result(self.provider_name, output, Utc::now()))
    }
}

/// Stamps the result and enforces its invariants whatever the strategy reported.
fn into_result(
    provider: String,
    output: StrategyOutput,
    timestamp: DateTime<Utc>,
) -> OptimizationResult {
    let current_cost = finite_or_zero(output.current_cost);
    let savings = finite_or_zero(output.savings).max(0.0);
    let confidence_score = finite_or_zero(output.confidence_score).clamp(0.0, 1.0);
    let resource_type = output
        .resource_type
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_RESOURCE_TYPE.to_string());

    OptimizationResult {
        provider,
        resource_type,
        current_cost,
        optimized_cost: (current_cost - savings).max(0.0),
        savings,
        recommendations: output.recommendations,
        confidence_score,
        timestamp,
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
