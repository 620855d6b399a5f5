use crate::error::AgentError;
use std::any::Any;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinError;

/// Applies the optional per-call limit to a collaborator call.
pub(crate) async fn bounded<T, F>(limit: Option<Duration>, stage: &str, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let Some(limit) = limit else {
        return fut.await;
    };
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(AgentError::Timeout {
            stage: stage.to_string(),
            after: limit,
        }
        .into()),
    }
}

/// Converts a task that panicked or was cancelled into an ordinary error.
pub(crate) fn join_failure(err: JoinError) -> anyhow::Error {
    if err.is_panic() {
        let payload = err.into_panic();
        anyhow::anyhow!("task panicked: {}", panic_message(payload.as_ref()))
    } else {
        anyhow::anyhow!("task cancelled")
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
