//! Evidence hook invoked at engine checkpoints

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("evidence capture failed: {0}")]
    Capture(String),
    #[error("evidence io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Injected callback; the engine calls it but owns no capture logic.
#[async_trait]
pub trait EvidenceHook: Send + Sync {
    async fn on_checkpoint(&self, label: &str) -> Result<(), HookError>;
}

/// Hook that ignores every checkpoint.
#[derive(Clone, Debug, Default)]
pub struct NoopHook;

#[async_trait]
impl EvidenceHook for NoopHook {
    async fn on_checkpoint(&self, _label: &str) -> Result<(), HookError> {
        Ok(())
    }
}

pub fn noop_hook() -> Arc<dyn EvidenceHook> {
    Arc::new(NoopHook)
}

/// Invoke the hook best-effort: a failing hook is logged and never changes
/// the outcome of the operation that reached the checkpoint.
pub async fn checkpoint(hook: &dyn EvidenceHook, label: &str) {
    if let Err(err) = hook.on_checkpoint(label).await {
        warn!(label, error = %err, "evidence hook failed; continuing");
    }
}

/// Builds `component:event:detail` labels with the detail flattened to one line.
pub fn checkpoint_label(component: &str, event: &str, detail: impl AsRef<str>) -> String {
    let detail: String = detail
        .as_ref()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    format!("{}:{}:{}", component, event, detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingHook;

    #[async_trait]
    impl EvidenceHook for FailingHook {
        async fn on_checkpoint(&self, _label: &str) -> Result<(), HookError> {
            Err(HookError::Capture("disk full".into()))
        }
    }

    #[tokio::test]
    async fn failing_hook_is_swallowed() {
        checkpoint(&FailingHook, "resolve:exhausted:[css=#x]").await;
    }

    #[test]
    fn label_is_single_line() {
        assert_eq!(
            checkpoint_label("search", "advance", "row\n'Ana'"),
            "search:advance:row 'Ana'"
        );
    }
}
