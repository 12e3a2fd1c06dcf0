//! Screenshot evidence hook

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use sureclick_driver_port::{Driver, EvidenceHook, HookError};
use tracing::debug;

const MAX_LABEL_LEN: usize = 80;

/// Writes a PNG of the current viewport for every checkpoint.
///
/// Files are named `<YYYYmmdd_HHMMSS>_<label>.png`; a second capture with
/// the same name in the same second gets a `-N` suffix.
pub struct ScreenshotHook {
    driver: Arc<dyn Driver>,
    dir: PathBuf,
}

impl ScreenshotHook {
    pub fn new(driver: Arc<dyn Driver>, dir: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn target_path(&self, label: &str) -> Result<PathBuf, HookError> {
        let stem = format!(
            "{}_{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            sanitize_label(label)
        );
        let mut path = self.dir.join(format!("{}.png", stem));
        let mut n = 2;
        while tokio::fs::try_exists(&path).await? {
            path = self.dir.join(format!("{}-{}.png", stem, n));
            n += 1;
        }
        Ok(path)
    }
}

/// File-system safe rendition of a checkpoint label.
pub fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_LABEL_LEN)
        .collect();
    if cleaned.is_empty() {
        "checkpoint".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl EvidenceHook for ScreenshotHook {
    async fn on_checkpoint(&self, label: &str) -> Result<(), HookError> {
        let png = self
            .driver
            .screenshot()
            .await
            .map_err(|err| HookError::Capture(err.to_string()))?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.target_path(label).await?;
        tokio::fs::write(&path, png).await?;
        debug!(label, path = %path.display(), "evidence screenshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sureclick_driver_port::fake::FakeDom;

    #[test]
    fn labels_are_file_name_safe() {
        assert_eq!(
            sanitize_label("action:failure:[css=#save | xpath=//b]"),
            "action_failure__css__save___xpath___b_"
        );
        assert_eq!(sanitize_label(""), "checkpoint");
        assert_eq!(sanitize_label(&"x".repeat(200)).len(), MAX_LABEL_LEN);
    }

    #[tokio::test]
    async fn checkpoint_writes_png_files() {
        let dir = tempfile::tempdir().unwrap();
        let hook = ScreenshotHook::new(Arc::new(FakeDom::new()), dir.path().join("evidence"));

        hook.on_checkpoint("search:advance:before:1").await.unwrap();
        hook.on_checkpoint("search:advance:before:1").await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(hook.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.contains("_search_advance_before_1")));
        assert!(names.iter().all(|n| n.ends_with(".png")));
    }
}
