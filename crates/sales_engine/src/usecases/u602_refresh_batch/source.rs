use anyhow::Context;
use async_trait::async_trait;
use contracts::dashboards::d410_sales_overview::DateRange;
use serde_json::Value;
use std::path::PathBuf;

/// Upstream provider of raw model lists.
///
/// Timeouts and retries belong to the implementation; the service only sees
/// success or failure.
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Fetch the raw payload covering `range`
    async fn fetch(&self, range: &DateRange) -> anyhow::Result<Value>;
}

/// Reads a pre-exported JSON payload from disk. The file is assumed to
/// already cover the requested range.
#[derive(Debug, Clone)]
pub struct FileBatchSource {
    path: PathBuf,
}

impl FileBatchSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl BatchSource for FileBatchSource {
    async fn fetch(&self, range: &DateRange) -> anyhow::Result<Value> {
        tracing::debug!(
            "reading payload {} for {}..{}",
            self.path.display(),
            range.from,
            range.to
        );

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        let payload: Value = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not valid JSON", self.path.display()))?;

        Ok(payload)
    }
}
