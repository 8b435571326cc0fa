//! Batch composition: authenticate once, pipeline per file, snapshot
//! the download directory, report.

use std::path::Path;

use enhancer_core_types::{BatchResult, Credentials, MediaFile, MediaStatus};
use semantic_locator::SemanticLocator;
use session_driver::Surface;
use tracing::{error, info, warn};

use crate::auth::{AuthConfig, AuthFlow};
use crate::pipeline::{PipelineConfig, UploadProcessPipeline};

#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    pub auth: AuthConfig,
    pub pipeline: PipelineConfig,
}

pub struct Runner<'a> {
    surface: &'a dyn Surface,
    locator: &'a SemanticLocator,
    config: &'a RunnerConfig,
}

impl<'a> Runner<'a> {
    pub fn new(
        surface: &'a dyn Surface,
        locator: &'a SemanticLocator,
        config: &'a RunnerConfig,
    ) -> Self {
        Self {
            surface,
            locator,
            config,
        }
    }

    /// Run the whole batch. Only authentication aborts it; per-file
    /// failures shorten the download list but the run still succeeds
    /// (best effort across the batch, not all-or-nothing).
    pub async fn run(&self, credentials: &Credentials, files: &mut [MediaFile]) -> BatchResult {
        let auth = AuthFlow::new(self.surface, self.locator, &self.config.auth);
        match auth.ensure_logged_in(credentials).await {
            Ok(state) => info!(?state, "authentication settled"),
            Err(err) => {
                error!(error = %err, "authentication failed; aborting the batch");
                return BatchResult::failed(err.to_string());
            }
        }

        let pipeline = UploadProcessPipeline::new(self.surface, self.locator, &self.config.pipeline);
        pipeline.process_batch(files).await;

        let downloaded = files
            .iter()
            .filter(|f| f.status == MediaStatus::Downloaded)
            .count();
        let failed = files.len() - downloaded;
        info!(total = files.len(), downloaded, failed, "batch finished");

        let downloads = list_downloads(&self.config.pipeline.download_dir);
        BatchResult::ok(downloads)
    }
}

/// Snapshot of the download directory after the last file. A listing
/// failure degrades to an empty list rather than failing the run.
fn list_downloads(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "could not list downloads");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_download_dir_yields_empty_list() {
        let listing = list_downloads(Path::new("/definitely/not/a/real/dir"));
        assert!(listing.is_empty());
    }

    #[test]
    fn listing_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.wav"), b"x").unwrap();
        std::fs::write(dir.path().join("a.wav"), b"x").unwrap();
        let listing = list_downloads(dir.path());
        assert_eq!(listing, vec!["a.wav".to_string(), "b.wav".to_string()]);
    }
}
