//! Per-file upload -> wait -> tune -> download pipeline.
//!
//! Failures are isolated per file: every condition short of a dead
//! session marks the current file `Failed` and moves on, so a batch of
//! N files always ends with N defined statuses.

use std::path::PathBuf;
use std::time::Duration;

use enhancer_core_types::{EnhancementParams, MediaFile, MediaStatus, PollOutcome};
use semantic_locator::{Intent, SemanticLocator, SliderKind};
use session_driver::Surface;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::poll::{poll, PollConfig, PollProbe};
use crate::selectors::FILE_INPUT;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Route reloaded between files so each job starts clean.
    pub target_url: String,
    /// Where downloads and diagnostic screenshots land.
    pub download_dir: PathBuf,
    pub params: EnhancementParams,
    /// Processing ceiling; the default budget is 5s x 180 (~15 min).
    pub processing: PollConfig,
    /// Pause after submitting the file before polling starts.
    pub upload_settle: Duration,
    /// Pause after the slider writes so the page state catches up.
    pub slider_settle: Duration,
    /// Pause after the download click for the filesystem write to land.
    pub download_settle: Duration,
    /// Pause after reloading the route between files.
    pub between_files_settle: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_url: "https://podcast.adobe.com/enhance".to_string(),
            download_dir: PathBuf::from("./downloads"),
            params: EnhancementParams::default(),
            processing: PollConfig::default(),
            upload_settle: Duration::from_secs(3),
            slider_settle: Duration::from_secs(2),
            download_settle: Duration::from_secs(5),
            between_files_settle: Duration::from_secs(3),
        }
    }
}

/// Success: a visible, enabled download affordance. Failure: an error
/// keyword in processing context in the page text.
struct ProcessingProbe<'a> {
    surface: &'a dyn Surface,
    locator: &'a SemanticLocator,
}

#[async_trait::async_trait]
impl PollProbe for ProcessingProbe<'_> {
    async fn success(&self) -> bool {
        match self.surface.snapshot().await {
            Ok(snapshot) => self.locator.find(&snapshot, Intent::Download).is_some(),
            Err(_) => false,
        }
    }

    async fn failure(&self) -> bool {
        match self.surface.page_text().await {
            Ok(text) => self.locator.lexicon().error_in_processing_context(&text),
            Err(_) => false,
        }
    }

    async fn diagnostics(&self) -> Vec<String> {
        match self.surface.snapshot().await {
            Ok(snapshot) => snapshot.actionable_labels(),
            Err(_) => Vec::new(),
        }
    }
}

pub struct UploadProcessPipeline<'a> {
    surface: &'a dyn Surface,
    locator: &'a SemanticLocator,
    config: &'a PipelineConfig,
}

impl<'a> UploadProcessPipeline<'a> {
    pub fn new(
        surface: &'a dyn Surface,
        locator: &'a SemanticLocator,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            surface,
            locator,
            config,
        }
    }

    /// Process every file in order, one in flight at a time. Statuses
    /// are written into `files`; no per-file condition aborts the
    /// batch.
    pub async fn process_batch(&self, files: &mut [MediaFile]) {
        let total = files.len();
        for i in 0..total {
            info!(
                file = %files[i].display_name(),
                "processing file {}/{}",
                i + 1,
                total
            );
            self.process_one(&mut files[i]).await;

            if i + 1 < total {
                // Reset to the entry route so the next file starts from
                // a clean single-job state.
                if let Err(err) = self.surface.navigate(&self.config.target_url).await {
                    warn!(error = %err, "route reset did not settle; continuing");
                }
                sleep(self.config.between_files_settle).await;
            }
        }
    }

    async fn process_one(&self, file: &mut MediaFile) {
        if !self.ensure_upload_target().await {
            warn!(file = %file.display_name(), "no upload target on the surface");
            file.mark(MediaStatus::Failed("no upload target".to_string()));
            return;
        }

        if let Err(err) = self.surface.attach_file(FILE_INPUT, &file.path).await {
            warn!(file = %file.display_name(), error = %err, "upload failed");
            file.mark(MediaStatus::Failed(format!("upload failed: {err}")));
            return;
        }
        file.mark(MediaStatus::Uploaded);
        info!(file = %file.display_name(), "uploaded, waiting for processing");
        sleep(self.config.upload_settle).await;
        file.mark(MediaStatus::Processing);

        let probe = ProcessingProbe {
            surface: self.surface,
            locator: self.locator,
        };
        match poll(&self.config.processing, &probe).await {
            PollOutcome::Success => self.finish_file(file).await,
            PollOutcome::Timeout => {
                self.capture_failure_screenshot().await;
                file.mark(MediaStatus::Failed("processing timeout".to_string()));
            }
            PollOutcome::ErrorDetected => {
                self.capture_failure_screenshot().await;
                file.mark(MediaStatus::Failed(
                    "error reported during processing".to_string(),
                ));
            }
        }
    }

    /// Parameter application happens strictly before the download
    /// trigger for the same file.
    async fn finish_file(&self, file: &mut MediaFile) {
        info!(file = %file.display_name(), "processing complete, applying parameters");
        self.apply_params().await;
        sleep(self.config.slider_settle).await;

        let download = match self.surface.snapshot().await {
            Ok(snapshot) => self
                .locator
                .find(&snapshot, Intent::Download)
                .map(|record| record.index),
            Err(_) => None,
        };
        let Some(index) = download else {
            self.capture_failure_screenshot().await;
            file.mark(MediaStatus::Failed(
                "download affordance disappeared".to_string(),
            ));
            return;
        };
        if let Err(err) = self.surface.click(index).await {
            self.capture_failure_screenshot().await;
            file.mark(MediaStatus::Failed(format!("download click failed: {err}")));
            return;
        }
        sleep(self.config.download_settle).await;
        file.mark(MediaStatus::Downloaded);
        info!(file = %file.display_name(), "downloaded");
    }

    /// Locate the file input, nudging the surface with one upload
    /// trigger click when it is not directly present.
    async fn ensure_upload_target(&self) -> bool {
        if self.surface.has_element(FILE_INPUT).await.unwrap_or(false) {
            return true;
        }
        if let Ok(snapshot) = self.surface.snapshot().await {
            if let Some(record) = self.locator.find(&snapshot, Intent::UploadTrigger) {
                if self.surface.click(record.index).await.is_ok() {
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
        self.surface.has_element(FILE_INPUT).await.unwrap_or(false)
    }

    /// Write both slider values, best effort. A missing slider keeps
    /// the service default rather than failing the file.
    async fn apply_params(&self) {
        let snapshot = match self.surface.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "could not snapshot the surface for parameter tuning");
                return;
            }
        };
        let writes = [
            (SliderKind::Speech, self.config.params.speech_level),
            (SliderKind::Background, self.config.params.background_level),
        ];
        for (kind, value) in writes {
            match self.locator.find(&snapshot, Intent::Slider(kind)) {
                Some(record) => {
                    if let Err(err) = self.surface.set_range_value(record.index, value).await {
                        warn!(?kind, value, error = %err, "slider write failed");
                    } else {
                        info!(?kind, value, "slider set");
                    }
                }
                None => warn!(?kind, "slider not found; keeping the service default"),
            }
        }
    }

    async fn capture_failure_screenshot(&self) {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
        let path = self
            .config
            .download_dir
            .join(format!("failure-{stamp}.png"));
        match self.surface.screenshot(&path).await {
            Ok(()) => info!(path = %path.display(), "diagnostic screenshot captured"),
            Err(err) => warn!(error = %err, "diagnostic screenshot failed"),
        }
    }
}
