//! Shared primitives for the enhancement automation engine.
//!
//! Everything here is plain data: credentials held in memory for the
//! duration of a run, the per-file status ledger, the enhancement
//! parameters, and the terminal result shapes produced by the poll
//! primitive and the batch runner.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal engine errors. Per-file conditions are never errors at this
/// level; they are recorded as [`MediaStatus::Failed`] instead.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("session error: {0}")]
    Session(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("download listing failed: {0}")]
    Listing(String),
}

/// Operator credentials. Held in memory only; never persisted.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Enhancement tuning parameters, applied once per file immediately
/// before the download is triggered. Both levels are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementParams {
    pub speech_level: u8,
    pub background_level: u8,
}

impl EnhancementParams {
    /// Build params with both levels clamped into `0..=100`.
    pub fn clamped(speech_level: u8, background_level: u8) -> Self {
        Self {
            speech_level: speech_level.min(100),
            background_level: background_level.min(100),
        }
    }
}

impl Default for EnhancementParams {
    fn default() -> Self {
        Self {
            speech_level: 70,
            background_level: 10,
        }
    }
}

/// Lifecycle status of one input file.
///
/// Transitions are monotonic; `Downloaded` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    Pending,
    Uploaded,
    Processing,
    Downloaded,
    Failed(String),
}

impl MediaStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MediaStatus::Downloaded | MediaStatus::Failed(_))
    }

    /// Whether this status counts as "in flight" on the remote surface.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, MediaStatus::Uploaded | MediaStatus::Processing)
    }
}

/// One input file and its current status in the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub status: MediaStatus,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            status: MediaStatus::Pending,
        }
    }

    /// Record a status transition. Terminal statuses are sticky: once a
    /// file is `Downloaded` or `Failed`, later marks are ignored.
    pub fn mark(&mut self, status: MediaStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
    }

    /// Base name of the file for log lines, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Terminal result of one poll-loop invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Success,
    Timeout,
    ErrorDetected,
}

/// Result of one batch run: the download-directory listing taken after
/// the last file's download attempt, not a per-file mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub success: bool,
    pub downloads: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResult {
    pub fn ok(downloads: Vec<String>) -> Self {
        Self {
            success: true,
            downloads,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            downloads: Vec::new(),
            error: Some(error.into()),
        }
    }
}
