//! Orchestration flows for the enhancement automation engine.
//!
//! Three layers, composed by the [`Runner`]: a generic bounded
//! [`poll`] primitive, the [`AuthFlow`] state machine, and the
//! per-file [`UploadProcessPipeline`]. All of them talk to the browser
//! only through the [`session_driver::Surface`] trait, so every flow is
//! testable against a scripted fake surface.

mod auth;
mod pipeline;
mod poll;
mod runner;

pub mod selectors {
    //! CSS selectors for the few structural anchors the surface does
    //! expose reliably, shared across flows.

    pub const FILE_INPUT: &str = "input[type=file]";
    pub const EMAIL_FIELD: &str = "input[type=email], input[name=username], input[name=email]";
    pub const PASSWORD_FIELD: &str = "input[type=password]";
}

pub use auth::{AuthConfig, AuthFlow, AuthState};
pub use pipeline::{PipelineConfig, UploadProcessPipeline};
pub use poll::{poll, PollConfig, PollProbe};
pub use runner::{Runner, RunnerConfig};
