//! Browser session driver.
//!
//! Owns the lifecycle of one Chrome instance and one page: launch with
//! a persistent profile (so authentication survives across runs),
//! suppress the standard automation-detection signal, route downloads
//! into a configured directory, and expose the live page behind the
//! [`Surface`] trait so the flow layer never touches the CDP client
//! directly.

mod config;
mod driver;
mod error;
mod surface;

pub use config::{detect_chrome_executable, SessionConfig};
pub use driver::EnhanceSession;
pub use error::SessionError;
pub use surface::Surface;
