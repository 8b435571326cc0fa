//! Semantic element location over an uncontracted interactive surface.
//!
//! The remote application exposes no stable selectors, so elements are
//! found by intent: a closed vocabulary of actions (sign-in, continue,
//! submit, upload trigger, download, slider-by-label) is matched against
//! a snapshot of the currently rendered actionable elements through a
//! prioritized cascade of text, accessible-label, and structural-hint
//! comparisons. Matching is a pure function over the snapshot, so it is
//! unit-testable without a browser.

mod lexicon;
mod matcher;
mod types;

pub use lexicon::IntentLexicon;
pub use matcher::SemanticLocator;
pub use types::{ElementRecord, Intent, Position, SliderKind, SurfaceSnapshot};
