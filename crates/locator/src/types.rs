//! Snapshot records and the intent vocabulary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A fixed semantic category of UI action. Decouples matching logic
/// from the literal wording on the remote surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    SignIn,
    Continue,
    Submit,
    UploadTrigger,
    Download,
    Slider(SliderKind),
}

/// Which enhancement slider a [`Intent::Slider`] lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliderKind {
    Speech,
    Background,
}

/// Bounding box of an element in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One actionable element as harvested from the live page.
///
/// `index` is the element's position in the harvest collection and is
/// stable for the lifetime of the snapshot; the session layer uses it
/// to act on the matched element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub index: usize,
    pub tag: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub visible: bool,
    pub enabled: bool,
    #[serde(default)]
    pub position: Option<Position>,
}

impl ElementRecord {
    /// Whether this element is a slider-like control.
    pub fn is_slider(&self) -> bool {
        (self.tag == "input"
            && self
                .attributes
                .get("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("range")))
            || self
                .attributes
                .get("role")
                .is_some_and(|r| r.eq_ignore_ascii_case("slider"))
    }

    /// Best human-readable label for diagnostics.
    pub fn label(&self) -> &str {
        if !self.text.trim().is_empty() {
            self.text.trim()
        } else {
            self.aria_label.as_deref().unwrap_or(&self.tag)
        }
    }
}

/// Snapshot of the interactive surface at one point in time, in
/// document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurfaceSnapshot(pub Vec<ElementRecord>);

impl SurfaceSnapshot {
    pub fn new(records: Vec<ElementRecord>) -> Self {
        Self(records)
    }

    pub fn records(&self) -> &[ElementRecord] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels of currently visible, enabled elements. Carried in poll
    /// progress output so a stuck wait shows what the page offers.
    pub fn actionable_labels(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|r| r.visible && r.enabled)
            .map(|r| r.label().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }
}
