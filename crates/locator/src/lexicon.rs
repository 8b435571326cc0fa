//! Keyword sets backing the intent cascade.
//!
//! The completion and error heuristics are best-effort against an
//! undocumented third-party surface, so every keyword set is plain
//! configuration: the defaults mirror the wording the target service
//! has used so far, and a deployment can override any set from a JSON
//! file when the surface drifts.

use serde::{Deserialize, Serialize};

use crate::types::{Intent, SliderKind};

/// How far (in characters) an error keyword may sit from a
/// processing-context keyword and still count as a processing failure.
const ERROR_CONTEXT_WINDOW: usize = 120;

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Per-intent keyword sets plus the error-detection vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct IntentLexicon {
    pub sign_in: Vec<String>,
    #[serde(rename = "continue")]
    pub continue_: Vec<String>,
    pub submit: Vec<String>,
    pub upload: Vec<String>,
    pub download: Vec<String>,
    pub speech_slider: Vec<String>,
    pub background_slider: Vec<String>,
    /// Markers of an already-authenticated surface (sign-out affordances).
    pub signed_in_markers: Vec<String>,
    /// Words that indicate a failure somewhere on the page.
    pub error_markers: Vec<String>,
    /// Words that tie an error marker to the processing job rather than
    /// unrelated incidental text.
    pub processing_context: Vec<String>,
}

impl Default for IntentLexicon {
    fn default() -> Self {
        Self {
            sign_in: words(&["sign in", "log in", "iniciar sesión", "get started"]),
            continue_: words(&["continue", "next", "continuar", "siguiente"]),
            submit: words(&["sign in", "log in", "iniciar", "submit"]),
            upload: words(&["upload", "select", "choose", "subir"]),
            download: words(&["download", "descargar"]),
            speech_slider: words(&["speech", "voice", "voz"]),
            background_slider: words(&["background", "noise", "fondo"]),
            signed_in_markers: words(&["sign out", "logout", "cerrar sesión"]),
            error_markers: words(&["error", "failed", "falló"]),
            processing_context: words(&[
                "processing",
                "enhance",
                "enhancing",
                "upload",
                "audio",
                "file",
            ]),
        }
    }
}

impl IntentLexicon {
    /// Keyword set for one intent, lowercase.
    pub fn keywords(&self, intent: Intent) -> &[String] {
        match intent {
            Intent::SignIn => &self.sign_in,
            Intent::Continue => &self.continue_,
            Intent::Submit => &self.submit,
            Intent::UploadTrigger => &self.upload,
            Intent::Download => &self.download,
            Intent::Slider(SliderKind::Speech) => &self.speech_slider,
            Intent::Slider(SliderKind::Background) => &self.background_slider,
        }
    }

    /// Whether the page text contains an error marker close enough to a
    /// processing-context keyword to count as a processing failure.
    ///
    /// A bare "error" in a footer or cookie banner must not fail the
    /// file, so the marker only counts when a context word appears
    /// within [`ERROR_CONTEXT_WINDOW`] characters of it.
    pub fn error_in_processing_context(&self, page_text: &str) -> bool {
        let text = page_text.to_lowercase();
        for marker in &self.error_markers {
            let mut from = 0;
            while let Some(found) = text[from..].find(marker.as_str()) {
                let at = from + found;
                let mut lo = at.saturating_sub(ERROR_CONTEXT_WINDOW);
                let mut hi = (at + marker.len() + ERROR_CONTEXT_WINDOW).min(text.len());
                while lo > 0 && !text.is_char_boundary(lo) {
                    lo -= 1;
                }
                while hi < text.len() && !text.is_char_boundary(hi) {
                    hi += 1;
                }
                let window = &text[lo..hi];
                if self
                    .processing_context
                    .iter()
                    .any(|ctx| window.contains(ctx.as_str()))
                {
                    return true;
                }
                from = at + marker.len();
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_requires_processing_context() {
        let lexicon = IntentLexicon::default();
        assert!(lexicon.error_in_processing_context("Enhancing audio... error occurred"));
        assert!(lexicon.error_in_processing_context("Upload failed, try again"));
        assert!(!lexicon.error_in_processing_context("no problems here"));
    }

    #[test]
    fn distant_error_text_is_ignored() {
        let lexicon = IntentLexicon::default();
        let page = format!("processing your job{}a cookie error banner", " ".repeat(400));
        assert!(!lexicon.error_in_processing_context(&page));
    }

    #[test]
    fn lexicon_overrides_deserialize_with_defaults() {
        let lexicon: IntentLexicon =
            serde_json::from_str(r#"{"download": ["grab it"]}"#).unwrap();
        assert_eq!(lexicon.download, vec!["grab it".to_string()]);
        // Untouched sets keep their defaults.
        assert!(lexicon.sign_in.contains(&"sign in".to_string()));
    }
}
