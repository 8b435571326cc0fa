//! The prioritized matching cascade.

use tracing::debug;

use crate::lexicon::IntentLexicon;
use crate::types::{ElementRecord, Intent, SurfaceSnapshot};

/// Matching tiers, evaluated in order; the first tier with a hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    /// Exact case-insensitive equality on visible text.
    ExactText,
    /// Equality on the accessible label.
    AriaLabel,
    /// Substring match across text, label, and structural hints
    /// (class / id / data-* attribute values).
    Loose,
}

const TIERS: [Tier; 3] = [Tier::ExactText, Tier::AriaLabel, Tier::Loose];

/// Intent-to-element resolver over a [`SurfaceSnapshot`].
///
/// `find` returning `None` means "not yet present": the remote surface
/// renders asynchronously, so callers retry rather than fail.
#[derive(Debug, Clone, Default)]
pub struct SemanticLocator {
    lexicon: IntentLexicon,
}

impl SemanticLocator {
    pub fn new(lexicon: IntentLexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &IntentLexicon {
        &self.lexicon
    }

    /// Find the best matching actionable element for `intent`.
    ///
    /// Hidden and disabled elements never match. Within a tier the
    /// first element in document order wins, so repeated lookups over
    /// equivalent snapshots are deterministic.
    pub fn find<'a>(
        &self,
        snapshot: &'a SurfaceSnapshot,
        intent: Intent,
    ) -> Option<&'a ElementRecord> {
        let keywords: Vec<String> = self
            .lexicon
            .keywords(intent)
            .iter()
            .map(|k| k.to_lowercase())
            .collect();

        let candidates: Vec<&ElementRecord> = snapshot
            .records()
            .iter()
            .filter(|r| r.visible && r.enabled && kind_matches(intent, r))
            .collect();

        for tier in TIERS {
            let hit = candidates
                .iter()
                .copied()
                .find(|r| tier_matches(tier, r, &keywords));
            if let Some(record) = hit {
                debug!(
                    ?intent,
                    ?tier,
                    index = record.index,
                    label = record.label(),
                    "locator hit"
                );
                return Some(record);
            }
        }
        None
    }
}

/// Slider intents only match slider-like elements; everything else
/// matches any actionable element.
fn kind_matches(intent: Intent, record: &ElementRecord) -> bool {
    match intent {
        Intent::Slider(_) => record.is_slider(),
        _ => !record.is_slider(),
    }
}

fn tier_matches(tier: Tier, record: &ElementRecord, keywords: &[String]) -> bool {
    match tier {
        Tier::ExactText => {
            let text = record.text.trim().to_lowercase();
            !text.is_empty() && keywords.iter().any(|k| *k == text)
        }
        Tier::AriaLabel => record
            .aria_label
            .as_deref()
            .map(|label| {
                let label = label.trim().to_lowercase();
                keywords.iter().any(|k| *k == label)
            })
            .unwrap_or(false),
        Tier::Loose => {
            let haystack = loose_haystack(record);
            keywords.iter().any(|k| haystack.contains(k.as_str()))
        }
    }
}

fn loose_haystack(record: &ElementRecord) -> String {
    let mut haystack = String::with_capacity(128);
    haystack.push_str(&record.text);
    haystack.push(' ');
    if let Some(label) = &record.aria_label {
        haystack.push_str(label);
        haystack.push(' ');
    }
    for (name, value) in &record.attributes {
        if name == "class" || name == "id" || name.starts_with("data-") {
            haystack.push_str(value);
            haystack.push(' ');
        }
    }
    haystack.to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::SliderKind;

    fn record(index: usize, tag: &str, text: &str) -> ElementRecord {
        ElementRecord {
            index,
            tag: tag.to_string(),
            text: text.to_string(),
            aria_label: None,
            attributes: HashMap::new(),
            visible: true,
            enabled: true,
            position: None,
        }
    }

    fn locator() -> SemanticLocator {
        SemanticLocator::default()
    }

    #[test]
    fn exact_text_beats_loose_match() {
        let snapshot = SurfaceSnapshot::new(vec![
            record(0, "div", "download options and more"),
            record(1, "button", "Download"),
        ]);
        let hit = locator().find(&snapshot, Intent::Download).unwrap();
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn hidden_and_disabled_never_match() {
        let mut hidden = record(0, "button", "Download");
        hidden.visible = false;
        let mut disabled = record(1, "button", "Download");
        disabled.enabled = false;
        let snapshot = SurfaceSnapshot::new(vec![hidden, disabled]);
        assert!(locator().find(&snapshot, Intent::Download).is_none());
    }

    #[test]
    fn aria_label_matches_when_text_is_empty() {
        let mut rec = record(0, "button", "");
        rec.aria_label = Some("Download".to_string());
        let snapshot = SurfaceSnapshot::new(vec![rec]);
        assert!(locator().find(&snapshot, Intent::Download).is_some());
    }

    #[test]
    fn structural_hints_match_loosely() {
        let mut rec = record(0, "div", "");
        rec.attributes
            .insert("class".to_string(), "btn-download-primary".to_string());
        let snapshot = SurfaceSnapshot::new(vec![rec]);
        assert!(locator().find(&snapshot, Intent::Download).is_some());
    }

    #[test]
    fn first_in_document_order_wins() {
        let snapshot = SurfaceSnapshot::new(vec![
            record(0, "a", "Sign in"),
            record(1, "button", "Sign in"),
        ]);
        let hit = locator().find(&snapshot, Intent::SignIn).unwrap();
        assert_eq!(hit.index, 0);
    }

    #[test]
    fn localized_wording_matches() {
        let snapshot = SurfaceSnapshot::new(vec![record(0, "button", "Iniciar sesión")]);
        assert!(locator().find(&snapshot, Intent::SignIn).is_some());
    }

    #[test]
    fn slider_intent_requires_slider_element() {
        let mut range = record(1, "input", "Speech");
        range
            .attributes
            .insert("type".to_string(), "range".to_string());
        let snapshot = SurfaceSnapshot::new(vec![
            record(0, "button", "speech"), // not a slider; must not match
            range,
        ]);
        let hit = locator()
            .find(&snapshot, Intent::Slider(SliderKind::Speech))
            .unwrap();
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn slider_matches_by_aria_label() {
        let mut slider = record(0, "div", "");
        slider
            .attributes
            .insert("role".to_string(), "slider".to_string());
        slider.aria_label = Some("Background noise".to_string());
        let snapshot = SurfaceSnapshot::new(vec![slider]);
        assert!(locator()
            .find(&snapshot, Intent::Slider(SliderKind::Background))
            .is_some());
    }

    #[test]
    fn none_when_nothing_qualifies() {
        let snapshot = SurfaceSnapshot::new(vec![record(0, "button", "unrelated")]);
        assert!(locator().find(&snapshot, Intent::UploadTrigger).is_none());
    }
}
