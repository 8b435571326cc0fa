//! The trait seam between the flow layer and the live page.
//!
//! Element discovery works on harvested snapshots: a script collects
//! every actionable element in document order and reports text, labels,
//! structural attributes, visibility, and enablement. Acting on a match
//! re-runs the same collection and addresses the element by index, so
//! the locator itself stays a pure function.

use std::path::Path;

use async_trait::async_trait;
use semantic_locator::SurfaceSnapshot;

use crate::error::SessionError;

/// Operations the automation flows need from a live page.
///
/// The production implementation is [`crate::EnhanceSession`]; tests
/// drive the flows with scripted fakes.
#[async_trait]
pub trait Surface: Send + Sync {
    /// Navigate and wait for the load to settle, bounded by the
    /// session's navigation timeout.
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    async fn current_url(&self) -> Result<String, SessionError>;

    /// Harvest the current interactive surface.
    async fn snapshot(&self) -> Result<SurfaceSnapshot, SessionError>;

    /// Click the element at `index` in the harvest collection.
    async fn click(&self, index: usize) -> Result<(), SessionError>;

    /// Whether any element matches the CSS selector right now.
    async fn has_element(&self, css: &str) -> Result<bool, SessionError>;

    /// Focus the first element matching `css` and type `text`,
    /// optionally clearing the current value first.
    async fn type_into(&self, css: &str, text: &str, clear: bool) -> Result<(), SessionError>;

    /// Press Enter on the first element matching `css`.
    async fn press_enter(&self, css: &str) -> Result<(), SessionError>;

    /// Submit a local file path to the file input matching `css`.
    async fn attach_file(&self, css: &str, path: &Path) -> Result<(), SessionError>;

    /// Write `value` into the slider at `index`, firing both an
    /// `input` and a `change` notification; a single one is not enough
    /// for every framework to pick the write up.
    async fn set_range_value(&self, index: usize, value: u8) -> Result<(), SessionError>;

    /// Full visible text of the page body.
    async fn page_text(&self) -> Result<String, SessionError>;

    /// Full-page screenshot written to `path`.
    async fn screenshot(&self, path: &Path) -> Result<(), SessionError>;
}

/// Selector feeding the harvest collection. Mirrors what the surface
/// actually renders as actionable: buttons, links, button-role divs,
/// inputs (including range sliders), and slider-role elements.
pub(crate) const ACTIONABLE_SELECTOR: &str =
    r#"button, a, [role="button"], input, select, textarea, [role="slider"]"#;

/// JS fragment that evaluates to the harvest collection (an array of
/// elements in document order). Shared by the snapshot and the
/// act-by-index scripts so indices line up.
pub(crate) fn collect_js() -> String {
    format!(
        "Array.from(document.querySelectorAll({}))",
        serde_json::to_string(ACTIONABLE_SELECTOR).expect("static selector serializes")
    )
}

/// Script producing the snapshot records.
pub(crate) fn harvest_script() -> String {
    format!(
        r#"(() => {{
  const nodes = {collect};
  return nodes.map((el, index) => {{
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    const visible = style.display !== 'none'
      && style.visibility !== 'hidden'
      && parseFloat(style.opacity || '1') > 0
      && rect.width > 0 && rect.height > 0;
    const enabled = !el.disabled
      && el.getAttribute('aria-disabled') !== 'true'
      && !el.classList.contains('disabled');
    const attributes = {{}};
    for (const name of el.getAttributeNames()) {{
      if (name === 'aria-label') continue;
      attributes[name] = el.getAttribute(name) || '';
    }}
    let text = (el.innerText || el.value || '').trim();
    const isSlider = (el.tagName === 'INPUT' && el.type === 'range')
      || el.getAttribute('role') === 'slider';
    if (isSlider) {{
      const owned = el.labels && el.labels.length ? el.labels[0].innerText : null;
      const wrapped = el.closest('label') ? el.closest('label').innerText : null;
      const nearby = el.parentElement ? el.parentElement.innerText : '';
      text = (owned || wrapped || text || nearby || '').trim();
    }}
    return {{
      index,
      tag: el.tagName.toLowerCase(),
      text: text.slice(0, 200),
      ariaLabel: el.getAttribute('aria-label'),
      attributes,
      visible,
      enabled,
      position: {{ x: rect.x, y: rect.y, width: rect.width, height: rect.height }},
    }};
  }});
}})()"#,
        collect = collect_js()
    )
}

/// Script clicking the nth element of the harvest collection.
pub(crate) fn click_script(index: usize) -> String {
    format!(
        r#"(() => {{
  const el = {collect}[{index}];
  if (!el) return false;
  el.click();
  return true;
}})()"#,
        collect = collect_js(),
        index = index
    )
}

/// Script writing a slider value through the native setter and firing
/// both notification levels.
pub(crate) fn set_range_script(index: usize, value: u8) -> String {
    format!(
        r#"(() => {{
  const el = {collect}[{index}];
  if (!el) return false;
  const v = String({value});
  if (el.tagName === 'INPUT') {{
    const desc = Object.getOwnPropertyDescriptor(HTMLInputElement.prototype, 'value');
    if (desc && desc.set) {{ desc.set.call(el, v); }} else {{ el.value = v; }}
  }} else {{
    el.setAttribute('aria-valuenow', v);
  }}
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return true;
}})()"#,
        collect = collect_js(),
        index = index,
        value = value
    )
}

/// New-document script masking the automation signal the surface
/// branches on.
pub(crate) const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => false });
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harvest_script_embeds_selector_once_per_script() {
        let script = harvest_script();
        assert!(script.contains("role=\\\"slider\\\"") || script.contains("slider"));
        assert!(script.contains("getComputedStyle"));
    }

    #[test]
    fn act_scripts_address_by_index() {
        assert!(click_script(7).contains("[7]"));
        let script = set_range_script(3, 70);
        assert!(script.contains("[3]"));
        assert!(script.contains("String(70)"));
        assert!(script.contains("'input'"));
        assert!(script.contains("'change'"));
    }
}
