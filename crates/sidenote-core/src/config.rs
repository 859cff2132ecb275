//! Layout configuration.
//!
//! Every field has a default, so hosts can deserialize a partial object
//! (or nothing at all) and get the stock sidenote behaviour.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Vertical gap kept between consecutive notes, in layout units.
pub const DEFAULT_SPACING: f64 = 8.0;

/// Shifts at or below this are written as zero to avoid sub-pixel jitter.
pub const DEFAULT_SHIFT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SidenoteConfig {
    pub spacing: f64,
    pub shift_threshold: f64,
    /// Target prefixes that may become links. Anything else stays literal.
    pub allowed_protocols: Vec<SmolStr>,
    pub selectors: Selectors,
}

impl Default for SidenoteConfig {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            shift_threshold: DEFAULT_SHIFT_THRESHOLD,
            allowed_protocols: vec![
                SmolStr::new_static("http://"),
                SmolStr::new_static("https://"),
                SmolStr::new_static("mailto:"),
            ],
            selectors: Selectors::default(),
        }
    }
}

/// CSS selectors used by DOM hosts to find the editor regions and notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Selectors {
    /// Live-editing container inside the active view.
    pub root: SmolStr,
    /// Scrollable region inside the root.
    pub scroller: SmolStr,
    /// Editable content region inside the root.
    pub content: SmolStr,
    pub note: SmolStr,
    /// Nearest enclosing marker of a note.
    pub marker: SmolStr,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            root: SmolStr::new_static(".markdown-source-view.mod-cm6"),
            scroller: SmolStr::new_static(".cm-scroller"),
            content: SmolStr::new_static(".cm-content"),
            note: SmolStr::new_static("small.sidenote"),
            marker: SmolStr::new_static(".sidenote-number"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SidenoteConfig::default();
        assert_eq!(config.spacing, 8.0);
        assert_eq!(config.shift_threshold, 0.5);
        assert_eq!(config.allowed_protocols.len(), 3);
        assert_eq!(config.selectors.note, "small.sidenote");
    }

    #[test]
    fn test_partial_object_keeps_defaults() {
        let config: SidenoteConfig =
            serde_json::from_str(r#"{"spacing": 12, "selectors": {"note": "aside.note"}}"#).unwrap();
        assert_eq!(config.spacing, 12.0);
        assert_eq!(config.shift_threshold, 0.5);
        assert_eq!(config.selectors.note, "aside.note");
        assert_eq!(config.selectors.scroller, ".cm-scroller");
    }
}
