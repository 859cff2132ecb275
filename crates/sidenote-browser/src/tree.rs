//! Sidenote access on the live DOM.
//!
//! Notes are found with the configured note selector below the editor root.
//! Numbers and the rendered-flag live in data attributes; shifts go into a
//! CSS custom property for the stylesheet to apply.

use sidenote_core::{Geometry, Segment, Selectors, SidenoteError, SidenoteTree};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node, Text};

use crate::{NUMBER_ATTR, RENDERED_ATTR, SHIFT_PROPERTY, js_error};

/// `NodeFilter.SHOW_TEXT`
const SHOW_TEXT: u32 = 0x4;

/// [`SidenoteTree`] over the DOM below one editor root.
pub struct DomTree {
    root: Element,
    selectors: Selectors,
    document: Document,
}

impl DomTree {
    pub fn new(root: Element, selectors: Selectors) -> Self {
        let document = root.owner_document().unwrap_or_else(gloo_utils::document);
        Self {
            root,
            selectors,
            document,
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Whether a text node sits inside a link element within `note`.
    fn inside_link(note: &Element, node: &Node) -> bool {
        let Some(anchor) = node
            .parent_element()
            .and_then(|parent| parent.closest("a").ok().flatten())
        else {
            return false;
        };
        let anchor: &Node = anchor.as_ref();
        note.contains(Some(anchor))
    }

    fn create_link(&self, label: &str, target: &str) -> Result<Element, SidenoteError> {
        let anchor = self
            .document
            .create_element("a")
            .map_err(|e| js_error("createElement", e))?;
        anchor.set_text_content(Some(label));
        for (name, value) in [
            ("href", target),
            ("rel", "noopener noreferrer"),
            ("target", "_blank"),
        ] {
            anchor
                .set_attribute(name, value)
                .map_err(|e| js_error("setAttribute", e))?;
        }
        Ok(anchor)
    }
}

impl SidenoteTree for DomTree {
    type Element = Element;
    type TextUnit = Text;

    fn annotations(&self) -> Vec<Element> {
        let list = match self.root.query_selector_all(&self.selectors.note) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(selector = %self.selectors.note, "querySelectorAll failed: {:?}", e);
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn geometry(&self, note: &Element) -> Option<Geometry> {
        if !note.is_connected() {
            return None;
        }
        let rect = note.get_bounding_client_rect();
        Some(Geometry::new(rect.top(), rect.height()))
    }

    fn marker(&self, note: &Element) -> Option<Element> {
        note.closest(&self.selectors.marker).ok().flatten()
    }

    fn is_rendered(&self, note: &Element) -> bool {
        note.get_attribute(RENDERED_ATTR).as_deref() == Some("1")
    }

    fn set_rendered(&mut self, note: &Element, rendered: bool) -> Result<(), SidenoteError> {
        let result = if rendered {
            note.set_attribute(RENDERED_ATTR, "1")
        } else {
            note.remove_attribute(RENDERED_ATTR)
        };
        result.map_err(|e| js_error("rendered flag", e))
    }

    fn text_units(&self, note: &Element) -> Vec<Text> {
        let walker = match self
            .document
            .create_tree_walker_with_what_to_show(note, SHOW_TEXT)
        {
            Ok(walker) => walker,
            Err(e) => {
                tracing::warn!("createTreeWalker failed: {:?}", e);
                return Vec::new();
            }
        };

        // Collect first: the caller replaces nodes while iterating.
        let mut units = Vec::new();
        while let Ok(Some(node)) = walker.next_node() {
            if Self::inside_link(note, &node) {
                continue;
            }
            if let Ok(text) = node.dyn_into::<Text>() {
                units.push(text);
            }
        }
        units
    }

    fn text(&self, unit: &Text) -> Option<String> {
        unit.node_value()
    }

    fn replace_text(&mut self, unit: &Text, segments: &[Segment<'_>]) -> Result<(), SidenoteError> {
        let parent = unit.parent_node().ok_or(SidenoteError::Detached)?;
        let fragment = self.document.create_document_fragment();

        for segment in segments {
            let node: Node = match *segment {
                Segment::Text("") => continue,
                Segment::Text(text) => self.document.create_text_node(text).into(),
                Segment::Link { label, target } => self.create_link(label, target)?.into(),
            };
            fragment
                .append_child(&node)
                .map_err(|e| js_error("appendChild", e))?;
        }

        parent
            .replace_child(&fragment, unit)
            .map_err(|e| js_error("replaceChild", e))?;
        Ok(())
    }

    fn set_number(&mut self, element: &Element, number: usize) -> Result<(), SidenoteError> {
        element
            .set_attribute(NUMBER_ATTR, &number.to_string())
            .map_err(|e| js_error("setAttribute", e))
    }

    fn set_shift(&mut self, note: &Element, shift: f64) -> Result<(), SidenoteError> {
        let html = note
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| SidenoteError::Unsupported(note.tag_name()))?;
        html.style()
            .set_property(SHIFT_PROPERTY, &format!("{shift}px"))
            .map_err(|e| js_error("style.setProperty", e))
    }
}
