//! Core types shared by the renderer, the layout engine and hosts.

use serde::Serialize;

/// Vertical extent of an element, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub top: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether this geometry can take part in the layout sweep.
    ///
    /// Non-finite coordinates or a negative height would corrupt the running
    /// column bottom, so such notes sit the pass out.
    pub fn is_usable(&self) -> bool {
        self.top.is_finite() && self.height.is_finite() && self.height >= 0.0
    }
}

/// One piece of a rewritten text run, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text kept verbatim.
    Text(&'a str),
    /// A link element with `label` as its visible text.
    Link { label: &'a str, target: &'a str },
}

impl Segment<'_> {
    pub fn is_link(&self) -> bool {
        matches!(self, Segment::Link { .. })
    }
}

/// Summary of one layout pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    /// Link elements created by the link renderer.
    pub links_rendered: usize,
    /// Annotations that received a sequence number.
    pub numbered: usize,
    /// Annotations pushed down by a non-zero shift.
    pub shifted: usize,
    /// Annotations left out because of unusable geometry or a failed write.
    pub skipped: usize,
}
