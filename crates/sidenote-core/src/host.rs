//! Host abstraction traits.
//!
//! These traits define the interface between the sidenote logic and the
//! editor application hosting it: how to find the active view and its
//! regions, how to read and edit the notes in its render tree, and how to
//! subscribe to the events that should trigger a relayout. The browser
//! implementation lives in `sidenote-browser`; [`crate::memory`] provides an
//! in-memory one.

use std::rc::Rc;

use crate::error::SidenoteError;
use crate::scheduler::FrameClock;
use crate::types::{Geometry, Segment};

/// Listener invoked by a host subscription.
pub type Callback = Rc<dyn Fn()>;

/// A live listener registration.
///
/// Dropping the subscription is its teardown action.
pub trait Subscription {
    /// Drop notifications that were produced but not yet delivered.
    ///
    /// Hosts that deliver mutation notifications asynchronously use this to
    /// forget records caused by the renderer's own edits.
    fn discard_pending(&self) {}
}

/// The application hosting the editor views.
pub trait Host: 'static {
    type View;
    /// A container element within a view.
    type Region: Clone + 'static;
    type Tree: SidenoteTree;
    type Subscription: Subscription + 'static;
    type Clock: FrameClock + 'static;

    /// The currently active editable view, if any.
    fn active_view(&self) -> Option<Self::View>;

    /// The live-editing container of a view.
    fn editor_root(&self, view: &Self::View) -> Option<Self::Region>;

    /// The scrollable region inside an editor root.
    fn scroller(&self, root: &Self::Region) -> Option<Self::Region>;

    /// The editable content region inside an editor root.
    fn content(&self, root: &Self::Region) -> Option<Self::Region>;

    /// Query access to the notes below `root`.
    fn tree(&self, root: &Self::Region) -> Self::Tree;

    fn listen_scroll(
        &self,
        scroller: &Self::Region,
        callback: Callback,
    ) -> Result<Self::Subscription, SidenoteError>;

    /// Watch child insertions, removals and text changes at any depth.
    fn observe_mutations(
        &self,
        content: &Self::Region,
        callback: Callback,
    ) -> Result<Self::Subscription, SidenoteError>;

    fn listen_resize(&self, callback: Callback) -> Result<Self::Subscription, SidenoteError>;

    fn clock(&self) -> Self::Clock;
}

/// Read and write access to the sidenotes of one editor root.
///
/// Handles are only valid for the duration of a single layout pass.
pub trait SidenoteTree {
    /// A note or marker element.
    type Element: Clone;
    /// A contiguous run of text inside a note.
    type TextUnit;

    /// All notes below the root, in document order.
    fn annotations(&self) -> Vec<Self::Element>;

    /// Current geometry of a note, `None` if the host can't measure it.
    fn geometry(&self, note: &Self::Element) -> Option<Geometry>;

    /// The nearest enclosing marker of a note.
    fn marker(&self, note: &Self::Element) -> Option<Self::Element>;

    fn is_rendered(&self, note: &Self::Element) -> bool;

    fn set_rendered(&mut self, note: &Self::Element, rendered: bool) -> Result<(), SidenoteError>;

    /// The text runs of a note in document order, skipping runs that already
    /// sit inside a link element.
    fn text_units(&self, note: &Self::Element) -> Vec<Self::TextUnit>;

    fn text(&self, unit: &Self::TextUnit) -> Option<String>;

    /// Replace a text run with the given segments, in order.
    fn replace_text(
        &mut self,
        unit: &Self::TextUnit,
        segments: &[Segment<'_>],
    ) -> Result<(), SidenoteError>;

    /// Write a sequence number onto a note or marker.
    fn set_number(&mut self, element: &Self::Element, number: usize) -> Result<(), SidenoteError>;

    /// Write the vertical rendering offset of a note.
    fn set_shift(&mut self, note: &Self::Element, shift: f64) -> Result<(), SidenoteError>;
}
