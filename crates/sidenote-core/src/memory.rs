//! In-memory host.
//!
//! A headless stand-in for an editor application: documents hold notes with
//! fixed geometry, listeners fire when told to, frames advance manually and
//! mutation notifications queue up until [`MemoryHost::flush`], the way DOM
//! mutation records are delivered after the edits that caused them.
//! [`MemoryDocument::on_edit`] can deliver them synchronously instead.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::SidenoteError;
use crate::host::{Callback, Host, SidenoteTree, Subscription};
use crate::scheduler::FrameClock;
use crate::types::{Geometry, Segment};

// === Frame clock ===

/// Frame clock advanced by hand.
#[derive(Clone, Default)]
pub struct ManualClock {
    queue: Rc<RefCell<FrameQueue>>,
}

#[derive(Default)]
struct FrameQueue {
    next_id: u64,
    callbacks: BTreeMap<u64, Box<dyn FnOnce()>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback queued before this call. Callbacks requested while
    /// running land in the next frame. Returns how many ran.
    pub fn advance(&self) -> usize {
        let due = std::mem::take(&mut self.queue.borrow_mut().callbacks);
        let count = due.len();
        for (_, callback) in due {
            callback();
        }
        count
    }

    /// Number of callbacks waiting for the next frame.
    pub fn queued(&self) -> usize {
        self.queue.borrow().callbacks.len()
    }
}

impl FrameClock for ManualClock {
    type Handle = u64;

    fn request(&self, callback: Box<dyn FnOnce()>) -> Result<u64, SidenoteError> {
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        queue.callbacks.insert(id, callback);
        Ok(id)
    }

    fn cancel(&self, handle: u64) {
        let removed = self.queue.borrow_mut().callbacks.remove(&handle);
        drop(removed);
    }
}

// === Documents ===

#[derive(Debug, Clone, PartialEq)]
enum Inline {
    Text(String),
    Link { label: String, href: String },
}

#[derive(Debug)]
struct NoteState {
    geometry: Option<Geometry>,
    content: Vec<(u64, Inline)>,
    number: Option<usize>,
    shift: Option<f64>,
    rendered: bool,
    /// Number written onto the enclosing marker, if the note has one.
    marker: Option<Option<usize>>,
}

#[derive(Default)]
struct EditHook(Option<Callback>);

impl fmt::Debug for EditHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "EditHook(set)" } else { "EditHook(none)" })
    }
}

#[derive(Debug, Default)]
struct DocState {
    notes: Vec<NoteState>,
    next_id: u64,
    mutations: u64,
    on_edit: EditHook,
}

impl DocState {
    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn note(&self, index: usize) -> Result<&NoteState, SidenoteError> {
        self.notes.get(index).ok_or(SidenoteError::Detached)
    }

    fn note_mut(&mut self, index: usize) -> Result<&mut NoteState, SidenoteError> {
        self.notes.get_mut(index).ok_or(SidenoteError::Detached)
    }
}

/// A document of sidenotes, shared between the test and the host.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    state: Rc<RefCell<DocState>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a note with a single text run. Returns its index.
    pub fn push_note(&self, top: f64, height: f64, text: &str) -> usize {
        let mut state = self.state.borrow_mut();
        let id = state.fresh_id();
        state.notes.push(NoteState {
            geometry: Some(Geometry::new(top, height)),
            content: vec![(id, Inline::Text(text.to_string()))],
            number: None,
            shift: None,
            rendered: false,
            marker: None,
        });
        state.mutations += 1;
        let index = state.notes.len() - 1;
        drop(state);
        self.edited();
        index
    }

    /// Give a note an enclosing marker.
    pub fn add_marker(&self, note: usize) {
        if let Some(state) = self.state.borrow_mut().notes.get_mut(note) {
            state.marker.get_or_insert(None);
        }
    }

    pub fn set_geometry(&self, note: usize, geometry: Option<Geometry>) {
        if let Some(state) = self.state.borrow_mut().notes.get_mut(note) {
            state.geometry = geometry;
        }
    }

    /// Replace a note's whole content with one text run, as an external edit.
    pub fn set_text(&self, note: usize, text: &str) {
        let mut state = self.state.borrow_mut();
        let id = state.fresh_id();
        if let Some(target) = state.notes.get_mut(note) {
            target.content = vec![(id, Inline::Text(text.to_string()))];
            state.mutations += 1;
        }
        drop(state);
        self.edited();
    }

    /// Append a separate text run to a note, as an external edit.
    pub fn append_text(&self, note: usize, text: &str) {
        let mut state = self.state.borrow_mut();
        let id = state.fresh_id();
        if let Some(target) = state.notes.get_mut(note) {
            target.content.push((id, Inline::Text(text.to_string())));
            state.mutations += 1;
        }
        drop(state);
        self.edited();
    }

    /// Run `hook` right after every text or structural edit, including the
    /// ones made through [`MemoryTree`].
    pub fn on_edit(&self, hook: impl Fn() + 'static) {
        self.state.borrow_mut().on_edit = EditHook(Some(Rc::new(hook)));
    }

    fn edited(&self) {
        let hook = self.state.borrow().on_edit.0.clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    pub fn len(&self) -> usize {
        self.state.borrow().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Structural and text edits made so far, by anyone.
    pub fn mutation_count(&self) -> u64 {
        self.state.borrow().mutations
    }

    pub fn tree(&self) -> MemoryTree {
        MemoryTree { doc: self.clone() }
    }

    pub fn note_element(&self, note: usize) -> MemoryElement {
        MemoryElement::Note(note)
    }

    /// Text content of a note, link labels included.
    pub fn note_text(&self, note: usize) -> String {
        let state = self.state.borrow();
        let Some(target) = state.notes.get(note) else {
            return String::new();
        };
        target
            .content
            .iter()
            .map(|(_, inline)| match inline {
                Inline::Text(text) => text.as_str(),
                Inline::Link { label, .. } => label.as_str(),
            })
            .collect()
    }

    pub fn number(&self, note: usize) -> Option<usize> {
        self.state.borrow().notes.get(note)?.number
    }

    pub fn marker_number(&self, note: usize) -> Option<usize> {
        self.state.borrow().notes.get(note)?.marker?
    }

    pub fn shift(&self, note: usize) -> Option<f64> {
        self.state.borrow().notes.get(note)?.shift
    }

    pub fn is_rendered(&self, note: usize) -> bool {
        self.state
            .borrow()
            .notes
            .get(note)
            .is_some_and(|n| n.rendered)
    }

    pub fn link_count(&self, note: usize) -> usize {
        self.state.borrow().notes.get(note).map_or(0, |n| {
            n.content
                .iter()
                .filter(|(_, inline)| matches!(inline, Inline::Link { .. }))
                .count()
        })
    }

    /// One line per note: number, shift, marker, flag, then the content
    /// with links written as `<a>` tags.
    pub fn dump(&self) -> String {
        let state = self.state.borrow();
        let numbered = |n: Option<usize>| n.map_or_else(|| "-".to_string(), |n| format!("#{n}"));

        state
            .notes
            .iter()
            .map(|note| {
                let mut line = format!(
                    "{} shift={}",
                    numbered(note.number),
                    note.shift.map_or_else(|| "-".to_string(), |s| s.to_string())
                );
                if let Some(marker) = note.marker {
                    line.push_str(&format!(" marker={}", numbered(marker)));
                }
                if note.rendered {
                    line.push_str(" rendered");
                }
                line.push_str(" | ");
                for (_, inline) in &note.content {
                    match inline {
                        Inline::Text(text) => line.push_str(text),
                        Inline::Link { label, href } => {
                            line.push_str(&format!("<a href=\"{href}\">{label}</a>"))
                        }
                    }
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A note or its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryElement {
    Note(usize),
    Marker(usize),
}

/// A text run inside a note, stable across edits to its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryTextUnit {
    note: usize,
    id: u64,
}

/// [`SidenoteTree`] over a [`MemoryDocument`].
#[derive(Debug, Clone)]
pub struct MemoryTree {
    doc: MemoryDocument,
}

impl SidenoteTree for MemoryTree {
    type Element = MemoryElement;
    type TextUnit = MemoryTextUnit;

    fn annotations(&self) -> Vec<MemoryElement> {
        (0..self.doc.len()).map(MemoryElement::Note).collect()
    }

    fn geometry(&self, note: &MemoryElement) -> Option<Geometry> {
        match *note {
            MemoryElement::Note(i) => self.doc.state.borrow().notes.get(i)?.geometry,
            MemoryElement::Marker(_) => None,
        }
    }

    fn marker(&self, note: &MemoryElement) -> Option<MemoryElement> {
        match *note {
            MemoryElement::Note(i) => {
                let state = self.doc.state.borrow();
                state.notes.get(i)?.marker.map(|_| MemoryElement::Marker(i))
            }
            MemoryElement::Marker(_) => None,
        }
    }

    fn is_rendered(&self, note: &MemoryElement) -> bool {
        match *note {
            MemoryElement::Note(i) => self.doc.is_rendered(i),
            MemoryElement::Marker(_) => false,
        }
    }

    fn set_rendered(&mut self, note: &MemoryElement, rendered: bool) -> Result<(), SidenoteError> {
        match *note {
            MemoryElement::Note(i) => {
                self.doc.state.borrow_mut().note_mut(i)?.rendered = rendered;
                Ok(())
            }
            MemoryElement::Marker(_) => Err(SidenoteError::Unsupported("marker".into())),
        }
    }

    fn text_units(&self, note: &MemoryElement) -> Vec<MemoryTextUnit> {
        let MemoryElement::Note(i) = *note else {
            return Vec::new();
        };
        let state = self.doc.state.borrow();
        let Ok(target) = state.note(i) else {
            return Vec::new();
        };
        target
            .content
            .iter()
            .filter(|(_, inline)| matches!(inline, Inline::Text(_)))
            .map(|&(id, _)| MemoryTextUnit { note: i, id })
            .collect()
    }

    fn text(&self, unit: &MemoryTextUnit) -> Option<String> {
        let state = self.doc.state.borrow();
        state
            .notes
            .get(unit.note)?
            .content
            .iter()
            .find_map(|(id, inline)| match inline {
                Inline::Text(text) if *id == unit.id => Some(text.clone()),
                _ => None,
            })
    }

    fn replace_text(
        &mut self,
        unit: &MemoryTextUnit,
        segments: &[Segment<'_>],
    ) -> Result<(), SidenoteError> {
        let mut state = self.doc.state.borrow_mut();
        let position = state
            .note(unit.note)?
            .content
            .iter()
            .position(|(id, _)| *id == unit.id)
            .ok_or(SidenoteError::Detached)?;

        let mut replacement = Vec::with_capacity(segments.len());
        for segment in segments {
            let inline = match *segment {
                Segment::Text("") => continue,
                Segment::Text(text) => Inline::Text(text.to_string()),
                Segment::Link { label, target } => Inline::Link {
                    label: label.to_string(),
                    href: target.to_string(),
                },
            };
            replacement.push((state.fresh_id(), inline));
        }

        state
            .note_mut(unit.note)?
            .content
            .splice(position..=position, replacement);
        state.mutations += 1;
        drop(state);
        self.doc.edited();
        Ok(())
    }

    fn set_number(&mut self, element: &MemoryElement, number: usize) -> Result<(), SidenoteError> {
        let mut state = self.doc.state.borrow_mut();
        match *element {
            MemoryElement::Note(i) => state.note_mut(i)?.number = Some(number),
            MemoryElement::Marker(i) => {
                let marker = state.note_mut(i)?.marker.as_mut().ok_or(SidenoteError::Detached)?;
                *marker = Some(number);
            }
        }
        Ok(())
    }

    fn set_shift(&mut self, note: &MemoryElement, shift: f64) -> Result<(), SidenoteError> {
        match *note {
            MemoryElement::Note(i) => {
                self.doc.state.borrow_mut().note_mut(i)?.shift = Some(shift);
                Ok(())
            }
            MemoryElement::Marker(_) => Err(SidenoteError::Unsupported("marker".into())),
        }
    }
}

// === Views and host ===

/// An editor view showing one document.
///
/// Each region can be removed to model views that lack it.
#[derive(Debug, Clone)]
pub struct MemoryView {
    document: MemoryDocument,
    root: bool,
    scroller: bool,
    content: bool,
}

impl MemoryView {
    pub fn new(document: &MemoryDocument) -> Self {
        Self {
            document: document.clone(),
            root: true,
            scroller: true,
            content: true,
        }
    }

    pub fn without_root(mut self) -> Self {
        self.root = false;
        self
    }

    pub fn without_scroller(mut self) -> Self {
        self.scroller = false;
        self
    }

    pub fn without_content(mut self) -> Self {
        self.content = false;
        self
    }

    pub fn document(&self) -> &MemoryDocument {
        &self.document
    }
}

/// A region of a [`MemoryView`].
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    view: MemoryView,
}

enum ListenerKind {
    Scroll,
    Resize,
    Mutations { document: MemoryDocument, seen: u64 },
}

struct Listener {
    kind: ListenerKind,
    callback: Callback,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
}

/// Registration handle returned by [`MemoryHost`].
pub struct MemorySubscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Subscription for MemorySubscription {
    fn discard_pending(&self) {
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };
        let mut listeners = listeners.borrow_mut();
        if let Some(Listener {
            kind: ListenerKind::Mutations { document, seen },
            ..
        }) = listeners.entries.get_mut(&self.id)
        {
            *seen = document.mutation_count();
        }
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let removed = listeners.borrow_mut().entries.remove(&self.id);
            drop(removed);
        }
    }
}

/// Host application with a single active view slot.
#[derive(Clone, Default)]
pub struct MemoryHost {
    active: Rc<RefCell<Option<MemoryView>>>,
    listeners: Rc<RefCell<Listeners>>,
    clock: ManualClock,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the active view. The controller only notices on `view_changed`.
    pub fn set_active(&self, view: Option<MemoryView>) {
        *self.active.borrow_mut() = view;
    }

    /// Fire every scroll listener.
    pub fn scroll(&self) -> usize {
        self.fire(|kind| matches!(kind, ListenerKind::Scroll))
    }

    /// Fire every resize listener.
    pub fn resize(&self) -> usize {
        self.fire(|kind| matches!(kind, ListenerKind::Resize))
    }

    /// Deliver queued mutation notifications, one per watch with unseen
    /// edits. Returns how many watches were notified.
    pub fn flush(&self) -> usize {
        let due: Vec<Callback> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners
                .entries
                .values_mut()
                .filter_map(|listener| match &mut listener.kind {
                    ListenerKind::Mutations { document, seen } => {
                        let count = document.mutation_count();
                        (count > *seen).then(|| {
                            *seen = count;
                            Rc::clone(&listener.callback)
                        })
                    }
                    _ => None,
                })
                .collect()
        };
        for callback in &due {
            callback();
        }
        due.len()
    }

    /// Run the next frame.
    pub fn advance_frame(&self) -> usize {
        self.clock.advance()
    }

    pub fn queued_frames(&self) -> usize {
        self.clock.queued()
    }

    pub fn scroll_listeners(&self) -> usize {
        self.count(|kind| matches!(kind, ListenerKind::Scroll))
    }

    pub fn resize_listeners(&self) -> usize {
        self.count(|kind| matches!(kind, ListenerKind::Resize))
    }

    pub fn mutation_watches(&self) -> usize {
        self.count(|kind| matches!(kind, ListenerKind::Mutations { .. }))
    }

    fn count(&self, pick: impl Fn(&ListenerKind) -> bool) -> usize {
        self.listeners
            .borrow()
            .entries
            .values()
            .filter(|l| pick(&l.kind))
            .count()
    }

    fn fire(&self, pick: impl Fn(&ListenerKind) -> bool) -> usize {
        let due: Vec<Callback> = self
            .listeners
            .borrow()
            .entries
            .values()
            .filter(|l| pick(&l.kind))
            .map(|l| Rc::clone(&l.callback))
            .collect();
        for callback in &due {
            callback();
        }
        due.len()
    }

    fn register(&self, kind: ListenerKind, callback: Callback) -> MemorySubscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.insert(id, Listener { kind, callback });
        MemorySubscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }
}

impl Host for MemoryHost {
    type View = MemoryView;
    type Region = MemoryRegion;
    type Tree = MemoryTree;
    type Subscription = MemorySubscription;
    type Clock = ManualClock;

    fn active_view(&self) -> Option<MemoryView> {
        self.active.borrow().clone()
    }

    fn editor_root(&self, view: &MemoryView) -> Option<MemoryRegion> {
        view.root.then(|| MemoryRegion { view: view.clone() })
    }

    fn scroller(&self, root: &MemoryRegion) -> Option<MemoryRegion> {
        root.view.scroller.then(|| root.clone())
    }

    fn content(&self, root: &MemoryRegion) -> Option<MemoryRegion> {
        root.view.content.then(|| root.clone())
    }

    fn tree(&self, root: &MemoryRegion) -> MemoryTree {
        root.view.document.tree()
    }

    fn listen_scroll(
        &self,
        _scroller: &MemoryRegion,
        callback: Callback,
    ) -> Result<MemorySubscription, SidenoteError> {
        Ok(self.register(ListenerKind::Scroll, callback))
    }

    fn observe_mutations(
        &self,
        content: &MemoryRegion,
        callback: Callback,
    ) -> Result<MemorySubscription, SidenoteError> {
        let document = content.view.document.clone();
        let seen = document.mutation_count();
        Ok(self.register(ListenerKind::Mutations { document, seen }, callback))
    }

    fn listen_resize(&self, callback: Callback) -> Result<MemorySubscription, SidenoteError> {
        Ok(self.register(ListenerKind::Resize, callback))
    }

    fn clock(&self) -> ManualClock {
        self.clock.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_replace_keeps_sibling_units_valid() {
        let doc = MemoryDocument::new();
        let note = doc.push_note(0.0, 10.0, "[a](https://a)");
        doc.append_text(note, " and [b](https://b)");

        let mut tree = doc.tree();
        let units = tree.text_units(&MemoryElement::Note(note));
        assert_eq!(units.len(), 2);

        tree.replace_text(&units[0], &[Segment::Link { label: "a", target: "https://a" }])
            .unwrap();
        tree.replace_text(
            &units[1],
            &[Segment::Text(" and "), Segment::Link { label: "b", target: "https://b" }],
        )
        .unwrap();

        assert_eq!(doc.link_count(note), 2);
        assert_eq!(doc.note_text(note), "a and b");
        assert_eq!(tree.text_units(&MemoryElement::Note(note)).len(), 1);
    }

    #[test]
    fn test_stale_unit_is_detached() {
        let doc = MemoryDocument::new();
        let note = doc.push_note(0.0, 10.0, "x");
        let mut tree = doc.tree();
        let unit = tree.text_units(&MemoryElement::Note(note))[0];

        doc.set_text(note, "y");
        assert_eq!(tree.text(&unit), None);
        assert_eq!(
            tree.replace_text(&unit, &[Segment::Text("z")]),
            Err(SidenoteError::Detached)
        );
    }

    #[test]
    fn test_flush_delivers_once_per_batch() {
        let host = MemoryHost::new();
        let doc = MemoryDocument::new();
        doc.push_note(0.0, 10.0, "x");
        let view = MemoryView::new(&doc);
        let root = host.editor_root(&view).unwrap();

        let hits = Rc::new(Cell::new(0));
        let hits_in_cb = Rc::clone(&hits);
        let watch = host
            .observe_mutations(&root, Rc::new(move || hits_in_cb.set(hits_in_cb.get() + 1)))
            .unwrap();

        assert_eq!(host.flush(), 0);
        doc.set_text(0, "a");
        doc.set_text(0, "b");
        assert_eq!(host.flush(), 1);
        assert_eq!(hits.get(), 1);

        doc.set_text(0, "c");
        watch.discard_pending();
        assert_eq!(host.flush(), 0);

        drop(watch);
        assert_eq!(host.mutation_watches(), 0);
    }
}
