//! Listener bindings for the active view.
//!
//! Every view or layout change throws the whole binding set away and builds
//! a fresh one. Nothing is diffed, so no listener can outlive the view it
//! was attached to.

use std::rc::Rc;

use crate::controller::Shared;
use crate::host::{Host, SidenoteTree, Subscription};

/// What a binding listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Scroll,
    Mutations,
    Resize,
}

struct Binding<S> {
    kind: BindingKind,
    subscription: S,
}

/// The listeners currently attached to the active view.
pub(crate) struct Bindings<S> {
    entries: Vec<Binding<S>>,
}

impl<S: Subscription> Bindings<S> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, kind: BindingKind, subscription: S) {
        self.entries.push(Binding { kind, subscription });
    }

    /// Run every teardown action and empty the set.
    pub(crate) fn teardown(&mut self) {
        for binding in self.entries.drain(..) {
            tracing::trace!(kind = ?binding.kind, "tearing down binding");
            drop(binding.subscription);
        }
    }

    /// Forget mutation notifications that haven't been delivered yet.
    pub(crate) fn discard_pending_mutations(&self) {
        self.entries
            .iter()
            .filter(|b| b.kind == BindingKind::Mutations)
            .for_each(|b| b.subscription.discard_pending());
    }

    pub(crate) fn kinds(&self) -> Vec<BindingKind> {
        self.entries.iter().map(|b| b.kind).collect()
    }
}

/// Tear down the current bindings and attach fresh ones to the active view.
///
/// Leaves the set empty when there is no active view or editor root.
pub(crate) fn rebind<H: Host>(shared: &Rc<Shared<H>>) {
    // Drop the old subscriptions before touching the host again.
    let mut old = std::mem::replace(&mut *shared.bindings.borrow_mut(), Bindings::new());
    old.teardown();

    let Some(view) = shared.host.active_view() else {
        tracing::trace!("no active view, nothing to bind");
        return;
    };
    let Some(root) = shared.host.editor_root(&view) else {
        tracing::trace!("active view has no editor root, nothing to bind");
        return;
    };

    let mut fresh = Bindings::new();

    if let Some(scroller) = shared.host.scroller(&root) {
        let weak = Rc::downgrade(shared);
        let on_scroll = Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                Shared::schedule(&shared);
            }
        });
        match shared.host.listen_scroll(&scroller, on_scroll) {
            Ok(sub) => fresh.push(BindingKind::Scroll, sub),
            Err(e) => tracing::warn!("failed to listen for scroll: {}", e),
        }
    }

    if let Some(content) = shared.host.content(&root) {
        let weak = Rc::downgrade(shared);
        let watched_root = root.clone();
        let on_mutation = Rc::new(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if shared.guard.is_suppressed() {
                return;
            }
            // The host may have re-rendered converted notes from source text.
            clear_rendered_flags(&mut shared.host.tree(&watched_root));
            Shared::schedule(&shared);
        });
        match shared.host.observe_mutations(&content, on_mutation) {
            Ok(sub) => fresh.push(BindingKind::Mutations, sub),
            Err(e) => tracing::warn!("failed to observe mutations: {}", e),
        }
    }

    tracing::debug!(bindings = ?fresh.kinds(), "rebound to active view");
    *shared.bindings.borrow_mut() = fresh;
}

fn clear_rendered_flags<T: SidenoteTree>(tree: &mut T) {
    for note in tree.annotations() {
        if !tree.is_rendered(&note) {
            continue;
        }
        if let Err(e) = tree.set_rendered(&note, false) {
            tracing::warn!("failed to clear rendered flag: {}", e);
        }
    }
}
