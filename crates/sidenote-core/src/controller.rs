//! The sidenote controller.
//!
//! Wires host events to the scheduler and runs layout passes: link
//! rendering first, then numbering and shifting, so geometry is read only
//! after the text has settled.

use std::cell::RefCell;
use std::rc::Rc;

use web_time::Instant;

use crate::config::SidenoteConfig;
use crate::guard::MutationGuard;
use crate::host::{Host, SidenoteTree};
use crate::layout;
use crate::observer::{self, BindingKind, Bindings};
use crate::render::render_links;
use crate::scheduler::Scheduler;
use crate::types::PassReport;

pub(crate) struct Shared<H: Host> {
    pub(crate) host: H,
    pub(crate) config: SidenoteConfig,
    pub(crate) scheduler: Scheduler<H::Clock>,
    pub(crate) guard: MutationGuard,
    pub(crate) bindings: RefCell<Bindings<H::Subscription>>,
    /// Bound once per controller, not per view.
    resize: RefCell<Option<H::Subscription>>,
}

impl<H: Host> Shared<H> {
    pub(crate) fn schedule(shared: &Rc<Self>) {
        let weak = Rc::downgrade(shared);
        shared.scheduler.schedule(move || {
            if let Some(shared) = weak.upgrade() {
                shared.run_pass();
            }
        });
    }

    fn run_pass(&self) -> PassReport {
        let started = Instant::now();

        let Some(view) = self.host.active_view() else {
            return PassReport::default();
        };
        let Some(root) = self.host.editor_root(&view) else {
            return PassReport::default();
        };

        let mut tree = self.host.tree(&root);
        let notes = tree.annotations();
        if notes.is_empty() {
            return PassReport::default();
        }

        let links_rendered = render_links(
            &mut tree,
            &notes,
            &self.config.allowed_protocols,
            &self.guard,
            || self.bindings.borrow().discard_pending_mutations(),
        );

        let geometries: Vec<_> = notes.iter().map(|note| tree.geometry(note)).collect();
        let placements = layout::plan(
            &geometries,
            self.config.spacing,
            self.config.shift_threshold,
        );
        let report = PassReport {
            links_rendered,
            ..layout::apply(&mut tree, &notes, &placements)
        };

        tracing::debug!(
            notes = notes.len(),
            links = report.links_rendered,
            numbered = report.numbered,
            shifted = report.shifted,
            skipped = report.skipped,
            elapsed = ?started.elapsed(),
            "sidenote layout pass"
        );
        report
    }
}

/// Keeps the sidenotes of the active view numbered, spaced and linked.
///
/// Listener closures only hold weak references, so dropping the controller
/// tears down every binding and cancels any pending pass.
pub struct Sidenotes<H: Host> {
    shared: Rc<Shared<H>>,
}

impl<H: Host> Sidenotes<H> {
    pub fn new(host: H, config: SidenoteConfig) -> Self {
        let scheduler = Scheduler::new(host.clock());
        Self {
            shared: Rc::new(Shared {
                host,
                config,
                scheduler,
                guard: MutationGuard::new(),
                bindings: RefCell::new(Bindings::new()),
                resize: RefCell::new(None),
            }),
        }
    }

    /// Bind the resize listener, attach to the active view and schedule the
    /// first pass.
    pub fn load(&self) {
        let weak = Rc::downgrade(&self.shared);
        let on_resize = Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                Shared::schedule(&shared);
            }
        });
        match self.shared.host.listen_resize(on_resize) {
            Ok(sub) => {
                let previous = self.shared.resize.borrow_mut().replace(sub);
                drop(previous);
            }
            Err(e) => tracing::warn!("failed to listen for resize: {}", e),
        }

        self.rebind();
        self.schedule();
    }

    /// The host switched its active view.
    pub fn view_changed(&self) {
        self.rebind();
        self.schedule();
    }

    /// The host rearranged its layout.
    pub fn layout_changed(&self) {
        self.rebind();
        self.schedule();
    }

    /// Tear down all view bindings and attach fresh ones.
    pub fn rebind(&self) {
        observer::rebind(&self.shared);
    }

    /// Request a layout pass on the next frame.
    pub fn schedule(&self) {
        Shared::schedule(&self.shared);
    }

    /// Run a layout pass right now.
    pub fn run_pass(&self) -> PassReport {
        self.shared.run_pass()
    }

    /// Cancel the pending pass and tear down every binding, resize included.
    pub fn unload(&self) {
        self.shared.scheduler.cancel();
        self.shared.bindings.borrow_mut().teardown();
        let resize = self.shared.resize.borrow_mut().take();
        drop(resize);
        tracing::debug!("sidenotes unloaded");
    }

    pub fn is_pending(&self) -> bool {
        self.shared.scheduler.is_pending()
    }

    /// Kinds of the bindings attached to the current view.
    pub fn bindings(&self) -> Vec<BindingKind> {
        self.shared.bindings.borrow().kinds()
    }

    pub fn host(&self) -> &H {
        &self.shared.host
    }

    pub fn config(&self) -> &SidenoteConfig {
        &self.shared.config
    }
}
