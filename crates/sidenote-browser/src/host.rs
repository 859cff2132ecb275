//! DOM host: the active view, its regions and event subscriptions.
//!
//! The embedding application tells the host which view element is active;
//! everything else is found below it with the configured selectors.

use std::cell::RefCell;

use gloo_events::EventListener;
use sidenote_core::{Callback, Host, Selectors, SidenoteError, Subscription};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MutationObserver, MutationObserverInit, Window};

use crate::frame::AnimationFrameClock;
use crate::js_error;
use crate::tree::DomTree;

type MutationCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

/// Browser implementation of [`Host`].
pub struct DomHost {
    window: Window,
    active: RefCell<Option<Element>>,
    selectors: Selectors,
}

impl DomHost {
    pub fn new(selectors: Selectors) -> Self {
        Self::with_window(gloo_utils::window(), selectors)
    }

    pub fn with_window(window: Window, selectors: Selectors) -> Self {
        Self {
            window,
            active: RefCell::new(None),
            selectors,
        }
    }

    /// Set the container element of the active view, or `None` when no
    /// editable view is active.
    pub fn set_active_view(&self, view: Option<Element>) {
        *self.active.borrow_mut() = view;
    }

    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    fn find(&self, scope: &Element, selector: &str) -> Option<Element> {
        match scope.query_selector(selector) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(selector, "querySelector failed: {:?}", e);
                None
            }
        }
    }
}

/// A DOM listener or observer, removed when dropped.
pub enum DomSubscription {
    Listener(EventListener),
    Mutations {
        observer: MutationObserver,
        _callback: MutationCallback,
    },
}

impl Subscription for DomSubscription {
    fn discard_pending(&self) {
        if let DomSubscription::Mutations { observer, .. } = self {
            // Records queued for the next microtask are dropped here.
            let _ = observer.take_records();
        }
    }
}

impl Drop for DomSubscription {
    fn drop(&mut self) {
        if let DomSubscription::Mutations { observer, .. } = self {
            observer.disconnect();
        }
    }
}

impl Host for DomHost {
    type View = Element;
    type Region = Element;
    type Tree = DomTree;
    type Subscription = DomSubscription;
    type Clock = AnimationFrameClock;

    fn active_view(&self) -> Option<Element> {
        self.active.borrow().clone()
    }

    fn editor_root(&self, view: &Element) -> Option<Element> {
        self.find(view, &self.selectors.root)
    }

    fn scroller(&self, root: &Element) -> Option<Element> {
        self.find(root, &self.selectors.scroller)
    }

    fn content(&self, root: &Element) -> Option<Element> {
        self.find(root, &self.selectors.content)
    }

    fn tree(&self, root: &Element) -> DomTree {
        DomTree::new(root.clone(), self.selectors.clone())
    }

    fn listen_scroll(
        &self,
        scroller: &Element,
        callback: Callback,
    ) -> Result<DomSubscription, SidenoteError> {
        // gloo registers listeners as passive by default.
        let listener = EventListener::new(scroller, "scroll", move |_| callback());
        Ok(DomSubscription::Listener(listener))
    }

    fn observe_mutations(
        &self,
        content: &Element,
        callback: Callback,
    ) -> Result<DomSubscription, SidenoteError> {
        let closure: MutationCallback = Closure::wrap(Box::new(
            move |_records: js_sys::Array, _observer: MutationObserver| callback(),
        )
            as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())
            .map_err(|e| js_error("MutationObserver", e))?;

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        init.set_character_data(true);

        let node: &web_sys::Node = content.as_ref();
        observer
            .observe_with_options(node, &init)
            .map_err(|e| js_error("MutationObserver.observe", e))?;

        Ok(DomSubscription::Mutations {
            observer,
            _callback: closure,
        })
    }

    fn listen_resize(&self, callback: Callback) -> Result<DomSubscription, SidenoteError> {
        let listener = EventListener::new(&self.window, "resize", move |_| callback());
        Ok(DomSubscription::Listener(listener))
    }

    fn clock(&self) -> AnimationFrameClock {
        AnimationFrameClock::new(self.window.clone())
    }
}
