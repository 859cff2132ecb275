//! Frame-coalesced scheduling of layout passes.
//!
//! Scroll, resize and mutation events arrive in bursts. `Scheduler` turns a
//! burst into a single pass on the next frame: every `schedule()` cancels the
//! request still pending and replaces it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::SidenoteError;

/// A source of "next rendering opportunity" callbacks.
///
/// The browser implementation wraps `requestAnimationFrame`. Implementations
/// must never run the callback from inside `request`.
pub trait FrameClock {
    /// Identifies a pending request. Some clocks keep the callback alive
    /// through it, so it is only dropped once the callback has finished.
    type Handle: 'static;

    /// Queue `callback` for the next frame.
    fn request(&self, callback: Box<dyn FnOnce()>) -> Result<Self::Handle, SidenoteError>;

    /// Cancel a request that has not fired yet.
    fn cancel(&self, handle: Self::Handle);
}

/// Debounces layout requests down to at most one pass per frame.
pub struct Scheduler<C: FrameClock> {
    clock: C,
    slots: Rc<RefCell<Slots<C::Handle>>>,
}

struct Slots<H> {
    pending: Option<H>,
    /// Handle of the request that last fired, dropped on the next call.
    spent: Option<H>,
}

impl<C: FrameClock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            slots: Rc::new(RefCell::new(Slots {
                pending: None,
                spent: None,
            })),
        }
    }

    /// Request one future run of `pass`, replacing any pending request.
    pub fn schedule(&self, pass: impl FnOnce() + 'static) {
        self.cancel();

        let slots = Rc::downgrade(&self.slots);
        let callback = Box::new(move || {
            if let Some(slots) = slots.upgrade() {
                let mut slots = slots.borrow_mut();
                let fired = slots.pending.take();
                slots.spent = fired;
            }
            pass();
        });

        match self.clock.request(callback) {
            Ok(handle) => {
                tracing::trace!("layout pass scheduled");
                self.slots.borrow_mut().pending = Some(handle);
            }
            Err(e) => tracing::warn!("failed to request frame: {}", e),
        }
    }

    /// Cancel the pending request, if any. Safe to call at any time.
    pub fn cancel(&self) {
        let (pending, spent) = {
            let mut slots = self.slots.borrow_mut();
            (slots.pending.take(), slots.spent.take())
        };
        drop(spent);
        if let Some(handle) = pending {
            tracing::trace!("pending layout pass cancelled");
            self.clock.cancel(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slots.borrow().pending.is_some()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: FrameClock> Drop for Scheduler<C> {
    fn drop(&mut self) {
        self.cancel();
    }
}
