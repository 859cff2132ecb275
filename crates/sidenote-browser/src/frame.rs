//! `requestAnimationFrame`-backed frame clock.

use sidenote_core::{FrameClock, SidenoteError};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

use crate::js_error;

/// Frame clock running callbacks on the browser's next animation frame.
#[derive(Clone)]
pub struct AnimationFrameClock {
    window: Window,
}

impl AnimationFrameClock {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Default for AnimationFrameClock {
    fn default() -> Self {
        Self::new(gloo_utils::window())
    }
}

/// A pending animation frame.
///
/// Owns the JS closure, which must stay alive until the frame fires or is
/// cancelled.
pub struct FrameRequest {
    id: i32,
    _callback: Closure<dyn FnMut()>,
}

impl FrameClock for AnimationFrameClock {
    type Handle = FrameRequest;

    fn request(&self, callback: Box<dyn FnOnce()>) -> Result<FrameRequest, SidenoteError> {
        let closure: Closure<dyn FnMut()> = Closure::once(callback);
        let id = self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .map_err(|e| js_error("requestAnimationFrame", e))?;
        Ok(FrameRequest {
            id,
            _callback: closure,
        })
    }

    fn cancel(&self, handle: FrameRequest) {
        if let Err(e) = self.window.cancel_animation_frame(handle.id) {
            tracing::warn!("cancelAnimationFrame failed: {:?}", e);
        }
    }
}
