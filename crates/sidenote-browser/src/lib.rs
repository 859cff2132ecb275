//! Browser DOM host for sidenote layout.
//!
//! This crate implements the `sidenote-core` host traits on top of the real
//! DOM. It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `host`: active view tracking, region lookup, scroll/resize listeners
//!   and `MutationObserver` watches
//! - `tree`: reading note geometry and rewriting note text
//! - `frame`: `requestAnimationFrame`-backed frame clock
//!
//! # Re-exports
//!
//! This crate re-exports `sidenote-core` for convenience, so consumers
//! only need to depend on `sidenote-browser`.

// Re-export core crate
pub use sidenote_core;
pub use sidenote_core::*;

pub mod frame;
pub mod host;
pub mod tree;

pub use frame::{AnimationFrameClock, FrameRequest};
pub use host::{DomHost, DomSubscription};
pub use tree::DomTree;

/// Attribute holding a note's (and its marker's) sequence number.
pub const NUMBER_ATTR: &str = "data-sidenote-num";

/// Attribute marking a note whose links have been converted.
pub const RENDERED_ATTR: &str = "data-md-links-rendered";

/// CSS custom property carrying a note's vertical shift.
pub const SHIFT_PROPERTY: &str = "--sidenote-shift";

/// Convert a JS exception into a host error.
pub(crate) fn js_error(context: &str, err: wasm_bindgen::JsValue) -> SidenoteError {
    SidenoteError::Host(format!("{context}: {err:?}"))
}
