//! sidenote-core: Sidenote layout logic without framework dependencies.
//!
//! This crate provides:
//! - `Host` / `SidenoteTree` traits for the editor and render tree the notes live in
//! - `Scheduler` - debounced, one layout pass per frame
//! - `render_links` - `[label](target)` to link conversion inside note text
//! - `layout` - sequence numbers and collision-free vertical shifts
//! - `Sidenotes<H>` - the controller that rebinds listeners and runs passes
//! - `memory` - an in-memory host for headless use and tests

pub mod config;
mod controller;
mod error;
pub mod guard;
pub mod host;
pub mod layout;
pub mod links;
pub mod memory;
mod observer;
pub mod render;
pub mod scheduler;
pub mod types;

pub use config::{Selectors, SidenoteConfig};
pub use controller::Sidenotes;
pub use error::SidenoteError;
pub use guard::{MutationGuard, Suppressed};
pub use host::{Callback, Host, SidenoteTree, Subscription};
pub use layout::{Placement, plan};
pub use links::{
    LinkToken, LinkTokens, could_contain_link, is_allowed_target, is_js_whitespace, link_tokens,
    segments,
};
pub use observer::BindingKind;
pub use render::render_links;
pub use scheduler::{FrameClock, Scheduler};
pub use smol_str::SmolStr;
pub use types::{Geometry, PassReport, Segment};
