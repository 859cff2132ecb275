//! WASM bindings for sidenote layout.
//!
//! Exposes a `SidenotePlugin` object for the JavaScript plugin shell of the
//! host editor. The shell forwards its workspace events:
//!
//! ```js
//! const plugin = new SidenotePlugin({ spacing: 8 });
//! plugin.setActiveView(view?.containerEl ?? null);
//! plugin.load();
//! workspace.on("active-leaf-change", () => {
//!   plugin.setActiveView(activeContainer());
//!   plugin.viewChanged();
//! });
//! workspace.on("layout-change", () => plugin.layoutChanged());
//! // on unload
//! plugin.unload();
//! ```

mod plugin;

pub use plugin::*;

use wasm_bindgen::prelude::*;

/// Initialize panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    // Another module may already have installed a subscriber.
    let _ = set_global_default(Registry::default().with(wasm_layer));
}
