//! SidenotePlugin - the controller wrapper for JavaScript.

use sidenote_browser::{DomHost, SidenoteConfig, Sidenotes};
use wasm_bindgen::prelude::*;
use web_sys::Element;

/// Sidenote layout bound to the host editor's active view.
#[wasm_bindgen]
pub struct SidenotePlugin {
    sidenotes: Sidenotes<DomHost>,
}

#[wasm_bindgen]
impl SidenotePlugin {
    /// Create a plugin. `config` may be omitted or a partial config object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SidenotePlugin, JsError> {
        let config = parse_config(config)?;
        let host = DomHost::new(config.selectors.clone());
        Ok(Self {
            sidenotes: Sidenotes::new(host, config),
        })
    }

    /// Set the container element of the active editor view, or `null`.
    ///
    /// Takes effect on the next `viewChanged` / `layoutChanged`.
    #[wasm_bindgen(js_name = setActiveView)]
    pub fn set_active_view(&self, view: Option<Element>) {
        self.sidenotes.host().set_active_view(view);
    }

    /// Bind listeners and schedule the first layout pass.
    pub fn load(&self) {
        self.sidenotes.load();
    }

    #[wasm_bindgen(js_name = viewChanged)]
    pub fn view_changed(&self) {
        self.sidenotes.view_changed();
    }

    #[wasm_bindgen(js_name = layoutChanged)]
    pub fn layout_changed(&self) {
        self.sidenotes.layout_changed();
    }

    /// Request a layout pass on the next animation frame.
    pub fn schedule(&self) {
        self.sidenotes.schedule();
    }

    /// Run a layout pass immediately and return its report.
    #[wasm_bindgen(js_name = runPass)]
    pub fn run_pass(&self) -> Result<JsValue, JsError> {
        let report = self.sidenotes.run_pass();
        serde_wasm_bindgen::to_value(&report)
            .map_err(|e| JsError::new(&format!("Failed to serialize report: {}", e)))
    }

    /// Cancel pending work and remove every listener.
    pub fn unload(&self) {
        self.sidenotes.unload();
    }
}

fn parse_config(value: JsValue) -> Result<SidenoteConfig, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(SidenoteConfig::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsError::new(&format!("Invalid sidenote config: {}", e)))
}
