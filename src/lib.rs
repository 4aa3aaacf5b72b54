pub mod core;
pub mod services;
pub mod utils;
#[cfg(target_arch = "wasm32")]
pub mod ui;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
thread_local! {
    static BINDINGS: std::cell::RefCell<Option<ui::PageBindings>> = const { std::cell::RefCell::new(None) };
}

/// Page entry point; call once the DOM is ready.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).unwrap_or(());

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window is unavailable"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("document is unavailable"))?;

    let mut config = crate::core::config::Config::default();
    if let Ok(origin) = window.location().origin() {
        config.api_base_url = origin;
    }

    let bindings = ui::initialize(&document, &config)
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;

    // Replacing earlier bindings unbinds their handler, so a second start() doesn't double-fire.
    BINDINGS.with(|slot| *slot.borrow_mut() = Some(bindings));
    Ok(())
}

/// Unbinds the page handlers installed by `start`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn stop() {
    if let Some(bindings) = BINDINGS.with(|slot| slot.borrow_mut().take()) {
        bindings.dispose();
    }
}
