//! WASM API for the page: installs the window/level runtime and exposes
//! per-slot reset and inspection. Minimal logic, bridge to the lower layers.

use wasm_bindgen::prelude::*;

use crate::config::{active_config, set_active_config, WindowLevelConfig};
use crate::domain::logging::{init_logger, init_time_provider, LogComponent};
use crate::global_state::{install_runtime, is_installed, with_runtime};
use crate::infrastructure::services::{BrowserTimeProvider, ConsoleLogger};
use crate::{log_error, log_info, log_warn};

#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();
    init_time_provider(Box::new(BrowserTimeProvider::new()));
}

fn install(config: &WindowLevelConfig) -> Result<(), JsValue> {
    init_logger(Box::new(ConsoleLogger::new(config.log_level)));
    let installed = install_runtime(config).map_err(|e| {
        log_error!(LogComponent::Presentation("WASM"), "❌ install failed: {}", e);
        e
    })?;
    if installed {
        log_info!(
            LogComponent::Presentation("WASM"),
            "watching {} slot(s) for '{}'",
            config.discovery.slots.len(),
            config.discovery.plot_selector
        );
    }
    Ok(())
}

/// Install with the built-in defaults. Calling it again is a no-op.
#[wasm_bindgen(js_name = installWindowLevel)]
pub fn install_window_level() -> Result<(), JsValue> {
    install(active_config())
}

/// Install with a JSON configuration; omitted fields keep their defaults.
#[wasm_bindgen(js_name = installWindowLevelWithConfig)]
pub fn install_window_level_with_config(config_json: &str) -> Result<(), JsValue> {
    if is_installed() {
        log_warn!(LogComponent::Presentation("WASM"), "⚠️ already installed, config ignored");
        return Ok(());
    }
    let config = WindowLevelConfig::from_json(config_json)?;
    set_active_config(config)?;
    install(active_config())
}

/// Explicit "charts may have changed" notification from the page. Returns the
/// number of slots still without a plot, or `undefined` before install.
#[wasm_bindgen(js_name = rescanWindowLevel)]
pub fn rescan_window_level() -> Option<u32> {
    with_runtime(|runtime| runtime.scan().pending as u32)
}

#[wasm_bindgen(js_name = resetWindowLevel)]
pub fn reset_window_level(slot: &str) -> bool {
    with_runtime(|runtime| runtime.reset_slot(slot).is_some()).unwrap_or(false)
}

/// Current `[zmin, zmax]` of the plot in `slot`, if it has been interacted with.
#[wasm_bindgen(js_name = windowLevelRange)]
pub fn window_level_range(slot: &str) -> Option<Vec<f64>> {
    with_runtime(|runtime| runtime.display_range(slot))
        .flatten()
        .map(|range| vec![range.zmin, range.zmax])
}
