use serde_json::Value;
use wasm_bindgen::prelude::*;

use super::{FragPlayer, LifecycleController};
use crate::{
    bindings::JsHost,
    capabilities::FullscreenApi,
    config::PlayerConfig,
    utils::logger::LoggerLevel,
    Logger,
};

/// Methods exposed to the JavaScript-side.
///
/// Note that these are not the only methods callable by JavaScript. There's
/// also "event_listeners" which, as its name points at, should be called when particular
/// events happen.
#[wasm_bindgen]
impl FragPlayer {
    /// Create a new `FragPlayer`, controlling the media element linked to it on the
    /// JavaScript-side.
    ///
    /// # Arguments
    ///
    /// * `config` - The player's configuration, as a JSON string. Absent keys take their
    ///   default value.
    ///
    /// * `fullscreen_properties` - Names of the fullscreen-related properties found on
    ///   the `document`, used to pick the right flavor of the Fullscreen API.
    #[wasm_bindgen(constructor)]
    pub fn new(config: &str, fullscreen_properties: Vec<String>) -> Result<FragPlayer, JsValue> {
        let config = PlayerConfig::from_json(config).map_err(|err| {
            Logger::error(&format!("API: Invalid configuration: {}", err));
            JsValue::from_str(&err.to_string())
        })?;
        let fullscreen_api = FullscreenApi::resolve(&fullscreen_properties);
        Ok(FragPlayer {
            controller: LifecycleController::new(JsHost, config, fullscreen_api),
        })
    }

    /// Play the content described by the given directive, replacing the current one.
    ///
    /// The directive is either a JSON document or a bare url. An empty string clears the
    /// media element.
    pub fn load_directive(&mut self, payload: &str) {
        self.controller.load_directive(parse_directive(payload));
    }

    /// Stop everything. The `FragPlayer` won't do anything after that call.
    pub fn dispose(&mut self) {
        self.controller.dispose();
    }

    /// Returns `true` if content is currently loaded on the media element.
    pub fn is_loaded(&self) -> bool {
        self.controller.is_loaded()
    }

    /// Name of the event to listen to for fullscreen changes, `undefined` if the
    /// Fullscreen API is not supported.
    pub fn fullscreen_change_event(&self) -> Option<String> {
        self.controller
            .fullscreen_api()
            .change_event()
            .map(str::to_owned)
    }

    pub fn set_log_level(level: LoggerLevel) {
        Logger::set_logger_level(level);
    }
}

fn parse_directive(payload: &str) -> Value {
    let payload = payload.trim();
    if payload.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(payload).unwrap_or_else(|_| Value::String(payload.to_owned()))
}
