use serde_json::Value;

use crate::{
    bindings::{Host, JsHost, TimerId},
    config::PlayerConfig,
    engagement::EngagementTracker,
    strategies::Strategy,
    wasm_bindgen,
};

mod api;
mod core;
mod event_listeners;

/// The `FragPlayer` is the player interface exported to the JavaScript-side, linked to a
/// single media element.
///
/// It receives playback directives through `load_directive` and decides, depending on
/// the configuration, the platform's capabilities and the user's engagement with the
/// page, which content to play and when.
#[wasm_bindgen]
pub struct FragPlayer {
    controller: LifecycleController<JsHost>,
}

/// Top-level orchestration of a `FragPlayer`: installs the strategy resolved from each new
/// directive and loads or unloads it.
pub(crate) struct LifecycleController<H: Host> {
    host: H,

    config: PlayerConfig,

    /// The single installed strategy. `Strategy::Noop` when nothing was resolved.
    strategy: Strategy,

    engagement: EngagementTracker,

    /// Set while waiting for external libraries before resolving a directive.
    library_wait: Option<PendingDirective>,

    /// `true` once `dispose` has been called. Nothing is done anymore from there.
    disposed: bool,
}

/// A directive waiting for external libraries to be available.
struct PendingDirective {
    payload: Value,

    /// Timer of the next availability check.
    timer: TimerId,

    /// Number of checks already performed after the first one.
    retries: u32,
}
