mod js_functions;
mod js_host;

pub use js_functions::*;
pub(crate) use js_host::JsHost;

use crate::{
    capabilities::FullscreenApi,
    channel::ChannelConnectError,
    media_element::{
        AddSourceBufferError, AttachMediaSourceError, MediaSourceDurationError, PushSegmentError,
        RemoveDataError,
    },
    strategies::EngineError,
};

/// Every side-effect the core performs on the page goes through a `Host`.
///
/// The real implementation, `JsHost`, forwards each call to the corresponding `js*`
/// JavaScript function. Keeping that boundary behind a trait allows to run the whole
/// playback logic against a recording implementation in tests.
///
/// Asynchronous outcomes (timers elapsing, buffer operations ending, channel messages...)
/// are never returned here: they come back later through the `on_*` methods of the
/// exported `FragPlayer`.
pub(crate) trait Host {
    /// Start a timer of `duration_ms` milliseconds. See `jsTimer`.
    fn start_timer(&mut self, duration_ms: f64, reason: TimerReason) -> TimerId;

    /// Clear a timer started with `start_timer`. See `jsClearTimer`.
    fn clear_timer(&mut self, id: TimerId);

    fn is_library_available(&self, library: ExternalLibrary) -> bool;

    fn is_media_source_supported(&self) -> bool;

    fn is_hls_engine_supported(&self) -> bool;

    /// Returns `true` if the media element answered something to `canPlayType`.
    fn can_play_type(&self, typ: &str) -> bool;

    /// Returns `true` if a SourceBuffer can be created for the given mime-type.
    fn is_type_supported(&self, mime: &str) -> bool;

    fn is_secure_page(&self) -> bool;

    fn set_poster(&mut self, url: &str);

    fn set_source(&mut self, url: &str);

    fn remove_source(&mut self);

    fn reload_element(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    fn set_controls(&mut self, enabled: bool);

    fn seek(&mut self, position: f64);

    fn current_time(&self) -> f64;

    /// Add or remove the media element's "error" and "loadedmetadata" listeners.
    fn observe_media_events(&mut self, enabled: bool);

    fn attach_media_source(&mut self) -> Result<(), AttachMediaSourceError>;

    fn remove_media_source(&mut self);

    fn set_media_source_duration(&mut self, duration: f64) -> Result<(), MediaSourceDurationError>;

    fn add_source_buffer(
        &mut self,
        mime: &str,
        mode: AppendMode,
    ) -> Result<SourceBufferId, AddSourceBufferError>;

    /// Append a resource to a SourceBuffer, transferring its ownership to the JavaScript-side.
    fn append_buffer(
        &mut self,
        source_buffer_id: SourceBufferId,
        resource_id: ResourceId,
    ) -> Result<(), PushSegmentError>;

    fn remove_buffer(
        &mut self,
        source_buffer_id: SourceBufferId,
        start: f64,
        end: f64,
    ) -> Result<(), RemoveDataError>;

    fn abort_source_buffer(&mut self, source_buffer_id: SourceBufferId);

    fn free_resource(&mut self, resource_id: ResourceId);

    fn channel_connect(
        &mut self,
        url: &str,
        path: &str,
        timeout_ms: f64,
    ) -> Result<ChannelId, ChannelConnectError>;

    fn channel_emit(&mut self, channel_id: ChannelId, message: ChannelMessage, payload: Option<String>);

    fn channel_close(&mut self, channel_id: ChannelId);

    fn create_hls_engine(&mut self, url: &str, config: &str) -> Result<(), EngineError>;

    fn hls_start_load(&mut self);

    fn hls_recover_media_error(&mut self);

    fn destroy_hls_engine(&mut self);

    fn observe_engagement(&mut self, threshold: f64, fullscreen_api: &FullscreenApi);

    fn stop_observing_engagement(&mut self);

    fn page_state(&self, fullscreen_api: &FullscreenApi) -> PageState;

    fn announce_status(&mut self, loaded: bool);
}
