use super::*;
use crate::{
    capabilities::FullscreenApi,
    channel::ChannelConnectError,
    media_element::{
        AddSourceBufferError, AttachMediaSourceError, MediaSourceDurationError, PushSegmentError,
        RemoveDataError,
    },
    strategies::EngineError,
};

/// `Host` implementation talking to the real page through the `js*` imported functions.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct JsHost;

impl Host for JsHost {
    fn start_timer(&mut self, duration_ms: f64, reason: TimerReason) -> TimerId {
        jsTimer(duration_ms, reason)
    }

    fn clear_timer(&mut self, id: TimerId) {
        jsClearTimer(id)
    }

    fn is_library_available(&self, library: ExternalLibrary) -> bool {
        jsIsLibraryAvailable(library)
    }

    fn is_media_source_supported(&self) -> bool {
        jsIsMediaSourceSupported()
    }

    fn is_hls_engine_supported(&self) -> bool {
        jsIsHlsEngineSupported()
    }

    fn can_play_type(&self, typ: &str) -> bool {
        jsCanPlayType(typ)
    }

    fn is_type_supported(&self, mime: &str) -> bool {
        jsIsTypeSupported(mime)
    }

    fn is_secure_page(&self) -> bool {
        jsIsSecurePage()
    }

    fn set_poster(&mut self, url: &str) {
        jsSetPoster(url)
    }

    fn set_source(&mut self, url: &str) {
        jsSetSource(url)
    }

    fn remove_source(&mut self) {
        jsRemoveSource()
    }

    fn reload_element(&mut self) {
        jsReloadMediaElement()
    }

    fn play(&mut self) {
        jsPlay()
    }

    fn pause(&mut self) {
        jsPause()
    }

    fn set_controls(&mut self, enabled: bool) {
        jsSetControls(enabled)
    }

    fn seek(&mut self, position: f64) {
        jsSeek(position)
    }

    fn current_time(&self) -> f64 {
        jsGetCurrentTime()
    }

    fn observe_media_events(&mut self, enabled: bool) {
        jsObserveMediaEvents(enabled)
    }

    fn attach_media_source(&mut self) -> Result<(), AttachMediaSourceError> {
        jsAttachMediaSource()
            .result()
            .map_err(AttachMediaSourceError::from_js_attach_media_source_error)
    }

    fn remove_media_source(&mut self) {
        jsRemoveMediaSource()
    }

    fn set_media_source_duration(&mut self, duration: f64) -> Result<(), MediaSourceDurationError> {
        jsSetMediaSourceDuration(duration)
            .result()
            .map_err(MediaSourceDurationError::from_js_duration_update_error)
    }

    fn add_source_buffer(
        &mut self,
        mime: &str,
        mode: AppendMode,
    ) -> Result<SourceBufferId, AddSourceBufferError> {
        jsAddSourceBuffer(mime, mode)
            .result()
            .map_err(|err| AddSourceBufferError::from_js_add_source_buffer_error(err, mime))
    }

    fn append_buffer(
        &mut self,
        source_buffer_id: SourceBufferId,
        resource_id: ResourceId,
    ) -> Result<(), PushSegmentError> {
        jsAppendBuffer(source_buffer_id, resource_id)
            .result()
            .map_err(PushSegmentError::from_js_append_buffer_error)
    }

    fn remove_buffer(
        &mut self,
        source_buffer_id: SourceBufferId,
        start: f64,
        end: f64,
    ) -> Result<(), RemoveDataError> {
        jsRemoveBuffer(source_buffer_id, start, end)
            .result()
            .map_err(RemoveDataError::from_js_remove_buffer_error)
    }

    fn abort_source_buffer(&mut self, source_buffer_id: SourceBufferId) {
        jsAbortSourceBuffer(source_buffer_id)
    }

    fn free_resource(&mut self, resource_id: ResourceId) {
        if !jsFreeResource(resource_id) {
            crate::Logger::warn(&format!(
                "Host: resource {} was already freed",
                resource_id
            ));
        }
    }

    fn channel_connect(
        &mut self,
        url: &str,
        path: &str,
        timeout_ms: f64,
    ) -> Result<ChannelId, ChannelConnectError> {
        jsChannelConnect(url, path, timeout_ms)
            .result()
            .map_err(ChannelConnectError::from_js_channel_connect_error)
    }

    fn channel_emit(&mut self, channel_id: ChannelId, message: ChannelMessage, payload: Option<String>) {
        jsChannelEmit(channel_id, message, payload)
    }

    fn channel_close(&mut self, channel_id: ChannelId) {
        jsChannelClose(channel_id)
    }

    fn create_hls_engine(&mut self, url: &str, config: &str) -> Result<(), EngineError> {
        jsCreateHlsEngine(url, config)
            .result()
            .map_err(EngineError::from_js_create_engine_error)
    }

    fn hls_start_load(&mut self) {
        jsHlsStartLoad()
    }

    fn hls_recover_media_error(&mut self) {
        jsHlsRecoverMediaError()
    }

    fn destroy_hls_engine(&mut self) {
        jsDestroyHlsEngine()
    }

    fn observe_engagement(&mut self, threshold: f64, fullscreen_api: &FullscreenApi) {
        jsObserveEngagement(
            threshold,
            fullscreen_api.change_event().map(str::to_owned),
        )
    }

    fn stop_observing_engagement(&mut self) {
        jsStopObservingEngagement()
    }

    fn page_state(&self, fullscreen_api: &FullscreenApi) -> PageState {
        jsGetPageState(fullscreen_api.element_property().map(str::to_owned))
    }

    fn announce_status(&mut self, loaded: bool) {
        jsAnnounceStatus(loaded)
    }
}
