use crate::{
    bindings::{
        AppendMode, ChannelId, ChannelMessage, ExternalLibrary, Host, PageState, ResourceId,
        SourceBufferId, TimerId, TimerReason,
    },
    capabilities::FullscreenApi,
    channel::ChannelConnectError,
    media_element::{
        AddSourceBufferError, AttachMediaSourceError, MediaSourceDurationError, PushSegmentError,
        RemoveDataError,
    },
    strategies::EngineError,
};

/// Mime-type for which `can_play_type` answers `true` when `native_hls_supported` is set.
const NATIVE_HLS_TYPE: &str = "application/vnd.apple.mpegurl";

/// A side-effect performed through the `Host`.
///
/// Read-only queries (capabilities, current position, page state) are not recorded.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum HostCall {
    StartTimer(f64, TimerReason),
    ClearTimer(TimerId),
    SetPoster(String),
    SetSource(String),
    RemoveSource,
    ReloadElement,
    Play,
    Pause,
    SetControls(bool),
    Seek(f64),
    ObserveMediaEvents(bool),
    AttachMediaSource,
    RemoveMediaSource,
    SetMediaSourceDuration(f64),
    AddSourceBuffer(String, AppendMode),
    AppendBuffer(SourceBufferId, ResourceId),
    RemoveBuffer(SourceBufferId, f64, f64),
    AbortSourceBuffer(SourceBufferId),
    FreeResource(ResourceId),
    ChannelConnect(String, String, f64),
    ChannelEmit(ChannelId, ChannelMessage, Option<String>),
    ChannelClose(ChannelId),
    CreateHlsEngine(String, String),
    HlsStartLoad,
    HlsRecoverMediaError,
    DestroyHlsEngine,
    ObserveEngagement(f64, Option<String>),
    StopObservingEngagement,
    AnnounceStatus(bool),
}

/// `Host` implementation recording every side-effect, with configurable answers.
///
/// Identifiers it hands out (timers, connections, SourceBuffers) start at `1`.
pub(crate) struct FakeHost {
    pub(crate) calls: Vec<HostCall>,

    pub(crate) media_source_supported: bool,
    pub(crate) hls_engine_supported: bool,
    pub(crate) native_hls_supported: bool,
    pub(crate) available_libraries: Vec<ExternalLibrary>,
    pub(crate) supported_mimes: Vec<String>,
    pub(crate) secure_page: bool,

    pub(crate) current_time: f64,
    pub(crate) page_state: PageState,

    pub(crate) fail_attach: bool,
    pub(crate) fail_channel_connect: bool,
    pub(crate) fail_engine_creation: bool,

    pub(crate) next_timer_id: TimerId,
    next_channel_id: ChannelId,
    next_source_buffer_id: SourceBufferId,
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self {
            calls: vec![],
            media_source_supported: false,
            hls_engine_supported: false,
            native_hls_supported: false,
            available_libraries: vec![],
            supported_mimes: vec![],
            secure_page: false,
            current_time: 0.,
            page_state: PageState::default(),
            fail_attach: false,
            fail_channel_connect: false,
            fail_engine_creation: false,
            next_timer_id: 1.,
            next_channel_id: 1,
            next_source_buffer_id: 1,
        }
    }
}

impl Host for FakeHost {
    fn start_timer(&mut self, duration_ms: f64, reason: TimerReason) -> TimerId {
        self.calls.push(HostCall::StartTimer(duration_ms, reason));
        let id = self.next_timer_id;
        self.next_timer_id += 1.;
        id
    }

    fn clear_timer(&mut self, id: TimerId) {
        self.calls.push(HostCall::ClearTimer(id));
    }

    fn is_library_available(&self, library: ExternalLibrary) -> bool {
        self.available_libraries.contains(&library)
    }

    fn is_media_source_supported(&self) -> bool {
        self.media_source_supported
    }

    fn is_hls_engine_supported(&self) -> bool {
        self.hls_engine_supported
    }

    fn can_play_type(&self, typ: &str) -> bool {
        self.native_hls_supported && typ == NATIVE_HLS_TYPE
    }

    fn is_type_supported(&self, mime: &str) -> bool {
        self.supported_mimes.iter().any(|m| m == mime)
    }

    fn is_secure_page(&self) -> bool {
        self.secure_page
    }

    fn set_poster(&mut self, url: &str) {
        self.calls.push(HostCall::SetPoster(url.to_owned()));
    }

    fn set_source(&mut self, url: &str) {
        self.calls.push(HostCall::SetSource(url.to_owned()));
    }

    fn remove_source(&mut self) {
        self.calls.push(HostCall::RemoveSource);
    }

    fn reload_element(&mut self) {
        self.calls.push(HostCall::ReloadElement);
    }

    fn play(&mut self) {
        self.calls.push(HostCall::Play);
    }

    fn pause(&mut self) {
        self.calls.push(HostCall::Pause);
    }

    fn set_controls(&mut self, enabled: bool) {
        self.calls.push(HostCall::SetControls(enabled));
    }

    fn seek(&mut self, position: f64) {
        self.calls.push(HostCall::Seek(position));
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn observe_media_events(&mut self, enabled: bool) {
        self.calls.push(HostCall::ObserveMediaEvents(enabled));
    }

    fn attach_media_source(&mut self) -> Result<(), AttachMediaSourceError> {
        self.calls.push(HostCall::AttachMediaSource);
        if self.fail_attach {
            Err(AttachMediaSourceError::MediaSourceUnavailable)
        } else {
            Ok(())
        }
    }

    fn remove_media_source(&mut self) {
        self.calls.push(HostCall::RemoveMediaSource);
    }

    fn set_media_source_duration(&mut self, duration: f64) -> Result<(), MediaSourceDurationError> {
        self.calls.push(HostCall::SetMediaSourceDuration(duration));
        Ok(())
    }

    fn add_source_buffer(
        &mut self,
        mime: &str,
        mode: AppendMode,
    ) -> Result<SourceBufferId, AddSourceBufferError> {
        self.calls
            .push(HostCall::AddSourceBuffer(mime.to_owned(), mode));
        let id = self.next_source_buffer_id;
        self.next_source_buffer_id += 1;
        Ok(id)
    }

    fn append_buffer(
        &mut self,
        source_buffer_id: SourceBufferId,
        resource_id: ResourceId,
    ) -> Result<(), PushSegmentError> {
        self.calls
            .push(HostCall::AppendBuffer(source_buffer_id, resource_id));
        Ok(())
    }

    fn remove_buffer(
        &mut self,
        source_buffer_id: SourceBufferId,
        start: f64,
        end: f64,
    ) -> Result<(), RemoveDataError> {
        self.calls
            .push(HostCall::RemoveBuffer(source_buffer_id, start, end));
        Ok(())
    }

    fn abort_source_buffer(&mut self, source_buffer_id: SourceBufferId) {
        self.calls.push(HostCall::AbortSourceBuffer(source_buffer_id));
    }

    fn free_resource(&mut self, resource_id: ResourceId) {
        self.calls.push(HostCall::FreeResource(resource_id));
    }

    fn channel_connect(
        &mut self,
        url: &str,
        path: &str,
        timeout_ms: f64,
    ) -> Result<ChannelId, ChannelConnectError> {
        if self.fail_channel_connect {
            return Err(ChannelConnectError::LibraryMissing);
        }
        self.calls.push(HostCall::ChannelConnect(
            url.to_owned(),
            path.to_owned(),
            timeout_ms,
        ));
        let id = self.next_channel_id;
        self.next_channel_id += 1;
        Ok(id)
    }

    fn channel_emit(&mut self, channel_id: ChannelId, message: ChannelMessage, payload: Option<String>) {
        self.calls
            .push(HostCall::ChannelEmit(channel_id, message, payload));
    }

    fn channel_close(&mut self, channel_id: ChannelId) {
        self.calls.push(HostCall::ChannelClose(channel_id));
    }

    fn create_hls_engine(&mut self, url: &str, config: &str) -> Result<(), EngineError> {
        if self.fail_engine_creation {
            return Err(EngineError::InvalidConfig("bad config".to_owned()));
        }
        self.calls
            .push(HostCall::CreateHlsEngine(url.to_owned(), config.to_owned()));
        Ok(())
    }

    fn hls_start_load(&mut self) {
        self.calls.push(HostCall::HlsStartLoad);
    }

    fn hls_recover_media_error(&mut self) {
        self.calls.push(HostCall::HlsRecoverMediaError);
    }

    fn destroy_hls_engine(&mut self) {
        self.calls.push(HostCall::DestroyHlsEngine);
    }

    fn observe_engagement(&mut self, threshold: f64, fullscreen_api: &FullscreenApi) {
        self.calls.push(HostCall::ObserveEngagement(
            threshold,
            fullscreen_api.change_event().map(str::to_owned),
        ));
    }

    fn stop_observing_engagement(&mut self) {
        self.calls.push(HostCall::StopObservingEngagement);
    }

    fn page_state(&self, _fullscreen_api: &FullscreenApi) -> PageState {
        self.page_state
    }

    fn announce_status(&mut self, loaded: bool) {
        self.calls.push(HostCall::AnnounceStatus(loaded));
    }
}
