use serde_json::Value;

use super::{LifecycleController, PendingDirective};
use crate::{
    bindings::{
        ChannelId, ExternalLibrary, HlsErrorKind, Host, SourceBufferId, TimerId, TimerReason,
    },
    capabilities::{Capabilities, FullscreenApi},
    config::PlayerConfig,
    engagement::EngagementTracker,
    error::PlayerError,
    media_element::MediaSourceReadyState,
    source_resolver,
    strategies::{ChannelEvent, Strategy, StrategyHandle},
    utils::time_ranges::TimeRanges,
    Logger,
};

impl<H: Host> LifecycleController<H> {
    pub(crate) fn new(mut host: H, config: PlayerConfig, fullscreen_api: FullscreenApi) -> Self {
        let mut engagement = EngagementTracker::new(config.threshold, fullscreen_api);
        if config.unload {
            engagement.start(&mut host);
        }
        if let Some(poster) = config.ready_poster.as_deref() {
            host.set_poster(poster);
        }
        Self {
            host,
            config,
            strategy: Strategy::Noop,
            engagement,
            library_wait: None,
            disposed: false,
        }
    }

    pub(crate) fn fullscreen_api(&self) -> FullscreenApi {
        self.engagement.fullscreen_api()
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.strategy.is_loaded()
    }

    #[cfg(test)]
    pub(crate) fn host(&self) -> &H {
        &self.host
    }

    #[cfg(test)]
    pub(crate) fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Replace whatever is currently played by the content described by `payload`.
    pub(crate) fn load_directive(&mut self, payload: Value) {
        if self.disposed {
            return;
        }
        Logger::info("Controller: New directive");
        self.engagement.cancel(&mut self.host);
        self.cancel_library_wait();
        self.unload_strategy();
        self.strategy = Strategy::Noop;
        self.show_ready_poster();

        let missing = self.missing_library();
        match missing {
            None => self.install(payload),
            Some(library) => {
                Logger::info(&format!("Controller: Waiting for the {} library", library));
                let timer = self
                    .host
                    .start_timer(self.config.library_wait.delay_ms, TimerReason::LibraryCheck);
                self.library_wait = Some(PendingDirective {
                    payload,
                    timer,
                    retries: 0,
                });
            }
        }
    }

    /// Stop everything for good.
    pub(crate) fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        Logger::info("Controller: Disposing");
        self.engagement.stop(&mut self.host);
        self.cancel_library_wait();
        self.unload_strategy();
        self.strategy = Strategy::Noop;
        self.show_ready_poster();
        self.disposed = true;
    }

    pub(crate) fn on_timer_ended(&mut self, id: TimerId, reason: TimerReason) {
        if self.disposed {
            return;
        }
        match reason {
            TimerReason::EngagementDecision => {
                if let Some(should_load) = self.engagement.on_timer_ended(&mut self.host, id) {
                    if should_load {
                        self.load_strategy();
                    } else {
                        self.unload_strategy();
                    }
                }
            }
            TimerReason::LibraryCheck => self.on_library_check(id),
        }
    }

    /// To call on visibility, fullscreen and picture-in-picture changes.
    pub(crate) fn on_engagement_input(&mut self) {
        if self.config.unload && !self.disposed {
            self.engagement.schedule(&mut self.host);
        }
    }

    pub(crate) fn on_intersection_change(&mut self, ratio: f64) {
        if self.config.unload && !self.disposed {
            self.engagement
                .on_intersection_change(&mut self.host, ratio);
        }
    }

    pub(crate) fn on_channel_event(&mut self, channel_id: ChannelId, event: ChannelEvent) {
        let res = self
            .strategy
            .on_channel_event(&mut self.host, channel_id, event);
        self.check(res);
    }

    pub(crate) fn on_media_source_state_change(&mut self, state: MediaSourceReadyState) {
        let res = self
            .strategy
            .on_media_source_state_change(&mut self.host, state);
        self.check(res);
    }

    pub(crate) fn on_source_buffer_update(
        &mut self,
        source_buffer_id: SourceBufferId,
        buffered: &TimeRanges,
    ) {
        let res = self
            .strategy
            .on_source_buffer_update(&mut self.host, source_buffer_id, buffered);
        self.check(res);
    }

    pub(crate) fn on_source_buffer_error(&mut self, source_buffer_id: SourceBufferId) {
        self.strategy.on_source_buffer_error(source_buffer_id);
    }

    pub(crate) fn on_loaded_metadata(&mut self) {
        self.strategy.on_loaded_metadata(&mut self.host);
    }

    pub(crate) fn on_play_result(&mut self, success: bool) {
        self.strategy.on_play_result(&mut self.host, success);
    }

    pub(crate) fn on_media_error(&mut self, message: &str) {
        self.strategy.on_media_error(message);
    }

    pub(crate) fn on_hls_manifest_parsed(&mut self) {
        self.strategy.on_hls_manifest_parsed(&mut self.host);
    }

    pub(crate) fn on_hls_error(&mut self, kind: HlsErrorKind, fatal: bool, details: &str) {
        let res = self
            .strategy
            .on_hls_error(&mut self.host, kind, fatal, details);
        self.check(res);
    }

    fn on_library_check(&mut self, id: TimerId) {
        let retries = match self.library_wait.as_ref() {
            Some(pending) if pending.timer == id => pending.retries + 1,
            _ => return,
        };
        match self.missing_library() {
            None => {
                if let Some(pending) = self.library_wait.take() {
                    self.install(pending.payload);
                }
            }
            Some(library) if retries >= self.config.library_wait.retries => {
                self.library_wait = None;
                self.fail(PlayerError::LibraryUnavailable(library));
            }
            Some(_) => {
                let timer = self
                    .host
                    .start_timer(self.config.library_wait.delay_ms, TimerReason::LibraryCheck);
                if let Some(pending) = self.library_wait.as_mut() {
                    pending.timer = timer;
                    pending.retries = retries;
                }
            }
        }
    }

    /// Resolve the directive and install the corresponding strategy.
    fn install(&mut self, payload: Value) {
        let resolved = {
            let capabilities = Capabilities::new(&self.host);
            source_resolver::resolve(&payload, &self.config.players, &capabilities)
        };
        self.strategy = Strategy::install(resolved, &self.config);
        if let Some(kind) = self.strategy.kind() {
            Logger::info(&format!("Controller: Installed {} strategy", kind));
        }
        if self.config.unload {
            self.engagement.schedule(&mut self.host);
        } else {
            self.load_strategy();
        }
    }

    fn load_strategy(&mut self) {
        let was_loaded = self.strategy.is_loaded();
        if let Err(err) = self.strategy.load(&mut self.host) {
            self.fail(err);
            return;
        }
        if !was_loaded && self.strategy.is_loaded() {
            self.host.announce_status(true);
        }
    }

    fn unload_strategy(&mut self) {
        let was_loaded = self.strategy.is_loaded();
        self.strategy.unload(&mut self.host);
        if was_loaded {
            self.host.announce_status(false);
        }
    }

    fn check(&mut self, res: Result<(), PlayerError>) {
        if let Err(err) = res {
            self.fail(err);
        }
    }

    /// The single path every fatal error goes through. The failed strategy stays
    /// installed, so a later engagement decision may load it again.
    fn fail(&mut self, err: PlayerError) {
        Logger::error(&format!("Controller: {:?} error: {}", err.category(), err));
        self.engagement.cancel(&mut self.host);
        self.cancel_library_wait();
        self.unload_strategy();
        if let Some(poster) = self.config.error_poster.as_deref() {
            self.host.set_poster(poster);
        }
    }

    fn show_ready_poster(&mut self) {
        if let Some(poster) = self.config.ready_poster.as_deref() {
            self.host.set_poster(poster);
        }
    }

    fn cancel_library_wait(&mut self) {
        if let Some(pending) = self.library_wait.take() {
            self.host.clear_timer(pending.timer);
        }
    }

    fn missing_library(&self) -> Option<ExternalLibrary> {
        self.config
            .required_libraries()
            .into_iter()
            .find(|lib| !self.host.is_library_available(*lib))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::bindings::ChannelMessage;
    use crate::test_utils::{FakeHost, HostCall};

    const READY: &str = "ready.png";
    const ERROR: &str = "error.png";

    fn controller(config: &str, host: FakeHost) -> LifecycleController<FakeHost> {
        let mut config = PlayerConfig::from_json(config).unwrap();
        config.ready_poster = Some(READY.to_owned());
        config.error_poster = Some(ERROR.to_owned());
        LifecycleController::new(host, config, FullscreenApi::Standard)
    }

    fn count(host: &FakeHost, pred: impl Fn(&HostCall) -> bool) -> usize {
        host.calls.iter().filter(|c| pred(c)).count()
    }

    fn last_timer(host: &FakeHost) -> TimerId {
        host.next_timer_id - 1.
    }

    #[test]
    fn test_file_scenario() {
        let mut host = FakeHost::new();
        host.media_source_supported = false;
        host.available_libraries.push(ExternalLibrary::SegmentChannel);
        let mut ctrl = controller(r#"{ "players": ["socket.io", "mp4"], "unload": false }"#, host);
        ctrl.load_directive(json!({ "file": "clip.mp4" }));
        assert!(ctrl.is_loaded());
        ctrl.on_loaded_metadata();
        ctrl.on_play_result(true);
        let calls = &ctrl.host().calls;
        let set_source = calls
            .iter()
            .position(|c| *c == HostCall::SetSource("clip.mp4".to_owned()))
            .unwrap();
        let play = calls.iter().position(|c| *c == HostCall::Play).unwrap();
        let controls = calls
            .iter()
            .position(|c| *c == HostCall::SetControls(true))
            .unwrap();
        assert!(set_source < play && play < controls);
        assert!(calls.contains(&HostCall::AnnounceStatus(true)));
    }

    #[test]
    fn test_engagement_debounce() {
        let mut host = FakeHost::new();
        host.page_state.visible = true;
        let mut ctrl = controller(r#"{ "players": ["mp4"] }"#, host);
        ctrl.load_directive(json!("clip.mp4"));
        assert!(!ctrl.is_loaded());

        ctrl.on_intersection_change(0.8);
        ctrl.on_engagement_input();
        ctrl.on_engagement_input();
        ctrl.on_engagement_input();
        let timer = last_timer(ctrl.host());
        // earlier timers were cleared and do not lead to anything
        ctrl.on_timer_ended(timer - 1., TimerReason::EngagementDecision);
        assert!(!ctrl.is_loaded());
        ctrl.on_timer_ended(timer, TimerReason::EngagementDecision);
        assert!(ctrl.is_loaded());
        assert_eq!(
            count(ctrl.host(), |c| matches!(c, HostCall::SetSource(_))),
            1
        );

        // the page gets hidden
        ctrl.host_mut().page_state.visible = false;
        ctrl.on_engagement_input();
        ctrl.on_engagement_input();
        let timer = last_timer(ctrl.host());
        ctrl.on_timer_ended(timer, TimerReason::EngagementDecision);
        assert!(!ctrl.is_loaded());
        assert_eq!(count(ctrl.host(), |c| *c == HostCall::ReloadElement), 1);
        assert_eq!(
            count(ctrl.host(), |c| *c == HostCall::AnnounceStatus(false)),
            1
        );
    }

    #[test]
    fn test_new_directive_unloads_first() {
        let mut ctrl = controller(r#"{ "players": ["mp4"], "unload": false }"#, FakeHost::new());
        ctrl.load_directive(json!("a.mp4"));
        ctrl.host_mut().calls.clear();
        ctrl.load_directive(json!("b.mp4"));
        let calls = &ctrl.host().calls;
        let reload = calls.iter().position(|c| *c == HostCall::ReloadElement).unwrap();
        let set_source = calls
            .iter()
            .position(|c| *c == HostCall::SetSource("b.mp4".to_owned()))
            .unwrap();
        assert!(reload < set_source);
        assert!(calls.contains(&HostCall::SetPoster(READY.to_owned())));
    }

    #[test]
    fn test_library_wait() {
        let mut host = FakeHost::new();
        host.hls_engine_supported = true;
        let mut ctrl = controller(r#"{ "players": ["hls.js"], "unload": false }"#, host);
        ctrl.load_directive(json!("live.m3u8"));
        assert!(ctrl
            .host()
            .calls
            .contains(&HostCall::StartTimer(1000., TimerReason::LibraryCheck)));

        ctrl.on_timer_ended(last_timer(ctrl.host()), TimerReason::LibraryCheck);
        ctrl.host_mut()
            .available_libraries
            .push(ExternalLibrary::HlsEngine);
        ctrl.on_timer_ended(last_timer(ctrl.host()), TimerReason::LibraryCheck);
        assert!(ctrl.is_loaded());
        assert_eq!(
            count(ctrl.host(), |c| matches!(c, HostCall::CreateHlsEngine(..))),
            1
        );
    }

    #[test]
    fn test_library_wait_timeout() {
        let mut ctrl = controller(r#"{ "players": ["hls.js", "mp4"], "unload": false }"#, FakeHost::new());
        ctrl.load_directive(json!("live.m3u8"));
        for _ in 0..9 {
            ctrl.on_timer_ended(last_timer(ctrl.host()), TimerReason::LibraryCheck);
        }
        assert!(!ctrl.host().calls.contains(&HostCall::SetPoster(ERROR.to_owned())));
        ctrl.on_timer_ended(last_timer(ctrl.host()), TimerReason::LibraryCheck);
        assert!(ctrl.host().calls.contains(&HostCall::SetPoster(ERROR.to_owned())));
        assert_eq!(
            count(ctrl.host(), |c| matches!(c, HostCall::StartTimer(_, TimerReason::LibraryCheck))),
            10
        );
        assert!(!ctrl.is_loaded());
    }

    #[test]
    fn test_unsupported_mime_scenario() {
        let mut host = FakeHost::new();
        host.media_source_supported = true;
        host.available_libraries.push(ExternalLibrary::SegmentChannel);
        let mut ctrl = controller(r#"{ "players": ["socket.io"], "unload": false }"#, host);
        ctrl.load_directive(json!({ "channel": { "namespace": "cam/one", "path": "/p" } }));
        assert!(ctrl.is_loaded());
        ctrl.on_channel_event(1, ChannelEvent::Connected);
        ctrl.on_channel_event(1, ChannelEvent::Mime(Ok("unsupported/type".to_owned())));

        assert!(!ctrl.is_loaded());
        let calls = &ctrl.host().calls;
        assert!(!calls.contains(&HostCall::AttachMediaSource));
        assert!(calls.contains(&HostCall::ChannelClose(1)));
        assert!(calls.contains(&HostCall::SetPoster(ERROR.to_owned())));
        assert!(calls.contains(&HostCall::AnnounceStatus(false)));

        ctrl.host_mut().calls.clear();
        ctrl.on_channel_event(1, ChannelEvent::Initialization(Ok(4)));
        assert_eq!(ctrl.host().calls, vec![HostCall::FreeResource(4)]);
    }

    #[test]
    fn test_failed_strategy_can_be_reloaded() {
        let mut host = FakeHost::new();
        host.page_state.visible = true;
        host.hls_engine_supported = true;
        host.available_libraries.push(ExternalLibrary::HlsEngine);
        let mut ctrl = controller(r#"{ "players": ["hls.js"] }"#, host);
        ctrl.load_directive(json!({ "hlsPlaylist": "live.m3u8" }));
        ctrl.on_intersection_change(1.);
        ctrl.on_timer_ended(last_timer(ctrl.host()), TimerReason::EngagementDecision);
        assert!(ctrl.is_loaded());

        ctrl.on_hls_error(HlsErrorKind::Other, true, "internalException");
        assert!(!ctrl.is_loaded());
        assert!(ctrl.host().calls.contains(&HostCall::SetPoster(ERROR.to_owned())));

        ctrl.on_engagement_input();
        ctrl.on_timer_ended(last_timer(ctrl.host()), TimerReason::EngagementDecision);
        assert!(ctrl.is_loaded());
        assert_eq!(
            count(ctrl.host(), |c| matches!(c, HostCall::CreateHlsEngine(..))),
            2
        );
    }

    #[test]
    fn test_all_mode_end_to_end() {
        let mut host = FakeHost::new();
        host.media_source_supported = true;
        host.available_libraries.push(ExternalLibrary::SegmentChannel);
        host.supported_mimes.push("video/mp4".to_owned());
        let mut ctrl = controller(r#"{ "players": ["socket.io"], "unload": false }"#, host);
        ctrl.load_directive(json!({ "socketIo": { "namespace": "cam/one", "path": "/p", "key": "k" } }));
        ctrl.on_channel_event(1, ChannelEvent::Connected);
        ctrl.on_channel_event(1, ChannelEvent::Auth(true));
        ctrl.on_channel_event(1, ChannelEvent::Mime(Ok("video/mp4".to_owned())));
        ctrl.on_media_source_state_change(MediaSourceReadyState::Open);
        ctrl.on_channel_event(1, ChannelEvent::Initialization(Ok(10)));
        ctrl.on_source_buffer_update(1, &TimeRanges::new());
        assert!(ctrl.is_loaded());
        let segment_requests = count(ctrl.host(), |c| {
            matches!(c, HostCall::ChannelEmit(_, ChannelMessage::Segment, _))
        });
        assert_eq!(segment_requests, 1);
        assert!(!ctrl.host().calls.contains(&HostCall::SetPoster(ERROR.to_owned())));
    }

    #[test]
    fn test_dispose() {
        let mut ctrl = controller(r#"{ "players": ["mp4"] }"#, FakeHost::new());
        ctrl.load_directive(json!("a.mp4"));
        ctrl.dispose();
        assert!(ctrl
            .host()
            .calls
            .contains(&HostCall::StopObservingEngagement));
        ctrl.host_mut().calls.clear();
        ctrl.load_directive(json!("b.mp4"));
        ctrl.on_engagement_input();
        assert!(ctrl.host().calls.is_empty());
    }
}
