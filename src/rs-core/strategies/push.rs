use super::{reset_media_element, start_playback, StrategyHandle};
use crate::{
    bindings::{ChannelId, ChannelMessage, Host, ResourceId, SourceBufferId},
    channel::{ChannelClient, MediaSegment},
    config::{BufferPolicy, ChannelMode},
    error::PlayerError,
    media_element::{BufferFeeder, FeedStep, MediaSourceReadyState, SegmentArrival},
    source_resolver::ChannelDescriptor,
    utils::time_ranges::TimeRanges,
    Logger,
};

/// Something received on a segment channel connection.
///
/// Payloads which did not have the expected type are carried as `Err`, with the name of
/// the type actually received.
#[derive(Debug, PartialEq)]
pub(crate) enum ChannelEvent {
    Connected,
    Auth(bool),
    Mime(Result<String, String>),
    Initialization(Result<ResourceId, String>),
    Segment(Result<MediaSegment, String>),

    /// The connection was lost and won't come back.
    Disconnected(String),

    /// Transport-level trouble the transport handles itself (connection errors,
    /// reconnections...).
    TransportError(String),
}

impl ChannelEvent {
    fn message(&self) -> Option<ChannelMessage> {
        match self {
            ChannelEvent::Auth(_) => Some(ChannelMessage::Auth),
            ChannelEvent::Mime(_) => Some(ChannelMessage::Mime),
            ChannelEvent::Initialization(_) => Some(ChannelMessage::Initialization),
            ChannelEvent::Segment(_) => Some(ChannelMessage::Segment),
            ChannelEvent::Connected
            | ChannelEvent::Disconnected(_)
            | ChannelEvent::TransportError(_) => None,
        }
    }

    /// Free the JavaScript resource carried by this event, if any.
    pub(crate) fn release<H: Host>(self, host: &mut H) {
        match self {
            ChannelEvent::Initialization(Ok(resource_id)) => host.free_resource(resource_id),
            ChannelEvent::Segment(Ok(segment)) => host.free_resource(segment.resource_id),
            _ => {}
        }
    }
}

/// Everything a loaded `PushStrategy` holds. Created on `load`, dropped on `unload`.
struct ChannelSession {
    client: ChannelClient,
    feeder: BufferFeeder,

    /// Mime-type announced by the server, kept until the sink opens.
    mime: Option<String>,
}

/// Plays segments pushed by a segment server, feeding them manually to a MediaSource.
pub(crate) struct PushStrategy {
    descriptor: ChannelDescriptor,
    mode: ChannelMode,
    policy: BufferPolicy,
    autoplay: bool,

    /// `None` when unloaded.
    session: Option<ChannelSession>,
}

impl PushStrategy {
    pub(crate) fn new(
        descriptor: ChannelDescriptor,
        mode: ChannelMode,
        policy: BufferPolicy,
        autoplay: bool,
    ) -> Self {
        Self {
            descriptor,
            mode,
            policy,
            autoplay,
            session: None,
        }
    }

    pub(crate) fn on_channel_event<H: Host>(
        &mut self,
        host: &mut H,
        channel_id: ChannelId,
        event: ChannelEvent,
    ) -> Result<(), PlayerError> {
        let session = match self.session.as_mut() {
            Some(session) if session.client.owns(channel_id) => session,
            _ => {
                Logger::debug(&format!(
                    "Push: Ignoring event from stale connection {}",
                    channel_id
                ));
                event.release(host);
                return Ok(());
            }
        };

        if let Some(message) = event.message() {
            if !session.client.state().expects(message) {
                Logger::debug(&format!(
                    "Push: Ignoring unexpected `{}` in state {:?}",
                    message,
                    session.client.state()
                ));
                event.release(host);
                return Ok(());
            }
        }

        match event {
            ChannelEvent::Connected => session.client.on_connected(host),
            ChannelEvent::TransportError(reason) => {
                Logger::warn(&format!("Push: Transport error: {}", reason));
            }
            ChannelEvent::Disconnected(reason) => return Err(PlayerError::Disconnected(reason)),
            ChannelEvent::Auth(accepted) => session.client.on_auth(host, accepted),
            ChannelEvent::Mime(Ok(mime)) => session.on_mime(host, mime)?,
            ChannelEvent::Initialization(Ok(resource_id)) => {
                session.on_initialization(host, resource_id)?
            }
            ChannelEvent::Segment(Ok(segment)) => session.on_segment(host, segment)?,
            ChannelEvent::Mime(Err(found)) => {
                return Err(malformed(ChannelMessage::Mime, "a string", found))
            }
            ChannelEvent::Initialization(Err(found)) => {
                return Err(malformed(ChannelMessage::Initialization, "binary data", found))
            }
            ChannelEvent::Segment(Err(found)) => {
                return Err(malformed(ChannelMessage::Segment, "binary data", found))
            }
        }
        Ok(())
    }

    pub(crate) fn on_media_source_state_change<H: Host>(
        &mut self,
        host: &mut H,
        state: MediaSourceReadyState,
    ) -> Result<(), PlayerError> {
        let session = match self.session.as_mut() {
            Some(session) if session.feeder.sink().is_attached() => session,
            _ => return Ok(()),
        };
        if !session.feeder.sink_mut().on_ready_state_change(state) {
            return Ok(());
        }
        let mime = match session.mime.take() {
            Some(mime) => mime,
            None => return Ok(()),
        };
        session.feeder.sink_mut().open_append_target(host, &mime)?;
        session.client.on_sink_open(host);
        Ok(())
    }

    pub(crate) fn on_source_buffer_update<H: Host>(
        &mut self,
        host: &mut H,
        source_buffer_id: SourceBufferId,
        buffered: &TimeRanges,
    ) -> Result<(), PlayerError> {
        let session = match self.session.as_mut() {
            Some(session) if session.feeder.sink().owns(source_buffer_id) => session,
            _ => return Ok(()),
        };
        let ended = session.feeder.on_operation_end();
        Logger::lazy_debug(&|| format!("Push: Operation ended: {:?}", ended));
        let step = session.feeder.feed(host, buffered)?;
        if session.client.mode() == ChannelMode::Pull {
            match step {
                FeedStep::NeedsSegment => session.client.request_any_segment(host),
                FeedStep::Seeked { .. } | FeedStep::Steady => {
                    session.client.request_next_segment(host)
                }
                FeedStep::AppendedQueued | FeedStep::Trimmed { .. } | FeedStep::Coalesced { .. } => {}
            }
        }
        Ok(())
    }

    pub(crate) fn on_source_buffer_error(&mut self, source_buffer_id: SourceBufferId) {
        if let Some(session) = self.session.as_ref() {
            if session.feeder.sink().owns(source_buffer_id) {
                Logger::warn("Push: SourceBuffer error");
            }
        }
    }

    pub(crate) fn on_loaded_metadata<H: Host>(&mut self, host: &mut H) {
        if self.session.is_some() {
            Logger::debug("Push: Metadata loaded");
            start_playback(host, self.autoplay);
        }
    }
}

impl ChannelSession {
    fn on_mime<H: Host>(&mut self, host: &mut H, mime: String) -> Result<(), PlayerError> {
        if !host.is_type_supported(&mime) {
            return Err(PlayerError::UnsupportedFormat(mime));
        }
        Logger::info(&format!("Push: Stream mime-type is {}", mime));
        host.observe_media_events(true);
        self.feeder.sink_mut().attach(host)?;
        self.mime = Some(mime);
        self.client.on_mime_accepted();
        Ok(())
    }

    fn on_initialization<H: Host>(
        &mut self,
        host: &mut H,
        resource_id: ResourceId,
    ) -> Result<(), PlayerError> {
        if let Err(err) = self.push_initialization(host, resource_id) {
            host.free_resource(resource_id);
            return Err(err);
        }
        self.client.on_initialization_pushed(host);
        Ok(())
    }

    fn push_initialization<H: Host>(
        &mut self,
        host: &mut H,
        resource_id: ResourceId,
    ) -> Result<(), PlayerError> {
        let sink = self.feeder.sink_mut();
        sink.set_live_duration(host)?;
        sink.push_init_segment(host, resource_id)?;
        Ok(())
    }

    fn on_segment<H: Host>(&mut self, host: &mut H, segment: MediaSegment) -> Result<(), PlayerError> {
        self.client.on_segment(&segment);
        let resource_id = segment.resource_id;
        match self.feeder.on_segment(host, segment) {
            Ok(SegmentArrival::QueueReset { dropped }) => {
                Logger::debug(&format!("Push: {} segments dropped", dropped));
                Ok(())
            }
            Ok(SegmentArrival::Queued { depth }) => {
                Logger::lazy_debug(&|| format!("Push: Segment queued (depth: {})", depth));
                Ok(())
            }
            Ok(SegmentArrival::Appended) => Ok(()),
            Err(err) => {
                host.free_resource(resource_id);
                Err(err.into())
            }
        }
    }
}

impl StrategyHandle for PushStrategy {
    fn load<H: Host>(&mut self, host: &mut H) -> Result<(), PlayerError> {
        if self.session.is_some() {
            Logger::debug("Push: Already loaded");
            return Ok(());
        }
        let mut client = ChannelClient::new(self.descriptor.clone(), self.mode);
        client.connect(host)?;
        self.session = Some(ChannelSession {
            client,
            feeder: BufferFeeder::new(self.policy),
            mime: None,
        });
        Ok(())
    }

    /// Tear everything down in dependency order: connection first, then the sink (aborting
    /// what it was doing), then the media element.
    fn unload<H: Host>(&mut self, host: &mut H) {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => {
                Logger::debug("Push: Already unloaded");
                return;
            }
        };
        Logger::info("Push: Unloading");
        session.client.close(host);
        host.observe_media_events(false);
        session.feeder.dispose(host);
        reset_media_element(host);
    }

    fn is_loaded(&self) -> bool {
        self.session.is_some()
    }
}

fn malformed(message: ChannelMessage, expected: &'static str, found: String) -> PlayerError {
    PlayerError::MalformedPayload {
        message,
        expected,
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeHost, HostCall};

    const MIME: &str = "video/mp4; codecs=\"avc1.640028\"";

    fn strategy(mode: ChannelMode) -> PushStrategy {
        PushStrategy::new(
            ChannelDescriptor {
                namespace: "cam.local/one".to_owned(),
                path: "/mp4frag".to_owned(),
                key: None,
            },
            mode,
            BufferPolicy::default(),
            true,
        )
    }

    fn segment(sequence: u32) -> ChannelEvent {
        ChannelEvent::Segment(Ok(MediaSegment {
            resource_id: 100 + sequence,
            duration: 2.,
            timestamp: 1000. * sequence as f64,
            sequence,
        }))
    }

    /// Bring a push strategy up to the streaming state, the init segment's append still
    /// pending.
    fn streaming(host: &mut FakeHost, mode: ChannelMode) -> PushStrategy {
        host.supported_mimes.push(MIME.to_owned());
        let mut strategy = strategy(mode);
        strategy.load(host).unwrap();
        strategy
            .on_channel_event(host, 1, ChannelEvent::Connected)
            .unwrap();
        strategy
            .on_channel_event(host, 1, ChannelEvent::Mime(Ok(MIME.to_owned())))
            .unwrap();
        strategy
            .on_media_source_state_change(host, MediaSourceReadyState::Open)
            .unwrap();
        strategy
            .on_channel_event(host, 1, ChannelEvent::Initialization(Ok(10)))
            .unwrap();
        strategy
    }

    #[test]
    fn test_startup_sequence() {
        let mut host = FakeHost::new();
        let _strategy = streaming(&mut host, ChannelMode::All);
        assert_eq!(
            host.calls,
            vec![
                HostCall::ChannelConnect("ws://cam.local/one".to_owned(), "/mp4frag".to_owned(), 5000.),
                HostCall::ChannelEmit(1, ChannelMessage::Mime, None),
                HostCall::ObserveMediaEvents(true),
                HostCall::AttachMediaSource,
                HostCall::AddSourceBuffer(MIME.to_owned(), crate::bindings::AppendMode::Sequence),
                HostCall::ChannelEmit(1, ChannelMessage::Initialization, None),
                HostCall::SetMediaSourceDuration(f64::INFINITY),
                HostCall::AppendBuffer(1, 10),
                HostCall::ChannelEmit(
                    1,
                    ChannelMessage::Segment,
                    Some(r#"{"buffered":true,"all":true}"#.to_owned())
                ),
            ]
        );
    }

    #[test]
    fn test_segments_wait_for_init_append() {
        let mut host = FakeHost::new();
        let mut strategy = streaming(&mut host, ChannelMode::All);
        host.calls.clear();
        strategy.on_channel_event(&mut host, 1, segment(1)).unwrap();
        assert!(host.calls.is_empty());

        strategy
            .on_source_buffer_update(&mut host, 1, &TimeRanges::new())
            .unwrap();
        assert_eq!(host.calls, vec![HostCall::AppendBuffer(1, 101)]);
    }

    #[test]
    fn test_unsupported_mime() {
        let mut host = FakeHost::new();
        let mut strategy = strategy(ChannelMode::All);
        strategy.load(&mut host).unwrap();
        strategy
            .on_channel_event(&mut host, 1, ChannelEvent::Connected)
            .unwrap();
        let res = strategy.on_channel_event(
            &mut host,
            1,
            ChannelEvent::Mime(Ok("unsupported/type".to_owned())),
        );
        assert!(matches!(res, Err(PlayerError::UnsupportedFormat(_))));
        assert!(!host.calls.contains(&HostCall::AttachMediaSource));

        strategy.unload(&mut host);
        host.calls.clear();
        strategy
            .on_channel_event(&mut host, 1, ChannelEvent::Initialization(Ok(10)))
            .unwrap();
        assert_eq!(host.calls, vec![HostCall::FreeResource(10)]);
    }

    #[test]
    fn test_sequence_gap_is_not_fatal() {
        let mut host = FakeHost::new();
        let mut strategy = streaming(&mut host, ChannelMode::All);
        let buffered = TimeRanges::from_flat(&[0., 2.]);
        host.current_time = 0.5;
        for seq in [1, 2, 4] {
            strategy.on_channel_event(&mut host, 1, segment(seq)).unwrap();
            strategy
                .on_source_buffer_update(&mut host, 1, &buffered)
                .unwrap();
        }
        assert!(strategy.is_loaded());
        let appended: Vec<u32> = host
            .calls
            .iter()
            .filter_map(|c| match c {
                HostCall::AppendBuffer(_, id) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(appended, vec![10, 101, 102, 104]);
    }

    #[test]
    fn test_unexpected_and_stale_events() {
        let mut host = FakeHost::new();
        host.supported_mimes.push(MIME.to_owned());
        let mut strategy = strategy(ChannelMode::All);
        strategy.load(&mut host).unwrap();
        strategy
            .on_channel_event(&mut host, 1, ChannelEvent::Connected)
            .unwrap();
        host.calls.clear();

        // a segment while waiting for the mime-type
        strategy.on_channel_event(&mut host, 1, segment(1)).unwrap();
        // an event from another connection
        strategy
            .on_channel_event(&mut host, 7, ChannelEvent::Mime(Ok(MIME.to_owned())))
            .unwrap();
        assert_eq!(host.calls, vec![HostCall::FreeResource(101)]);
    }

    #[test]
    fn test_malformed_payloads() {
        let mut host = FakeHost::new();
        let mut strategy = strategy(ChannelMode::All);
        strategy.load(&mut host).unwrap();
        strategy
            .on_channel_event(&mut host, 1, ChannelEvent::Connected)
            .unwrap();
        let res = strategy.on_channel_event(&mut host, 1, ChannelEvent::Mime(Err("object".to_owned())));
        assert!(matches!(
            res,
            Err(PlayerError::MalformedPayload {
                message: ChannelMessage::Mime,
                ..
            })
        ));

        let mut host = FakeHost::new();
        let mut strategy = streaming(&mut host, ChannelMode::All);
        let res = strategy.on_channel_event(&mut host, 1, ChannelEvent::Segment(Err("string".to_owned())));
        assert!(matches!(
            res,
            Err(PlayerError::MalformedPayload {
                message: ChannelMessage::Segment,
                ..
            })
        ));
    }

    #[test]
    fn test_disconnection_is_fatal() {
        let mut host = FakeHost::new();
        let mut strategy = streaming(&mut host, ChannelMode::All);
        strategy
            .on_channel_event(&mut host, 1, ChannelEvent::TransportError("timeout".to_owned()))
            .unwrap();
        assert!(matches!(
            strategy.on_channel_event(
                &mut host,
                1,
                ChannelEvent::Disconnected("transport close".to_owned())
            ),
            Err(PlayerError::Disconnected(_))
        ));
    }

    #[test]
    fn test_pull_mode() {
        let mut host = FakeHost::new();
        let mut strategy = streaming(&mut host, ChannelMode::Pull);
        assert!(!host
            .calls
            .iter()
            .any(|c| matches!(c, HostCall::ChannelEmit(_, ChannelMessage::Segment, _))));
        host.calls.clear();

        // init segment pushed, nothing buffered yet
        strategy
            .on_source_buffer_update(&mut host, 1, &TimeRanges::new())
            .unwrap();
        assert_eq!(
            host.calls,
            vec![HostCall::ChannelEmit(1, ChannelMessage::Segment, None)]
        );

        host.calls.clear();
        host.current_time = 0.5;
        strategy.on_channel_event(&mut host, 1, segment(1)).unwrap();
        strategy
            .on_source_buffer_update(&mut host, 1, &TimeRanges::from_flat(&[0., 2.]))
            .unwrap();
        assert_eq!(
            host.calls,
            vec![
                HostCall::AppendBuffer(1, 101),
                HostCall::ChannelEmit(
                    1,
                    ChannelMessage::Segment,
                    Some(r#"{"timestamp":1000.0}"#.to_owned())
                ),
            ]
        );
    }

    #[test]
    fn test_metadata_starts_playback() {
        let mut host = FakeHost::new();
        let mut strategy = streaming(&mut host, ChannelMode::All);
        host.calls.clear();
        strategy.on_loaded_metadata(&mut host);
        assert_eq!(host.calls, vec![HostCall::Play]);
    }

    #[test]
    fn test_unload_order() {
        let mut host = FakeHost::new();
        let mut strategy = streaming(&mut host, ChannelMode::All);
        strategy.on_channel_event(&mut host, 1, segment(1)).unwrap();
        host.calls.clear();
        strategy.unload(&mut host);
        assert_eq!(
            host.calls,
            vec![
                HostCall::ChannelClose(1),
                HostCall::ObserveMediaEvents(false),
                HostCall::FreeResource(101),
                HostCall::AbortSourceBuffer(1),
                HostCall::RemoveMediaSource,
                HostCall::SetControls(false),
                HostCall::Pause,
                HostCall::RemoveSource,
                HostCall::ReloadElement,
            ]
        );
        assert!(!strategy.is_loaded());
    }
}
