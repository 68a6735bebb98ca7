use super::FragPlayer;
use crate::{
    bindings::{ChannelId, HlsErrorKind, ResourceId, SourceBufferId, TimerId, TimerReason},
    channel::MediaSegment,
    media_element::MediaSourceReadyState,
    strategies::ChannelEvent,
    utils::time_ranges::TimeRanges,
    wasm_bindgen,
};

/// Methods triggered on JavaScript events by the JavaScript code.
///
/// Channel payloads which could not be turned into the expected type are signaled by
/// setting the value to `undefined` and `found_type` to the `typeof` of what was received.
#[wasm_bindgen]
impl FragPlayer {
    /// The JS code should call this method each time a timer started with the `jsTimer`
    /// function finished.
    ///
    /// # Arguments
    ///
    /// * `id` - The `TimerId` given by `jsTimer` when the timer was started.
    ///
    /// * `reason` - The `TimerReason` given by the Rust code when that timer
    ///   was started.
    pub fn on_timer_ended(&mut self, id: TimerId, reason: TimerReason) {
        self.controller.on_timer_ended(id, reason);
    }

    /// The JS code should call this method once the connection started by
    /// `jsChannelConnect` is established.
    pub fn on_channel_connected(&mut self, channel_id: ChannelId) {
        self.controller
            .on_channel_event(channel_id, ChannelEvent::Connected);
    }

    /// The JS code should call this method when the server answers an `auth` message.
    pub fn on_channel_auth(&mut self, channel_id: ChannelId, accepted: bool) {
        self.controller
            .on_channel_event(channel_id, ChannelEvent::Auth(accepted));
    }

    /// The JS code should call this method when the server answers a `mime` message.
    pub fn on_channel_mime(&mut self, channel_id: ChannelId, mime: Option<String>, found_type: String) {
        let payload = mime.ok_or(found_type);
        self.controller
            .on_channel_event(channel_id, ChannelEvent::Mime(payload));
    }

    /// The JS code should call this method when the server answers an `initialization`
    /// message.
    ///
    /// # Arguments
    ///
    /// * `channel_id` - The identifier returned by `jsChannelConnect`.
    ///
    /// * `resource_id` - Id referring to the initialization segment's data on the
    ///   JavaScript-side. Its ownership is given to the Rust-side.
    ///
    /// * `found_type` - `typeof` of the payload, only used when `resource_id` is not set.
    pub fn on_channel_initialization(
        &mut self,
        channel_id: ChannelId,
        resource_id: Option<ResourceId>,
        found_type: String,
    ) {
        let payload = resource_id.ok_or(found_type);
        self.controller
            .on_channel_event(channel_id, ChannelEvent::Initialization(payload));
    }

    /// The JS code should call this method when the server sends a media segment.
    ///
    /// # Arguments
    ///
    /// * `channel_id` - The identifier returned by `jsChannelConnect`.
    ///
    /// * `resource_id` - Id referring to the segment's data on the JavaScript-side. Its
    ///   ownership is given to the Rust-side.
    ///
    /// * `found_type` - `typeof` of the payload, only used when `resource_id` is not set.
    ///
    /// * `duration` - Duration of the segment, in seconds.
    ///
    /// * `timestamp` - Server-side timestamp of the segment.
    ///
    /// * `sequence` - Sequence number of the segment.
    pub fn on_channel_segment(
        &mut self,
        channel_id: ChannelId,
        resource_id: Option<ResourceId>,
        found_type: String,
        duration: f64,
        timestamp: f64,
        sequence: u32,
    ) {
        let payload = resource_id
            .map(|resource_id| MediaSegment {
                resource_id,
                duration,
                timestamp,
                sequence,
            })
            .ok_or(found_type);
        self.controller
            .on_channel_event(channel_id, ChannelEvent::Segment(payload));
    }

    /// The JS code should call this method when the connection is definitely lost.
    pub fn on_channel_disconnected(&mut self, channel_id: ChannelId, reason: String) {
        self.controller
            .on_channel_event(channel_id, ChannelEvent::Disconnected(reason));
    }

    /// The JS code should call this method on transport errors the transport recovers
    /// from by itself (connection errors, reconnection attempts...).
    pub fn on_channel_error(&mut self, channel_id: ChannelId, message: String) {
        self.controller
            .on_channel_event(channel_id, ChannelEvent::TransportError(message));
    }

    /// The JS code should call this method when the MediaSource's readyState changed.
    pub fn on_media_source_state_change(&mut self, state: MediaSourceReadyState) {
        self.controller.on_media_source_state_change(state);
    }

    /// The JS code should call this method when a SourceBuffer emits an `updateend`
    /// event.
    ///
    /// # Arguments
    ///
    /// * `source_buffer_id` - The identifier generated when the SourceBuffer was created.
    ///
    /// * `buffered` - The SourceBuffer's `buffered` ranges, flattened as
    ///   `[start0, end0, start1, end1...]`.
    pub fn on_source_buffer_update(&mut self, source_buffer_id: SourceBufferId, buffered: Vec<f64>) {
        let buffered = TimeRanges::from_flat(&buffered);
        self.controller
            .on_source_buffer_update(source_buffer_id, &buffered);
    }

    /// The JS code should call this method when a SourceBuffer emits an `error` event.
    pub fn on_source_buffer_error(&mut self, source_buffer_id: SourceBufferId) {
        self.controller.on_source_buffer_error(source_buffer_id);
    }

    pub fn on_loaded_metadata(&mut self) {
        self.controller.on_loaded_metadata();
    }

    pub fn on_media_error(&mut self, message: String) {
        self.controller.on_media_error(&message);
    }

    /// The JS code should call this method once the promise returned by the media
    /// element's `play` method settled.
    pub fn on_play_result(&mut self, success: bool) {
        self.controller.on_play_result(success);
    }

    pub fn on_hls_manifest_parsed(&mut self) {
        self.controller.on_hls_manifest_parsed();
    }

    /// The JS code should call this method on each error event of the HLS engine.
    pub fn on_hls_error(&mut self, kind: HlsErrorKind, fatal: bool, details: String) {
        self.controller.on_hls_error(kind, fatal, &details);
    }

    pub fn on_visibility_change(&mut self) {
        self.controller.on_engagement_input();
    }

    /// The JS code should call this method each time the intersection observer set up
    /// by `jsObserveEngagement` reports a change.
    ///
    /// # Arguments
    ///
    /// * `ratio` - Visible ratio of the media element, from `0` to `1`.
    pub fn on_intersection_change(&mut self, ratio: f64) {
        self.controller.on_intersection_change(ratio);
    }

    pub fn on_fullscreen_change(&mut self) {
        self.controller.on_engagement_input();
    }

    pub fn on_picture_in_picture_change(&mut self) {
        self.controller.on_engagement_input();
    }
}
