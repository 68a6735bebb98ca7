use serde::Serialize;
use thiserror::Error;

use crate::{
    bindings::{ChannelConnectErrorCode, ChannelId, ChannelMessage, Host, ResourceId},
    config::ChannelMode,
    source_resolver::ChannelDescriptor,
    utils::url::Url,
    Logger,
};

/// Timeout, in milliseconds, given to the transport when connecting.
const CONNECT_TIMEOUT_MS: f64 = 5000.;

/// States a `ChannelClient` goes through, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChannelState {
    /// Not connected yet.
    Idle,

    /// Waiting for the transport to announce the connection.
    Connecting,

    /// The credential has been sent, waiting for the server to accept it.
    Authenticating,

    /// The stream's mime-type has been requested.
    AwaitingMime,

    /// The mime-type is known, waiting for the media sink to open.
    OpeningSink,

    /// The initialization segment has been requested.
    AwaitingInitialization,

    /// Media segments are flowing.
    Streaming,

    /// The connection has been closed and won't be used anymore.
    TornDown,
}

impl ChannelState {
    /// Returns `true` if the given server message is expected in this state.
    pub(crate) fn expects(&self, message: ChannelMessage) -> bool {
        matches!(
            (self, message),
            (ChannelState::Authenticating, ChannelMessage::Auth)
                | (ChannelState::AwaitingMime, ChannelMessage::Mime)
                | (ChannelState::AwaitingInitialization, ChannelMessage::Initialization)
                | (ChannelState::Streaming, ChannelMessage::Segment)
        )
    }
}

/// A media segment received on the channel, whose data still lives on the JavaScript-side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MediaSegment {
    pub(crate) resource_id: ResourceId,

    /// Duration of the segment, in seconds.
    pub(crate) duration: f64,

    /// Server-side timestamp of the segment, sent back when pulling the next one.
    pub(crate) timestamp: f64,

    /// Sequence number of the segment, incremented by one for each new segment.
    pub(crate) sequence: u32,
}

/// Metadata of the last segment received.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LastSeen {
    pub(crate) timestamp: f64,
    pub(crate) sequence: u32,
}

/// Payload of an `auth` request.
#[derive(Serialize)]
struct AuthRequest<'a> {
    key: &'a str,
}

/// Payload of a `segment` request.
#[derive(Debug, Default, Serialize, PartialEq)]
pub(crate) struct SegmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buffered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all: Option<bool>,
}

/// Client side of the segment channel protocol.
///
/// Only keeps track of the protocol's progression: what is done with the received data
/// is up to its owner.
pub(crate) struct ChannelClient {
    descriptor: ChannelDescriptor,
    mode: ChannelMode,
    state: ChannelState,

    /// Identifier of the current connection, `None` until `connect` succeeded.
    id: Option<ChannelId>,

    last_seen: Option<LastSeen>,
}

impl ChannelClient {
    pub(crate) fn new(descriptor: ChannelDescriptor, mode: ChannelMode) -> Self {
        Self {
            descriptor,
            mode,
            state: ChannelState::Idle,
            id: None,
            last_seen: None,
        }
    }

    pub(crate) fn state(&self) -> ChannelState {
        self.state
    }

    pub(crate) fn mode(&self) -> ChannelMode {
        self.mode
    }

    #[cfg(test)]
    pub(crate) fn last_seen(&self) -> Option<LastSeen> {
        self.last_seen
    }

    /// Returns `true` if `id` identifies the current connection.
    pub(crate) fn owns(&self, id: ChannelId) -> bool {
        self.id == Some(id) && self.state != ChannelState::TornDown
    }

    /// Open the connection to the segment server.
    pub(crate) fn connect<H: Host>(&mut self, host: &mut H) -> Result<(), ChannelConnectError> {
        let endpoint = Url::websocket_endpoint(&self.descriptor.namespace, host.is_secure_page());
        Logger::info(&format!(
            "Channel: Connecting to {} (path: {})",
            endpoint, self.descriptor.path
        ));
        let id = host.channel_connect(endpoint.get_ref(), &self.descriptor.path, CONNECT_TIMEOUT_MS)?;
        self.id = Some(id);
        self.state = ChannelState::Connecting;
        Ok(())
    }

    /// To call once the transport announced the connection.
    pub(crate) fn on_connected<H: Host>(&mut self, host: &mut H) {
        if self.state != ChannelState::Connecting {
            Logger::debug("Channel: Ignoring connection outside of the connecting state");
            return;
        }
        Logger::info("Channel: Connected");
        if self.descriptor.key.is_some() {
            self.state = ChannelState::Authenticating;
            self.send_auth(host);
        } else {
            self.request_mime(host);
        }
    }

    /// To call when the server answered an authentication request.
    ///
    /// A refused credential is sent again right away, the server deciding of the pace.
    pub(crate) fn on_auth<H: Host>(&mut self, host: &mut H, accepted: bool) {
        if accepted {
            Logger::info("Channel: Authenticated");
            self.request_mime(host);
        } else {
            Logger::warn("Channel: Credential refused, sending it again");
            self.send_auth(host);
        }
    }

    /// To call when the mime-type has been received and validated, before opening the
    /// media sink.
    pub(crate) fn on_mime_accepted(&mut self) {
        self.state = ChannelState::OpeningSink;
    }

    /// To call once the media sink is ready to receive the initialization segment.
    pub(crate) fn on_sink_open<H: Host>(&mut self, host: &mut H) {
        if self.state != ChannelState::OpeningSink {
            Logger::debug("Channel: Media sink opened in an unexpected state");
            return;
        }
        self.state = ChannelState::AwaitingInitialization;
        self.emit(host, ChannelMessage::Initialization, None);
    }

    /// To call once the initialization segment has been pushed. In `All` mode, the
    /// server is asked to push every segment from there.
    pub(crate) fn on_initialization_pushed<H: Host>(&mut self, host: &mut H) {
        self.state = ChannelState::Streaming;
        if self.mode == ChannelMode::All {
            self.request_segments(
                host,
                SegmentRequest {
                    buffered: Some(true),
                    all: Some(true),
                    ..SegmentRequest::default()
                },
            );
        }
    }

    /// Keep track of a new media segment's metadata.
    ///
    /// Returns `true` if segments were skipped since the previous one. This is not an
    /// error: the new segment is used anyway.
    pub(crate) fn on_segment(&mut self, segment: &MediaSegment) -> bool {
        let gap = match self.last_seen {
            Some(last) if segment.sequence != last.sequence.wrapping_add(1) => {
                Logger::warn(&format!(
                    "Channel: Sequence gap, received #{} after #{}",
                    segment.sequence, last.sequence
                ));
                true
            }
            _ => false,
        };
        self.last_seen = Some(LastSeen {
            timestamp: segment.timestamp,
            sequence: segment.sequence,
        });
        gap
    }

    /// Ask for any segment, without reference to a previous one.
    pub(crate) fn request_any_segment<H: Host>(&mut self, host: &mut H) {
        self.request_segments(host, SegmentRequest::default());
    }

    /// Ask for the segment following the last one received.
    pub(crate) fn request_next_segment<H: Host>(&mut self, host: &mut H) {
        let timestamp = self.last_seen.map(|l| l.timestamp);
        self.request_segments(
            host,
            SegmentRequest {
                timestamp,
                ..SegmentRequest::default()
            },
        );
    }

    /// Close the connection. Nothing is sent nor accepted afterwards.
    pub(crate) fn close<H: Host>(&mut self, host: &mut H) {
        if let Some(id) = self.id {
            if self.state != ChannelState::TornDown {
                Logger::info("Channel: Closing connection");
                host.channel_close(id);
            }
        }
        self.state = ChannelState::TornDown;
    }

    fn send_auth<H: Host>(&mut self, host: &mut H) {
        let payload = self
            .descriptor
            .key
            .as_deref()
            .and_then(|key| to_payload(&AuthRequest { key }));
        self.emit(host, ChannelMessage::Auth, payload);
    }

    fn request_mime<H: Host>(&mut self, host: &mut H) {
        self.state = ChannelState::AwaitingMime;
        self.emit(host, ChannelMessage::Mime, None);
    }

    fn request_segments<H: Host>(&mut self, host: &mut H, request: SegmentRequest) {
        let payload = if request == SegmentRequest::default() {
            None
        } else {
            to_payload(&request)
        };
        self.emit(host, ChannelMessage::Segment, payload);
    }

    fn emit<H: Host>(&self, host: &mut H, message: ChannelMessage, payload: Option<String>) {
        if let Some(id) = self.id {
            Logger::lazy_debug(&|| {
                format!(
                    "Channel: Emitting `{}` {}",
                    message,
                    payload.as_deref().unwrap_or("")
                )
            });
            host.channel_emit(id, message, payload);
        }
    }
}

fn to_payload<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(payload) => Some(payload),
        Err(err) => {
            Logger::error(&format!("Channel: Cannot serialize request: {}", err));
            None
        }
    }
}

/// Error encountered synchronously when opening a segment channel connection.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum ChannelConnectError {
    #[error("The segment channel library is not available")]
    LibraryMissing,
    #[error("Invalid segment channel endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Uncategorized error when connecting to the segment channel: {0}")]
    UnknownError(String),
}

impl ChannelConnectError {
    /// Creates a new `ChannelConnectError` based on the original error as returned by the
    /// `jsChannelConnect` binding.
    pub(crate) fn from_js_channel_connect_error(
        err: (ChannelConnectErrorCode, Option<String>),
    ) -> Self {
        match err.0 {
            ChannelConnectErrorCode::LibraryMissing => ChannelConnectError::LibraryMissing,
            ChannelConnectErrorCode::InvalidEndpoint => {
                ChannelConnectError::InvalidEndpoint(err.1.unwrap_or_default())
            }
            ChannelConnectErrorCode::UnknownError => ChannelConnectError::UnknownError(
                err.1.unwrap_or_else(|| "Unknown error.".to_owned()),
            ),
        }
    }
}
