use thiserror::Error;

use crate::{
    bindings::{ChannelMessage, ExternalLibrary},
    channel::ChannelConnectError,
    media_element::{
        AddSourceBufferError, AttachMediaSourceError, MediaSourceDurationError, PushSegmentError,
        RemoveDataError,
    },
    strategies::EngineError,
};

/// Every error leading to the current strategy being unloaded and the error poster being
/// displayed.
///
/// Recoverable conditions (sequence gaps, queue resets, recoverable engine errors...) are
/// logged where they happen and never turned into a `PlayerError`.
#[derive(Error, Debug)]
pub(crate) enum PlayerError {
    #[error("The {0} library never became available")]
    LibraryUnavailable(ExternalLibrary),

    #[error("Segment channel connection failed: {0}")]
    ConnectionFailed(#[from] ChannelConnectError),

    #[error("Segment channel disconnected: {0}")]
    Disconnected(String),

    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed `{message}` payload: expected {expected}, got {found}")]
    MalformedPayload {
        message: ChannelMessage,
        expected: &'static str,
        found: String,
    },

    #[error(transparent)]
    AttachMediaSource(#[from] AttachMediaSourceError),

    #[error(transparent)]
    SourceBufferCreation(#[from] AddSourceBufferError),

    #[error(transparent)]
    MediaSourceDuration(#[from] MediaSourceDurationError),

    #[error(transparent)]
    PushSegment(#[from] PushSegmentError),

    #[error(transparent)]
    RemoveData(#[from] RemoveDataError),

    #[error(transparent)]
    EngineCreation(#[from] EngineError),

    #[error("The HLS engine reported a fatal error: {0}")]
    EngineFatal(String),
}

/// Broad families of `PlayerError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ErrorCategory {
    CapabilityMissing,
    ConnectionFailure,
    UnsupportedFormat,
    MalformedPayload,
    MediaSink,
    Engine,
}

impl PlayerError {
    pub(crate) fn category(&self) -> ErrorCategory {
        match self {
            PlayerError::LibraryUnavailable(_) => ErrorCategory::CapabilityMissing,
            PlayerError::ConnectionFailed(_) | PlayerError::Disconnected(_) => {
                ErrorCategory::ConnectionFailure
            }
            PlayerError::UnsupportedFormat(_) => ErrorCategory::UnsupportedFormat,
            PlayerError::MalformedPayload { .. } => ErrorCategory::MalformedPayload,
            PlayerError::AttachMediaSource(_)
            | PlayerError::SourceBufferCreation(_)
            | PlayerError::MediaSourceDuration(_)
            | PlayerError::PushSegment(_)
            | PlayerError::RemoveData(_) => ErrorCategory::MediaSink,
            PlayerError::EngineCreation(_) | PlayerError::EngineFatal(_) => ErrorCategory::Engine,
        }
    }
}
