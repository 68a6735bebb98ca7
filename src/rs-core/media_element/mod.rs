use thiserror::Error;

use crate::bindings::{
    AttachMediaSourceErrorCode, Host, MediaSourceDurationUpdateErrorCode, ResourceId,
    SourceBufferId,
};
use crate::wasm_bindgen;
use crate::Logger;

use source_buffer::AppendTarget;
pub(crate) use source_buffer::{
    AddSourceBufferError, PendingOperation, PushSegmentError, RemoveDataError,
};

pub(crate) use buffer_feeder::{BufferFeeder, FeedStep, SegmentArrival};

mod buffer_feeder;
mod source_buffer;

/// Identify the JavaScript `readyState` of a created `MediaSource` instance.
#[wasm_bindgen]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MediaSourceReadyState {
    /// Corresponds to the "closed" JavaScript MediaSource's `readyState`
    Closed = 0,
    /// Corresponds to the "ended" JavaScript MediaSource's `readyState`
    Ended = 1,
    /// Corresponds to the "open" JavaScript MediaSource's `readyState`
    Open = 2,
}

/// The buffered media sink: a MediaSource attached to the media element and the single
/// SourceBuffer segments are appended to.
pub(crate) struct MediaSink {
    /// Current state of the attached MediaSource.
    ///
    /// `None` if no MediaSource is attached for now.
    ready_state: Option<MediaSourceReadyState>,

    /// `None` until the MediaSource opened and the mime-type was communicated.
    append_target: Option<AppendTarget>,
}

impl MediaSink {
    pub(crate) fn new() -> Self {
        Self {
            ready_state: None,
            append_target: None,
        }
    }

    /// Create a MediaSource and attach it to the media element. Its opening will be
    /// announced through `on_ready_state_change`.
    pub(crate) fn attach<H: Host>(&mut self, host: &mut H) -> Result<(), AttachMediaSourceError> {
        Logger::info("Sink: Attaching MediaSource");
        host.attach_media_source()?;
        self.ready_state = Some(MediaSourceReadyState::Closed);
        Ok(())
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.ready_state.is_some()
    }

    /// Update the known MediaSource state. Returns `true` if the MediaSource just opened.
    pub(crate) fn on_ready_state_change(&mut self, state: MediaSourceReadyState) -> bool {
        let previous = self.ready_state.replace(state);
        Logger::debug(&format!("Sink: MediaSource state is now {:?}", state));
        state == MediaSourceReadyState::Open && previous != Some(MediaSourceReadyState::Open)
    }

    /// Create the SourceBuffer for the given mime-type and announce an unbounded
    /// duration, as the content is live.
    pub(crate) fn open_append_target<H: Host>(
        &mut self,
        host: &mut H,
        mime: &str,
    ) -> Result<SourceBufferId, AddSourceBufferError> {
        match self.ready_state {
            Some(MediaSourceReadyState::Open) => {}
            Some(_) => return Err(AddSourceBufferError::MediaSourceIsClosed),
            None => {
                return Err(AddSourceBufferError::NoMediaSourceAttached {
                    message: "MediaSource not attached yet.".to_owned(),
                })
            }
        }
        let target = AppendTarget::new(host, mime.to_owned())?;
        let id = target.id();
        self.append_target = Some(target);
        Ok(id)
    }

    pub(crate) fn set_live_duration<H: Host>(
        &mut self,
        host: &mut H,
    ) -> Result<(), MediaSourceDurationError> {
        host.set_media_source_duration(f64::INFINITY)
    }

    /// Returns `true` if the SourceBuffer with the given id is the one of this sink.
    pub(crate) fn owns(&self, id: SourceBufferId) -> bool {
        self.append_target.as_ref().map(|t| t.id()) == Some(id)
    }

    /// Returns `true` if an append or a removal is still pending.
    pub(crate) fn is_busy(&self) -> bool {
        self.append_target
            .as_ref()
            .map_or(false, |t| t.is_updating())
    }

    pub(crate) fn push_init_segment<H: Host>(
        &mut self,
        host: &mut H,
        resource_id: ResourceId,
    ) -> Result<(), PushSegmentError> {
        match self.append_target.as_mut() {
            Some(target) => target.push_init_segment(host, resource_id),
            None => Err(PushSegmentError::NoSourceBuffer),
        }
    }

    pub(crate) fn push_media_segment<H: Host>(
        &mut self,
        host: &mut H,
        resource_id: ResourceId,
        sequence: u32,
    ) -> Result<(), PushSegmentError> {
        match self.append_target.as_mut() {
            Some(target) => target.push_media_segment(host, resource_id, sequence),
            None => Err(PushSegmentError::NoSourceBuffer),
        }
    }

    pub(crate) fn remove<H: Host>(
        &mut self,
        host: &mut H,
        start: f64,
        end: f64,
    ) -> Result<(), RemoveDataError> {
        match self.append_target.as_mut() {
            Some(target) => target.remove_buffer(host, start, end),
            None => Err(RemoveDataError::NoSourceBuffer),
        }
    }

    /// To call when the SourceBuffer announced the end of its pending operation.
    pub(crate) fn on_operation_end(&mut self) -> Option<PendingOperation> {
        self.append_target
            .as_mut()
            .and_then(|t| t.on_operation_end())
    }

    /// Abort any pending operation then remove the SourceBuffer and the MediaSource.
    pub(crate) fn dispose<H: Host>(&mut self, host: &mut H) {
        if let Some(mut target) = self.append_target.take() {
            target.abort(host);
        }
        if self.ready_state.take().is_some() {
            Logger::info("Sink: Removing MediaSource");
            host.remove_media_source();
        }
    }
}

/// Error that may be returned by an `attach` call.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum AttachMediaSourceError {
    #[error("MediaSource is not available on this platform")]
    MediaSourceUnavailable,
    #[error("Uncategorized Error when attaching MediaSource: {message}")]
    UnknownError { message: String },
}

impl AttachMediaSourceError {
    pub(crate) fn from_js_attach_media_source_error(
        err: (AttachMediaSourceErrorCode, Option<String>),
    ) -> Self {
        match err.0 {
            AttachMediaSourceErrorCode::MediaSourceUnavailable => {
                AttachMediaSourceError::MediaSourceUnavailable
            }
            AttachMediaSourceErrorCode::UnknownError => AttachMediaSourceError::UnknownError {
                message: err.1.unwrap_or_else(|| "Unknown Error.".to_string()),
            },
        }
    }
}

/// Error that may be returned when updating the MediaSource's duration.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum MediaSourceDurationError {
    #[error("Cannot update duration: no MediaSource attached")]
    NoMediaSourceAttached,
    #[error("Uncategorized Error when updating the MediaSource's duration: {message}")]
    UnknownError { message: String },
}

impl MediaSourceDurationError {
    pub(crate) fn from_js_duration_update_error(
        err: (MediaSourceDurationUpdateErrorCode, Option<String>),
    ) -> Self {
        match err.0 {
            MediaSourceDurationUpdateErrorCode::NoMediaSourceAttached => {
                MediaSourceDurationError::NoMediaSourceAttached
            }
            MediaSourceDurationUpdateErrorCode::UnknownError => {
                MediaSourceDurationError::UnknownError {
                    message: err.1.unwrap_or_else(|| "Unknown Error.".to_string()),
                }
            }
        }
    }
}
