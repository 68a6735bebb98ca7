use thiserror::Error;

use crate::bindings::{
    AddSourceBufferErrorCode, AppendBufferErrorCode, AppendMode, Host, RemoveBufferErrorCode,
    ResourceId, SourceBufferId,
};
use crate::Logger;

/// Abstraction over the Media Source Extension's `SourceBuffer` concept, which we call the
/// "append target" here.
///
/// It enforces that at most a single operation (append or remove) is pending at any time:
/// trying to start a new one before `on_operation_end` was called fails with a
/// `TargetBusy` error.
pub(super) struct AppendTarget {
    /// The `SourceBufferId` given on SourceBuffer creation, used to identify
    /// this `AppendTarget` when talking with JavaScript.
    id: SourceBufferId,

    /// The Content-Type currently linked to the SourceBuffer
    typ: String,

    /// The operation currently performed by the SourceBuffer, if one.
    pending: Option<PendingOperation>,
}

impl AppendTarget {
    /// Create a new `AppendTarget` for the mime-type indicated by `typ`, with the "sequence"
    /// append mode, so segments are placed one after the other whatever their timestamps.
    pub(super) fn new<H: Host>(host: &mut H, typ: String) -> Result<Self, AddSourceBufferError> {
        Logger::info(&format!("Buffer: Creating SourceBuffer for \"{}\"", typ));
        let id = host.add_source_buffer(&typ, AppendMode::Sequence)?;
        Ok(Self {
            id,
            typ,
            pending: None,
        })
    }

    /// Returns the `SourceBufferId` needed to refer to that SourceBuffer when interacting with
    /// JavaScript.
    pub(super) fn id(&self) -> SourceBufferId {
        self.id
    }

    /// Returns `true` if an operation is still being performed by the SourceBuffer.
    pub(super) fn is_updating(&self) -> bool {
        self.pending.is_some()
    }

    /// Pushes the initialization segment.
    pub(super) fn push_init_segment<H: Host>(
        &mut self,
        host: &mut H,
        resource_id: ResourceId,
    ) -> Result<(), PushSegmentError> {
        self.check_idle()?;
        Logger::debug(&format!(
            "Buffer {} ({}): Pushing initialization segment",
            self.id, self.typ
        ));
        host.append_buffer(self.id, resource_id)?;
        self.pending = Some(PendingOperation::PushInit);
        Ok(())
    }

    /// Pushes a media segment, identified by its `sequence` number.
    pub(super) fn push_media_segment<H: Host>(
        &mut self,
        host: &mut H,
        resource_id: ResourceId,
        sequence: u32,
    ) -> Result<(), PushSegmentError> {
        self.check_idle()?;
        Logger::lazy_debug(&|| {
            format!("Buffer {} ({}): Pushing segment #{}", self.id, self.typ, sequence)
        });
        host.append_buffer(self.id, resource_id)?;
        self.pending = Some(PendingOperation::PushMedia { sequence });
        Ok(())
    }

    /// Remove media data from this `AppendTarget`, based on a `start` and `end` time in seconds.
    pub(super) fn remove_buffer<H: Host>(
        &mut self,
        host: &mut H,
        start: f64,
        end: f64,
    ) -> Result<(), RemoveDataError> {
        if self.pending.is_some() {
            return Err(RemoveDataError::TargetBusy);
        }
        Logger::debug(&format!(
            "Buffer {} ({}): Removing {} {}",
            self.id, self.typ, start, end
        ));
        host.remove_buffer(self.id, start, end)?;
        self.pending = Some(PendingOperation::Remove { start, end });
        Ok(())
    }

    /// Abort the operation currently pending, if one.
    pub(super) fn abort<H: Host>(&mut self, host: &mut H) {
        if self.pending.take().is_some() {
            Logger::debug(&format!("Buffer {} ({}): Aborting", self.id, self.typ));
            host.abort_source_buffer(self.id);
        }
    }

    /// To call once the operation pending on the underlying SourceBuffer has finished.
    pub(super) fn on_operation_end(&mut self) -> Option<PendingOperation> {
        self.pending.take()
    }

    fn check_idle(&self) -> Result<(), PushSegmentError> {
        if self.pending.is_some() {
            Err(PushSegmentError::TargetBusy)
        } else {
            Ok(())
        }
    }
}

/// Operations an `AppendTarget` can be performing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PendingOperation {
    /// The initialization segment is being pushed.
    PushInit,

    /// A media segment is being pushed.
    PushMedia { sequence: u32 },

    /// Some already-buffered data is being removed, `start` and `end` giving the
    /// time range of the data to remove, in seconds.
    Remove { start: f64, end: f64 },
}

/// Formatted error when the creation of a MSE SourceBuffer fails.
///
/// This is almost a 1:1 to error codes returned by `AddSourceBufferErrorCode`.
#[derive(Error, Debug)]
pub(crate) enum AddSourceBufferError {
    #[error("SourceBuffer initialization impossible: {message}")]
    NoMediaSourceAttached { message: String },
    #[error("Could not create SourceBuffer because the MediaSource instance was closed.")]
    MediaSourceIsClosed,
    #[error("QuotaExceededError received when trying to create SourceBuffer: {message}")]
    QuotaExceededError { message: String },
    #[error("Could not create SourceBuffer due to unsupported `{mime_type}` mime-type: {message}")]
    TypeNotSupportedError { mime_type: String, message: String },
    #[error("Could not create SourceBuffer because no mime-type was defined.")]
    EmptyMimeType,
    #[error("Uncategorized Error when creating SourceBuffer: {message}")]
    UnknownError { message: String },
}

impl AddSourceBufferError {
    /// Translate `AddSourceBufferErrorCode` and its optional accompanying message, as returned by
    /// the `jsAddSourceBuffer` JavaScript function, into the corresponding `AddSourceBufferError`.
    ///
    /// # Arguments
    ///
    /// * `err` - The error received from the `jsAddSourceBuffer` JavaScript function.
    ///
    /// * `mime_type` - Mime-type linked to this SourceBuffer.
    pub(crate) fn from_js_add_source_buffer_error(
        err: (AddSourceBufferErrorCode, Option<String>),
        mime_type: &str,
    ) -> Self {
        match err.0 {
            AddSourceBufferErrorCode::NoMediaSourceAttached => {
                AddSourceBufferError::NoMediaSourceAttached {
                    message: err
                        .1
                        .unwrap_or_else(|| "MediaSource instance not found.".to_owned()),
                }
            }
            AddSourceBufferErrorCode::MediaSourceIsClosed => {
                AddSourceBufferError::MediaSourceIsClosed
            }
            AddSourceBufferErrorCode::QuotaExceededError => {
                AddSourceBufferError::QuotaExceededError {
                    message: err
                        .1
                        .unwrap_or_else(|| "Unknown QuotaExceededError error".to_owned()),
                }
            }
            AddSourceBufferErrorCode::TypeNotSupportedError => {
                AddSourceBufferError::TypeNotSupportedError {
                    mime_type: mime_type.to_string(),
                    message: err
                        .1
                        .unwrap_or_else(|| "Unknown NotSupportedError error".to_owned()),
                }
            }
            AddSourceBufferErrorCode::EmptyMimeType => AddSourceBufferError::EmptyMimeType,
            AddSourceBufferErrorCode::UnknownError => AddSourceBufferError::UnknownError {
                message: err.1.unwrap_or_else(|| "Unknown error.".to_owned()),
            },
        }
    }
}

/// Error encountered synchronously after trying to push a segment to an `AppendTarget`.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum PushSegmentError {
    #[error("No SourceBuffer has been created yet")]
    NoSourceBuffer,
    #[error("The resource appended did not exist.")]
    NoResource,
    #[error("An operation is already pending on the SourceBuffer")]
    TargetBusy,
    #[error("Uncategorized Error with the SourceBuffer: {0}")]
    UnknownError(String),
}

impl PushSegmentError {
    /// Creates a new `PushSegmentError` based on the original error as returned by the
    /// `jsAppendBuffer` binding.
    pub(crate) fn from_js_append_buffer_error(err: (AppendBufferErrorCode, Option<String>)) -> Self {
        match err.0 {
            AppendBufferErrorCode::NoSourceBuffer => PushSegmentError::NoSourceBuffer,
            AppendBufferErrorCode::NoResource => PushSegmentError::NoResource,
            AppendBufferErrorCode::UnknownError => {
                PushSegmentError::UnknownError(err.1.unwrap_or_else(|| "Unknown error.".to_owned()))
            }
        }
    }
}

/// Error encountered synchronously after trying to remove media data from an `AppendTarget`.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum RemoveDataError {
    #[error("No SourceBuffer has been created yet")]
    NoSourceBuffer,
    #[error("An operation is already pending on the SourceBuffer")]
    TargetBusy,
    #[error("Uncategorized Error when removing data: {0}")]
    UnknownError(String),
}

impl RemoveDataError {
    /// Creates a new `RemoveDataError` based on the original error as returned by the
    /// `jsRemoveBuffer` binding.
    pub(crate) fn from_js_remove_buffer_error(err: (RemoveBufferErrorCode, Option<String>)) -> Self {
        match err.0 {
            RemoveBufferErrorCode::SourceBufferNotFound => RemoveDataError::NoSourceBuffer,
            RemoveBufferErrorCode::UnknownError => {
                RemoveDataError::UnknownError(err.1.unwrap_or_else(|| "Unknown error.".to_owned()))
            }
        }
    }
}
