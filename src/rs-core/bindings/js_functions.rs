use crate::wasm_bindgen;
use std::fmt;

/// # js_functions
///
/// This file lists all JavaScript functions that are callable from Rust as well as
/// struct and enumeration used by those functions.
///
/// None of those functions should be called directly by the core logic: they are only
/// reached through the `JsHost` implementation of the `Host` trait.

#[wasm_bindgen]
extern "C" {
    // Log the given text in the JavaScript console, with the log level given.
    pub fn jsLog(log_level: LogLevel, log: &str);

    // Starts a timer for the number of milliseconds indicated by the `duration` argument.
    //
    // Once this timer has elapsed, and unless `jsClearTimer` has been called since with
    // the `TimerId` returned by this function, the `on_timer_ended` method of this
    // `FragPlayer` will be called with both the corresponding `TimerId` and `reason`.
    pub fn jsTimer(duration: f64, reason: TimerReason) -> TimerId;

    // Clear a timer started with `jsTimer`.
    pub fn jsClearTimer(id: TimerId);

    // Returns `true` if the given external library (e.g. the HLS engine or the segment
    // channel client) is defined on the page.
    //
    // Those libraries may be loaded asynchronously, so the answer may change over time.
    pub fn jsIsLibraryAvailable(library: ExternalLibrary) -> bool;

    // Returns `true` if the `MediaSource` constructor exists in the current environment.
    pub fn jsIsMediaSourceSupported() -> bool;

    // Returns `true` if the embedded HLS engine reports that it is supported in the current
    // environment.
    //
    // Returns `false` if the engine library is not defined.
    pub fn jsIsHlsEngineSupported() -> bool;

    // Call `canPlayType` on the media element with the given type and returns `true` if
    // the answer is not an empty string.
    pub fn jsCanPlayType(typ: &str) -> bool;

    // Call `MediaSource.isTypeSupported` with the given mime-type and codecs string.
    pub fn jsIsTypeSupported(typ: &str) -> bool;

    // Returns `true` if the current page was loaded through `https:`.
    pub fn jsIsSecurePage() -> bool;

    // Set the `poster` attribute of the media element.
    pub fn jsSetPoster(url: &str);

    // Set the `src` attribute of the media element.
    pub fn jsSetSource(url: &str);

    // Remove the `src` attribute of the media element.
    pub fn jsRemoveSource();

    // Call the `load` method of the media element, resetting its internal state.
    pub fn jsReloadMediaElement();

    // Call the `play` method of the media element.
    //
    // As playing may be refused (e.g. autoplay policies), the outcome will be
    // communicated asynchronously through the `on_play_result` method of this
    // `FragPlayer`.
    pub fn jsPlay();

    // Call the `pause` method of the media element.
    pub fn jsPause();

    // Update the `controls` attribute of the media element.
    pub fn jsSetControls(enabled: bool);

    // Update the `currentTime` attribute of the media element.
    pub fn jsSeek(position: f64);

    // Returns the `currentTime` attribute of the media element.
    pub fn jsGetCurrentTime() -> f64;

    // When `enabled` is `true`, add "error" and "loadedmetadata" listeners on the media
    // element which will call respectively the `on_media_error` and `on_loaded_metadata`
    // methods of this `FragPlayer`.
    //
    // When `false`, remove those listeners.
    pub fn jsObserveMediaEvents(enabled: bool);

    // Create MediaSource and attach it to the media element associated with
    // this `FragPlayer`, through an ObjectURL.
    //
    // The MediaSource is not usable right away. This `FragPlayer` instance will know when
    // it becomes usable when its `on_media_source_state_change` method is called with the
    // "Open" `MediaSourceReadyState`.
    pub fn jsAttachMediaSource() -> AttachMediaSourceResult;

    // Remove MediaSource attached to the media element associated with
    // the `FragPlayer` if one, and free all its associated resources
    // (SourceBuffer, event listeners, created ObjectURL).
    //
    // This function performs all those operations synchronously.
    pub fn jsRemoveMediaSource();

    // Update the duration in seconds of the MediaSource attached to this FragPlayer.
    pub fn jsSetMediaSourceDuration(duration: f64) -> MediaSourceDurationUpdateResult;

    // Add a SourceBuffer to the created MediaSource, with the given mime-type and append
    // mode.
    //
    // Its `updateend` and `error` events will lead to respectively the
    // `on_source_buffer_update` and `on_source_buffer_error` methods of this
    // `FragPlayer` being called.
    pub fn jsAddSourceBuffer(typ: &str, mode: AppendMode) -> AddSourceBufferResult;

    // Append the resource behind `resource_id` to the given SourceBuffer.
    //
    // The resource is then owned by the JavaScript-side, which will free it itself.
    pub fn jsAppendBuffer(
        source_buffer_id: SourceBufferId,
        resource_id: ResourceId,
    ) -> AppendBufferResult;

    // Remove media data from the given SourceBuffer.
    //
    // Completion is announced the same way than for appends, through
    // `on_source_buffer_update`.
    pub fn jsRemoveBuffer(
        source_buffer_id: SourceBufferId,
        start: f64,
        end: f64,
    ) -> RemoveBufferResult;

    // Abort the operation currently performed by the given SourceBuffer, if one.
    pub fn jsAbortSourceBuffer(source_buffer_id: SourceBufferId);

    // Free resource stored in JavaScript's memory kept alive for the current `FragPlayer`.
    pub fn jsFreeResource(resource_id: ResourceId) -> bool;

    // Open a duplex connection to a segment server.
    //
    // Every event received on that connection will be communicated through the
    // `on_channel_*` methods of this `FragPlayer`, alongside the returned `ChannelId`.
    pub fn jsChannelConnect(url: &str, path: &str, timeout: f64) -> ChannelConnectResult;

    // Emit a request on the connection identified by `channel_id`, with an optional JSON
    // payload.
    pub fn jsChannelEmit(channel_id: ChannelId, message: ChannelMessage, payload: Option<String>);

    // Remove all listeners of the given connection and disconnect it.
    pub fn jsChannelClose(channel_id: ChannelId);

    // Create an instance of the embedded HLS engine with the given JSON configuration,
    // make it load the given playlist and attach it to the media element.
    pub fn jsCreateHlsEngine(url: &str, config: &str) -> CreateEngineResult;

    // Ask the embedded HLS engine to restart loading, after a network error.
    pub fn jsHlsStartLoad();

    // Ask the embedded HLS engine to recover in-place, after a media error.
    pub fn jsHlsRecoverMediaError();

    // Destroy the embedded HLS engine instance, if one.
    pub fn jsDestroyHlsEngine();

    // Start observing page visibility, intersection of the media element (with the given
    // threshold), fullscreen changes (through the event name given) and
    // picture-in-picture changes.
    pub fn jsObserveEngagement(threshold: f64, fullscreen_change_event: Option<String>);

    // Stop all observations started with `jsObserveEngagement`.
    pub fn jsStopObservingEngagement();

    // Synchronously read the current state of the page relative to the media element.
    //
    // `fullscreen_element_property` is the canonical property of the document giving the
    // current fullscreen element, if the platform has one.
    pub fn jsGetPageState(fullscreen_element_property: Option<String>) -> PageState;

    // Announce to the host whether a content is currently loaded or not.
    pub fn jsAnnounceStatus(loaded: bool);
}

/// "Reason" associated to a timer started by the `FragPlayer`.
///
/// This can then help to identify what the timer was for once resolved.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerReason {
    /// The quiet period before re-evaluating engagement has elapsed.
    EngagementDecision = 0,

    /// The delay between two checks of external libraries availability has elapsed.
    LibraryCheck = 1,
}

/// External JavaScript libraries the core may depend on.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalLibrary {
    /// The embedded HLS engine.
    HlsEngine = 0,

    /// The client library for the segment channel.
    SegmentChannel = 1,
}

impl fmt::Display for ExternalLibrary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExternalLibrary::HlsEngine => write!(f, "HLS engine"),
            ExternalLibrary::SegmentChannel => write!(f, "segment channel"),
        }
    }
}

/// Events exchanged on the segment channel, in both directions.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMessage {
    Auth = 0,
    Mime = 1,
    Initialization = 2,
    Segment = 3,
}

impl fmt::Display for ChannelMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ChannelMessage::Auth => "auth",
                ChannelMessage::Mime => "mime",
                ChannelMessage::Initialization => "initialization",
                ChannelMessage::Segment => "segment",
            }
        )
    }
}

/// Value of the `mode` attribute of a SourceBuffer.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendMode {
    Segments = 0,
    Sequence = 1,
}

/// Category of an error reported by the embedded HLS engine.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HlsErrorKind {
    Network = 0,
    Media = 1,
    Other = 2,
}

/// Levels with which a log can be emitted.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd)]
pub enum LogLevel {
    /// Log level reserved for very important errors and highly unexpected events.
    Error = 0,

    /// Log level reserved for less important errors and unexpected events.
    Warn = 1,

    /// Log level reserved for important events
    Info = 2,

    /// Log level used when debugging. Small-ish yet impactful events should be logged with it.
    Debug = 3,
}

/// Identify a resource allocated on the JavaScript side and kept alive until either
/// it is appended to a SourceBuffer or `jsFreeResource` is called with it.
pub type ResourceId = u32;

/// Identify a pending timer.
pub type TimerId = f64;

/// Identify a SourceBuffer.
pub type SourceBufferId = u32;

/// Identify a segment channel connection.
pub type ChannelId = u32;

/// Snapshot of the page's state relative to the media element, as read by
/// `jsGetPageState`.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageState {
    pub(crate) visible: bool,
    pub(crate) document_fullscreen: bool,
    pub(crate) element_fullscreen: bool,
    pub(crate) picture_in_picture: bool,
}

#[wasm_bindgen]
impl PageState {
    /// This function should only be called by the JavaScript-side.
    #[wasm_bindgen(constructor)]
    pub fn new(
        visible: bool,
        document_fullscreen: bool,
        element_fullscreen: bool,
        picture_in_picture: bool,
    ) -> Self {
        Self {
            visible,
            document_fullscreen,
            element_fullscreen,
            picture_in_picture,
        }
    }
}

/// Trait allowing to convert "JavaScript Results" as exposed by the JavaScript functions into
/// `Result` structs more idiomatic to Rust.
pub(crate) trait JsResult<T, E> {
    fn result(self) -> Result<T, (E, Option<String>)>;
}

/// Declare a `*Result` struct created by the JavaScript-side through its `success` and
/// `error` static constructors, alongside its `JsResult` implementation.
macro_rules! js_result {
    ($(#[$doc:meta])* $name:ident, $code:ident) => {
        $(#[$doc])*
        #[wasm_bindgen]
        pub struct $name {
            error: Option<($code, Option<String>)>,
        }

        #[wasm_bindgen]
        impl $name {
            /// This function should only be called by the JavaScript-side.
            pub fn success() -> Self {
                Self { error: None }
            }

            /// This function should only be called by the JavaScript-side.
            pub fn error(err: $code, desc: Option<String>) -> Self {
                Self {
                    error: Some((err, desc)),
                }
            }
        }

        impl JsResult<(), $code> for $name {
            fn result(self) -> Result<(), ($code, Option<String>)> {
                match self.error {
                    Some(err) => Err(err),
                    None => Ok(()),
                }
            }
        }
    };
    ($(#[$doc:meta])* $name:ident, $code:ident, $val:ty) => {
        $(#[$doc])*
        #[wasm_bindgen]
        pub struct $name {
            value: $val,
            error: Option<($code, Option<String>)>,
        }

        #[wasm_bindgen]
        impl $name {
            /// This function should only be called by the JavaScript-side.
            pub fn success(val: $val) -> Self {
                Self {
                    value: val,
                    error: None,
                }
            }

            /// This function should only be called by the JavaScript-side.
            pub fn error(err: $code, desc: Option<String>) -> Self {
                Self {
                    value: Default::default(),
                    error: Some((err, desc)),
                }
            }
        }

        impl JsResult<$val, $code> for $name {
            fn result(self) -> Result<$val, ($code, Option<String>)> {
                match self.error {
                    Some(err) => Err(err),
                    None => Ok(self.value),
                }
            }
        }
    };
}

/// Errors that can arise when attempting to "attach" a MediaSource to a media element.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachMediaSourceErrorCode {
    /// `MediaSource` is not defined in the current environment.
    MediaSourceUnavailable,

    /// Could not attach MediaSource to the media element because of an unknown error.
    UnknownError,
}

js_result!(
    /// Result of calling the `jsAttachMediaSource` JavaScript function.
    AttachMediaSourceResult,
    AttachMediaSourceErrorCode
);

/// Errors that can arise when attempting to update the duration of a MediaSource.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaSourceDurationUpdateErrorCode {
    /// The `FragPlayer` had no MediaSource attached to its media element.
    NoMediaSourceAttached,

    /// An unknown error arised
    UnknownError,
}

js_result!(
    /// Result of calling the `jsSetMediaSourceDuration` JavaScript function.
    MediaSourceDurationUpdateResult,
    MediaSourceDurationUpdateErrorCode
);

/// Error that might arise when adding a SourceBuffer through a MediaSource instance.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddSourceBufferErrorCode {
    /// The `FragPlayer` had no MediaSource attached to its media element.
    NoMediaSourceAttached,

    /// The `MediaSource` instance linked to this `FragPlayer` is in a "closed" state.
    MediaSourceIsClosed,

    /// A `QuotaExceededError` was received while trying to add the `SourceBuffer`
    QuotaExceededError,

    /// The given mime-type and codec combination is not supported
    TypeNotSupportedError,

    /// The given mime-type and codec combination is empty
    EmptyMimeType,

    /// An unknown error happened.
    UnknownError,
}

js_result!(
    /// Result of calling the `jsAddSourceBuffer` JavaScript function.
    AddSourceBufferResult,
    AddSourceBufferErrorCode,
    SourceBufferId
);

/// Errors that can arise when calling the `jsAppendBuffer` JavaScript function.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendBufferErrorCode {
    /// The operation failed because the resource to append was not found.
    NoResource,
    /// The operation failed because the SourceBuffer instance linked to the
    /// given `SourceBufferId` was not found.
    NoSourceBuffer,
    /// The operation failed because of an unknown error.
    UnknownError,
}

js_result!(
    /// Result of calling the `jsAppendBuffer` JavaScript function.
    AppendBufferResult,
    AppendBufferErrorCode
);

/// Errors that can arise when calling the `jsRemoveBuffer` JavaScript function.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveBufferErrorCode {
    /// The operation failed because the SourceBuffer instance linked to the given
    /// `SourceBufferId` was not found.
    SourceBufferNotFound,

    /// The operation failed because of an unknown error.
    UnknownError,
}

js_result!(
    /// Result of calling the `jsRemoveBuffer` JavaScript function.
    RemoveBufferResult,
    RemoveBufferErrorCode
);

/// Errors that can arise when opening a segment channel connection.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelConnectErrorCode {
    /// The channel client library is not defined on the page.
    LibraryMissing,

    /// The client library refused the given endpoint.
    InvalidEndpoint,

    /// An unknown error happened.
    UnknownError,
}

js_result!(
    /// Result of calling the `jsChannelConnect` JavaScript function.
    ChannelConnectResult,
    ChannelConnectErrorCode,
    ChannelId
);

/// Errors that can arise when creating the embedded HLS engine.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateEngineErrorCode {
    /// The engine library is not defined on the page.
    LibraryMissing,

    /// The engine refused the given configuration.
    InvalidConfig,

    /// An unknown error happened.
    UnknownError,
}

js_result!(
    /// Result of calling the `jsCreateHlsEngine` JavaScript function.
    CreateEngineResult,
    CreateEngineErrorCode
);
