use thiserror::Error;

use crate::{
    bindings::{ChannelId, CreateEngineErrorCode, HlsErrorKind, Host, SourceBufferId},
    config::PlayerConfig,
    error::PlayerError,
    media_element::MediaSourceReadyState,
    source_resolver::{ResolvedSource, SourceKind},
    utils::time_ranges::TimeRanges,
    Logger,
};

pub(crate) use element_source::ElementSourceStrategy;
pub(crate) use embedded_hls::EmbeddedHlsStrategy;
pub(crate) use push::{ChannelEvent, PushStrategy};

mod element_source;
mod embedded_hls;
mod push;

/// The only contract the rest of the player relies on to start and stop playback.
///
/// Both operations are idempotent: loading a loaded strategy or unloading an unloaded one
/// does nothing.
pub(crate) trait StrategyHandle {
    /// Start playing the resolved source.
    fn load<H: Host>(&mut self, host: &mut H) -> Result<(), PlayerError>;

    /// Stop playing and release every resource taken in `load`.
    fn unload<H: Host>(&mut self, host: &mut H);

    fn is_loaded(&self) -> bool;
}

/// The strategy currently installed on the media element.
pub(crate) enum Strategy {
    Push(PushStrategy),
    EmbeddedHls(EmbeddedHlsStrategy),
    ElementSource(ElementSourceStrategy),

    /// Nothing to play: loading and unloading do nothing.
    Noop,
}

impl Strategy {
    /// Create the strategy corresponding to a `ResolvedSource`, in an unloaded state.
    pub(crate) fn install(source: ResolvedSource, config: &PlayerConfig) -> Self {
        match source {
            ResolvedSource::Push(descriptor) => Strategy::Push(PushStrategy::new(
                descriptor,
                config.channel_mode,
                config.buffer_policy,
                config.autoplay,
            )),
            ResolvedSource::EmbeddedHls(url) => Strategy::EmbeddedHls(EmbeddedHlsStrategy::new(
                url,
                config.hls_js_config.to_string(),
                config.autoplay,
            )),
            ResolvedSource::NativeHls(url) => Strategy::ElementSource(ElementSourceStrategy::new(
                url,
                SourceKind::NativeHls,
                config.autoplay,
            )),
            ResolvedSource::File(url) => Strategy::ElementSource(ElementSourceStrategy::new(
                url,
                SourceKind::File,
                config.autoplay,
            )),
            ResolvedSource::Empty | ResolvedSource::Unknown(_) => Strategy::Noop,
        }
    }

    pub(crate) fn kind(&self) -> Option<SourceKind> {
        match self {
            Strategy::Push(_) => Some(SourceKind::Push),
            Strategy::EmbeddedHls(_) => Some(SourceKind::EmbeddedHls),
            Strategy::ElementSource(s) => Some(s.kind()),
            Strategy::Noop => None,
        }
    }

    pub(crate) fn on_loaded_metadata<H: Host>(&mut self, host: &mut H) {
        match self {
            Strategy::Push(s) => s.on_loaded_metadata(host),
            Strategy::ElementSource(s) => s.on_loaded_metadata(host),
            _ => Logger::debug("Strategy: Ignoring `loadedmetadata`"),
        }
    }

    pub(crate) fn on_play_result<H: Host>(&mut self, host: &mut H, success: bool) {
        on_play_result(host, self.is_loaded(), success);
    }

    pub(crate) fn on_media_error(&mut self, message: &str) {
        Logger::warn(&format!("Strategy: Media element error: {}", message));
    }

    pub(crate) fn on_hls_manifest_parsed<H: Host>(&mut self, host: &mut H) {
        match self {
            Strategy::EmbeddedHls(s) => s.on_manifest_parsed(host),
            _ => Logger::debug("Strategy: Ignoring HLS manifest event"),
        }
    }

    pub(crate) fn on_hls_error<H: Host>(
        &mut self,
        host: &mut H,
        kind: HlsErrorKind,
        fatal: bool,
        details: &str,
    ) -> Result<(), PlayerError> {
        match self {
            Strategy::EmbeddedHls(s) => s.on_error(host, kind, fatal, details),
            _ => {
                Logger::debug("Strategy: Ignoring HLS error event");
                Ok(())
            }
        }
    }

    pub(crate) fn on_channel_event<H: Host>(
        &mut self,
        host: &mut H,
        channel_id: ChannelId,
        event: ChannelEvent,
    ) -> Result<(), PlayerError> {
        match self {
            Strategy::Push(s) => s.on_channel_event(host, channel_id, event),
            _ => {
                event.release(host);
                Logger::debug("Strategy: Ignoring segment channel event");
                Ok(())
            }
        }
    }

    pub(crate) fn on_media_source_state_change<H: Host>(
        &mut self,
        host: &mut H,
        state: MediaSourceReadyState,
    ) -> Result<(), PlayerError> {
        match self {
            Strategy::Push(s) => s.on_media_source_state_change(host, state),
            _ => Ok(()),
        }
    }

    pub(crate) fn on_source_buffer_update<H: Host>(
        &mut self,
        host: &mut H,
        source_buffer_id: SourceBufferId,
        buffered: &TimeRanges,
    ) -> Result<(), PlayerError> {
        match self {
            Strategy::Push(s) => s.on_source_buffer_update(host, source_buffer_id, buffered),
            _ => Ok(()),
        }
    }

    pub(crate) fn on_source_buffer_error(&mut self, source_buffer_id: SourceBufferId) {
        if let Strategy::Push(s) = self {
            s.on_source_buffer_error(source_buffer_id);
        }
    }
}

impl StrategyHandle for Strategy {
    fn load<H: Host>(&mut self, host: &mut H) -> Result<(), PlayerError> {
        match self {
            Strategy::Push(s) => s.load(host),
            Strategy::EmbeddedHls(s) => s.load(host),
            Strategy::ElementSource(s) => s.load(host),
            Strategy::Noop => Ok(()),
        }
    }

    fn unload<H: Host>(&mut self, host: &mut H) {
        match self {
            Strategy::Push(s) => s.unload(host),
            Strategy::EmbeddedHls(s) => s.unload(host),
            Strategy::ElementSource(s) => s.unload(host),
            Strategy::Noop => {}
        }
    }

    fn is_loaded(&self) -> bool {
        match self {
            Strategy::Push(s) => s.is_loaded(),
            Strategy::EmbeddedHls(s) => s.is_loaded(),
            Strategy::ElementSource(s) => s.is_loaded(),
            Strategy::Noop => false,
        }
    }
}

/// Start playback if `autoplay` is set, otherwise directly give control to the user.
fn start_playback<H: Host>(host: &mut H, autoplay: bool) {
    if autoplay {
        Logger::debug("Strategy: Starting playback");
        host.play();
    } else {
        host.set_controls(true);
    }
}

fn on_play_result<H: Host>(host: &mut H, loaded: bool, success: bool) {
    if !loaded {
        Logger::debug("Strategy: Ignoring play result of an unloaded strategy");
    } else if success {
        host.set_controls(true);
    } else {
        Logger::warn("Strategy: Playback could not be started");
    }
}

/// Bring the media element back to its initial state.
fn reset_media_element<H: Host>(host: &mut H) {
    host.set_controls(false);
    host.pause();
    host.remove_source();
    host.reload_element();
}

/// Error encountered synchronously when creating the embedded HLS engine.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum EngineError {
    #[error("The HLS engine library is not available")]
    LibraryMissing,
    #[error("The HLS engine refused its configuration: {0}")]
    InvalidConfig(String),
    #[error("Uncategorized error when creating the HLS engine: {0}")]
    UnknownError(String),
}

impl EngineError {
    /// Creates a new `EngineError` based on the original error as returned by the
    /// `jsCreateHlsEngine` binding.
    pub(crate) fn from_js_create_engine_error(err: (CreateEngineErrorCode, Option<String>)) -> Self {
        match err.0 {
            CreateEngineErrorCode::LibraryMissing => EngineError::LibraryMissing,
            CreateEngineErrorCode::InvalidConfig => {
                EngineError::InvalidConfig(err.1.unwrap_or_default())
            }
            CreateEngineErrorCode::UnknownError => {
                EngineError::UnknownError(err.1.unwrap_or_else(|| "Unknown error.".to_owned()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::source_resolver::ChannelDescriptor;
    use crate::test_utils::{FakeHost, HostCall};
    use crate::utils::url::Url;

    #[test]
    fn test_install() {
        let config = PlayerConfig::default();
        let strategy = Strategy::install(
            ResolvedSource::Push(ChannelDescriptor {
                namespace: "a/b".to_owned(),
                path: "/p".to_owned(),
                key: None,
            }),
            &config,
        );
        assert_eq!(strategy.kind(), Some(SourceKind::Push));
        let strategy = Strategy::install(
            ResolvedSource::NativeHls(Url::new("a.m3u8".to_owned())),
            &config,
        );
        assert_eq!(strategy.kind(), Some(SourceKind::NativeHls));
        let strategy = Strategy::install(ResolvedSource::Unknown(json!({ "a": 1 })), &config);
        assert_eq!(strategy.kind(), None);
    }

    #[test]
    fn test_noop_does_nothing() {
        let mut host = FakeHost::new();
        let mut strategy = Strategy::install(ResolvedSource::Empty, &PlayerConfig::default());
        strategy.load(&mut host).unwrap();
        assert!(!strategy.is_loaded());
        strategy.unload(&mut host);
        strategy.on_loaded_metadata(&mut host);
        strategy.on_play_result(&mut host, true);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_unload_is_idempotent() {
        let config = PlayerConfig::default();
        let sources = [
            ResolvedSource::Push(ChannelDescriptor {
                namespace: "a/b".to_owned(),
                path: "/p".to_owned(),
                key: None,
            }),
            ResolvedSource::EmbeddedHls(Url::new("a.m3u8".to_owned())),
            ResolvedSource::NativeHls(Url::new("a.m3u8".to_owned())),
            ResolvedSource::File(Url::new("a.mp4".to_owned())),
        ];
        for source in sources {
            let mut host = FakeHost::new();
            let mut strategy = Strategy::install(source, &config);

            strategy.unload(&mut host);
            assert!(host.calls.is_empty());

            strategy.load(&mut host).unwrap();
            assert!(strategy.is_loaded());
            let after_load = host.calls.len();
            strategy.load(&mut host).unwrap();
            assert_eq!(host.calls.len(), after_load);

            strategy.unload(&mut host);
            assert!(!strategy.is_loaded());
            assert!(host.calls.contains(&HostCall::ReloadElement));
            let after_unload = host.calls.len();
            strategy.unload(&mut host);
            assert_eq!(host.calls.len(), after_unload);
        }
    }
}
