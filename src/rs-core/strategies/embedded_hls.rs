use super::{reset_media_element, start_playback, StrategyHandle};
use crate::{
    bindings::{HlsErrorKind, Host},
    error::PlayerError,
    utils::url::Url,
    Logger,
};

/// Plays an HLS playlist through the embedded HLS engine.
pub(crate) struct EmbeddedHlsStrategy {
    url: Url,

    /// JSON configuration given to the engine on creation.
    engine_config: String,

    autoplay: bool,

    /// `true` while an engine instance exists.
    loaded: bool,
}

impl EmbeddedHlsStrategy {
    pub(crate) fn new(url: Url, engine_config: String, autoplay: bool) -> Self {
        Self {
            url,
            engine_config,
            autoplay,
            loaded: false,
        }
    }

    pub(crate) fn on_manifest_parsed<H: Host>(&mut self, host: &mut H) {
        if self.loaded {
            Logger::debug("HLS: Manifest parsed");
            start_playback(host, self.autoplay);
        }
    }

    /// Triage an error reported by the engine.
    ///
    /// Fatal network and media errors are recovered by the engine itself, any other fatal
    /// error is returned.
    pub(crate) fn on_error<H: Host>(
        &mut self,
        host: &mut H,
        kind: HlsErrorKind,
        fatal: bool,
        details: &str,
    ) -> Result<(), PlayerError> {
        if !self.loaded {
            return Ok(());
        }
        if !fatal {
            Logger::debug(&format!("HLS: Non-fatal {:?} error: {}", kind, details));
            return Ok(());
        }
        match kind {
            HlsErrorKind::Network => {
                Logger::warn(&format!("HLS: Fatal network error ({}), reloading", details));
                host.hls_start_load();
                Ok(())
            }
            HlsErrorKind::Media => {
                Logger::warn(&format!("HLS: Fatal media error ({}), recovering", details));
                host.hls_recover_media_error();
                Ok(())
            }
            HlsErrorKind::Other => Err(PlayerError::EngineFatal(details.to_owned())),
        }
    }
}

impl StrategyHandle for EmbeddedHlsStrategy {
    fn load<H: Host>(&mut self, host: &mut H) -> Result<(), PlayerError> {
        if self.loaded {
            Logger::debug("HLS: Already loaded");
            return Ok(());
        }
        Logger::info(&format!("HLS: Loading {}", self.url));
        host.create_hls_engine(self.url.get_ref(), &self.engine_config)?;
        self.loaded = true;
        Ok(())
    }

    fn unload<H: Host>(&mut self, host: &mut H) {
        if !self.loaded {
            Logger::debug("HLS: Already unloaded");
            return;
        }
        Logger::info("HLS: Unloading");
        self.loaded = false;
        host.destroy_hls_engine();
        reset_media_element(host);
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeHost, HostCall};

    fn loaded_strategy(host: &mut FakeHost) -> EmbeddedHlsStrategy {
        let mut strategy = EmbeddedHlsStrategy::new(
            Url::new("https://cdn.example.com/live.m3u8".to_owned()),
            r#"{"liveDurationInfinity":true}"#.to_owned(),
            true,
        );
        strategy.load(host).unwrap();
        strategy
    }

    #[test]
    fn test_load_and_play() {
        let mut host = FakeHost::new();
        let mut strategy = loaded_strategy(&mut host);
        strategy.on_manifest_parsed(&mut host);
        assert_eq!(
            host.calls,
            vec![
                HostCall::CreateHlsEngine(
                    "https://cdn.example.com/live.m3u8".to_owned(),
                    r#"{"liveDurationInfinity":true}"#.to_owned()
                ),
                HostCall::Play,
            ]
        );
    }

    #[test]
    fn test_creation_failure() {
        let mut host = FakeHost::new();
        host.fail_engine_creation = true;
        let mut strategy =
            EmbeddedHlsStrategy::new(Url::new("live.m3u8".to_owned()), "{}".to_owned(), true);
        assert!(matches!(
            strategy.load(&mut host),
            Err(PlayerError::EngineCreation(_))
        ));
        assert!(!strategy.is_loaded());
    }

    #[test]
    fn test_error_triage() {
        let mut host = FakeHost::new();
        let mut strategy = loaded_strategy(&mut host);
        host.calls.clear();

        strategy
            .on_error(&mut host, HlsErrorKind::Network, false, "fragLoadError")
            .unwrap();
        assert!(host.calls.is_empty());

        strategy
            .on_error(&mut host, HlsErrorKind::Network, true, "manifestLoadError")
            .unwrap();
        strategy
            .on_error(&mut host, HlsErrorKind::Media, true, "bufferStalledError")
            .unwrap();
        assert_eq!(
            host.calls,
            vec![HostCall::HlsStartLoad, HostCall::HlsRecoverMediaError]
        );

        assert!(matches!(
            strategy.on_error(&mut host, HlsErrorKind::Other, true, "internalException"),
            Err(PlayerError::EngineFatal(_))
        ));
    }

    #[test]
    fn test_unload() {
        let mut host = FakeHost::new();
        let mut strategy = loaded_strategy(&mut host);
        host.calls.clear();
        strategy.unload(&mut host);
        assert_eq!(
            host.calls,
            vec![
                HostCall::DestroyHlsEngine,
                HostCall::SetControls(false),
                HostCall::Pause,
                HostCall::RemoveSource,
                HostCall::ReloadElement,
            ]
        );
    }
}
