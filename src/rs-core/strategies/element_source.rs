use super::{reset_media_element, start_playback, StrategyHandle};
use crate::{
    bindings::Host, error::PlayerError, source_resolver::SourceKind, utils::url::Url, Logger,
};

/// Plays a source the media element handles by itself: HLS playlists on platforms
/// supporting them natively, and progressive files.
pub(crate) struct ElementSourceStrategy {
    url: Url,
    kind: SourceKind,
    autoplay: bool,
    loaded: bool,
}

impl ElementSourceStrategy {
    pub(crate) fn new(url: Url, kind: SourceKind, autoplay: bool) -> Self {
        Self {
            url,
            kind,
            autoplay,
            loaded: false,
        }
    }

    pub(crate) fn kind(&self) -> SourceKind {
        self.kind
    }

    pub(crate) fn on_loaded_metadata<H: Host>(&mut self, host: &mut H) {
        if self.loaded {
            Logger::debug("Element: Metadata loaded");
            start_playback(host, self.autoplay);
        }
    }
}

impl StrategyHandle for ElementSourceStrategy {
    fn load<H: Host>(&mut self, host: &mut H) -> Result<(), PlayerError> {
        if self.loaded {
            Logger::debug("Element: Already loaded");
            return Ok(());
        }
        Logger::info(&format!("Element: Loading {} source {}", self.kind, self.url));
        self.loaded = true;
        host.observe_media_events(true);
        host.set_source(self.url.get_ref());
        Ok(())
    }

    fn unload<H: Host>(&mut self, host: &mut H) {
        if !self.loaded {
            Logger::debug("Element: Already unloaded");
            return;
        }
        Logger::info(&format!("Element: Unloading {} source", self.kind));
        self.loaded = false;
        host.observe_media_events(false);
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

    #[test]
    fn test_file_playback() {
        let mut host = FakeHost::new();
        let mut strategy =
            ElementSourceStrategy::new(Url::new("clip.mp4".to_owned()), SourceKind::File, true);
        strategy.load(&mut host).unwrap();
        strategy.on_loaded_metadata(&mut host);
        assert_eq!(
            host.calls,
            vec![
                HostCall::ObserveMediaEvents(true),
                HostCall::SetSource("clip.mp4".to_owned()),
                HostCall::Play,
            ]
        );

        host.calls.clear();
        strategy.unload(&mut host);
        assert_eq!(
            host.calls,
            vec![
                HostCall::ObserveMediaEvents(false),
                HostCall::SetControls(false),
                HostCall::Pause,
                HostCall::RemoveSource,
                HostCall::ReloadElement,
            ]
        );
    }

    #[test]
    fn test_without_autoplay() {
        let mut host = FakeHost::new();
        let mut strategy = ElementSourceStrategy::new(
            Url::new("live.m3u8".to_owned()),
            SourceKind::NativeHls,
            false,
        );
        strategy.load(&mut host).unwrap();
        strategy.on_loaded_metadata(&mut host);
        assert!(!host.calls.contains(&HostCall::Play));
        assert!(host.calls.contains(&HostCall::SetControls(true)));
    }

    #[test]
    fn test_metadata_after_unload_is_ignored() {
        let mut host = FakeHost::new();
        let mut strategy =
            ElementSourceStrategy::new(Url::new("clip.mp4".to_owned()), SourceKind::File, true);
        strategy.load(&mut host).unwrap();
        strategy.unload(&mut host);
        host.calls.clear();
        strategy.on_loaded_metadata(&mut host);
        assert!(host.calls.is_empty());
    }
}
