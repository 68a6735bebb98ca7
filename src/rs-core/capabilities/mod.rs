use crate::{
    bindings::{ExternalLibrary, Host},
    config::StrategyName,
    Logger,
};

/// Mime-type answered by media elements able to play HLS playlists natively.
const NATIVE_HLS_TYPE: &str = "application/vnd.apple.mpegurl";

/// Answers whether the current platform is able to play content with a given strategy.
///
/// Nothing is cached here: the embedded engine may only become available after the
/// `FragPlayer` was created, so every resolution probes again.
pub(crate) struct Capabilities<'a, H: Host> {
    host: &'a H,
}

impl<'a, H: Host> Capabilities<'a, H> {
    pub(crate) fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// Returns `true` if segments can be fed manually to a MediaSource.
    pub(crate) fn push_sink(&self) -> bool {
        self.host.is_media_source_supported()
    }

    /// Returns `true` if the embedded HLS engine is loaded and reports itself as supported.
    pub(crate) fn embedded_hls(&self) -> bool {
        self.host.is_library_available(ExternalLibrary::HlsEngine)
            && self.host.is_hls_engine_supported()
    }

    /// Returns `true` if the media element can play HLS playlists by itself.
    pub(crate) fn native_hls(&self) -> bool {
        self.host.can_play_type(NATIVE_HLS_TYPE)
    }

    /// Returns `true` if the given strategy can be used on the current platform.
    ///
    /// Progressive files are always assumed playable.
    pub(crate) fn supports(&self, strategy: StrategyName) -> bool {
        match strategy {
            StrategyName::Push => self.push_sink(),
            StrategyName::EmbeddedHls => self.embedded_hls(),
            StrategyName::NativeHls => self.native_hls(),
            StrategyName::File => true,
        }
    }
}

/// Vendor-specific flavor of the Fullscreen API present on the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FullscreenApi {
    Standard,
    Webkit,
    Moz,
    Ms,
    Unsupported,
}

impl FullscreenApi {
    /// Resolve the Fullscreen API flavor from the names of the fullscreen-related
    /// properties found on the `document`.
    ///
    /// The standard API is preferred when several flavors are present.
    pub(crate) fn resolve<S: AsRef<str>>(property_names: &[S]) -> Self {
        let has = |name: &str| property_names.iter().any(|p| p.as_ref() == name);
        let api = [
            FullscreenApi::Standard,
            FullscreenApi::Webkit,
            FullscreenApi::Moz,
            FullscreenApi::Ms,
        ]
        .into_iter()
        .find(|api| api.element_property().map_or(false, has))
        .unwrap_or(FullscreenApi::Unsupported);
        Logger::debug(&format!("Capabilities: Fullscreen API resolved to {:?}", api));
        api
    }

    /// Name of the `document` property giving the element currently in fullscreen.
    pub(crate) fn element_property(&self) -> Option<&'static str> {
        match self {
            FullscreenApi::Standard => Some("fullscreenElement"),
            FullscreenApi::Webkit => Some("webkitFullscreenElement"),
            FullscreenApi::Moz => Some("mozFullScreenElement"),
            FullscreenApi::Ms => Some("msFullscreenElement"),
            FullscreenApi::Unsupported => None,
        }
    }

    /// Name of the `document` event sent when the fullscreen state changes.
    pub(crate) fn change_event(&self) -> Option<&'static str> {
        match self {
            FullscreenApi::Standard => Some("fullscreenchange"),
            FullscreenApi::Webkit => Some("webkitfullscreenchange"),
            FullscreenApi::Moz => Some("mozfullscreenchange"),
            FullscreenApi::Ms => Some("MSFullscreenChange"),
            FullscreenApi::Unsupported => None,
        }
    }

    pub(crate) fn is_supported(&self) -> bool {
        *self != FullscreenApi::Unsupported
    }
}
