use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::bindings::ExternalLibrary;

/// Intersection ratio above which the media element is considered visible, when not
/// configured.
const DEFAULT_THRESHOLD: f64 = 0.1;

/// Configuration of a `FragPlayer`, as communicated by the JavaScript-side in JSON on
/// creation.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct PlayerConfig {
    /// Delivery strategies to try, by order of preference.
    #[serde(alias = "playerOrder")]
    pub(crate) players: Vec<StrategyName>,

    /// Configuration blob given as is to the embedded HLS engine.
    pub(crate) hls_js_config: serde_json::Value,

    /// Poster displayed when nothing is loaded.
    pub(crate) ready_poster: Option<String>,

    /// Poster displayed after a fatal error.
    pub(crate) error_poster: Option<String>,

    /// If `true`, playback is started as soon as enough metadata is known.
    pub(crate) autoplay: bool,

    /// If `true`, loading and unloading follows the engagement of the user with the media
    /// element. If `false`, the strategy is loaded as soon as it is installed.
    pub(crate) unload: bool,

    /// Fraction of the media element which has to be visible for it to be considered as
    /// intersecting with the viewport.
    #[serde(deserialize_with = "deserialize_threshold")]
    pub(crate) threshold: f64,

    pub(crate) channel_mode: ChannelMode,

    pub(crate) buffer_policy: BufferPolicy,

    pub(crate) library_wait: LibraryWait,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            players: vec![
                StrategyName::Push,
                StrategyName::EmbeddedHls,
                StrategyName::NativeHls,
                StrategyName::File,
            ],
            hls_js_config: serde_json::Value::Object(serde_json::Map::new()),
            ready_poster: None,
            error_poster: None,
            autoplay: true,
            unload: true,
            threshold: DEFAULT_THRESHOLD,
            channel_mode: ChannelMode::default(),
            buffer_policy: BufferPolicy::default(),
            library_wait: LibraryWait::default(),
        }
    }
}

impl PlayerConfig {
    /// Parse and check a `PlayerConfig` from its JSON representation.
    pub(crate) fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        if config.players.is_empty() {
            return Err(ConfigError::NoPlayers);
        }
        config.buffer_policy.check()?;
        Ok(config)
    }

    /// External libraries that have to be present on the page before any of the
    /// configured strategies can be resolved.
    pub(crate) fn required_libraries(&self) -> Vec<ExternalLibrary> {
        let mut libraries = vec![];
        for name in &self.players {
            if let Some(lib) = name.required_library() {
                if !libraries.contains(&lib) {
                    libraries.push(lib);
                }
            }
        }
        libraries
    }
}

/// Identify a delivery strategy in the configured preference order.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub(crate) enum StrategyName {
    /// Segments pushed over a segment channel, fed manually to a MediaSource.
    #[serde(rename = "socket.io", alias = "push")]
    Push,

    /// HLS playlist played through the embedded HLS engine.
    #[serde(rename = "hls.js", alias = "embeddedHls")]
    EmbeddedHls,

    /// HLS playlist played directly by the media element.
    #[serde(rename = "hls", alias = "nativeHls")]
    NativeHls,

    /// Progressive file played directly by the media element.
    #[serde(rename = "mp4", alias = "file")]
    File,
}

impl StrategyName {
    fn required_library(self) -> Option<ExternalLibrary> {
        match self {
            StrategyName::Push => Some(ExternalLibrary::SegmentChannel),
            StrategyName::EmbeddedHls => Some(ExternalLibrary::HlsEngine),
            StrategyName::NativeHls | StrategyName::File => None,
        }
    }
}

/// How media segments are requested on the segment channel once the initialization
/// segment has been pushed.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ChannelMode {
    /// A single request is made, the server then pushes every new segment.
    #[default]
    All,

    /// A new request is made each time a segment has been consumed.
    Pull,
}

/// Rules followed when feeding segments to the media buffer.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct BufferPolicy {
    /// Minimum amount of media to keep in the buffer, in seconds.
    pub(crate) min_seconds: f64,

    /// Minimum amount of segments to keep in the buffer.
    pub(crate) min_segments: u32,

    /// Multiplier applied to segment durations and to the retained duration before
    /// trimming.
    pub(crate) safety_margin: f64,

    /// Maximum amount of segments waiting to be pushed. Going over it empties the
    /// whole queue.
    pub(crate) max_queue_depth: usize,

    /// Farthest position from the live edge playback may be at, as a factor of the
    /// retained duration.
    pub(crate) far_factor: f64,

    /// Nearest position from the live edge playback may be at, as a factor of the
    /// retained duration.
    pub(crate) near_factor: f64,
}

impl Default for BufferPolicy {
    fn default() -> Self {
        Self {
            min_seconds: 10.,
            min_segments: 3,
            safety_margin: 1.1,
            max_queue_depth: 5,
            far_factor: 0.9,
            near_factor: 0.05,
        }
    }
}

impl BufferPolicy {
    fn check(&self) -> Result<(), ConfigError> {
        if self.min_seconds <= 0. || self.safety_margin < 1. {
            return Err(ConfigError::InvalidBufferPolicy(
                "`minSeconds` must be positive and `safetyMargin` at least 1".to_owned(),
            ));
        }
        if self.near_factor < 0. || self.far_factor > 1. || self.near_factor >= self.far_factor {
            return Err(ConfigError::InvalidBufferPolicy(
                "`nearFactor` and `farFactor` must verify 0 <= near < far <= 1".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Bounded wait for external libraries.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct LibraryWait {
    /// Number of checks performed after the first immediate one.
    pub(crate) retries: u32,

    /// Delay between two checks, in milliseconds.
    pub(crate) delay_ms: f64,
}

impl Default for LibraryWait {
    fn default() -> Self {
        Self {
            retries: 10,
            delay_ms: 1000.,
        }
    }
}

fn deserialize_threshold<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(match value {
        Some(val) if (0. ..=1.).contains(&val) => val,
        _ => DEFAULT_THRESHOLD,
    })
}

#[derive(Error, Debug)]
pub(crate) enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid configuration: at least one player has to be configured")]
    NoPlayers,
    #[error("Invalid buffer policy: {0}")]
    InvalidBufferPolicy(String),
}
