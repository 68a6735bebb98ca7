use std::fmt;

use serde_json::Value;

use crate::{
    bindings::Host,
    capabilities::Capabilities,
    config::StrategyName,
    utils::url::Url,
    Logger,
};

/// Extensions accepted for HLS playlists.
const PLAYLIST_EXTENSIONS: [&str; 1] = ["m3u8"];

/// Extensions accepted for progressive files.
const FILE_EXTENSIONS: [&str; 3] = ["mp4", "m4v", "webm"];

/// Where and how to reach a segment server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ChannelDescriptor {
    /// Namespace of the server, either an absolute websocket URL or `host[:port]/name`.
    pub(crate) namespace: String,

    /// Path on which the server listens for connections.
    pub(crate) path: String,

    /// Credential to send before anything else, if the server requires one.
    pub(crate) key: Option<String>,
}

/// Outcome of resolving a playback directive: the strategy to install alongside what it
/// needs to play.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ResolvedSource {
    Push(ChannelDescriptor),
    EmbeddedHls(Url),
    NativeHls(Url),
    File(Url),

    /// The directive asked for nothing to be played.
    Empty,

    /// Nothing in the directive could be played with the configured strategies.
    Unknown(Value),
}

/// Simple discriminant of a `ResolvedSource`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SourceKind {
    Push,
    EmbeddedHls,
    NativeHls,
    File,
    Empty,
    Unknown,
}

impl ResolvedSource {
    pub(crate) fn kind(&self) -> SourceKind {
        match self {
            ResolvedSource::Push(_) => SourceKind::Push,
            ResolvedSource::EmbeddedHls(_) => SourceKind::EmbeddedHls,
            ResolvedSource::NativeHls(_) => SourceKind::NativeHls,
            ResolvedSource::File(_) => SourceKind::File,
            ResolvedSource::Empty => SourceKind::Empty,
            ResolvedSource::Unknown(_) => SourceKind::Unknown,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SourceKind::Push => "push",
            SourceKind::EmbeddedHls => "embedded HLS",
            SourceKind::NativeHls => "native HLS",
            SourceKind::File => "file",
            SourceKind::Empty => "empty",
            SourceKind::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Pick the first strategy of `order` which is supported by the platform and for which a
/// source can be found in `payload`.
pub(crate) fn resolve<H: Host>(
    payload: &Value,
    order: &[StrategyName],
    capabilities: &Capabilities<H>,
) -> ResolvedSource {
    if is_empty_payload(payload) {
        return ResolvedSource::Empty;
    }
    for strategy in order {
        if !capabilities.supports(*strategy) {
            Logger::debug(&format!("Resolver: {:?} not supported, skipping", strategy));
            continue;
        }
        let resolved = match strategy {
            StrategyName::Push => extract_channel(payload).map(ResolvedSource::Push),
            StrategyName::EmbeddedHls => extract_playlist(payload).map(ResolvedSource::EmbeddedHls),
            StrategyName::NativeHls => extract_playlist(payload).map(ResolvedSource::NativeHls),
            StrategyName::File => extract_file(payload).map(ResolvedSource::File),
        };
        if let Some(resolved) = resolved {
            Logger::info(&format!("Resolver: resolved to {}", resolved.kind()));
            return resolved;
        }
    }
    Logger::warn("Resolver: no configured strategy can play the directive");
    ResolvedSource::Unknown(payload.clone())
}

fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn extract_channel(payload: &Value) -> Option<ChannelDescriptor> {
    let channel = payload.get("channel").or_else(|| payload.get("socketIo"))?;
    let namespace = channel.get("namespace")?.as_str()?;
    let path = channel.get("path")?.as_str()?;
    let key = channel
        .get("key")
        .and_then(Value::as_str)
        .map(str::to_owned);
    Some(ChannelDescriptor {
        namespace: namespace.to_owned(),
        path: path.to_owned(),
        key,
    })
}

fn extract_playlist(payload: &Value) -> Option<Url> {
    extract_url(payload, &["hlsPlaylist"], &PLAYLIST_EXTENSIONS)
}

fn extract_file(payload: &Value) -> Option<Url> {
    extract_url(payload, &["file", "mp4File"], &FILE_EXTENSIONS)
}

/// Find an URL with one of the given `extensions`, either as the payload itself or in one
/// of its `fields`.
fn extract_url(payload: &Value, fields: &[&str], extensions: &[&str]) -> Option<Url> {
    let candidates = std::iter::once(payload).chain(fields.iter().filter_map(|f| payload.get(*f)));
    candidates
        .filter_map(Value::as_str)
        .map(|s| Url::new(s.to_owned()))
        .find(|url| extensions.iter().any(|ext| url.has_extension(ext)))
}
