//! Element and stream classification types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One entry of a pipeline's element catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// GStreamer factory name (e.g., "videoconvert")
    pub factory: String,
    /// Instance name inside the pipeline (e.g., "convert")
    pub name: String,
}

impl ElementSpec {
    pub fn new(factory: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            factory: factory.into(),
            name: name.into(),
        }
    }
}

/// Raw media kinds that a decoder output pad can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Caps structure name prefix for decoded streams of this kind.
    pub fn caps_prefix(&self) -> &'static str {
        match self {
            Self::Video => "video/x-raw",
            Self::Audio => "audio/x-raw",
        }
    }

    /// Classify a caps structure name such as "video/x-raw" or "audio/x-raw(memory:GLMemory)".
    ///
    /// Matching is by prefix, so anything that is not decoded raw media
    /// (subtitles, encoded streams, ...) yields `None`.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        [Self::Video, Self::Audio]
            .into_iter()
            .find(|kind| media_type.starts_with(kind.caps_prefix()))
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Which of the two playback topologies to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Decoder -> video chain only; audio pads are refused.
    #[default]
    Single,
    /// Decoder -> video chain and audio chain.
    Dual,
}

impl Variant {
    /// Media kinds the dynamic pad linker accepts for this variant.
    pub fn accepted_kinds(&self) -> &'static [MediaKind] {
        match self {
            Self::Single => &[MediaKind::Video],
            Self::Dual => &[MediaKind::Video, MediaKind::Audio],
        }
    }

    pub fn accepts(&self, kind: MediaKind) -> bool {
        self.accepted_kinds().contains(&kind)
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Dual => write!(f, "dual"),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "video" => Ok(Self::Single),
            "dual" | "av" => Ok(Self::Dual),
            other => Err(format!(
                "unknown variant '{}' (expected 'single' or 'dual')",
                other
            )),
        }
    }
}
