//! Events published while a playback pipeline runs.

use crate::element::MediaKind;
use crate::state::PipelineState;
use serde::{Deserialize, Serialize};

/// Event types broadcast to every subscriber of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PlayerEvent {
    /// A decoder output pad appeared
    PadAdded { source: String, pad: String },
    /// A decoder output pad was linked to a converter chain
    PadLinked {
        pad: String,
        media_type: String,
        kind: MediaKind,
    },
    /// A pad was left unlinked because nothing consumes its media type
    PadRejected {
        pad: String,
        media_type: Option<String>,
    },
    /// A pad was already linked when its notification arrived
    PadAlreadyLinked { pad: String },
    /// Linking a pad to its converter chain failed
    PadLinkFailed {
        pad: String,
        media_type: String,
        reason: String,
    },
    /// The pipeline itself changed state
    StateChanged {
        old: PipelineState,
        new: PipelineState,
        pending: PipelineState,
    },
    /// The pipeline posted an error
    PipelineError {
        error: String,
        debug: Option<String>,
        source: Option<String>,
    },
    /// The pipeline reached end of stream
    PipelineEos,
}

impl PlayerEvent {
    /// Get a human-readable description of the event.
    pub fn description(&self) -> String {
        match self {
            PlayerEvent::PadAdded { source, pad } => format!("Pad {} added on {}", pad, source),
            PlayerEvent::PadLinked {
                pad,
                media_type,
                kind,
            } => format!("Pad {} linked to {} chain ({})", pad, kind, media_type),
            PlayerEvent::PadRejected { pad, media_type } => match media_type {
                Some(t) => format!("Pad {} rejected: unsupported type {}", pad, t),
                None => format!("Pad {} rejected: no negotiated caps", pad),
            },
            PlayerEvent::PadAlreadyLinked { pad } => format!("Pad {} already linked", pad),
            PlayerEvent::PadLinkFailed {
                pad,
                media_type,
                reason,
            } => format!("Pad {} ({}) failed to link: {}", pad, media_type, reason),
            PlayerEvent::StateChanged { old, new, .. } => {
                format!("Pipeline state changed from {} to {}", old, new)
            }
            PlayerEvent::PipelineError { error, source, .. } => {
                if let Some(src) = source {
                    format!("Pipeline error from {}: {}", src, error)
                } else {
                    format!("Pipeline error: {}", error)
                }
            }
            PlayerEvent::PipelineEos => "Pipeline reached end of stream".to_string(),
        }
    }

    /// Whether this event ends playback.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlayerEvent::PipelineError { .. } | PlayerEvent::PipelineEos
        )
    }
}
