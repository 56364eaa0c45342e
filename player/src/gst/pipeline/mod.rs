//! GStreamer playback pipeline management.

mod bus;
mod construction;
mod lifecycle;
mod linking;

pub use bus::{BusEvent, BusPoller, PollerState, Termination};
pub use construction::ElementCatalog;
pub use linking::{DiscoveredPad, LinkOutcome, LinkerHandle, PadLinker, PadRequester, SinkTargets};

use crate::events::EventBroadcaster;
use dynplay_types::{PipelineState, Variant};
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("GStreamer boolean error: {0}")]
    BoolError(#[from] glib::BoolError),

    #[error("Failed to create element '{name}' from factory '{factory}'")]
    ElementCreation { factory: String, name: String },

    #[error("Failed to link elements: {0} -> {1}")]
    LinkError(String, String),

    #[error("Invalid element catalog: {0}")]
    InvalidCatalog(String),

    #[error("Pipeline state change failed: {0}")]
    StateChange(String),

    #[error("Pipeline '{0}' has no bus")]
    MissingBus(String),

    #[error("Failed to spawn pad linker thread: {0}")]
    LinkerSpawn(#[from] std::io::Error),
}

/// Element references the dynamic pad linker needs, scoped to one pipeline.
///
/// The pipeline owns the elements; this bundle only holds extra references
/// so the linker can resolve converter sink pads from its own thread. It is
/// built once per [`PlaybackPipeline`] and never shared with another one.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// uridecodebin whose source pads appear at runtime
    pub decoder: gst::Element,
    /// Head of the video chain
    pub video_convert: gst::Element,
    /// Head of the audio chain (dual variant only)
    pub audio_convert: Option<gst::Element>,
}

/// A playback pipeline: decoder, converter chains, sinks, and the pad linker
/// that joins them once the decoder has discovered its streams.
pub struct PlaybackPipeline {
    name: String,
    variant: Variant,
    pipeline: gst::Pipeline,
    context: PipelineContext,
    events: EventBroadcaster,
    /// Worker thread that makes the dynamic link decisions
    linker: Option<LinkerHandle>,
    /// pad-added handler on the decoder (disconnected on teardown)
    pad_added_handler: Option<glib::SignalHandlerId>,
    /// Set once the pipeline has been brought to NULL
    torn_down: bool,
}

impl PlaybackPipeline {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// The underlying GStreamer pipeline.
    pub fn pipeline(&self) -> &gst::Pipeline {
        &self.pipeline
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    /// Current state as reported by GStreamer (no waiting on pending transitions).
    pub fn state(&self) -> PipelineState {
        pipeline_state(self.pipeline.current_state())
    }
}

impl Drop for PlaybackPipeline {
    fn drop(&mut self) {
        debug!("Dropping pipeline: {}", self.name);
        self.teardown();
    }
}

/// Map a GStreamer state onto the shared state type.
pub fn pipeline_state(state: gst::State) -> PipelineState {
    match state {
        gst::State::VoidPending => PipelineState::VoidPending,
        gst::State::Null => PipelineState::Null,
        gst::State::Ready => PipelineState::Ready,
        gst::State::Paused => PipelineState::Paused,
        gst::State::Playing => PipelineState::Playing,
        _ => PipelineState::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_state_mapping() {
        assert_eq!(pipeline_state(gst::State::Null), PipelineState::Null);
        assert_eq!(pipeline_state(gst::State::Ready), PipelineState::Ready);
        assert_eq!(pipeline_state(gst::State::Paused), PipelineState::Paused);
        assert_eq!(pipeline_state(gst::State::Playing), PipelineState::Playing);
        assert_eq!(
            pipeline_state(gst::State::VoidPending),
            PipelineState::VoidPending
        );
    }

    #[test]
    fn test_error_messages() {
        let err = PipelineError::ElementCreation {
            factory: "nosuchelement".to_string(),
            name: "sink".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create element 'sink' from factory 'nosuchelement'"
        );

        let err = PipelineError::LinkError("convert".to_string(), "sink".to_string());
        assert_eq!(err.to_string(), "Failed to link elements: convert -> sink");
    }
}
