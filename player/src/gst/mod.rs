//! GStreamer integration.

pub mod pipeline;

pub use pipeline::{PipelineError, PlaybackPipeline};
