//! dynplay library.
//!
//! Builds a `uridecodebin` playback pipeline, links the decoder's pads as
//! they appear and runs the bus until end-of-stream or error. The binary is
//! a thin wrapper around [`play`]; tests drive the same entry points.

pub mod config;
pub mod events;
pub mod gst;
pub mod logging;
pub mod version;

use config::Config;
use events::EventBroadcaster;
use gst::pipeline::Termination;
use gst::{PipelineError, PlaybackPipeline};
use tracing::info;

/// Build, start and run a pipeline to completion.
///
/// Setup failures (element creation, static links, the PLAYING transition)
/// are returned as `Err` after the partial pipeline has been released. An
/// error posted by the pipeline while playing ends playback normally and is
/// reported as [`Termination::Error`].
pub fn play(config: &Config, events: EventBroadcaster) -> Result<Termination, PipelineError> {
    let mut playback = PlaybackPipeline::new(config, events)?;
    playback.start()?;
    let termination = playback.run()?;
    match &termination {
        Termination::EndOfStream => info!("Playback finished"),
        Termination::Error { message, .. } => info!("Playback stopped by error: {}", message),
    }
    Ok(termination)
}
