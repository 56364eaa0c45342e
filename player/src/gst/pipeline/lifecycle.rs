use super::{pipeline_state, PipelineError, PlaybackPipeline};
use dynplay_types::PipelineState;
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{debug, error, info};

impl PlaybackPipeline {
    /// Start the pipeline (set to PLAYING state).
    ///
    /// On failure the pipeline is brought back to NULL before the error is
    /// returned; dropping the value then releases everything.
    pub fn start(&mut self) -> Result<PipelineState, PipelineError> {
        info!("Setting pipeline '{}' to PLAYING state", self.name);

        match self.pipeline.set_state(gst::State::Playing) {
            Ok(gst::StateChangeSuccess::Success) => {
                info!("Pipeline '{}' set to PLAYING: Success", self.name);
                Ok(PipelineState::Playing)
            }
            Ok(gst::StateChangeSuccess::Async) => {
                // The bus reports when the transition completes (or fails)
                info!(
                    "Pipeline '{}' set to PLAYING: Async (state change in progress)",
                    self.name
                );
                Ok(PipelineState::Playing)
            }
            Ok(gst::StateChangeSuccess::NoPreroll) => {
                info!("Pipeline '{}' set to PLAYING: NoPreroll (live source)", self.name);
                Ok(PipelineState::Playing)
            }
            Err(e) => {
                // The element that refused usually posted the reason already
                let reason = self.pending_error().unwrap_or_else(|| e.to_string());
                error!("Pipeline '{}' failed to start: {}", self.name, reason);
                self.teardown();
                Err(PipelineError::StateChange(format!(
                    "Failed to start: {}",
                    reason
                )))
            }
        }
    }

    /// Bring the pipeline to NULL and stop the pad linker. Idempotent.
    ///
    /// Runs before the pipeline is released, whatever ended playback.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let previous = pipeline_state(self.pipeline.current_state());
        match self.pipeline.set_state(gst::State::Null) {
            Ok(_) => info!(
                "Pipeline '{}' stopped (was {})",
                self.name, previous
            ),
            Err(e) => error!("Failed to set pipeline '{}' to NULL: {}", self.name, e),
        }

        // Streaming threads are gone now, so no pad-added handler can be waiting on the linker
        if let Some(handler) = self.pad_added_handler.take() {
            self.context.decoder.disconnect(handler);
        }
        if let Some(mut linker) = self.linker.take() {
            linker.shutdown();
        }
        debug!("Pipeline '{}' torn down", self.name);
    }

    /// First error message waiting on the bus, if any.
    fn pending_error(&self) -> Option<String> {
        let msg = self
            .pipeline
            .bus()?
            .pop_filtered(&[gst::MessageType::Error])?;
        if let gst::MessageView::Error(err) = msg.view() {
            return Some(format!(
                "{}: {}",
                err.src()
                    .map(|s| s.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                err.error()
            ));
        }
        None
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
