use super::{pipeline_state, PipelineError, PlaybackPipeline};
use crate::events::EventBroadcaster;
use dynplay_types::{PipelineState, PlayerEvent};
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{debug, error, info, trace, warn};

/// Message kinds the poller waits for; everything else stays on the bus.
const WATCHED_MESSAGES: [gst::MessageType; 3] = [
    gst::MessageType::Error,
    gst::MessageType::Eos,
    gst::MessageType::StateChanged,
];

/// A bus message reduced to what the poller acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    Error {
        source: Option<String>,
        message: String,
        debug: Option<String>,
    },
    EndOfStream,
    StateChanged {
        /// Whether the pipeline itself (not a child element) changed state
        from_pipeline: bool,
        source: Option<String>,
        old: PipelineState,
        new: PipelineState,
        pending: PipelineState,
    },
    /// Any other message type; carries the type name
    Other(String),
}

impl BusEvent {
    pub fn from_message(msg: &gst::Message, pipeline: &gst::Pipeline) -> Self {
        use gst::MessageView;

        let source = msg.src().map(|s| s.name().to_string());
        match msg.view() {
            MessageView::Error(err) => BusEvent::Error {
                source,
                message: err.error().to_string(),
                debug: err.debug().map(|d| d.to_string()),
            },
            MessageView::Eos(_) => BusEvent::EndOfStream,
            MessageView::StateChanged(state_changed) => BusEvent::StateChanged {
                from_pipeline: msg
                    .src()
                    .is_some_and(|s| s == pipeline.upcast_ref::<gst::Object>()),
                source,
                old: pipeline_state(state_changed.old()),
                new: pipeline_state(state_changed.current()),
                pending: pipeline_state(state_changed.pending()),
            },
            _ => BusEvent::Other(format!("{:?}", msg.type_())),
        }
    }
}

/// Why the bus loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    EndOfStream,
    Error {
        source: Option<String>,
        message: String,
        debug: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerState {
    Running,
    Terminated(Termination),
}

/// RUNNING/TERMINATED state machine driven by [`BusEvent`]s.
pub struct BusPoller {
    pipeline_name: String,
    state: PollerState,
    events: EventBroadcaster,
}

impl BusPoller {
    pub fn new(pipeline_name: &str, events: EventBroadcaster) -> Self {
        Self {
            pipeline_name: pipeline_name.to_string(),
            state: PollerState::Running,
            events,
        }
    }

    pub fn state(&self) -> &PollerState {
        &self.state
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, PollerState::Terminated(_))
    }

    /// Consume the poller, returning the termination reason if it has one.
    pub fn into_termination(self) -> Option<Termination> {
        match self.state {
            PollerState::Terminated(termination) => Some(termination),
            PollerState::Running => None,
        }
    }

    /// Feed one event. Events after termination are ignored.
    pub fn step(&mut self, event: BusEvent) -> &PollerState {
        if self.is_terminated() {
            trace!("Bus event after termination ignored: {:?}", event);
            return &self.state;
        }

        match event {
            BusEvent::Error {
                source,
                message,
                debug,
            } => {
                error!(
                    "Error received from {}: {}",
                    source.as_deref().unwrap_or("unknown"),
                    message
                );
                let debug_info = debug.as_deref().unwrap_or("none");
                error!("Debugging information: {}", debug_info);
                self.events.broadcast(PlayerEvent::PipelineError {
                    error: message.clone(),
                    debug: debug.clone(),
                    source: source.clone(),
                });
                self.state = PollerState::Terminated(Termination::Error {
                    source,
                    message,
                    debug,
                });
            }
            BusEvent::EndOfStream => {
                info!("Pipeline '{}' reached end of stream", self.pipeline_name);
                self.events.broadcast(PlayerEvent::PipelineEos);
                self.state = PollerState::Terminated(Termination::EndOfStream);
            }
            BusEvent::StateChanged {
                from_pipeline: true,
                old,
                new,
                pending,
                ..
            } => {
                info!(
                    "Pipeline '{}' state changed from {} to {}",
                    self.pipeline_name, old, new
                );
                self.events
                    .broadcast(PlayerEvent::StateChanged { old, new, pending });
            }
            BusEvent::StateChanged {
                from_pipeline: false,
                source,
                old,
                new,
                ..
            } => {
                trace!(
                    "Element '{}' state changed from {} to {}",
                    source.as_deref().unwrap_or("unknown"),
                    old,
                    new
                );
            }
            BusEvent::Other(kind) => {
                warn!("Unexpected message received: {}", kind);
            }
        }

        &self.state
    }
}

impl PlaybackPipeline {
    /// Block on the bus until end-of-stream or an error, then tear down.
    ///
    /// A pipeline-reported error is a normal termination, not an `Err`:
    /// `Err` is only returned when the bus itself cannot be obtained.
    pub fn run(mut self) -> Result<Termination, PipelineError> {
        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| PipelineError::MissingBus(self.name.clone()))?;

        let mut poller = BusPoller::new(&self.name, self.events.clone());
        debug!("Polling bus of pipeline '{}'", self.name);
        while !poller.is_terminated() {
            let Some(msg) = bus.timed_pop_filtered(gst::ClockTime::NONE, &WATCHED_MESSAGES)
            else {
                trace!("Bus returned no message, waiting again");
                continue;
            };
            poller.step(BusEvent::from_message(&msg, &self.pipeline));
        }

        drop(bus);
        self.teardown();

        match poller.into_termination() {
            Some(termination) => Ok(termination),
            None => Err(PipelineError::StateChange(
                "bus loop ended without termination".to_string(),
            )),
        }
    }
}
