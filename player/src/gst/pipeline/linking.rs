//! Dynamic pad linking.
//!
//! The decoder exposes its source pads only once it has looked at the media.
//! Each new pad is handed to a [`PadLinker`] running on its own thread; the
//! pad-added handler waits for the verdict so the pad is linked (or knowingly
//! left alone) before GStreamer starts pushing data through it.

use super::{PipelineContext, PipelineError};
use crate::events::EventBroadcaster;
use dynplay_types::{MediaKind, PlayerEvent, Variant};
use gstreamer as gst;
use gstreamer::prelude::*;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Pending pad-added notifications the worker will queue before senders block.
const LINKER_QUEUE_DEPTH: usize = 16;

/// What the linker did with one pad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Linked to the converter chain for `kind`
    Linked { media_type: String, kind: MediaKind },
    /// The pad already had a peer; nothing attempted
    AlreadyLinked,
    /// No caps negotiated on the pad yet
    NoCaps,
    /// Nothing in this pipeline consumes the media type
    Unsupported { media_type: String },
    /// A target existed but the link was refused
    LinkFailed { media_type: String, reason: String },
}

impl LinkOutcome {
    pub fn is_linked(&self) -> bool {
        matches!(self, LinkOutcome::Linked { .. })
    }
}

/// A freshly exposed source pad, as seen by the linker.
pub trait DiscoveredPad {
    /// Sink pad type this pad can be linked to
    type Sink;

    fn pad_name(&self) -> String;

    fn already_linked(&self) -> bool;

    /// Name of the first structure of the pad's current caps.
    fn media_type(&self) -> Option<String>;

    fn link_to(&self, sink: &Self::Sink) -> Result<(), String>;
}

/// Where pads of each media kind should go.
pub trait SinkTargets {
    type Pad;

    /// Sink pad at the head of the chain for `kind`, if the pipeline has one.
    fn sink_pad(&self, kind: MediaKind) -> Option<Self::Pad>;
}

impl DiscoveredPad for gst::Pad {
    type Sink = gst::Pad;

    fn pad_name(&self) -> String {
        self.name().to_string()
    }

    fn already_linked(&self) -> bool {
        self.is_linked()
    }

    fn media_type(&self) -> Option<String> {
        let caps = self.current_caps()?;
        caps.structure(0).map(|s| s.name().to_string())
    }

    fn link_to(&self, sink: &gst::Pad) -> Result<(), String> {
        self.link(sink).map(|_| ()).map_err(|e| format!("{:?}", e))
    }
}

impl SinkTargets for PipelineContext {
    type Pad = gst::Pad;

    fn sink_pad(&self, kind: MediaKind) -> Option<gst::Pad> {
        let element = match kind {
            MediaKind::Video => Some(&self.video_convert),
            MediaKind::Audio => self.audio_convert.as_ref(),
        }?;
        element.static_pad("sink")
    }
}

/// Routes decoder pads to converter chains by media type prefix.
pub struct PadLinker<T> {
    variant: Variant,
    targets: T,
    events: EventBroadcaster,
}

impl<T: SinkTargets> PadLinker<T> {
    pub fn new(variant: Variant, targets: T, events: EventBroadcaster) -> Self {
        Self {
            variant,
            targets,
            events,
        }
    }

    /// Decide what to do with a new pad and do it.
    ///
    /// Never fails: every problem is a soft one, logged and reported through
    /// the returned outcome and a [`PlayerEvent`].
    pub fn handle<P>(&self, source: &str, pad: &P) -> LinkOutcome
    where
        P: DiscoveredPad<Sink = T::Pad>,
    {
        let pad_name = pad.pad_name();
        info!("Received new pad {} from {}", pad_name, source);
        self.events.broadcast(PlayerEvent::PadAdded {
            source: source.to_string(),
            pad: pad_name.clone(),
        });

        let outcome = self.route(&pad_name, pad);
        self.publish(&pad_name, &outcome);
        outcome
    }

    fn route<P>(&self, pad_name: &str, pad: &P) -> LinkOutcome
    where
        P: DiscoveredPad<Sink = T::Pad>,
    {
        if pad.already_linked() {
            info!("Pad {} is already linked, ignoring", pad_name);
            return LinkOutcome::AlreadyLinked;
        }

        let Some(media_type) = pad.media_type() else {
            warn!("Pad {} has no negotiated caps, ignoring", pad_name);
            return LinkOutcome::NoCaps;
        };

        let kind = match MediaKind::from_media_type(&media_type) {
            Some(kind) if self.variant.accepts(kind) => kind,
            _ => {
                match self.variant {
                    Variant::Single => info!("Not my pad: {} has type {}", pad_name, media_type),
                    Variant::Dual => warn!("Unknown pad type {} on pad {}", media_type, pad_name),
                }
                return LinkOutcome::Unsupported { media_type };
            }
        };

        let Some(sink) = self.targets.sink_pad(kind) else {
            warn!("No {} sink pad to link {} to", kind, pad_name);
            return LinkOutcome::LinkFailed {
                media_type,
                reason: format!("no {} sink pad", kind),
            };
        };

        match pad.link_to(&sink) {
            Ok(()) => {
                info!("Pad linking succeeded: {} ({})", pad_name, media_type);
                LinkOutcome::Linked { media_type, kind }
            }
            Err(reason) => {
                warn!(
                    "Pad linking failed: {} ({}): {}",
                    pad_name, media_type, reason
                );
                LinkOutcome::LinkFailed { media_type, reason }
            }
        }
    }

    fn publish(&self, pad_name: &str, outcome: &LinkOutcome) {
        let pad = pad_name.to_string();
        let event = match outcome.clone() {
            LinkOutcome::Linked { media_type, kind } => PlayerEvent::PadLinked {
                pad,
                media_type,
                kind,
            },
            LinkOutcome::AlreadyLinked => PlayerEvent::PadAlreadyLinked { pad },
            LinkOutcome::NoCaps => PlayerEvent::PadRejected {
                pad,
                media_type: None,
            },
            LinkOutcome::Unsupported { media_type } => PlayerEvent::PadRejected {
                pad,
                media_type: Some(media_type),
            },
            LinkOutcome::LinkFailed { media_type, reason } => PlayerEvent::PadLinkFailed {
                pad,
                media_type,
                reason,
            },
        };
        self.events.broadcast(event);
    }
}

enum LinkerMessage {
    PadDiscovered {
        source: String,
        pad: gst::Pad,
        reply: oneshot::Sender<LinkOutcome>,
    },
    Shutdown,
}

/// Owns the thread that runs a [`PadLinker`].
pub struct LinkerHandle {
    sender: mpsc::Sender<LinkerMessage>,
    worker: Option<JoinHandle<()>>,
}

impl LinkerHandle {
    /// Start the linking routine on a dedicated thread.
    pub fn spawn<T>(linker: PadLinker<T>) -> Result<Self, PipelineError>
    where
        T: SinkTargets<Pad = gst::Pad> + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::channel(LINKER_QUEUE_DEPTH);
        let worker = std::thread::Builder::new()
            .name("pad-linker".to_string())
            .spawn(move || {
                debug!("Pad linker started");
                while let Some(message) = receiver.blocking_recv() {
                    match message {
                        LinkerMessage::PadDiscovered { source, pad, reply } => {
                            let outcome = linker.handle(&source, &pad);
                            // The requester may have given up waiting
                            let _ = reply.send(outcome);
                        }
                        LinkerMessage::Shutdown => break,
                    }
                }
                debug!("Pad linker stopped");
            })?;

        Ok(Self {
            sender,
            worker: Some(worker),
        })
    }

    /// A cloneable entry point for pad-added handlers.
    pub fn requester(&self) -> PadRequester {
        PadRequester {
            sender: self.sender.clone(),
        }
    }

    /// Stop the worker and wait for it. Pads discovered afterwards are not linked.
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            if self.sender.blocking_send(LinkerMessage::Shutdown).is_err() {
                debug!("Pad linker already stopped");
            }
            if worker.join().is_err() {
                error!("Pad linker thread panicked");
            }
        }
    }
}

impl Drop for LinkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Publishes "pad discovered" requests to the linker and waits for the outcome.
#[derive(Clone)]
pub struct PadRequester {
    sender: mpsc::Sender<LinkerMessage>,
}

impl PadRequester {
    /// Returns `None` once the linker has been shut down.
    ///
    /// Blocks the calling thread; must not be called from async code.
    pub fn discover(&self, source: &str, pad: &gst::Pad) -> Option<LinkOutcome> {
        let (reply, response) = oneshot::channel();
        self.sender
            .blocking_send(LinkerMessage::PadDiscovered {
                source: source.to_string(),
                pad: pad.clone(),
                reply,
            })
            .ok()?;
        response.blocking_recv().ok()
    }
}
