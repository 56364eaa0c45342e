//! Shared types for the dynplay playback engine.
//!
//! This crate contains the domain models shared between the pipeline code
//! and anything observing it (the CLI, tests, embedders).

/// URI played when none is given on the command line or in config.
pub const DEFAULT_URI: &str =
    "https://www.freedesktop.org/software/gstreamer-sdk/data/media/sintel_trailer-480p.webm";

/// Default name of the top-level pipeline object.
pub const DEFAULT_PIPELINE_NAME: &str = "pipeline";

pub mod element;
pub mod events;
pub mod state;

// Re-export commonly used types
pub use element::{ElementSpec, MediaKind, Variant};
pub use events::PlayerEvent;
pub use state::PipelineState;
