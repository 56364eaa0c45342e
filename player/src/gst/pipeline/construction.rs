use super::{LinkerHandle, PadLinker, PipelineContext, PipelineError, PlaybackPipeline};
use crate::config::Config;
use crate::events::EventBroadcaster;
use dynplay_types::{ElementSpec, Variant};
use gstreamer as gst;
use gstreamer::prelude::*;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// The fixed set of elements a playback pipeline is built from.
///
/// Each chain is linked statically, in order, at construction time. The
/// decoder is left unlinked: its source pads only exist once it has
/// inspected the media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementCatalog {
    pub variant: Variant,
    pub decoder: ElementSpec,
    pub video_chain: Vec<ElementSpec>,
    pub audio_chain: Vec<ElementSpec>,
}

impl ElementCatalog {
    /// Catalog for a variant with the given sink factories.
    pub fn for_variant(variant: Variant, video_sink: &str, audio_sink: &str) -> Self {
        match variant {
            Variant::Single => Self {
                variant,
                decoder: ElementSpec::new("uridecodebin", "source"),
                video_chain: vec![
                    ElementSpec::new("videoconvert", "convert"),
                    ElementSpec::new(video_sink, "sink"),
                ],
                audio_chain: Vec::new(),
            },
            Variant::Dual => Self {
                variant,
                decoder: ElementSpec::new("uridecodebin", "src"),
                video_chain: vec![
                    ElementSpec::new("videoconvert", "vconv"),
                    ElementSpec::new(video_sink, "vsink"),
                ],
                audio_chain: vec![
                    ElementSpec::new("audioconvert", "aconv"),
                    ElementSpec::new("audioresample", "arspl"),
                    ElementSpec::new(audio_sink, "asink"),
                ],
            },
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::for_variant(config.variant, &config.video_sink, &config.audio_sink)
    }

    /// Every element, decoder first.
    pub fn all(&self) -> impl Iterator<Item = &ElementSpec> {
        std::iter::once(&self.decoder)
            .chain(self.video_chain.iter())
            .chain(self.audio_chain.iter())
    }
}

/// Instantiate every catalog entry, stopping at the first factory that fails.
fn make_elements(catalog: &ElementCatalog) -> Result<HashMap<String, gst::Element>, PipelineError> {
    let mut elements = HashMap::new();
    for spec in catalog.all() {
        let element = gst::ElementFactory::make(&spec.factory)
            .name(&spec.name)
            .build()
            .map_err(|e| {
                error!(
                    "Failed to create element '{}' ({}): {}",
                    spec.name, spec.factory, e
                );
                PipelineError::ElementCreation {
                    factory: spec.factory.clone(),
                    name: spec.name.clone(),
                }
            })?;
        debug!("Created element '{}' ({})", spec.name, spec.factory);
        elements.insert(spec.name.clone(), element);
    }
    Ok(elements)
}

/// Look up the elements of a chain by instance name, in chain order.
fn chain_elements<'a>(
    elements: &'a HashMap<String, gst::Element>,
    chain: &[ElementSpec],
) -> Vec<&'a gst::Element> {
    chain
        .iter()
        .filter_map(|spec| elements.get(&spec.name))
        .collect()
}

impl PlaybackPipeline {
    /// Build the pipeline described by the configuration.
    pub fn new(config: &Config, events: EventBroadcaster) -> Result<Self, PipelineError> {
        let catalog = ElementCatalog::from_config(config);
        Self::from_catalog(&catalog, &config.uri, &config.pipeline_name, events)
    }

    /// Build a pipeline from an explicit catalog.
    ///
    /// On any failure the partially built pipeline is released before the
    /// error is returned; no state transition is attempted here.
    pub fn from_catalog(
        catalog: &ElementCatalog,
        uri: &str,
        pipeline_name: &str,
        events: EventBroadcaster,
    ) -> Result<Self, PipelineError> {
        info!(
            "Creating {} pipeline '{}' for {}",
            catalog.variant, pipeline_name, uri
        );

        let elements = make_elements(catalog)?;
        info!("Created {} element(s)", elements.len());

        let pipeline = gst::Pipeline::builder().name(pipeline_name).build();
        pipeline.add_many(elements.values())?;

        let video_chain = chain_elements(&elements, &catalog.video_chain);
        link_chain(&video_chain)?;
        if !catalog.audio_chain.is_empty() {
            let audio_chain = chain_elements(&elements, &catalog.audio_chain);
            link_chain(&audio_chain)?;
        }

        let decoder = elements
            .get(&catalog.decoder.name)
            .cloned()
            .ok_or_else(|| PipelineError::InvalidCatalog("decoder missing".to_string()))?;
        let video_convert = video_chain
            .first()
            .map(|element| (*element).clone())
            .ok_or_else(|| PipelineError::InvalidCatalog("empty video chain".to_string()))?;

        let context = PipelineContext {
            decoder,
            video_convert,
            audio_convert: catalog
                .audio_chain
                .first()
                .and_then(|spec| elements.get(&spec.name))
                .cloned(),
        };

        context.decoder.set_property("uri", uri);
        debug!("Decoder '{}' uri set to {}", catalog.decoder.name, uri);

        let mut playback = Self {
            name: pipeline_name.to_string(),
            variant: catalog.variant,
            pipeline,
            context: context.clone(),
            events: events.clone(),
            linker: None,
            pad_added_handler: None,
            torn_down: false,
        };

        let linker = LinkerHandle::spawn(PadLinker::new(catalog.variant, context, events))?;
        playback.connect_pad_added(linker.requester());
        playback.linker = Some(linker);

        info!("Pipeline '{}' constructed", pipeline_name);
        Ok(playback)
    }

    /// Forward every pad the decoder exposes to the pad linker.
    fn connect_pad_added(&mut self, requester: super::PadRequester) {
        let handler = self
            .context
            .decoder
            .connect_pad_added(move |element, new_pad| {
                if new_pad.direction() != gst::PadDirection::Src {
                    return;
                }
                let source = element.name();
                if requester.discover(&source, new_pad).is_none() {
                    warn!(
                        "Pad linker is gone, pad {} from {} left unlinked",
                        new_pad.name(),
                        source
                    );
                }
            });
        self.pad_added_handler = Some(handler);
    }
}

/// Link consecutive elements of a chain.
fn link_chain(chain: &[&gst::Element]) -> Result<(), PipelineError> {
    for pair in chain.windows(2) {
        pair[0].link(pair[1]).map_err(|e| {
            error!(
                "Failed to link {} -> {}: {}",
                pair[0].name(),
                pair[1].name(),
                e
            );
            PipelineError::LinkError(pair[0].name().to_string(), pair[1].name().to_string())
        })?;
        debug!("Linked {} -> {}", pair[0].name(), pair[1].name());
    }
    Ok(())
}
