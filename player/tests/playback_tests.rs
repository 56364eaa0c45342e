//! End-to-end playback tests against real GStreamer elements.
//!
//! Media is generated on the fly with encoders from gst-plugins-base. Tests
//! that need a plugin which is not installed print a note and return early.

use dynplay::config::Config;
use dynplay::events::{drain, EventBroadcaster};
use dynplay::gst::pipeline::Termination;
use dynplay::gst::PipelineError;
use dynplay_types::{MediaKind, PlayerEvent, Variant};
use gstreamer as gst;
use gstreamer::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const PLAYBACK_FACTORIES: [&str; 4] = ["uridecodebin", "videoconvert", "fakesink", "filesrc"];
const VIDEO_FILE_FACTORIES: [&str; 6] = [
    "videotestsrc",
    "theoraenc",
    "theoradec",
    "oggmux",
    "oggdemux",
    "filesink",
];
const AUDIO_FILE_FACTORIES: [&str; 6] = [
    "audiotestsrc",
    "vorbisenc",
    "vorbisdec",
    "audioconvert",
    "audioresample",
    "filesink",
];

fn init() {
    gst::init().unwrap();
}

/// True when every factory is installed; otherwise logs which one is missing.
fn have_factories(factories: &[&str]) -> bool {
    for name in factories {
        if gst::ElementFactory::find(name).is_none() {
            eprintln!("skipping: GStreamer element '{}' is not installed", name);
            return false;
        }
    }
    true
}

/// Encode a short Ogg file with a Theora stream and, optionally, a Vorbis stream.
fn write_ogg(path: &Path, with_audio: bool) {
    let mut description = format!(
        "videotestsrc num-buffers=15 ! video/x-raw,width=160,height=120,framerate=15/1 \
         ! theoraenc ! oggmux name=mux ! filesink location=\"{}\"",
        path.display()
    );
    if with_audio {
        description.push_str(
            " audiotestsrc num-buffers=10 ! audioconvert ! vorbisenc ! queue ! mux.",
        );
    }

    let pipeline = gst::parse::launch(&description).unwrap();
    pipeline.set_state(gst::State::Playing).unwrap();
    let bus = pipeline.bus().unwrap();
    let msg = bus
        .timed_pop_filtered(
            gst::ClockTime::from_seconds(30),
            &[gst::MessageType::Eos, gst::MessageType::Error],
        )
        .expect("encoder pipeline timed out");
    if let gst::MessageView::Error(err) = msg.view() {
        panic!("encoder pipeline failed: {}", err.error());
    }
    pipeline.set_state(gst::State::Null).unwrap();
}

fn file_uri(path: &Path) -> String {
    gst::glib::filename_to_uri(path, None).unwrap().to_string()
}

fn linked_kinds(events: &[PlayerEvent]) -> Vec<MediaKind> {
    events
        .iter()
        .filter_map(|event| match event {
            PlayerEvent::PadLinked { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect()
}

#[test]
fn test_missing_element_fails_setup() {
    init();
    if !have_factories(&["uridecodebin", "videoconvert"]) {
        return;
    }
    let config = Config {
        uri: "file:///unused.ogg".to_string(),
        video_sink: "dynplaynosuchsink".to_string(),
        ..Config::default()
    };
    let events = EventBroadcaster::default();
    let mut rx = events.subscribe();

    let result = dynplay::play(&config, events);

    assert!(matches!(
        result,
        Err(PipelineError::ElementCreation { ref factory, .. }) if factory == "dynplaynosuchsink"
    ));
    // Nothing ran, so nothing was published
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_missing_file_ends_without_panic() {
    init();
    if !have_factories(&PLAYBACK_FACTORIES) {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        uri: file_uri(&temp_dir.path().join("missing.ogg")),
        ..Config::default().headless()
    };

    // Depending on the source element the failure shows up either while
    // starting or as an error on the bus; both end playback cleanly.
    match dynplay::play(&config, EventBroadcaster::default()) {
        Ok(Termination::Error { message, .. }) => assert!(!message.is_empty()),
        Err(PipelineError::StateChange(reason)) => assert!(!reason.is_empty()),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_unreachable_uri_reports_bus_error() {
    init();
    if !have_factories(&PLAYBACK_FACTORIES) || !have_factories(&["souphttpsrc"]) {
        return;
    }
    let config = Config {
        // Nothing listens on port 9 of the loopback interface
        uri: "http://127.0.0.1:9/missing.webm".to_string(),
        ..Config::default().headless()
    };
    let events = EventBroadcaster::default();
    let mut rx = events.subscribe();

    match dynplay::play(&config, events) {
        Ok(Termination::Error { .. }) => assert!(drain(&mut rx)
            .iter()
            .any(|event| matches!(event, PlayerEvent::PipelineError { .. }))),
        Err(PipelineError::StateChange(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_single_stream_plays_to_eos() {
    init();
    if !have_factories(&PLAYBACK_FACTORIES) || !have_factories(&VIDEO_FILE_FACTORIES) {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("video.ogg");
    write_ogg(&path, false);

    let config = Config {
        uri: file_uri(&path),
        ..Config::default().headless()
    };
    let events = EventBroadcaster::new(256);
    let mut rx = events.subscribe();

    let termination = dynplay::play(&config, events).unwrap();

    assert_eq!(termination, Termination::EndOfStream);
    let received = drain(&mut rx);
    assert_eq!(linked_kinds(&received), vec![MediaKind::Video]);
    assert!(received.iter().any(|event| matches!(
        event,
        PlayerEvent::StateChanged {
            new: dynplay_types::PipelineState::Playing,
            ..
        }
    )));
    assert_eq!(received.last(), Some(&PlayerEvent::PipelineEos));
}

#[test]
fn test_single_stream_rejects_audio_pad() {
    init();
    if !have_factories(&PLAYBACK_FACTORIES)
        || !have_factories(&VIDEO_FILE_FACTORIES)
        || !have_factories(&AUDIO_FILE_FACTORIES)
    {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("av.ogg");
    write_ogg(&path, true);

    let config = Config {
        uri: file_uri(&path),
        ..Config::default().headless()
    };
    let events = EventBroadcaster::new(256);
    let mut rx = events.subscribe();

    let termination = dynplay::play(&config, events).unwrap();

    assert_eq!(termination, Termination::EndOfStream);
    let received = drain(&mut rx);
    assert_eq!(linked_kinds(&received), vec![MediaKind::Video]);
    assert!(received.iter().any(|event| matches!(
        event,
        PlayerEvent::PadRejected { media_type: Some(t), .. } if t.starts_with("audio/x-raw")
    )));
}

#[test]
fn test_dual_stream_links_both_chains() {
    init();
    if !have_factories(&PLAYBACK_FACTORIES)
        || !have_factories(&VIDEO_FILE_FACTORIES)
        || !have_factories(&AUDIO_FILE_FACTORIES)
    {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("av.ogg");
    write_ogg(&path, true);

    let config = Config {
        uri: file_uri(&path),
        variant: Variant::Dual,
        ..Config::default().headless()
    };
    let events = EventBroadcaster::new(256);
    let mut rx = events.subscribe();

    let termination = dynplay::play(&config, events).unwrap();

    assert_eq!(termination, Termination::EndOfStream);
    let mut kinds = linked_kinds(&drain(&mut rx));
    kinds.sort_by_key(|kind| kind.to_string());
    assert_eq!(kinds, vec![MediaKind::Audio, MediaKind::Video]);
}
