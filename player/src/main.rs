//! dynplay command line player.

use clap::Parser;
use dynplay_types::Variant;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use dynplay::config::{Config, ConfigOverrides};
use dynplay::events::EventBroadcaster;
use dynplay::gst::pipeline::Termination;
use dynplay::version::VersionInfo;

/// dynplay - play a URI through uridecodebin, linking its pads as they appear
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media URI to play (defaults to the configured URI)
    uri: Option<String>,

    /// Pipeline topology: "single" (video only) or "dual" (video and audio)
    #[arg(long)]
    variant: Option<Variant>,

    /// Video sink factory (e.g. autovideosink, fakesink)
    #[arg(long)]
    video_sink: Option<String>,

    /// Audio sink factory (e.g. autoaudiosink, fakesink)
    #[arg(long)]
    audio_sink: Option<String>,

    /// Extra TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error or an EnvFilter directive)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = Config::from_figment(ConfigOverrides {
        uri: args.uri,
        variant: args.variant,
        video_sink: args.video_sink,
        audio_sink: args.audio_sink,
        log_level: args.log_level,
        config_file: args.config,
    })?;

    let _log_guard = dynplay::logging::init(&config)?;

    gstreamer::init()?;
    info!("{}", VersionInfo::get().summary());
    info!(
        "Playing {} ({} variant, sinks: {} / {})",
        config.uri, config.variant, config.video_sink, config.audio_sink
    );

    match dynplay::play(&config, EventBroadcaster::default()) {
        Ok(Termination::EndOfStream) => Ok(ExitCode::SUCCESS),
        // Reported by the pipeline and already logged; playback ended cleanly
        Ok(Termination::Error { .. }) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
