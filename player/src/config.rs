//! Configuration management.

use dynplay_types::{Variant, DEFAULT_PIPELINE_NAME, DEFAULT_URI};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    sinks: SinkConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlaybackConfig {
    #[serde(default = "default_uri")]
    uri: String,
    #[serde(default)]
    variant: Variant,
    #[serde(default = "default_pipeline_name")]
    pipeline_name: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            variant: Variant::default(),
            pipeline_name: default_pipeline_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SinkConfig {
    #[serde(default = "default_video_sink")]
    video: String,
    #[serde(default = "default_audio_sink")]
    audio: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            video: default_video_sink(),
            audio: default_audio_sink(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LoggingConfig {
    /// Path to log file (if set, logs are written to the file as well as the console)
    log_file: Option<PathBuf>,
    /// Log level filter (trace, debug, info, warn, error or a full EnvFilter directive)
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    log_level: Option<String>,
}

fn default_uri() -> String {
    DEFAULT_URI.to_string()
}

fn default_pipeline_name() -> String {
    DEFAULT_PIPELINE_NAME.to_string()
}

fn default_video_sink() -> String {
    "autovideosink".to_string()
}

fn default_audio_sink() -> String {
    "autoaudiosink".to_string()
}

/// Values given on the command line. `None` leaves the lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub uri: Option<String>,
    pub variant: Option<Variant>,
    pub video_sink: Option<String>,
    pub audio_sink: Option<String>,
    pub log_level: Option<String>,
    /// Extra TOML file, merged above the discovered config files
    pub config_file: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Media URI handed to the decoder
    pub uri: String,
    /// Which playback topology to build
    pub variant: Variant,
    /// Name of the top-level pipeline object
    pub pipeline_name: String,
    /// Factory used for the video sink
    pub video_sink: String,
    /// Factory used for the audio sink (dual variant only)
    pub audio_sink: String,
    /// Path to log file (if set, logs are written to the file as well as the console)
    pub log_file: Option<PathBuf>,
    /// Log level (if set, overrides RUST_LOG environment variable)
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with full priority chain:
    /// CLI args > env vars > `--config` file > local file > user file > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `config.toml` in user config directory (~/.config/dynplay/ on Linux)
    /// 2. `.dynplay.toml` in current directory
    pub fn from_figment(overrides: ConfigOverrides) -> anyhow::Result<Self> {
        let local_config = std::env::current_dir()
            .ok()
            .map(|d| d.join(".dynplay.toml"));
        let user_config = directories::ProjectDirs::from("", "", "dynplay")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // 1. Start with defaults
        let mut figment = Figment::new().merge(Serialized::defaults(ConfigFile {
            playback: PlaybackConfig::default(),
            sinks: SinkConfig::default(),
            logging: LoggingConfig::default(),
        }));

        // 2. Merge user and local config files if they exist
        for path in [user_config, local_config].iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // 3. Merge an explicitly requested file; unlike the discovered ones it must exist
        if let Some(ref path) = overrides.config_file {
            if !path.exists() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        // 4. Merge environment variables (DYNPLAY_<SECTION>__<KEY>)
        figment = figment.merge(Env::prefixed("DYNPLAY_").split("__"));

        // 5. Merge CLI arguments (highest priority)
        if let Some(ref uri) = overrides.uri {
            figment = figment.merge(Serialized::default("playback.uri", uri));
        }
        if let Some(variant) = overrides.variant {
            figment = figment.merge(Serialized::default("playback.variant", variant));
        }
        if let Some(ref sink) = overrides.video_sink {
            figment = figment.merge(Serialized::default("sinks.video", sink));
        }
        if let Some(ref sink) = overrides.audio_sink {
            figment = figment.merge(Serialized::default("sinks.audio", sink));
        }
        if let Some(ref level) = overrides.log_level {
            figment = figment.merge(Serialized::default("logging.log_level", level));
        }

        let config_file: ConfigFile = figment.extract()?;
        Ok(config_file.into())
    }

    /// Load configuration from a single TOML file on top of the defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config_file: ConfigFile = Figment::new()
            .merge(Serialized::defaults(ConfigFile {
                playback: PlaybackConfig::default(),
                sinks: SinkConfig::default(),
                logging: LoggingConfig::default(),
            }))
            .merge(Toml::file(path))
            .extract()?;
        Ok(config_file.into())
    }

    /// Same configuration with both sinks replaced by `fakesink`.
    pub fn headless(mut self) -> Self {
        self.video_sink = "fakesink".to_string();
        self.audio_sink = "fakesink".to_string();
        self
    }
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Self {
            uri: file.playback.uri,
            variant: file.playback.variant,
            pipeline_name: file.playback.pipeline_name,
            video_sink: file.sinks.video,
            audio_sink: file.sinks.audio,
            log_file: file.logging.log_file,
            log_level: file.logging.log_level,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigFile {
            playback: PlaybackConfig::default(),
            sinks: SinkConfig::default(),
            logging: LoggingConfig::default(),
        }
        .into()
    }
}
