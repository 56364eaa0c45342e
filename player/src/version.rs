/// Version and build information embedded at compile time
use serde::Serialize;

/// Build and version information
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    /// Package version from Cargo.toml
    pub version: &'static str,
    /// Git commit hash (short)
    pub git_hash: &'static str,
    /// Whether the working directory had uncommitted changes
    pub git_dirty: bool,
    /// Build timestamp (ISO 8601 format)
    pub build_timestamp: &'static str,
    /// GStreamer runtime version (only meaningful after gst::init)
    pub gstreamer_version: String,
}

impl VersionInfo {
    /// Get the current version information
    pub fn get() -> Self {
        let (major, minor, micro, nano) = gstreamer::version();
        let gstreamer_version = if nano > 0 {
            format!("{}.{}.{}.{}", major, minor, micro, nano)
        } else {
            format!("{}.{}.{}", major, minor, micro)
        };

        Self {
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("GIT_HASH"),
            git_dirty: env!("GIT_DIRTY") == "true",
            build_timestamp: env!("BUILD_TIMESTAMP"),
            gstreamer_version,
        }
    }

    /// One-line summary for startup logs.
    pub fn summary(&self) -> String {
        format!(
            "dynplay {} ({}{}, built {}) on GStreamer {}",
            self.version,
            self.git_hash,
            if self.git_dirty { "-dirty" } else { "" },
            self.build_timestamp,
            self.gstreamer_version
        )
    }
}
