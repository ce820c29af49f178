use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;

use crate::bridge::{PageOptions, PlayerDimensions};
use crate::error::ConfigError;
use crate::link::VideoId;

/// Widest player the page is generated for, in CSS pixels
pub const MAX_PLAYER_WIDTH: u32 = 7680;

/// Application settings, read from `config.toml`. Every field is optional in
/// the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Video shown before the user pastes a link
    pub initial_video: Option<String>,
    /// Loopback address the bridge server binds to
    pub bind: String,
    /// Player width in CSS pixels, up to `MAX_PLAYER_WIDTH`; the height follows at 16:9
    pub player_width: u32,
    /// Length of one seek bar tween
    pub seek_animation_ms: u64,
    /// Cadence of the page's `currentTime` push
    pub time_update_ms: u64,
    /// How often the page polls for commands
    pub command_poll_ms: u64,
    /// How long to wait for `playerReady` before reporting a stalled load
    pub ready_timeout_secs: u64,
    /// How long status messages stay on screen
    pub status_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            initial_video: Some("833WFf1Lpsc".to_string()),
            bind: "127.0.0.1:8765".to_string(),
            player_width: 640,
            seek_animation_ms: 50,
            time_update_ms: 1000,
            command_poll_ms: 250,
            ready_timeout_secs: 15,
            status_ttl_secs: 5,
        }
    }
}

impl AppConfig {
    /// Default location: `<config dir>/linkplay/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "linkplay").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    debug!("No config directory on this platform, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn initial_video(&self) -> Option<VideoId> {
        self.initial_video.clone().and_then(VideoId::new)
    }

    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            dimensions: PlayerDimensions::from_width(self.player_width.clamp(1, MAX_PLAYER_WIDTH)),
            time_update: Duration::from_millis(self.time_update_ms),
            command_poll: Duration::from_millis(self.command_poll_ms),
        }
    }

    pub fn seek_animation(&self) -> Duration {
        Duration::from_millis(self.seek_animation_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }
}
