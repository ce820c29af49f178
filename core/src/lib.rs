pub mod animator;
pub mod bridge;
pub mod config;
pub mod error;
pub mod link;
pub mod playback;
pub mod time;

// Re-exports
pub use animator::SeekBarAnimator;
pub use bridge::{
    BridgeMessage, EmbedHost, Generation, HttpHost, MemoryHost, PageOptions, PlayerBridge,
    PlayerCommand, PlayerDimensions,
};
pub use config::AppConfig;
pub use error::{BridgeError, ConfigError, ParseError};
pub use link::VideoId;
pub use playback::{
    CommandOutcome, DropReason, LoadPhase, PlaybackController, PlaybackSnapshot, PlaybackState,
};
pub use time::{format_progress, format_time};
