//! Two-way contract between the host and the embedded YouTube page.
//!
//! The page is generated by [`EmbedPage`], mounted through an [`EmbedHost`]
//! and identified by a [`Generation`]. Notifications flow page → host as raw
//! JSON [`Envelope`]s, commands flow host → page as [`PlayerCommand`]s. Every
//! mount tears down the previous page first; anything the old page still
//! sends afterwards is discarded by generation.

mod http;
mod memory;
mod page;
mod wire;

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::BridgeError;
use crate::link::VideoId;

pub use http::HttpHost;
pub use memory::MemoryHost;
pub use page::{EmbedPage, placeholder_page};
pub use wire::BridgeMessage;

/// Sequence number of one mounted embedded page. Starts at 1; 0 means
/// "nothing mounted" on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const NONE: Generation = Generation(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Commands the host can push into the embedded player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Play,
    Pause,
}

impl PlayerCommand {
    /// Name of the page function that carries out the command
    pub fn function_name(self) -> &'static str {
        match self {
            PlayerCommand::Play => "playVideo",
            PlayerCommand::Pause => "pauseVideo",
        }
    }
}

/// Render size of the embedded player in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDimensions {
    pub width: u32,
    pub height: u32,
}

impl PlayerDimensions {
    /// 16:9 player that fills the given width
    pub fn from_width(width: u32) -> Self {
        // floor(width * 9 / 16) without the intermediate product
        Self {
            width,
            height: (width / 16) * 9 + (width % 16) * 9 / 16,
        }
    }
}

impl Default for PlayerDimensions {
    fn default() -> Self {
        Self::from_width(640)
    }
}

/// Knobs baked into every generated page
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub dimensions: PlayerDimensions,
    /// Cadence of the page's `currentTime` push
    pub time_update: Duration,
    /// How often the page asks the host for queued commands
    pub command_poll: Duration,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            dimensions: PlayerDimensions::default(),
            time_update: Duration::from_millis(1000),
            command_poll: Duration::from_millis(250),
        }
    }
}

/// A fully rendered page, ready to be handed to a host
#[derive(Debug, Clone)]
pub struct EmbedContent {
    pub generation: Generation,
    pub video_id: VideoId,
    pub html: String,
}

/// One raw notification from a page, tagged with the page's generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub generation: Generation,
    pub payload: String,
}

/// Something that can display embedded content and shuttle messages for it:
/// a web view, a browser tab fed over loopback HTTP, or an in-memory fake.
pub trait EmbedHost {
    /// Display `content`, replacing whatever the host shows
    fn load(&mut self, content: &EmbedContent) -> Result<(), BridgeError>;

    /// Fire-and-forget a command into the page of `generation`
    fn inject(&mut self, generation: Generation, command: PlayerCommand) -> Result<(), BridgeError>;

    /// Release the page of `generation`
    fn unload(&mut self, generation: Generation);

    /// Next pending notification, if any. Never blocks.
    fn try_recv(&mut self) -> Option<Envelope>;
}

impl<H: EmbedHost + ?Sized> EmbedHost for Box<H> {
    fn load(&mut self, content: &EmbedContent) -> Result<(), BridgeError> {
        (**self).load(content)
    }

    fn inject(&mut self, generation: Generation, command: PlayerCommand) -> Result<(), BridgeError> {
        (**self).inject(generation, command)
    }

    fn unload(&mut self, generation: Generation) {
        (**self).unload(generation)
    }

    fn try_recv(&mut self) -> Option<Envelope> {
        (**self).try_recv()
    }
}

#[derive(Debug, Clone)]
struct Mounted {
    generation: Generation,
    video_id: VideoId,
}

/// Owns the lifecycle of the embedded page on top of an [`EmbedHost`].
///
/// At most one page is mounted. It is unloaded before the next one is
/// mounted and when the bridge is dropped.
pub struct PlayerBridge<H: EmbedHost> {
    host: H,
    options: PageOptions,
    mounted: Option<Mounted>,
    last_generation: Generation,
}

impl<H: EmbedHost> PlayerBridge<H> {
    pub fn new(host: H, options: PageOptions) -> Self {
        Self {
            host,
            options,
            mounted: None,
            last_generation: Generation::NONE,
        }
    }

    /// Tear down the current page and mount a fresh one for `video_id`
    pub fn mount(&mut self, video_id: &VideoId) -> Result<Generation, BridgeError> {
        self.teardown();

        let generation = self.last_generation.next();
        self.last_generation = generation;

        let html = EmbedPage::new(video_id, generation, &self.options).render();
        let content = EmbedContent {
            generation,
            video_id: video_id.clone(),
            html,
        };
        self.host.load(&content)?;

        info!("Mounted embedded player {} for video {}", generation, video_id);
        self.mounted = Some(Mounted {
            generation,
            video_id: video_id.clone(),
        });
        Ok(generation)
    }

    /// Unload the current page, if any
    pub fn teardown(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            debug!("Tearing down embedded player {}", mounted.generation);
            self.host.unload(mounted.generation);
        }
    }

    /// Push a command into the mounted page
    pub fn send(&mut self, command: PlayerCommand) -> Result<(), BridgeError> {
        let mounted = self.mounted.as_ref().ok_or(BridgeError::NotMounted)?;
        debug!("Injecting {} into {}", command.function_name(), mounted.generation);
        self.host.inject(mounted.generation, command)
    }

    /// Next decodable notification from the mounted page.
    ///
    /// Envelopes from other generations and undecodable payloads are
    /// dropped here, so callers only ever see current, well-formed messages.
    pub fn next_message(&mut self) -> Option<BridgeMessage> {
        while let Some(envelope) = self.host.try_recv() {
            if Some(envelope.generation) != self.generation() {
                debug!(
                    "Dropping message from stale player {}: {}",
                    envelope.generation, envelope.payload
                );
                continue;
            }

            match BridgeMessage::decode(&envelope.payload) {
                Ok(message) => return Some(message),
                Err(e) => warn!("Ignoring bridge message {:?}: {}", envelope.payload, e),
            }
        }
        None
    }

    pub fn generation(&self) -> Option<Generation> {
        self.mounted.as_ref().map(|m| m.generation)
    }

    pub fn video_id(&self) -> Option<&VideoId> {
        self.mounted.as_ref().map(|m| &m.video_id)
    }
}

impl<H: EmbedHost> Drop for PlayerBridge<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> VideoId {
        VideoId::new(id).unwrap()
    }

    #[test]
    fn test_dimensions_are_16_by_9() {
        let dims = PlayerDimensions::from_width(640);
        assert_eq!(dims.height, 360);
        assert_eq!(PlayerDimensions::from_width(1000).height, 562);
    }

    #[test]
    fn test_dimensions_do_not_overflow_for_huge_widths() {
        assert_eq!(PlayerDimensions::from_width(u32::MAX / 4).height, 603_979_775);
        assert_eq!(PlayerDimensions::from_width(u32::MAX).height, 2_415_919_103);
    }

    #[test]
    fn test_mount_tears_down_previous_page() {
        let host = MemoryHost::new();
        let mut bridge = PlayerBridge::new(host.clone(), PageOptions::default());

        let first = bridge.mount(&video("aaa")).unwrap();
        let second = bridge.mount(&video("bbb")).unwrap();

        assert!(second > first);
        assert_eq!(host.unloaded(), vec![first]);
        assert_eq!(host.current(), Some(second));
        assert_eq!(bridge.video_id(), Some(&video("bbb")));
    }

    #[test]
    fn test_drop_releases_page() {
        let host = MemoryHost::new();
        let generation = {
            let mut bridge = PlayerBridge::new(host.clone(), PageOptions::default());
            bridge.mount(&video("aaa")).unwrap()
        };

        assert_eq!(host.unloaded(), vec![generation]);
        assert_eq!(host.current(), None);
    }

    #[test]
    fn test_send_requires_mounted_page() {
        let host = MemoryHost::new();
        let mut bridge = PlayerBridge::new(host.clone(), PageOptions::default());

        assert_eq!(bridge.send(PlayerCommand::Play), Err(BridgeError::NotMounted));

        let generation = bridge.mount(&video("aaa")).unwrap();
        bridge.send(PlayerCommand::Play).unwrap();
        bridge.send(PlayerCommand::Play).unwrap();
        assert_eq!(
            host.injected(),
            vec![(generation, PlayerCommand::Play), (generation, PlayerCommand::Play)]
        );
    }

    #[test]
    fn test_next_message_filters_stale_and_malformed() {
        let host = MemoryHost::new();
        let mut bridge = PlayerBridge::new(host.clone(), PageOptions::default());

        let old = bridge.mount(&video("aaa")).unwrap();
        let current = bridge.mount(&video("bbb")).unwrap();

        host.emit(old, &BridgeMessage::Duration(99.0));
        host.push_raw(current, "{not json");
        host.push_raw(current, r#"{"type":"volume","data":3}"#);
        host.emit(current, &BridgeMessage::Duration(120.0));

        assert_eq!(bridge.next_message(), Some(BridgeMessage::Duration(120.0)));
        assert_eq!(bridge.next_message(), None);
    }
}
