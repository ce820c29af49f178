#[cfg(test)]
mod tests;

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::bridge::{BridgeMessage, EmbedHost, PlayerBridge, PlayerCommand};
use crate::error::BridgeError;
use crate::link::VideoId;
use crate::time::format_progress;

/// Player state as reported by the YouTube IFrame API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    #[default]
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlaybackState {
    /// Numeric code used by the IFrame API
    pub fn code(self) -> i64 {
        match self {
            PlaybackState::Unstarted => -1,
            PlaybackState::Ended => 0,
            PlaybackState::Playing => 1,
            PlaybackState::Paused => 2,
            PlaybackState::Buffering => 3,
            PlaybackState::Cued => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Unstarted => "Unstarted",
            PlaybackState::Ended => "Ended",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Buffering => "Buffering",
            PlaybackState::Cued => "Cued",
        }
    }
}

impl TryFrom<i64> for PlaybackState {
    type Error = BridgeError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(PlaybackState::Unstarted),
            0 => Ok(PlaybackState::Ended),
            1 => Ok(PlaybackState::Playing),
            2 => Ok(PlaybackState::Paused),
            3 => Ok(PlaybackState::Buffering),
            5 => Ok(PlaybackState::Cued),
            other => Err(BridgeError::UnknownState(other)),
        }
    }
}

/// The host's view of playback for the loaded video
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub video_id: VideoId,
    pub duration_secs: f64,
    /// Within `[0, duration_secs]` once the duration is known, `0` before
    pub current_time_secs: f64,
    pub state: PlaybackState,
}

impl PlaybackSnapshot {
    pub fn new(video_id: VideoId) -> Self {
        Self {
            video_id,
            duration_secs: 0.0,
            current_time_secs: 0.0,
            state: PlaybackState::Unstarted,
        }
    }

    /// Fold one notification into the snapshot. Last write wins per field.
    pub fn apply(&mut self, message: &BridgeMessage) {
        match *message {
            BridgeMessage::Duration(secs) => {
                self.duration_secs = secs.max(0.0);
                self.current_time_secs = self.clamp_time(self.current_time_secs);
            }
            BridgeMessage::CurrentTime(secs) => {
                self.current_time_secs = self.clamp_time(secs);
            }
            BridgeMessage::StateChange(state) => {
                self.state = state;
            }
            BridgeMessage::PlayerReady => {}
        }
    }

    /// Time stays `0` until the duration is known
    fn clamp_time(&self, secs: f64) -> f64 {
        if self.duration_secs > 0.0 {
            secs.clamp(0.0, self.duration_secs)
        } else {
            0.0
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Elapsed share of the video in `[0, 1]`; `0` while the duration is unknown
    pub fn fraction(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.current_time_secs / self.duration_secs).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// `MM:SS / MM:SS` label
    pub fn progress_label(&self) -> String {
        format_progress(self.current_time_secs, self.duration_secs)
    }
}

/// Why a play/pause request never reached the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No video has been loaded yet
    NothingLoaded,
    /// The page has not reported `playerReady` yet
    NotReady,
}

/// Result of a play/pause request. Even `Sent` only means the command left
/// the host; the page acknowledges nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Sent(PlayerCommand),
    Dropped(DropReason),
}

/// Where the current load stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Ready,
    /// No `playerReady` within the readiness timeout
    Stalled,
}

/// Sole owner of the playback snapshot and sole issuer of player commands.
///
/// Only notifications from the page change the snapshot. Play and pause
/// requests go out through the bridge and are reflected once the page
/// reports the resulting state change.
pub struct PlaybackController<H: EmbedHost> {
    bridge: PlayerBridge<H>,
    snapshot: Option<PlaybackSnapshot>,
    ready: bool,
    loaded_at: Option<Instant>,
    ready_timeout: Duration,
}

impl<H: EmbedHost> PlaybackController<H> {
    pub fn new(bridge: PlayerBridge<H>, ready_timeout: Duration) -> Self {
        Self {
            bridge,
            snapshot: None,
            ready: false,
            loaded_at: None,
            ready_timeout,
        }
    }

    /// Replace whatever is playing with `video_id`.
    ///
    /// The previous page is torn down and the snapshot starts over at
    /// `00:00`, `Unstarted`, before any message from the new page is seen.
    pub fn load(&mut self, video_id: VideoId) -> Result<(), BridgeError> {
        self.ready = false;
        self.loaded_at = None;
        self.snapshot = None;

        self.bridge.mount(&video_id)?;

        info!("Loading video {}", video_id);
        self.snapshot = Some(PlaybackSnapshot::new(video_id));
        self.loaded_at = Some(Instant::now());
        Ok(())
    }

    /// Mount the current video again from scratch
    pub fn reload(&mut self) -> Result<(), BridgeError> {
        let video_id = self
            .snapshot
            .as_ref()
            .map(|s| s.video_id.clone())
            .ok_or(BridgeError::NotMounted)?;
        self.load(video_id)
    }

    /// Unmount the page and forget the loaded video
    pub fn stop(&mut self) {
        self.bridge.teardown();
        self.snapshot = None;
        self.ready = false;
        self.loaded_at = None;
    }

    /// Apply one notification from the mounted page
    pub fn on_message(&mut self, message: BridgeMessage) {
        let Some(snapshot) = self.snapshot.as_mut() else {
            debug!("No video loaded, ignoring {}", message.kind());
            return;
        };

        if message == BridgeMessage::PlayerReady {
            info!("Embedded player is ready for {}", snapshot.video_id);
            self.ready = true;
        }
        snapshot.apply(&message);
    }

    /// Drain and apply everything the page has sent since the last call.
    /// Returns the number of messages applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(message) = self.bridge.next_message() {
            self.on_message(message);
            applied += 1;
        }
        applied
    }

    pub fn request_play(&mut self) -> Result<CommandOutcome, BridgeError> {
        self.send(PlayerCommand::Play)
    }

    pub fn request_pause(&mut self) -> Result<CommandOutcome, BridgeError> {
        self.send(PlayerCommand::Pause)
    }

    /// Pause while playing, play otherwise
    pub fn toggle(&mut self) -> Result<CommandOutcome, BridgeError> {
        if self.is_playing() {
            self.request_pause()
        } else {
            self.request_play()
        }
    }

    fn send(&mut self, command: PlayerCommand) -> Result<CommandOutcome, BridgeError> {
        if self.snapshot.is_none() {
            return Ok(CommandOutcome::Dropped(DropReason::NothingLoaded));
        }
        if !self.ready {
            warn!("Dropping {:?}: embedded player is not ready", command);
            return Ok(CommandOutcome::Dropped(DropReason::NotReady));
        }

        self.bridge.send(command)?;
        Ok(CommandOutcome::Sent(command))
    }

    pub fn snapshot(&self) -> Option<&PlaybackSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot.as_ref().is_some_and(PlaybackSnapshot::is_playing)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn load_phase(&self, now: Instant) -> LoadPhase {
        match self.loaded_at {
            None => LoadPhase::Idle,
            Some(_) if self.ready => LoadPhase::Ready,
            Some(at) if now.saturating_duration_since(at) >= self.ready_timeout => LoadPhase::Stalled,
            Some(_) => LoadPhase::Loading,
        }
    }

    pub fn bridge(&self) -> &PlayerBridge<H> {
        &self.bridge
    }
}
