use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Color;
use linkplay_core::{
    AppConfig, CommandOutcome, DropReason, EmbedHost, LoadPhase, PlaybackController,
    SeekBarAnimator, VideoId, link,
};

use crate::commands;

/// Controller over whichever host the binary was started with
pub type Controller = PlaybackController<Box<dyn EmbedHost>>;

/// Shown when a pasted link yields no video identifier
pub const INVALID_LINK_NOTICE: &str = "Invalid URL format. Paste a link like https://www.youtube.com/watch?v=...";

/// Redraw interval while the seek bar is sweeping
const ANIMATION_FRAME: Duration = Duration::from_millis(16);
/// Redraw interval otherwise; keeps the spinner and status fade moving
const IDLE_FRAME: Duration = Duration::from_millis(33);

/// Which control receives key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// The link input field
    Link,
    /// The play/pause toggle
    Controls,
}

// App state
pub struct App {
    /// Playback state and the bridge to the embedded player
    pub controller: Controller,
    /// Seek bar interpolation
    pub animator: SeekBarAnimator,
    /// Link input field
    pub input: String,
    /// Cursor position in the input field, in characters
    pub input_cursor: usize,
    /// Focused control
    pub focus: Focus,
    /// Where the embedded page can be opened, if the host serves one
    pub page_url: Option<String>,
    /// Blocking notice; swallows all keys until dismissed
    pub notice: Option<String>,
    /// Status message to display
    pub status_message: Option<(String, Instant, Color)>,
    /// How long a status message stays up
    pub status_ttl: Duration,
    /// Whether the current load was already reported as stalled
    stall_reported: bool,
    /// Last time the user pressed a key
    pub last_ui_interaction: Instant,
    /// Whether the app should exit
    pub should_quit: bool,
    /// Help dialog visibility
    pub show_help: bool,
    /// Whether command mode is active
    pub command_mode: bool,
    /// Command buffer for command mode
    pub command_buffer: String,
}

impl App {
    /// Create a new application
    pub fn new(controller: Controller, config: &AppConfig, page_url: Option<String>) -> Self {
        Self {
            controller,
            animator: SeekBarAnimator::new(config.seek_animation()),
            input: String::new(),
            input_cursor: 0,
            focus: Focus::Link,
            page_url,
            notice: None,
            status_message: None,
            status_ttl: config.status_ttl(),
            stall_reported: false,
            last_ui_interaction: Instant::now(),
            should_quit: false,
            show_help: false,
            command_mode: false,
            command_buffer: String::new(),
        }
    }

    /// Set a status message with a color
    pub fn set_status(&mut self, message: impl Into<String>, color: Color) {
        let message_string = message.into();
        log::debug!("Status message: {} ({})", message_string, color);
        self.status_message = Some((message_string, Instant::now(), color));
    }

    /// Show a notice the user has to dismiss
    pub fn show_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    /// Parse `raw` and load the video it names.
    ///
    /// A link without a usable identifier raises the invalid-link notice and
    /// leaves the current video untouched.
    pub fn open_link(&mut self, raw: &str) -> Result<()> {
        match link::parse(raw) {
            Ok(video_id) => self.open_video(video_id),
            Err(e) => {
                log::info!("Rejected link: {}", e);
                self.show_notice(INVALID_LINK_NOTICE);
                Ok(())
            }
        }
    }

    /// Submit whatever is in the link field
    pub fn submit_link(&mut self) -> Result<()> {
        let raw = self.input.clone();
        self.open_link(&raw)
    }

    /// Tear down the current player and load `video_id`
    pub fn open_video(&mut self, video_id: VideoId) -> Result<()> {
        self.animator.reset();
        self.stall_reported = false;
        self.controller
            .load(video_id.clone())
            .with_context(|| format!("Failed to load video {}", video_id))?;

        match &self.page_url {
            Some(url) => self.set_status(format!("Loading {} at {}", video_id, url), Color::Green),
            None => self.set_status(format!("Loading {}", video_id), Color::Green),
        }
        Ok(())
    }

    /// Load the current video again from scratch
    pub fn reload(&mut self) -> Result<()> {
        self.animator.reset();
        self.stall_reported = false;
        self.controller.reload().context("Nothing to reload")?;
        self.set_status("Reloading player", Color::Green);
        Ok(())
    }

    pub fn play(&mut self) -> Result<()> {
        let outcome = self.controller.request_play()?;
        self.report(outcome);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        let outcome = self.controller.request_pause()?;
        self.report(outcome);
        Ok(())
    }

    pub fn toggle_playback(&mut self) -> Result<()> {
        let outcome = self.controller.toggle()?;
        self.report(outcome);
        Ok(())
    }

    fn report(&mut self, outcome: CommandOutcome) {
        match outcome {
            CommandOutcome::Sent(command) => log::debug!("Sent {:?}", command),
            CommandOutcome::Dropped(DropReason::NothingLoaded) => {
                self.set_status("Paste a link first", Color::Yellow);
            }
            CommandOutcome::Dropped(DropReason::NotReady) => {
                self.set_status("Player is not ready yet", Color::Yellow);
            }
        }
    }

    /// Whether the play/pause toggle currently shows "pause"
    pub fn is_playing(&self) -> bool {
        self.controller.is_playing()
    }

    /// Seek bar fraction to draw right now
    pub fn seek_fraction(&self) -> f64 {
        self.animator.value(Instant::now())
    }

    /// `MM:SS / MM:SS` label
    pub fn time_label(&self) -> String {
        self.controller
            .snapshot()
            .map_or_else(|| linkplay_core::format_progress(0.0, 0.0), |s| s.progress_label())
    }

    /// How long the main loop may wait before drawing again
    pub fn frame_interval(&self) -> Duration {
        if self.animator.is_animating(Instant::now()) {
            ANIMATION_FRAME
        } else {
            IDLE_FRAME
        }
    }

    pub fn load_phase(&self) -> LoadPhase {
        self.controller.load_phase(Instant::now())
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        self.last_ui_interaction = Instant::now();

        // A notice blocks everything until dismissed
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.notice = None;
            }
            return Ok(());
        }

        // Check if we're in command mode
        if self.is_command_mode() {
            match key.code {
                KeyCode::Enter => {
                    let cmd = self.get_command_buffer().to_string();
                    self.exit_command_mode();
                    commands::handle_command(self, &cmd)?;
                }
                KeyCode::Char(c) => {
                    self.add_to_command_buffer(c);
                }
                KeyCode::Backspace => {
                    self.remove_from_command_buffer();
                }
                KeyCode::Esc => {
                    self.exit_command_mode();
                }
                _ => {}
            }
            return Ok(());
        }

        if key.code == KeyCode::F(1) {
            self.show_help = !self.show_help;
            return Ok(());
        }
        if self.show_help {
            if key.code == KeyCode::Esc {
                self.show_help = false;
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Link => Focus::Controls,
                    Focus::Controls => Focus::Link,
                };
                return Ok(());
            }
            _ => {}
        }

        match self.focus {
            Focus::Link => self.handle_link_key(key),
            Focus::Controls => self.handle_controls_key(key),
        }
    }

    /// Handle key events in the link field
    fn handle_link_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter => self.submit_link()?,
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                self.input_cursor = 0;
            }
            KeyCode::Char(c) => {
                let at = self.cursor_byte_index();
                self.input.insert(at, c);
                self.input_cursor += 1;
            }
            KeyCode::Backspace => {
                if self.input_cursor > 0 {
                    self.input_cursor -= 1;
                    let at = self.cursor_byte_index();
                    self.input.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.input_cursor < self.input.chars().count() {
                    let at = self.cursor_byte_index();
                    self.input.remove(at);
                }
            }
            KeyCode::Left => {
                self.input_cursor = self.input_cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.input_cursor = (self.input_cursor + 1).min(self.input.chars().count());
            }
            KeyCode::Home => self.input_cursor = 0,
            KeyCode::End => self.input_cursor = self.input.chars().count(),
            KeyCode::Esc => self.focus = Focus::Controls,
            _ => {}
        }

        Ok(())
    }

    /// Handle key events on the playback controls
    fn handle_controls_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_playback()?,
            KeyCode::Char('p') => self.play()?,
            KeyCode::Char('s') => self.pause()?,
            KeyCode::Char('r') => self.reload()?,
            KeyCode::Char('l') | KeyCode::Char('i') => self.focus = Focus::Link,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char(':') => self.enter_command_mode(),
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }

        Ok(())
    }

    /// Insert pasted text into the link field at the cursor
    pub fn handle_paste(&mut self, text: &str) {
        if self.notice.is_some() {
            return;
        }
        if self.is_command_mode() {
            self.command_buffer.push_str(text.trim());
            return;
        }

        self.focus = Focus::Link;
        let text: String = text.chars().filter(|c| !c.is_control()).collect();
        let at = self.cursor_byte_index();
        self.input.insert_str(at, &text);
        self.input_cursor += text.chars().count();
    }

    fn cursor_byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.input_cursor)
            .map_or(self.input.len(), |(i, _)| i)
    }

    /// Apply pending bridge messages and advance timers
    pub fn update(&mut self) -> Result<()> {
        let now = Instant::now();

        let applied = self.controller.pump();
        if applied > 0 {
            log::trace!("Applied {} bridge messages", applied);
        }
        self.animator.track(self.controller.snapshot(), now);

        if self.controller.load_phase(now) == LoadPhase::Stalled && !self.stall_reported {
            self.stall_reported = true;
            log::warn!("Embedded player did not report ready in time");
            self.set_status(
                "Player did not become ready. Is the page open in a browser?",
                Color::Red,
            );
        }

        // Clear status message after timeout
        if let Some((_, time, _)) = &self.status_message {
            if time.elapsed() > self.status_ttl {
                self.status_message = None;
            }
        }

        Ok(())
    }

    /// Check if command mode is active
    pub fn is_command_mode(&self) -> bool {
        self.command_mode
    }

    /// Enter command mode
    pub fn enter_command_mode(&mut self) {
        self.command_mode = true;
        self.command_buffer.clear();
    }

    /// Exit command mode
    pub fn exit_command_mode(&mut self) {
        self.command_mode = false;
    }

    /// Get the current command buffer
    pub fn get_command_buffer(&self) -> &str {
        &self.command_buffer
    }

    /// Add a character to the command buffer
    pub fn add_to_command_buffer(&mut self, c: char) {
        self.command_buffer.push(c);
    }

    /// Remove the last character from the command buffer
    pub fn remove_from_command_buffer(&mut self) {
        self.command_buffer.pop();
    }
}
