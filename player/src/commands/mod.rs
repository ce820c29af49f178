use anyhow::{Result, anyhow};
use ratatui::style::Color;

use crate::app::App;

/// Command handler for the application
pub struct CommandHandler;

impl CommandHandler {
    /// Parse and execute a command
    pub fn execute(app: &mut App, command_str: &str) -> Result<()> {
        let parts: Vec<&str> = command_str.trim().splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let args = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

        match cmd.as_str() {
            "open" | "o" => {
                if let Some(link) = args {
                    app.open_link(link)?;
                } else {
                    return Err(anyhow!("Open command requires a link argument"));
                }
            }
            "play" | "p" => app.play()?,
            "pause" => app.pause()?,
            "toggle" | "t" => app.toggle_playback()?,
            "reload" | "r" => app.reload()?,
            "url" => match app.page_url.clone() {
                Some(url) => app.set_status(format!("Player page: {}", url), Color::Cyan),
                None => app.set_status("No player page is served", Color::Yellow),
            },
            "help" | "h" | "?" => {
                app.show_help = true;
            }
            "quit" | "exit" | "q" => {
                app.should_quit = true;
            }
            "" => {
                // Empty command, do nothing
            }
            _ => {
                return Err(anyhow!("Unknown command: {}", cmd));
            }
        }

        Ok(())
    }
}

/// Handle a command string entered by the user
pub fn handle_command(app: &mut App, command: &str) -> Result<()> {
    let result = CommandHandler::execute(app, command);
    if let Err(e) = &result {
        log::debug!("Command {:?} failed: {}", command, e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::INVALID_LINK_NOTICE;
    use crate::app::tests::test_app;
    use linkplay_core::{BridgeMessage, PlayerCommand};

    #[test]
    fn test_open_command_loads_link() {
        let (mut app, host) = test_app();
        handle_command(&mut app, "open https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();

        assert_eq!(host.loads().len(), 1);
        assert_eq!(app.controller.snapshot().unwrap().video_id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_open_command_with_bad_link_raises_notice() {
        let (mut app, host) = test_app();
        handle_command(&mut app, "o https://x/watch").unwrap();

        assert_eq!(app.notice.as_deref(), Some(INVALID_LINK_NOTICE));
        assert!(host.loads().is_empty());
        assert!(handle_command(&mut app, "open").is_err());
    }

    #[test]
    fn test_play_and_pause_commands() {
        let (mut app, host) = test_app();
        handle_command(&mut app, "open https://x/watch?v=abc").unwrap();
        let generation = host.current().unwrap();
        host.emit(generation, &BridgeMessage::PlayerReady);
        app.update().unwrap();

        handle_command(&mut app, "play").unwrap();
        handle_command(&mut app, "PAUSE").unwrap();
        assert_eq!(
            host.injected(),
            vec![(generation, PlayerCommand::Play), (generation, PlayerCommand::Pause)]
        );
    }

    #[test]
    fn test_reload_command_remounts() {
        let (mut app, host) = test_app();
        assert!(handle_command(&mut app, "reload").is_err());

        handle_command(&mut app, "open https://x/watch?v=abc").unwrap();
        handle_command(&mut app, "reload").unwrap();
        assert_eq!(host.loads().len(), 2);
        assert_eq!(host.unloaded().len(), 1);
    }

    #[test]
    fn test_unknown_and_quit_commands() {
        let (mut app, _host) = test_app();
        assert!(handle_command(&mut app, "volume 10").is_err());
        handle_command(&mut app, "  ").unwrap();
        assert!(!app.should_quit);

        handle_command(&mut app, "quit").unwrap();
        assert!(app.should_quit);
    }
}
