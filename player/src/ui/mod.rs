pub mod app;
pub mod components;

// Re-export components for easier access
pub use components::*;

use anyhow::Result;
use crate::app::App;
use ratatui::Frame;

/// Draw the main UI
pub fn draw_ui(f: &mut Frame, app: &App) -> Result<()> {
    let size = f.area();

    app::draw_player_screen(f, app, size);

    // Draw status message if needed
    if let Some((msg, time, color)) = &app.status_message {
        let age = time.elapsed();
        app::draw_status_message(f, msg, *color, age, app.status_ttl);
    }

    // Draw command prompt if in command mode
    if app.is_command_mode() {
        app::draw_command_prompt(f, app.get_command_buffer());
    }

    // Draw help dialog if needed
    if app.show_help {
        app::draw_help_dialog(f);
    }

    // The notice sits above everything else
    if let Some(notice) = &app.notice {
        app::draw_notice(f, notice);
    }

    Ok(())
}
