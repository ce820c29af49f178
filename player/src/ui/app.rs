use crate::app::{App, Focus};
use crate::ui::components::*;
use linkplay_core::LoadPhase;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Clear, Wrap},
    Frame,
};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// Draw the single player screen: link field, player panel, seek bar, controls
pub fn draw_player_screen(f: &mut Frame, app: &App, area: Rect) {
    f.render_widget(Block::default().style(Style::default().bg(BACKGROUND)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),   // Link input
            Constraint::Min(4),      // Player panel
            Constraint::Length(1),   // Seek bar
            Constraint::Length(1),   // Time label
            Constraint::Length(3),   // Controls
            Constraint::Length(1),   // Hints
        ])
        .split(area);

    draw_link_input(f, app, chunks[0]);
    draw_player_panel(f, app, chunks[1]);

    f.render_widget(SeekBar::new(app.seek_fraction()), chunks[2]);

    let time = Paragraph::new(Text::from(app.time_label()))
        .style(Style::default().fg(MUTED))
        .alignment(Alignment::Right);
    f.render_widget(time, chunks[3]);

    draw_controls(f, app, chunks[4]);

    let hints = match app.focus {
        Focus::Link => "Enter: Open link | Tab: Controls | Ctrl+U: Clear | F1: Help | Ctrl+Q: Quit",
        Focus::Controls => "Space: Play/Pause | r: Reload | l: Link | :: Command | F1: Help | q: Quit",
    };
    let status = Paragraph::new(Text::from(hints))
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    f.render_widget(status, chunks[5]);
}

fn draw_link_input(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Link;
    f.render_widget(LinkInput::new(&app.input).focused(focused), area);

    if focused && app.notice.is_none() && !app.is_command_mode() {
        let before: String = app.input.chars().take(app.input_cursor).collect();
        let max_x = area.right().saturating_sub(2);
        let x = (area.x + 1 + before.width() as u16).min(max_x);
        f.set_cursor_position((x, area.y + 1));
    }
}

/// What the embedded player is doing, and where it can be opened
fn draw_player_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Player ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(PANEL));

    let phase = app.load_phase();
    let spinner = spinner_frame(app.last_ui_interaction.elapsed());

    let label = |name: &'static str| Span::styled(name, Style::default().fg(MUTED));
    let mut lines = Vec::new();

    if let Some(url) = &app.page_url {
        lines.push(Line::from(vec![
            label("Page:       "),
            Span::styled(url.as_str(), Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED)),
        ]));
    }

    match app.controller.snapshot() {
        Some(snapshot) => {
            let generation = app
                .controller
                .bridge()
                .generation()
                .map_or_else(|| "-".to_string(), |g| g.to_string());

            lines.push(Line::from(vec![
                label("Video:      "),
                Span::styled(snapshot.video_id.as_str(), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", generation), Style::default().fg(Color::DarkGray)),
            ]));

            let (phase_text, phase_color) = match phase {
                LoadPhase::Idle => ("Idle".to_string(), Color::DarkGray),
                LoadPhase::Loading => (format!("{} Waiting for the player...", spinner), Color::Yellow),
                LoadPhase::Ready => (snapshot.state.label().to_string(), ACCENT),
                LoadPhase::Stalled => ("Player did not report ready".to_string(), Color::Red),
            };
            lines.push(Line::from(vec![
                label("State:      "),
                Span::styled(phase_text, Style::default().fg(phase_color)),
            ]));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "Paste a YouTube link above to start",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let panel = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(panel, area);
}

fn draw_controls(f: &mut Frame, app: &App, area: Rect) {
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(20),
            Constraint::Percentage(40),
        ])
        .split(area);

    let toggle = PlayToggle::new(app.is_playing())
        .focused(app.focus == Focus::Controls)
        .ready(app.controller.is_ready());
    f.render_widget(toggle, row[1]);
}

/// Float the status toast just above the controls
pub fn draw_status_message(f: &mut Frame, message: &str, color: Color, age: Duration, ttl: Duration) {
    let screen = f.area();
    let width = u16::try_from(message.width())
        .unwrap_or(u16::MAX)
        .saturating_add(4)
        .min(screen.width);
    let height = 3.min(screen.height);

    let area = Rect {
        x: screen.x + (screen.width - width) / 2,
        y: screen.y + screen.height.saturating_sub(9),
        width,
        height,
    };
    f.render_widget(StatusToast::new(message, color).aged(age, ttl), area);
}

/// Draw command prompt
pub fn draw_command_prompt(f: &mut Frame, command: &str) {
    let screen = f.area();
    if screen.height < 3 {
        return;
    }
    let area = Rect::new(0, screen.height - 3, screen.width, 3);

    let prompt_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    f.render_widget(Clear, area);
    f.render_widget(&prompt_block, area);

    let inner_area = prompt_block.inner(area);
    let command_para = Paragraph::new(Text::from(format!(":{}", command)))
        .style(Style::default()
            .fg(Color::Yellow)
            .bg(Color::Black)
            .add_modifier(Modifier::BOLD))
        .alignment(Alignment::Left);

    f.render_widget(command_para, inner_area);

    // Cursor after the colon and the buffer
    f.set_cursor_position((inner_area.x + 1 + command.width() as u16, inner_area.y));
}

/// Draw help dialog
pub fn draw_help_dialog(f: &mut Frame) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(HelpOverlay, area);
}

/// Draw the blocking notice
pub fn draw_notice(f: &mut Frame, message: &str) {
    let screen = f.area();
    let dialog = NoticeDialog::new(message);
    let width = (screen.width * 6 / 10).max(30).min(screen.width);
    let height = dialog.height_for(width).min(screen.height);

    let area = Rect {
        x: screen.x + (screen.width - width) / 2,
        y: screen.y + (screen.height - height) / 2,
        width,
        height,
    };
    f.render_widget(dialog, area);
}

/// Area of `percent_x` by `percent_y` of `r`, centered in it
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(r);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    area
}
