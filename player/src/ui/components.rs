use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Widget, Wrap, Clear},
    buffer::Buffer,
};
use unicode_width::UnicodeWidthStr;
use std::time::Duration;

pub const BACKGROUND: Color = Color::Rgb(0x24, 0x24, 0x24);
pub const PANEL: Color = Color::Rgb(0x1A, 0x1A, 0x1A);
pub const MUTED: Color = Color::Rgb(0xAE, 0xAE, 0xB2);
pub const ACCENT: Color = Color::Rgb(0x00, 0xDD, 0xA8);
pub const SEEK_TRACK: Color = Color::Rgb(0xD4, 0xD4, 0xD4);
pub const PAUSE_ICON: Color = Color::Rgb(0xE5, 0xE5, 0xEA);

/// Single-line text field for pasting a link
pub struct LinkInput<'a> {
    value: &'a str,
    placeholder: &'a str,
    focused: bool,
}

impl<'a> LinkInput<'a> {
    pub fn new(value: &'a str) -> Self {
        Self {
            value,
            placeholder: "Paste a YouTube link",
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl<'a> Widget for LinkInput<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused { ACCENT } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Link ")
            .title_bottom(Line::from(" Enter: add link ").right_aligned())
            .style(Style::default().bg(PANEL));

        let text = if self.value.is_empty() {
            Span::styled(self.placeholder, Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(self.value, Style::default().fg(MUTED))
        };

        Paragraph::new(Line::from(text)).block(block).render(area, buf);
    }
}

/// Thin progress bar: accent up to `fraction`, light track after it
pub struct SeekBar {
    fraction: f64,
}

impl SeekBar {
    pub fn new(fraction: f64) -> Self {
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        Self { fraction }
    }

    /// Number of cells filled across `width`
    pub fn filled_cells(&self, width: u16) -> u16 {
        (f64::from(width) * self.fraction).round() as u16
    }
}

impl Widget for SeekBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let filled = self.filled_cells(area.width);

        for x in area.left()..area.right() {
            let color = if x - area.left() < filled { ACCENT } else { SEEK_TRACK };
            for y in area.top()..area.bottom() {
                buf[(x, y)].set_symbol(" ").set_bg(color);
            }
        }
    }
}

/// The play/pause toggle. Shows the action a press will request.
pub struct PlayToggle {
    is_playing: bool,
    focused: bool,
    ready: bool,
}

impl PlayToggle {
    pub fn new(is_playing: bool) -> Self {
        Self {
            is_playing,
            focused: false,
            ready: true,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }
}

impl Widget for PlayToggle {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (symbol, label, color) = if self.is_playing {
            ("⏸", "Pause", PAUSE_ICON)
        } else {
            ("▶", "Play", ACCENT)
        };
        let color = if self.ready { color } else { Color::DarkGray };

        let border = if self.focused { color } else { Color::DarkGray };
        let style = if self.focused {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };

        let button = Paragraph::new(Text::from(format!("{}  {}", symbol, label)))
            .style(style)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .style(Style::default().bg(PANEL)),
            );

        button.render(area, buf);
    }
}

/// Short-lived status line. Dims to `MUTED` for the last part of its life
/// and disappears once `ttl` has passed; errors keep their red to the end.
pub struct StatusToast<'a> {
    message: &'a str,
    color: Color,
    age: Duration,
    ttl: Duration,
}

impl<'a> StatusToast<'a> {
    pub fn new(message: &'a str, color: Color) -> Self {
        Self {
            message,
            color,
            age: Duration::ZERO,
            ttl: Duration::from_secs(3),
        }
    }

    pub fn aged(mut self, age: Duration, ttl: Duration) -> Self {
        self.age = age;
        self.ttl = ttl;
        self
    }

    /// Color for the current age, `None` once expired
    pub fn tint(&self) -> Option<Color> {
        if self.age >= self.ttl {
            return None;
        }
        let remaining = 1.0 - self.age.as_secs_f32() / self.ttl.as_secs_f32();
        if self.color == Color::Red || remaining > 0.3 {
            Some(self.color)
        } else {
            Some(MUTED)
        }
    }
}

impl<'a> Widget for StatusToast<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(tint) = self.tint() else {
            return;
        };

        let toast = Paragraph::new(Line::from(self.message))
            .style(Style::default().fg(tint))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(tint))
                    .style(Style::default().bg(PANEL)),
            );

        Clear.render(area, buf);
        toast.render(area, buf);
    }
}

/// Blocking notice with a single acknowledge action
pub struct NoticeDialog<'a> {
    message: &'a str,
}

impl<'a> NoticeDialog<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }

    /// Height needed to show the message wrapped at `width`, borders included
    pub fn height_for(&self, width: u16) -> u16 {
        let inner = width.saturating_sub(4).max(1) as usize;
        let lines = self.message.width().div_ceil(inner).max(1);
        lines as u16 + 4
    }
}

impl<'a> Widget for NoticeDialog<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = Text::from(vec![
            Line::from(self.message),
            Line::from(""),
            Line::from(Span::styled("[ OK ]  Enter", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))),
        ]);

        let notice = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Notice ")
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(Color::Yellow))
                    .style(Style::default().bg(PANEL)),
            );

        Clear.render(area, buf);
        notice.render(area, buf);
    }
}

/// Simple help overlay widget
pub struct HelpOverlay;

impl Widget for HelpOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(k, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(what),
            ])
        };
        let heading = |title: &'static str| {
            Line::from(vec![Span::styled(
                title,
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )])
        };

        let help_text = vec![
            heading("Link field"),
            key("Enter", " - Open the pasted link"),
            key("Ctrl+U", " - Clear the field"),
            key("Tab", " - Switch to the controls"),
            Line::from(""),
            heading("Controls"),
            key("Space/Enter", " - Play/Pause"),
            key("p / s", " - Play / Pause"),
            key("r", " - Reload the player"),
            key("l", " - Back to the link field"),
            key(":", " - Command mode (open, play, pause, toggle, reload, url, quit)"),
            key("q", " - Quit"),
            Line::from(""),
            key("F1", " - Toggle help"),
            key("Ctrl+Q", " - Quit from anywhere"),
        ];

        let help = Paragraph::new(Text::from(help_text))
            .block(Block::default().title("Help").borders(Borders::ALL))
            .style(Style::default().fg(Color::White).bg(Color::Black))
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });

        Clear.render(area, buf);
        help.render(area, buf);
    }
}

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const SPINNER_STEP: Duration = Duration::from_millis(100);

/// Spinner glyph for something that has been waiting `elapsed`
pub fn spinner_frame(elapsed: Duration) -> &'static str {
    let step = elapsed.as_millis() / SPINNER_STEP.as_millis();
    SPINNER[(step % SPINNER.len() as u128) as usize]
}
