use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Event utility functions
pub mod event_utils {
    use super::*;

    /// Check if a key event matches Ctrl+C or Ctrl+Q (terminate)
    pub fn is_terminate_event(event: &Event) -> bool {
        matches!(
            event,
            Event::Key(KeyEvent {
                code: KeyCode::Char('c') | KeyCode::Char('q'),
                modifiers: KeyModifiers::CONTROL,
                ..
            })
        )
    }

    /// Key presses worth handling. Release and repeat events reported by
    /// some terminals are ignored so each press acts once.
    pub fn is_key_press(key: &KeyEvent) -> bool {
        key.kind == KeyEventKind::Press
    }

    /// Text pasted into the terminal as one bracketed block
    pub fn pasted_text(event: &Event) -> Option<&str> {
        match event {
            Event::Paste(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::event_utils::*;
    use super::*;

    #[test]
    fn test_terminate_keys() {
        let ctrl_q = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        let plain_q = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));

        assert!(is_terminate_event(&ctrl_q));
        assert!(!is_terminate_event(&plain_q));
    }

    #[test]
    fn test_paste_event() {
        let paste = Event::Paste("https://x/watch?v=abc".to_string());
        assert_eq!(pasted_text(&paste), Some("https://x/watch?v=abc"));
        assert_eq!(pasted_text(&Event::FocusGained), None);
    }
}
