//! Single-line text input shared by the search box, forms and compose boxes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Span,
    widgets::Paragraph,
    Frame,
};

/// Editable text with a character-based cursor.
#[derive(Debug, Default, Clone)]
pub struct TextInput {
    text: String,
    /// Cursor position (character offset into `text`).
    cursor: usize,
    /// Render as bullets (passwords).
    pub masked: bool,
}

impl TextInput {
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    #[cfg(test)]
    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.char_to_byte(self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_pos = self.char_to_byte(self.cursor);
            let prev_byte_pos = self.char_to_byte(self.cursor - 1);
            self.text.drain(prev_byte_pos..byte_pos);
            self.cursor -= 1;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = self.char_to_byte(self.cursor);
            let next_byte_pos = self.char_to_byte(self.cursor + 1);
            self.text.drain(byte_pos..next_byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.text.chars().count() {
            self.cursor += 1;
        }
    }

    /// Apply an editing key. Returns true if the key was consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.text.chars().count(),
            KeyCode::Char(c) if !ctrl => self.insert_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.chars().count(),
            _ => return false,
        }
        true
    }

    /// Visible slice for a field `width` columns wide, and the cursor column
    /// inside it. Scrolls horizontally to keep the cursor visible.
    pub fn visible(&self, width: usize) -> (String, usize) {
        if width == 0 {
            return (String::new(), 0);
        }
        let chars: Vec<char> = if self.masked {
            vec!['*'; self.text.chars().count()]
        } else {
            self.text.chars().collect()
        };
        let start = if self.cursor < width {
            0
        } else {
            self.cursor + 1 - width
        };
        let end = (start + width).min(chars.len());
        let visible: String = chars[start.min(end)..end].iter().collect();
        (visible, self.cursor - start)
    }

    fn char_to_byte(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

/// Draw `input` on one row. Shows `placeholder` while empty and places the
/// terminal cursor when focused.
pub fn render(frame: &mut Frame, area: Rect, input: &TextInput, placeholder: &str, focused: bool) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let width = area.width as usize;
    let (text, cursor) = input.visible(width.saturating_sub(1));
    let span = if text.is_empty() {
        Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(text, Style::default().fg(Color::White))
    };
    frame.render_widget(Paragraph::new(span), Rect::new(area.x, area.y, area.width, 1));
    if focused {
        frame.set_cursor_position((area.x + cursor as u16, area.y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_editing_multibyte() {
        let mut input = TextInput::default();
        for c in "héllo".chars() {
            input.insert_char(c);
        }
        input.move_left();
        input.backspace();
        assert_eq!(input.text(), "hélo");
        input.handle_key(key(KeyCode::Home));
        input.delete();
        assert_eq!(input.text(), "élo");
    }

    #[test]
    fn test_ctrl_u_clears() {
        let mut input = TextInput::default();
        input.set("draft");
        assert!(input.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL)));
        assert!(input.is_blank());
    }

    #[test]
    fn test_visible_scrolls_and_masks() {
        let mut input = TextInput::default();
        input.set("abcdefghij");
        let (text, cursor) = input.visible(4);
        assert_eq!(text, "hij");
        assert_eq!(cursor, 3);

        let mut secret = TextInput::masked();
        secret.set("pw");
        assert_eq!(secret.visible(10), ("**".to_string(), 2));
    }

    #[test]
    fn test_unhandled_keys_pass_through() {
        let mut input = TextInput::default();
        assert!(!input.handle_key(key(KeyCode::Enter)));
        assert!(!input.handle_key(key(KeyCode::Tab)));
    }
}
