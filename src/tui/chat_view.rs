//! Chat panel view: header, message history and compose row.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::input::{self, TextInput};
use crate::models::{Message, Sender};
use crate::panel::{ChatPanel, ConnectionState};

/// A panel on screen together with its compose box.
pub struct PanelView {
    pub panel: ChatPanel,
    pub compose: TextInput,
    /// Rendered lines scrolled back from the newest (0 = follow).
    scroll_back: usize,
}

/// What a key press asked of the view's owner.
#[derive(Debug, PartialEq, Eq)]
pub enum ViewAction {
    None,
    Close,
}

impl PanelView {
    pub fn new(panel: ChatPanel) -> Self {
        Self {
            panel,
            compose: TextInput::default(),
            scroll_back: 0,
        }
    }

    /// Apply queued socket events. A new message snaps back to the bottom.
    pub fn pump(&mut self) {
        let before = self.panel.messages().len();
        self.panel.pump();
        if self.panel.messages().len() != before {
            self.scroll_back = 0;
        }
    }

    /// Send the compose text. The draft is kept when sending is refused.
    pub fn submit(&mut self) -> bool {
        if self.panel.send(self.compose.text()) {
            self.compose.clear();
            self.scroll_back = 0;
            true
        } else {
            false
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
        match key.code {
            KeyCode::Esc => return ViewAction::Close,
            KeyCode::Enter => {
                self.submit();
            }
            KeyCode::PageUp => self.scroll_back += 5,
            KeyCode::PageDown => self.scroll_back = self.scroll_back.saturating_sub(5),
            _ => {
                self.compose.handle_key(key);
            }
        }
        ViewAction::None
    }
}

fn state_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Connecting => Color::Yellow,
        ConnectionState::Open => Color::Green,
        ConnectionState::Closed => Color::Red,
    }
}

pub fn render(frame: &mut Frame, area: Rect, view: &PanelView, focused: bool) {
    let panel = &view.panel;
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let border_type = if focused {
        BorderType::Double
    } else {
        BorderType::Plain
    };

    let mut title = vec![Span::raw(" ")];
    let initials = panel.initials();
    if !initials.is_empty() {
        title.push(Span::styled(
            format!("[{}] ", initials),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ));
    }
    title.push(Span::styled(
        panel.title(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    title.push(Span::styled(
        format!(" ({}) ", panel.state().as_str()),
        Style::default().fg(state_color(panel.state())),
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .title(Line::from(title))
        .title_bottom(Line::from(Span::styled(
            " Esc close ",
            Style::default().fg(Color::DarkGray),
        )));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 3 || inner.width < 4 {
        return;
    }

    // History above, a separator row, compose row at the bottom.
    let history = Rect::new(inner.x, inner.y, inner.width, inner.height - 2);
    let separator = Rect::new(inner.x, inner.y + inner.height - 2, inner.width, 1);
    let compose = Rect::new(inner.x + 1, inner.y + inner.height - 1, inner.width - 1, 1);

    let lines = message_lines(panel.messages(), history.width as usize);
    let visible = history.height as usize;
    let end = lines.len().saturating_sub(view.scroll_back.min(lines.len().saturating_sub(visible)));
    let start = end.saturating_sub(visible);
    // Pad from the top so short conversations sit at the bottom.
    let mut shown: Vec<Line> = vec![Line::from(""); visible.saturating_sub(end - start)];
    shown.extend(lines[start..end].iter().cloned());
    frame.render_widget(Paragraph::new(shown), history);

    frame.render_widget(
        Paragraph::new(Span::styled(
            "\u{2500}".repeat(separator.width as usize),
            Style::default().fg(Color::DarkGray),
        )),
        separator,
    );

    let placeholder = match panel.state() {
        ConnectionState::Connecting => "connecting...",
        ConnectionState::Open => "Type a message...",
        ConnectionState::Closed => "disconnected",
    };
    input::render(
        frame,
        compose,
        &view.compose,
        placeholder,
        focused && panel.can_send(),
    );
}

/// Own messages align right, the other side's left; each is followed by
/// its time.
fn message_lines(messages: &[Message], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let bubble_width = (width * 3 / 4).max(8);

    for msg in messages {
        let (alignment, style) = match msg.sender {
            Sender::Own => (Alignment::Right, Style::default().fg(Color::Cyan)),
            Sender::Other => (Alignment::Left, Style::default().fg(Color::White)),
        };
        for row in wrap_text(&msg.content, bubble_width) {
            lines.push(Line::from(Span::styled(row, style)).alignment(alignment));
        }
        lines.push(
            Line::from(Span::styled(
                msg.display_time(),
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(alignment),
        );
    }
    lines
}

/// Word-wrap by display width. Words wider than `max_width` are split.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let mut current = String::new();
        for word in line.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.width() + 1 + word.width() <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                rows.push(std::mem::take(&mut current));
                current = word.to_string();
            }
            if current.width() > max_width {
                let mut pieces = split_wide(&current, max_width);
                current = pieces.pop().unwrap_or_default();
                rows.extend(pieces);
            }
        }
        rows.push(current);
    }
    if rows.is_empty() {
        rows.push(String::new());
    }
    rows
}

/// Chunks of at most `max_width` columns; every chunk holds at least one char.
fn split_wide(word: &str, max_width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut used = 0;
    for c in word.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
            used = 0;
        }
        piece.push(c);
        used += w;
    }
    pieces.push(piece);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_user;
    use crate::panel::PanelEvent;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap_text("", 10), vec![""]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("hi abcdefg", 4), vec!["hi", "abcd", "efg"]);
        assert_eq!(wrap_text("日本語", 4), vec!["日本", "語"]);
    }

    #[test]
    fn test_enter_sends_and_clears_when_open() {
        let (panel, events, _cmds) =
            ChatPanel::detached(3, 1, Some(sample_user(2, "Ada", "Byron", "ab")));
        let mut view = PanelView::new(panel);
        events.send(PanelEvent::Opened).unwrap();
        view.pump();

        for c in "hey".chars() {
            view.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(view.handle_key(key(KeyCode::Enter)), ViewAction::None);
        assert_eq!(view.compose.text(), "");
        assert_eq!(view.panel.messages().len(), 1);
    }

    #[test]
    fn test_draft_kept_while_connecting() {
        let (panel, _events, _cmds) = ChatPanel::detached(3, 1, None);
        let mut view = PanelView::new(panel);
        view.compose.set("queued?");
        assert!(!view.submit());
        assert_eq!(view.compose.text(), "queued?");
        assert!(view.panel.messages().is_empty());
    }

    #[test]
    fn test_esc_requests_close() {
        let (panel, _events, _cmds) = ChatPanel::detached(3, 1, None);
        let mut view = PanelView::new(panel);
        assert_eq!(view.handle_key(key(KeyCode::Esc)), ViewAction::Close);
    }
}
