//! Chat list: the user's conversations, newest first as the backend sends
//! them. Selecting one replaces the list's panel.

use anyhow::Result;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::chat_view::PanelView;
use crate::api::UNKNOWN_USER_ID;
use crate::models::ChatSummary;

pub struct ChatListState {
    pub chats: Vec<ChatSummary>,
    pub selected: usize,
    /// True until the first load answers.
    pub loading: bool,
    pub current_user_id: i64,
    pub view: Option<PanelView>,
}

impl Default for ChatListState {
    fn default() -> Self {
        Self {
            chats: Vec::new(),
            selected: 0,
            loading: true,
            current_user_id: UNKNOWN_USER_ID,
            view: None,
        }
    }
}

impl ChatListState {
    /// Replace the list with a fresh load. A failed load keeps what is shown.
    pub fn apply_chats(&mut self, result: Result<Vec<ChatSummary>>) {
        self.loading = false;
        match result {
            Ok(chats) => {
                tracing::debug!("Loaded {} chats", chats.len());
                self.chats = chats;
                self.selected = self.selected.min(self.chats.len().saturating_sub(1));
            }
            Err(e) => tracing::error!("Failed to load chats: {:#}", e),
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.chats.len() {
            self.selected += 1;
        }
    }

    /// Close the current panel, then open one for the selected chat.
    pub fn select_chat(&mut self, open: impl FnOnce(&ChatSummary, i64) -> PanelView) -> bool {
        let Some(summary) = self.chats.get(self.selected) else {
            return false;
        };
        if let Some(mut old) = self.view.take() {
            old.panel.close();
        }
        self.view = Some(open(summary, self.current_user_id));
        true
    }

    pub fn close_view(&mut self) {
        if let Some(mut view) = self.view.take() {
            view.panel.close();
        }
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &ChatListState, focused: bool) {
    let (border_style, border_type) = if focused {
        (Style::default().fg(Color::Yellow), BorderType::Double)
    } else {
        (Style::default().fg(Color::DarkGray), BorderType::Plain)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .title(Span::styled(
            " Chats ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if state.loading {
        frame.render_widget(
            Paragraph::new(Span::styled(" Loading...", Style::default().fg(Color::DarkGray))),
            inner,
        );
        return;
    }
    if state.chats.is_empty() {
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(" No chats yet.", Style::default().fg(Color::DarkGray))),
                Line::from(Span::styled(
                    " Search for a user above.",
                    Style::default().fg(Color::DarkGray),
                )),
            ]),
            inner,
        );
        return;
    }

    // Each chat takes two rows: name + time, then the preview.
    let per_page = (inner.height as usize / 2).max(1);
    let first = scroll_offset(state.selected, per_page, state.chats.len());
    let width = inner.width as usize;
    let mut lines = Vec::new();
    for (idx, chat) in state.chats.iter().enumerate().skip(first).take(per_page) {
        let selected = idx == state.selected;
        lines.extend(chat_rows(chat, width, selected, focused));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn chat_rows(chat: &ChatSummary, width: usize, selected: bool, focused: bool) -> [Line<'static>; 2] {
    let base = match (selected, focused) {
        (true, true) => Style::default().bg(Color::Blue).fg(Color::White),
        (true, false) => Style::default().bg(Color::DarkGray).fg(Color::White),
        _ => Style::default(),
    };
    let initials = format!(" {:<2} ", chat.other_user.initials());
    let time = chat.display_time();
    let name_width = width.saturating_sub(initials.width() + time.width() + 1);
    let name = truncate(&chat.other_user.username, name_width);
    let pad = width.saturating_sub(initials.width() + name.width() + time.width());

    let head = Line::from(vec![
        Span::styled(initials, base.fg(Color::Cyan)),
        Span::styled(name, base.add_modifier(Modifier::BOLD)),
        Span::styled(" ".repeat(pad), base),
        Span::styled(time, base.fg(Color::Gray)),
    ]);
    let preview = format!("    {}", chat.preview().trim());
    let tail = Line::from(Span::styled(
        truncate(&preview, width),
        base.fg(Color::Gray),
    ));
    [head, tail]
}

/// Cut `text` to at most `max` columns, marking the cut with `~`.
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + c.width().unwrap_or(0) + 1 > max {
            break;
        }
        out.push(c);
    }
    out.push('~');
    out
}

/// First chat index to draw so `selected` stays on screen.
fn scroll_offset(selected: usize, per_page: usize, total: usize) -> usize {
    if total <= per_page {
        0
    } else if selected >= per_page {
        (selected + 1 - per_page).min(total - per_page)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_user;
    use crate::panel::{ChatPanel, ConnectionState, PanelCommand, PanelEvent};

    fn summary(chat_id: i64, username: &str) -> ChatSummary {
        ChatSummary {
            chat_id,
            last_message: Some("yo".into()),
            last_message_at: Some(1_700_000_000),
            other_user: sample_user(chat_id + 100, "Ada", "Byron", username),
        }
    }

    #[test]
    fn test_loading_until_first_answer() {
        let mut list = ChatListState::default();
        assert!(list.loading);
        list.apply_chats(Err(anyhow::anyhow!("offline")));
        assert!(!list.loading);
        assert!(list.chats.is_empty());
    }

    #[test]
    fn test_failed_reload_keeps_list() {
        let mut list = ChatListState::default();
        list.apply_chats(Ok(vec![summary(1, "ab"), summary(2, "cd")]));
        list.apply_chats(Err(anyhow::anyhow!("offline")));
        assert_eq!(list.chats.len(), 2);
    }

    #[test]
    fn test_navigation_clamps() {
        let mut list = ChatListState::default();
        list.apply_chats(Ok(vec![summary(1, "ab"), summary(2, "cd")]));
        list.move_up();
        assert_eq!(list.selected, 0);
        list.move_down();
        list.move_down();
        assert_eq!(list.selected, 1);
        list.apply_chats(Ok(vec![summary(1, "ab")]));
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_selecting_replaces_and_closes_previous_panel() {
        let mut list = ChatListState::default();
        list.current_user_id = 5;
        list.apply_chats(Ok(vec![summary(1, "ab"), summary(2, "cd")]));

        let (first, _e1, mut c1) = ChatPanel::detached(1, 5, None);
        assert!(list.select_chat(|chat, viewer| {
            assert_eq!((chat.chat_id, viewer), (1, 5));
            PanelView::new(first)
        }));

        list.move_down();
        let (second, _e2, _c2) = ChatPanel::detached(2, 5, None);
        assert!(list.select_chat(|chat, _| {
            assert_eq!(chat.chat_id, 2);
            PanelView::new(second)
        }));

        assert_eq!(c1.try_recv().unwrap(), PanelCommand::Close);
        assert_eq!(list.view.as_ref().map(|v| v.panel.chat_id), Some(2));
    }

    #[test]
    fn test_reselecting_same_chat_opens_fresh_panel() {
        let mut list = ChatListState::default();
        list.current_user_id = 5;
        list.apply_chats(Ok(vec![summary(1, "ab")]));

        let (first, e1, mut c1) = ChatPanel::detached(1, 5, None);
        assert!(list.select_chat(|_, _| PanelView::new(first)));
        e1.send(PanelEvent::Opened).unwrap();
        e1.send(PanelEvent::Frame(
            r#"{"sender_id":101,"message":"old","sent_at":1700000000}"#.into(),
        ))
        .unwrap();
        let view = list.view.as_mut().unwrap();
        view.pump();
        assert_eq!(view.panel.messages().len(), 1);

        list.close_view();
        assert!(list.view.is_none());
        assert_eq!(c1.try_recv().unwrap(), PanelCommand::Close);

        let (second, _e2, _c2) = ChatPanel::detached(1, 5, None);
        assert!(list.select_chat(|_, _| PanelView::new(second)));
        let _ = e1.send(PanelEvent::Frame(
            r#"{"sender_id":101,"message":"late","sent_at":1700000001}"#.into(),
        ));

        let view = list.view.as_mut().unwrap();
        view.pump();
        assert_eq!(view.panel.chat_id, 1);
        assert!(view.panel.messages().is_empty());
        assert_eq!(view.panel.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_select_on_empty_list_is_noop() {
        let mut list = ChatListState::default();
        assert!(!list.select_chat(|_, _| panic!("nothing to open")));
    }

    #[test]
    fn test_truncate_and_scroll() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefgh", 5), "abcd~");
        assert_eq!(truncate("日本語テキスト", 6), "日本~");
        assert!(truncate("日本語テキスト", 7).width() <= 7);
        assert_eq!(scroll_offset(0, 3, 10), 0);
        assert_eq!(scroll_offset(5, 3, 10), 3);
        assert_eq!(scroll_offset(9, 3, 10), 7);
    }
}
