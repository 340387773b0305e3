//! Navbar: branding, user search, the found-user card, and the account menu.
//!
//! Picking the found user creates (or fetches) the chat with them and opens
//! a panel for it, independent of the chat list's panel.

use anyhow::Result;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use super::backend::BackendCommand;
use super::chat_view::PanelView;
use super::input::{self, TextInput};
use crate::api::UNKNOWN_USER_ID;
use crate::models::User;

pub struct NavBarState {
    pub query: TextInput,
    /// The user found by the last search.
    pub result: Option<User>,
    /// Chat with `result`, once created.
    pub chat_id: Option<i64>,
    pub current_user_id: i64,
    pub view: Option<PanelView>,
}

impl Default for NavBarState {
    fn default() -> Self {
        Self {
            query: TextInput::default(),
            result: None,
            chat_id: None,
            current_user_id: UNKNOWN_USER_ID,
            view: None,
        }
    }
}

impl NavBarState {
    /// Command for the current query. A blank query just clears the result.
    pub fn submit_search(&mut self) -> Option<BackendCommand> {
        if self.query.is_blank() {
            self.clear_result();
            return None;
        }
        let username = self.query.text().trim().to_string();
        Some(BackendCommand::SearchUser { username })
    }

    /// Any failure (404 included) leaves no result.
    pub fn apply_search(&mut self, username: &str, result: Result<User>) {
        match result {
            Ok(user) => {
                tracing::debug!("Found user {}", user.username);
                self.result = Some(user);
            }
            Err(e) => {
                tracing::debug!("No user for '{}': {:#}", username, e);
                self.clear_result();
            }
        }
    }

    /// Command that opens the chat with the found user.
    pub fn select_result(&self) -> Option<BackendCommand> {
        self.result
            .clone()
            .map(|recipient| BackendCommand::CreateChat { recipient })
    }

    /// Record a created chat. Returns the chat to open a panel for, if any.
    pub fn apply_chat_created(&mut self, recipient: User, result: Result<i64>) -> Option<(i64, User)> {
        match result {
            Ok(chat_id) => {
                self.chat_id = Some(chat_id);
                Some((chat_id, recipient))
            }
            Err(e) => {
                tracing::error!("Could not open chat with {}: {:#}", recipient.username, e);
                None
            }
        }
    }

    pub fn open_view(&mut self, view: PanelView) {
        self.close_view();
        self.view = Some(view);
    }

    pub fn close_view(&mut self) {
        if let Some(mut view) = self.view.take() {
            view.panel.close();
        }
    }

    fn clear_result(&mut self) {
        self.result = None;
        self.chat_id = None;
        self.close_view();
    }
}

/// Top bar: branding, search box, account menu.
pub fn render_bar(frame: &mut Frame, area: Rect, state: &NavBarState, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(
            " CheeChat ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let account = if state.current_user_id == UNKNOWN_USER_ID {
        " user ? | Ctrl+L log out ".to_string()
    } else {
        format!(" user #{} | Ctrl+L log out ", state.current_user_id)
    };
    let [label, field, menu] = Layout::horizontal([
        Constraint::Length(9),
        Constraint::Min(10),
        Constraint::Length(account.len() as u16),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new(Span::styled(" Search: ", Style::default().fg(Color::Gray))),
        label,
    );
    input::render(frame, field, &state.query, "username", focused);
    frame.render_widget(
        Paragraph::new(Span::styled(account, Style::default().fg(Color::DarkGray))),
        menu,
    );
}

/// Card for the found user.
pub fn render_result(frame: &mut Frame, area: Rect, user: &User, focused: bool) {
    let (border_style, border_type) = if focused {
        (Style::default().fg(Color::Yellow), BorderType::Double)
    } else {
        (Style::default().fg(Color::DarkGray), BorderType::Plain)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .title_bottom(Line::from(Span::styled(
            " Enter open chat ",
            Style::default().fg(Color::DarkGray),
        )));

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", user.initials()),
                Style::default().fg(Color::Black).bg(Color::Cyan),
            ),
            Span::raw(" "),
            Span::styled(
                user.username.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!("    {}", user.email),
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            format!("    {}", user.full_name()),
            Style::default().fg(Color::Gray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::ApiError;
    use crate::models::sample_user;
    use crate::panel::ChatPanel;

    fn not_found() -> anyhow::Error {
        ApiError::Status {
            status: 404,
            url: "http://localhost:9000/get-user?username=ghost".into(),
            body: String::new(),
        }
        .into()
    }

    #[test]
    fn test_search_hit_then_404_clears() {
        let mut nav = NavBarState::default();
        nav.query.set("ab");
        assert!(matches!(
            nav.submit_search(),
            Some(BackendCommand::SearchUser { username }) if username == "ab"
        ));

        nav.apply_search("ab", Ok(sample_user(2, "Ada", "Byron", "ab")));
        assert_eq!(nav.result.as_ref().map(|u| u.id), Some(2));

        nav.apply_search("ghost", Err(not_found()));
        assert!(nav.result.is_none());
        assert!(nav.select_result().is_none());
    }

    #[test]
    fn test_blank_query_clears_without_request() {
        let mut nav = NavBarState::default();
        nav.result = Some(sample_user(2, "Ada", "Byron", "ab"));
        nav.query.set("   ");
        assert!(nav.submit_search().is_none());
        assert!(nav.result.is_none());
    }

    #[test]
    fn test_select_result_creates_chat() {
        let mut nav = NavBarState::default();
        nav.result = Some(sample_user(2, "Ada", "Byron", "ab"));
        match nav.select_result() {
            Some(BackendCommand::CreateChat { recipient }) => assert_eq!(recipient.username, "ab"),
            _ => panic!("expected CreateChat"),
        }

        let user = sample_user(2, "Ada", "Byron", "ab");
        let opened = nav.apply_chat_created(user, Ok(12));
        assert_eq!(nav.chat_id, Some(12));
        assert_eq!(opened.map(|(id, u)| (id, u.username)), Some((12, "ab".to_string())));
    }

    #[test]
    fn test_failed_create_opens_nothing() {
        let mut nav = NavBarState::default();
        let user = sample_user(2, "Ada", "Byron", "ab");
        assert!(nav.apply_chat_created(user, Err(anyhow::anyhow!("boom"))).is_none());
        assert!(nav.chat_id.is_none());
    }

    #[test]
    fn test_cleared_result_closes_panel() {
        let mut nav = NavBarState::default();
        let (panel, _events, mut cmds) = ChatPanel::detached(12, 1, None);
        nav.result = Some(sample_user(2, "Ada", "Byron", "ab"));
        nav.open_view(PanelView::new(panel));

        nav.apply_search("ghost", Err(not_found()));
        assert!(nav.view.is_none());
        assert!(nav.chat_id.is_none());
        assert!(cmds.try_recv().is_ok());
    }
}
