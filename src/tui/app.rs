//! TUI application state and the async event loop.
//!
//! The app shows one route at a time. Every navigation goes through the
//! session gate, so the dashboard is only reachable with a session cookie.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::DefaultTerminal;

use super::backend::{Backend, BackendCommand, BackendResponse};
use super::chat_list::ChatListState;
use super::chat_view::{PanelView, ViewAction};
use super::forms::{FormAction, LoginForm, RegisterForm};
use super::log_pane::{LogBuffer, LogPane};
use super::navbar::NavBarState;
use super::ui;
use crate::api::client::ChatClient;
use crate::api::UNKNOWN_USER_ID;
use crate::auth::gate::{self, GateDecision, DASHBOARD_ROUTE, LOGIN_ROUTE, REGISTER_ROUTE};
use crate::config::Config;
use crate::panel::ChatPanel;

/// Redraw interval (~30 fps); panels are pumped on the same tick.
const FRAME_DURATION_MS: u64 = 33;

/// Focusable regions of the dashboard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    SearchResult,
    #[default]
    ChatList,
    ListPanel,
    NavPanel,
}

impl Focus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Focus::Search => "search",
            Focus::SearchResult => "result",
            Focus::ChatList => "chats",
            Focus::ListPanel => "chat",
            Focus::NavPanel => "search chat",
        }
    }
}

#[derive(Default)]
pub struct Dashboard {
    pub navbar: NavBarState,
    pub chat_list: ChatListState,
    pub focus: Focus,
}

impl Dashboard {
    /// Regions that can take focus right now, in Tab order.
    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::Search];
        if self.navbar.result.is_some() {
            order.push(Focus::SearchResult);
        }
        order.push(Focus::ChatList);
        if self.chat_list.view.is_some() {
            order.push(Focus::ListPanel);
        }
        if self.navbar.view.is_some() {
            order.push(Focus::NavPanel);
        }
        order
    }

    fn cycle_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (pos + 1) % order.len()
        } else {
            (pos + order.len() - 1) % order.len()
        };
        self.focus = order[next];
    }

    /// Move focus off a region that went away.
    fn settle_focus(&mut self) {
        if !self.focus_order().contains(&self.focus) {
            self.focus = Focus::ChatList;
        }
    }

    fn pump(&mut self) {
        if let Some(view) = self.chat_list.view.as_mut() {
            view.pump();
        }
        if let Some(view) = self.navbar.view.as_mut() {
            view.pump();
        }
    }

    fn handle_key(&mut self, client: &ChatClient, key: KeyEvent) -> Vec<BackendCommand> {
        let mut commands = Vec::new();
        match self.focus {
            Focus::Search => match key.code {
                KeyCode::Enter => commands.extend(self.navbar.submit_search()),
                KeyCode::Down if self.navbar.result.is_some() => self.focus = Focus::SearchResult,
                _ => {
                    self.navbar.query.handle_key(key);
                }
            },
            Focus::SearchResult => match key.code {
                KeyCode::Enter => commands.extend(self.navbar.select_result()),
                KeyCode::Up | KeyCode::Esc => self.focus = Focus::Search,
                _ => {}
            },
            Focus::ChatList => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.chat_list.move_up(),
                KeyCode::Down | KeyCode::Char('j') => self.chat_list.move_down(),
                KeyCode::Enter => {
                    let opened = self.chat_list.select_chat(|summary, viewer_id| {
                        PanelView::new(ChatPanel::open(
                            client,
                            summary.chat_id,
                            viewer_id,
                            Some(summary.other_user.clone()),
                        ))
                    });
                    if opened {
                        self.focus = Focus::ListPanel;
                    }
                }
                _ => {}
            },
            Focus::ListPanel => {
                if let Some(view) = self.chat_list.view.as_mut() {
                    if view.handle_key(key) == ViewAction::Close {
                        self.chat_list.close_view();
                        self.focus = Focus::ChatList;
                    }
                }
            }
            Focus::NavPanel => {
                if let Some(view) = self.navbar.view.as_mut() {
                    if view.handle_key(key) == ViewAction::Close {
                        self.navbar.close_view();
                        self.focus = Focus::Search;
                    }
                }
            }
        }
        commands
    }
}

/// The route being shown.
pub enum Screen {
    Login(LoginForm),
    Register(RegisterForm),
    Dashboard(Dashboard),
}

pub struct App {
    client: Arc<ChatClient>,
    pub screen: Screen,
    pub route: &'static str,
    pub show_help: bool,
    pub log_pane: LogPane,
    pub should_exit: bool,
}

impl App {
    pub fn new(client: Arc<ChatClient>, logs: LogBuffer) -> Self {
        Self {
            client,
            screen: Screen::Login(LoginForm::default()),
            route: LOGIN_ROUTE,
            show_help: false,
            log_pane: LogPane::new(logs),
            should_exit: false,
        }
    }

    /// Enter `path` through the session gate. Returns the commands the new
    /// screen needs on mount.
    pub fn navigate(&mut self, path: &str) -> Vec<BackendCommand> {
        let target = match gate::check(path, &self.client.cookies()) {
            GateDecision::Allow => path,
            GateDecision::Redirect(to) => to,
        };
        tracing::debug!("Route {} -> {}", self.route, target);

        if target.starts_with(LOGIN_ROUTE) {
            self.route = LOGIN_ROUTE;
            self.screen = Screen::Login(LoginForm::default());
            Vec::new()
        } else if target.starts_with(REGISTER_ROUTE) {
            self.route = REGISTER_ROUTE;
            self.screen = Screen::Register(RegisterForm::default());
            Vec::new()
        } else {
            tracing::info!("Opening dashboard");
            self.route = DASHBOARD_ROUTE;
            self.screen = Screen::Dashboard(Dashboard::default());
            vec![BackendCommand::LoadChats, BackendCommand::LoadCurrentUserId]
        }
    }

    /// Per-frame housekeeping.
    pub fn tick(&mut self) {
        self.log_pane.refresh();
        if let Screen::Dashboard(dash) = &mut self.screen {
            dash.pump();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<BackendCommand> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.should_exit = true;
                return Vec::new();
            }
            KeyCode::Char('d') if ctrl => {
                self.log_pane.toggle();
                return Vec::new();
            }
            KeyCode::Up if alt && self.log_pane.visible => {
                self.log_pane.scroll_back(1);
                return Vec::new();
            }
            KeyCode::Down if alt && self.log_pane.visible => {
                self.log_pane.scroll_forward(1);
                return Vec::new();
            }
            _ => {}
        }
        if self.show_help {
            self.show_help = false;
            return Vec::new();
        }

        let action = match &mut self.screen {
            Screen::Login(form) => form.handle_key(key),
            Screen::Register(form) => form.handle_key(key),
            Screen::Dashboard(dash) => {
                return match key.code {
                    KeyCode::F(1) => {
                        self.show_help = true;
                        Vec::new()
                    }
                    KeyCode::Char('l') if ctrl => vec![BackendCommand::Logout],
                    KeyCode::Char('r') if ctrl => vec![BackendCommand::LoadChats],
                    KeyCode::Tab => {
                        dash.cycle_focus(true);
                        Vec::new()
                    }
                    KeyCode::BackTab => {
                        dash.cycle_focus(false);
                        Vec::new()
                    }
                    _ => dash.handle_key(&self.client, key),
                };
            }
        };

        match action {
            FormAction::None => Vec::new(),
            FormAction::Submit(cmd) => vec![cmd],
            FormAction::Navigate(path) => self.navigate(path),
            FormAction::Quit => {
                self.should_exit = true;
                Vec::new()
            }
        }
    }

    pub fn handle_response(&mut self, resp: BackendResponse) -> Vec<BackendCommand> {
        match resp {
            BackendResponse::LoggedIn(result) => {
                if let Screen::Login(form) = &mut self.screen {
                    if let Some(next) = form.apply_result(result) {
                        return self.navigate(next);
                    }
                }
            }
            BackendResponse::Registered(result) => {
                if let Screen::Register(form) = &mut self.screen {
                    if let Some(next) = form.apply_result(result) {
                        return self.navigate(next);
                    }
                }
            }
            BackendResponse::LoggedOut => {
                tracing::info!("Logged out");
                return self.navigate(LOGIN_ROUTE);
            }
            // Everything below belongs to the dashboard; drop it if the
            // user has already left.
            BackendResponse::Chats(result) => {
                if let Screen::Dashboard(dash) = &mut self.screen {
                    dash.chat_list.apply_chats(result);
                }
            }
            BackendResponse::CurrentUserId(id) => {
                if let Screen::Dashboard(dash) = &mut self.screen {
                    dash.navbar.current_user_id = id;
                    dash.chat_list.current_user_id = id;
                    reopen_unknown_viewer(&mut dash.chat_list.view, &self.client, id);
                    reopen_unknown_viewer(&mut dash.navbar.view, &self.client, id);
                }
            }
            BackendResponse::SearchResult { username, result } => {
                if let Screen::Dashboard(dash) = &mut self.screen {
                    dash.navbar.apply_search(&username, result);
                    dash.settle_focus();
                }
            }
            BackendResponse::ChatCreated { recipient, result } => {
                if let Screen::Dashboard(dash) = &mut self.screen {
                    if let Some((chat_id, other)) = dash.navbar.apply_chat_created(recipient, result) {
                        let panel = ChatPanel::open(
                            &self.client,
                            chat_id,
                            dash.navbar.current_user_id,
                            Some(other),
                        );
                        dash.navbar.open_view(PanelView::new(panel));
                        dash.focus = Focus::NavPanel;
                    }
                }
            }
        }
        Vec::new()
    }
}

/// Reconnect a panel opened before the viewer id was known, so its messages
/// are attributed to the right side. The compose draft carries over.
fn reopen_unknown_viewer(slot: &mut Option<PanelView>, client: &ChatClient, viewer_id: i64) {
    if viewer_id == UNKNOWN_USER_ID {
        return;
    }
    let stale = slot
        .as_ref()
        .is_some_and(|view| view.panel.viewer_id == UNKNOWN_USER_ID);
    if !stale {
        return;
    }
    let Some(mut old) = slot.take() else { return };
    old.panel.close();
    tracing::debug!("Reopening chat {} as user {}", old.panel.chat_id, viewer_id);

    let panel = ChatPanel::open(
        client,
        old.panel.chat_id,
        viewer_id,
        old.panel.other_user.clone(),
    );
    let mut view = PanelView::new(panel);
    view.compose = old.compose;
    *slot = Some(view);
}

/// Run the TUI until the user quits. The terminal is restored on return.
pub async fn run(config: Config, logs: LogBuffer) -> Result<()> {
    let client = Arc::new(ChatClient::new(&config));
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, client, logs).await;
    ratatui::restore();
    result
}

async fn run_app(terminal: &mut DefaultTerminal, client: Arc<ChatClient>, logs: LogBuffer) -> Result<()> {
    let mut backend = Backend::start(Arc::clone(&client));
    let mut app = App::new(client, logs);
    for cmd in app.navigate(DASHBOARD_ROUTE) {
        backend.send(cmd);
    }

    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(FRAME_DURATION_MS));

    while !app.should_exit {
        app.tick();
        terminal.draw(|frame| ui::render(frame, &app))?;

        let commands = tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => app.handle_key(key),
                Some(Ok(_)) => Vec::new(),
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(resp) = backend.recv() => app.handle_response(resp),
            _ = tick.tick() => Vec::new(),
        };
        for cmd in commands {
            backend.send(cmd);
        }
    }

    Ok(())
}
