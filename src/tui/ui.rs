//! Top-level layout for each screen.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::app::{App, Dashboard, Focus, Screen};
use super::chat_list;
use super::chat_view::{self, PanelView};
use super::forms;
use super::help;
use super::log_pane;
use super::navbar;

/// Height of the log pane when shown.
const LOG_PANE_HEIGHT: u16 = 10;
/// Width of the chat list column.
const CHAT_LIST_WIDTH: u16 = 34;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let (main, log_area) = if app.log_pane.visible {
        let [main, log] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(LOG_PANE_HEIGHT)]).areas(area);
        (main, Some(log))
    } else {
        (area, None)
    };

    match &app.screen {
        Screen::Login(form) => forms::render_login(frame, main, form),
        Screen::Register(form) => forms::render_register(frame, main, form),
        Screen::Dashboard(dash) => render_dashboard(frame, main, dash),
    }

    if let Some(log_area) = log_area {
        log_pane::render(log_area, frame.buffer_mut(), &app.log_pane);
    }
    if app.show_help {
        help::render_help_popup(frame);
    }
}

fn render_dashboard(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let card_height = if dash.navbar.result.is_some() { 5 } else { 0 };
    let [bar, card, body, status] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(card_height),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);

    navbar::render_bar(frame, bar, &dash.navbar, dash.focus == Focus::Search);
    if let Some(user) = &dash.navbar.result {
        navbar::render_result(frame, card, user, dash.focus == Focus::SearchResult);
    }

    let [list, panels] =
        Layout::horizontal([Constraint::Length(CHAT_LIST_WIDTH), Constraint::Min(20)]).areas(body);
    chat_list::render(frame, list, &dash.chat_list, dash.focus == Focus::ChatList);

    let open: Vec<(&PanelView, bool)> = [
        dash.chat_list
            .view
            .as_ref()
            .map(|v| (v, dash.focus == Focus::ListPanel)),
        dash.navbar
            .view
            .as_ref()
            .map(|v| (v, dash.focus == Focus::NavPanel)),
    ]
    .into_iter()
    .flatten()
    .collect();

    if open.is_empty() {
        render_welcome(frame, panels);
    } else {
        let slots = Layout::vertical(vec![Constraint::Ratio(1, open.len() as u32); open.len()])
            .split(panels);
        for (slot, (view, focused)) in slots.iter().zip(open) {
            chat_view::render(frame, *slot, view, focused);
        }
    }

    render_status(frame, status, dash);
}

fn render_welcome(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Welcome to your dashboard!",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Pick a chat on the left, or search for a user to start one.",
            Style::default().fg(Color::Gray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let mut spans = vec![Span::styled(
        format!(" {} ", dash.focus.as_str()),
        Style::default().fg(Color::Black).bg(Color::Cyan),
    )];
    for (label, view) in [("chat", &dash.chat_list.view), ("search chat", &dash.navbar.view)] {
        if let Some(view) = view {
            spans.push(Span::styled(
                format!("  {}: {}", label, view.panel.state().as_str()),
                Style::default().fg(Color::Gray),
            ));
        }
    }
    spans.push(Span::styled(
        "  F1 help | Ctrl+D log | Ctrl+C quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
