//! Help popup listing the dashboard's key bindings.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const POPUP_WIDTH: u16 = 56;

/// (section, [(key, description)])
const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "MOVING AROUND",
        &[
            ("Tab", "Next pane"),
            ("Shift+Tab", "Previous pane"),
            ("Up/Down", "Move in chat list"),
            ("PgUp/PgDn", "Scroll a chat panel"),
        ],
    ),
    (
        "CHATTING",
        &[
            ("Enter", "Search / open chat / send"),
            ("Esc", "Close the focused chat panel"),
            ("Ctrl+U", "Clear the input"),
        ],
    ),
    (
        "SESSION",
        &[
            ("Ctrl+R", "Reload the chat list"),
            ("Ctrl+L", "Log out"),
            ("Ctrl+D", "Toggle log pane"),
            ("Alt+Up/Down", "Scroll the log pane"),
            ("F1", "Toggle this help"),
            ("Ctrl+C", "Quit"),
        ],
    ),
];

pub fn render_help_popup(frame: &mut Frame) {
    let mut lines: Vec<Line> = Vec::new();
    for (idx, (title, keys)) in SECTIONS.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            *title,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
        for (key, desc) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<12}", key), Style::default().fg(Color::Yellow)),
                Span::styled(*desc, Style::default().fg(Color::Gray)),
            ]));
        }
    }

    let area = frame.area();
    let width = POPUP_WIDTH.min(area.width.saturating_sub(2));
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " HELP ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::from(Span::styled(
            " any key to close ",
            Style::default().fg(Color::Gray),
        )));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}
