//! Login and registration screens.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::backend::BackendCommand;
use super::input::{self, TextInput};
use crate::api::{login_error_message, registration_error_message};
use crate::auth::gate::{DASHBOARD_ROUTE, LOGIN_ROUTE, REGISTER_ROUTE};
use crate::models::{Credentials, Registration};

/// Outcome of a key press on a form.
pub enum FormAction {
    None,
    Submit(BackendCommand),
    Navigate(&'static str),
    Quit,
}

/// A labelled set of inputs with one focused at a time.
struct Fields {
    labels: &'static [&'static str],
    inputs: Vec<TextInput>,
    focus: usize,
}

impl Fields {
    fn new(labels: &'static [&'static str], masked: &[usize]) -> Self {
        let inputs = (0..labels.len())
            .map(|i| {
                if masked.contains(&i) {
                    TextInput::masked()
                } else {
                    TextInput::default()
                }
            })
            .collect();
        Self {
            labels,
            inputs,
            focus: 0,
        }
    }

    fn value(&self, idx: usize) -> String {
        self.inputs[idx].text().to_string()
    }

    fn next(&mut self) {
        self.focus = (self.focus + 1) % self.inputs.len();
    }

    fn prev(&mut self) {
        self.focus = (self.focus + self.inputs.len() - 1) % self.inputs.len();
    }

    fn on_last(&self) -> bool {
        self.focus + 1 == self.inputs.len()
    }

    /// Shared field navigation. Returns true if Enter should submit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.next(),
            KeyCode::BackTab | KeyCode::Up => self.prev(),
            KeyCode::Enter if self.on_last() => return true,
            KeyCode::Enter => self.next(),
            _ => {
                self.inputs[self.focus].handle_key(key);
            }
        }
        false
    }
}

pub struct LoginForm {
    fields: Fields,
    pub error: Option<String>,
    pub pending: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            fields: Fields::new(&["Username", "Password"], &[1]),
            error: None,
            pending: false,
        }
    }
}

impl LoginForm {
    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return FormAction::Quit,
            KeyCode::Char('n') if ctrl => return FormAction::Navigate(REGISTER_ROUTE),
            _ => {}
        }
        if self.pending {
            return FormAction::None;
        }
        if self.fields.handle_key(key) {
            return self.submit();
        }
        FormAction::None
    }

    fn submit(&mut self) -> FormAction {
        let credentials = Credentials {
            username: self.fields.value(0).trim().to_string(),
            password: self.fields.value(1),
        };
        if credentials.username.is_empty() || credentials.password.is_empty() {
            self.error = Some("Username and password are required".to_string());
            return FormAction::None;
        }
        self.error = None;
        self.pending = true;
        FormAction::Submit(BackendCommand::Login(credentials))
    }

    /// Success goes to the dashboard; failure stays with a message.
    pub fn apply_result(&mut self, result: Result<()>) -> Option<&'static str> {
        self.pending = false;
        match result {
            Ok(()) => Some(DASHBOARD_ROUTE),
            Err(e) => {
                tracing::warn!("Login failed: {:#}", e);
                self.error = Some(login_error_message(&e));
                None
            }
        }
    }
}

pub struct RegisterForm {
    fields: Fields,
    pub error: Option<String>,
    pub pending: bool,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            fields: Fields::new(
                &["Email", "First name", "Last name", "Username", "Password"],
                &[4],
            ),
            error: None,
            pending: false,
        }
    }
}

impl RegisterForm {
    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        if key.code == KeyCode::Esc {
            return FormAction::Navigate(LOGIN_ROUTE);
        }
        if self.pending {
            return FormAction::None;
        }
        if self.fields.handle_key(key) {
            return self.submit();
        }
        FormAction::None
    }

    fn registration(&self) -> Registration {
        Registration {
            email: self.fields.value(0).trim().to_string(),
            first_name: self.fields.value(1).trim().to_string(),
            last_name: self.fields.value(2).trim().to_string(),
            username: self.fields.value(3).trim().to_string(),
            password: self.fields.value(4),
        }
    }

    fn submit(&mut self) -> FormAction {
        let registration = self.registration();
        if let Some(field) = registration.missing_field() {
            self.error = Some(format!("{} is required", field));
            return FormAction::None;
        }
        self.error = None;
        self.pending = true;
        FormAction::Submit(BackendCommand::Register(registration))
    }

    /// Success goes to the login screen; failure shows the server's reason.
    pub fn apply_result(&mut self, result: Result<()>) -> Option<&'static str> {
        self.pending = false;
        match result {
            Ok(()) => Some(LOGIN_ROUTE),
            Err(e) => {
                tracing::warn!("Registration failed: {:#}", e);
                self.error = Some(registration_error_message(&e));
                None
            }
        }
    }
}

pub fn render_login(frame: &mut Frame, area: Rect, form: &LoginForm) {
    render_form(
        frame,
        area,
        " Log in ",
        &form.fields,
        form.error.as_deref(),
        form.pending,
        "Enter submit | Ctrl+N create account | Esc quit",
    );
}

pub fn render_register(frame: &mut Frame, area: Rect, form: &RegisterForm) {
    render_form(
        frame,
        area,
        " Create account ",
        &form.fields,
        form.error.as_deref(),
        form.pending,
        "Enter submit | Esc back to login",
    );
}

fn render_form(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    fields: &Fields,
    error: Option<&str>,
    pending: bool,
    hint: &str,
) {
    let height = fields.inputs.len() as u16 * 2 + 6;
    let area = centered(area, 56, height);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::from(Span::styled(
            format!(" {} ", hint),
            Style::default().fg(Color::DarkGray),
        )));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut rows: Vec<Constraint> = fields.inputs.iter().map(|_| Constraint::Length(2)).collect();
    rows.push(Constraint::Length(1));
    rows.push(Constraint::Min(1));
    let areas = Layout::vertical(rows).margin(1).split(inner);

    for (idx, label) in fields.labels.iter().enumerate() {
        let row = areas[idx];
        let focused = idx == fields.focus && !pending;
        let label_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        let [label_area, field_area] =
            Layout::horizontal([Constraint::Length(13), Constraint::Min(1)]).areas(row);
        frame.render_widget(
            Paragraph::new(Span::styled(format!("{:>11}: ", label), label_style)),
            label_area,
        );
        input::render(frame, field_area, &fields.inputs[idx], "", focused);
    }

    let status = if pending {
        Line::from(Span::styled("Working...", Style::default().fg(Color::Yellow)))
    } else if let Some(err) = error {
        Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red)))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(status), areas[fields.inputs.len() + 1]);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::ApiError;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_into(form: &mut LoginForm, text: &str) {
        for c in text.chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn conflict(body: &str) -> anyhow::Error {
        ApiError::Status {
            status: 409,
            url: "http://localhost:9000/register".into(),
            body: body.into(),
        }
        .into()
    }

    fn filled_register() -> RegisterForm {
        let mut form = RegisterForm::default();
        for value in ["a@b.c", "Ada", "Byron", "ab", "pw"] {
            form.fields.inputs[form.fields.focus].set(value);
            form.fields.next();
        }
        form.fields.focus = 4;
        form
    }

    #[test]
    fn test_login_submit_builds_credentials() {
        let mut form = LoginForm::default();
        type_into(&mut form, "ab");
        form.handle_key(key(KeyCode::Enter));
        type_into(&mut form, "pw");
        match form.handle_key(key(KeyCode::Enter)) {
            FormAction::Submit(BackendCommand::Login(c)) => {
                assert_eq!(c.username, "ab");
                assert_eq!(c.password, "pw");
            }
            _ => panic!("expected login submit"),
        }
        assert!(form.pending);
    }

    #[test]
    fn test_login_requires_both_fields() {
        let mut form = LoginForm::default();
        form.fields.focus = 1;
        assert!(matches!(form.handle_key(key(KeyCode::Enter)), FormAction::None));
        assert!(form.error.is_some());
        assert!(!form.pending);
    }

    #[test]
    fn test_login_unauthorized_message() {
        let mut form = LoginForm::default();
        form.pending = true;
        let err = ApiError::Unauthorized {
            url: "http://localhost:9000/login".into(),
        };
        assert_eq!(form.apply_result(Err(err.into())), None);
        assert_eq!(form.error.as_deref(), Some("Login failed"));
        assert!(!form.pending);
    }

    #[test]
    fn test_login_success_goes_to_dashboard() {
        let mut form = LoginForm::default();
        assert_eq!(form.apply_result(Ok(())), Some(DASHBOARD_ROUTE));
    }

    #[test]
    fn test_register_server_error_shown_without_navigation() {
        let mut form = filled_register();
        assert!(matches!(
            form.handle_key(key(KeyCode::Enter)),
            FormAction::Submit(BackendCommand::Register(_))
        ));
        let next = form.apply_result(Err(conflict(r#"{"message":"email taken"}"#)));
        assert_eq!(next, None);
        assert_eq!(form.error.as_deref(), Some("email taken"));
    }

    #[test]
    fn test_register_fallback_message() {
        let mut form = filled_register();
        form.apply_result(Err(conflict("")));
        assert_eq!(form.error.as_deref(), Some("Registration failed"));
        form.apply_result(Err(anyhow::anyhow!("connection refused")));
        assert_eq!(form.error.as_deref(), Some("Registration failed"));
    }

    #[test]
    fn test_register_missing_field_blocks_submit() {
        let mut form = filled_register();
        form.fields.inputs[1].clear();
        assert!(matches!(form.handle_key(key(KeyCode::Enter)), FormAction::None));
        assert!(form.error.as_deref().unwrap_or_default().contains("required"));
    }

    #[test]
    fn test_register_success_goes_to_login_and_esc_returns() {
        let mut form = filled_register();
        assert_eq!(form.apply_result(Ok(())), Some(LOGIN_ROUTE));
        assert!(matches!(
            form.handle_key(key(KeyCode::Esc)),
            FormAction::Navigate(LOGIN_ROUTE)
        ));
    }
}
