//! Session handling for the CheeChat backend
//!
//! The backend authenticates with a cookie-held session id. This module
//! stores that cookie, gates routes on its presence and drives the
//! login/logout/register commands.

pub mod gate;
pub mod session;

use std::io::{IsTerminal, Write};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::api::{self, client::ChatClient};
use crate::config::Config;
use crate::models::{Credentials, Registration};

pub use session::CookieJar;

/// Log in and store the session cookie.
pub async fn login(config: &Config, username: String, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password("Password: ")?,
    };
    let client = ChatClient::new(config);
    let credentials = Credentials { username, password };
    if let Err(e) = api::login(&client, &credentials).await {
        anyhow::bail!("{}", api::login_error_message(&e));
    }
    println!("Logged in as {}.", credentials.username);
    Ok(())
}

/// Log out on the backend and forget the local session.
pub async fn logout(config: &Config) -> Result<()> {
    let client = ChatClient::new(config);
    api::logout(&client).await?;
    println!("Logged out.");
    Ok(())
}

/// Register a new account.
pub async fn register(config: &Config, registration: Registration) -> Result<()> {
    if let Some(field) = registration.missing_field() {
        anyhow::bail!("The {} field is required", field);
    }
    let client = ChatClient::new(config);
    if let Err(e) = api::register(&client, &registration).await {
        tracing::debug!("Registration failed: {:#}", e);
        anyhow::bail!("{}", api::registration_error_message(&e));
    }
    println!("Registered {}. Run 'cheechat login' to sign in.", registration.username);
    Ok(())
}

/// Display current session status
pub async fn status(config: &Config) -> Result<()> {
    println!("Server:  {}", config.base_url());
    if config.cookies.has_session() {
        println!("Session: present");
    } else {
        println!("Session: none");
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Read a password without echoing it. Piped input is read as a plain line.
fn prompt_password(prompt: &str) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        return prompt_line(prompt);
    }
    print!("{}", prompt);
    std::io::stdout().flush()?;

    terminal::enable_raw_mode()?;
    let read = read_password();
    terminal::disable_raw_mode()?;
    println!();

    match read? {
        Some(password) => Ok(password),
        None => anyhow::bail!("Cancelled"),
    }
}

/// `None` when the user cancels.
fn read_password() -> Result<Option<String>> {
    let mut password = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            match feed_password_key(&mut password, key) {
                PasswordKey::Continue => {}
                PasswordKey::Done => return Ok(Some(password)),
                PasswordKey::Cancel => return Ok(None),
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PasswordKey {
    Continue,
    Done,
    Cancel,
}

fn feed_password_key(password: &mut String, key: KeyEvent) -> PasswordKey {
    if key.kind != KeyEventKind::Press {
        return PasswordKey::Continue;
    }
    match key.code {
        KeyCode::Enter => PasswordKey::Done,
        KeyCode::Esc => PasswordKey::Cancel,
        KeyCode::Char('c') | KeyCode::Char('d')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            PasswordKey::Cancel
        }
        KeyCode::Backspace => {
            password.pop();
            PasswordKey::Continue
        }
        KeyCode::Char(c) => {
            password.push(c);
            PasswordKey::Continue
        }
        _ => PasswordKey::Continue,
    }
}
