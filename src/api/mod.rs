//! API client module for the CheeChat backend

mod account;
mod chat;
pub mod client;
#[cfg(test)]
mod test_server;
mod users;

use anyhow::{Context, Result};

use crate::auth::gate::{self, DASHBOARD_ROUTE};
use crate::config::Config;
use crate::models::ChatSummary;
use crate::panel;
use client::ChatClient;

pub use account::{
    current_user_id, login, login_error_message, logout, register, registration_error_message,
    UNKNOWN_USER_ID,
};
pub use chat::{create_chat, list_chats as list_chats_data};
pub use users::find_user;

/// Build a client for a command that needs a session.
fn authed_client(config: &Config) -> Result<ChatClient> {
    gate::require(DASHBOARD_ROUTE, &config.cookies)?;
    Ok(ChatClient::new(config))
}

/// Show the current user id.
pub async fn whoami(config: &Config) -> Result<()> {
    let client = authed_client(config)?;
    let id = account::fetch_current_user_id(&client).await?;
    println!("User ID: {}", id);
    Ok(())
}

/// List chat summaries (prints to stdout).
pub async fn list_chats(config: &Config, limit: usize) -> Result<()> {
    let client = authed_client(config)?;
    let chats = chat::list_chats(&client).await?;

    println!("\nChats:");
    println!("{:-<60}", "");

    if chats.is_empty() {
        println!("  (no chats yet)");
        return Ok(());
    }

    for chat in chats.iter().take(limit) {
        print_summary(chat);
    }

    Ok(())
}

fn print_summary(chat: &ChatSummary) {
    let user = &chat.other_user;
    println!(
        "[{:>2}] {:<24} {:>5}",
        user.initials(),
        user.username,
        chat.display_time()
    );
    if !chat.preview().trim().is_empty() {
        println!("     {}", chat.preview().trim());
    }
    println!("     ID: {}", chat.chat_id);
    println!();
}

/// Look a user up by exact username (prints a profile card).
pub async fn search(config: &Config, username: &str) -> Result<()> {
    let client = authed_client(config)?;
    match users::find_user(&client, username).await {
        Ok(user) => {
            println!();
            println!("[{}] {}", user.initials(), user.username);
            println!("     {}", user.email);
            println!("     {}", user.full_name());
        }
        Err(e) if is_not_found(&e) => {
            println!("No user named '{}'.", username);
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<client::ApiError>()
        .is_some_and(|e| e.status() == 404)
}

/// Create or fetch the chat with `username` and open it in line mode.
pub async fn open_chat(config: &Config, username: &str) -> Result<()> {
    let client = authed_client(config)?;
    let other = users::find_user(&client, username)
        .await
        .with_context(|| format!("No user named '{}'", username))?;
    let chat_id = chat::create_chat(&client, &other.username).await?;
    let viewer_id = account::current_user_id(&client).await;
    panel::console::run(client, chat_id, viewer_id, Some(other)).await
}

/// Open an existing chat by id in line mode.
pub async fn open_chat_by_id(config: &Config, chat_id: i64) -> Result<()> {
    let client = authed_client(config)?;
    let viewer_id = account::current_user_id(&client).await;
    panel::console::run(client, chat_id, viewer_id, None).await
}
