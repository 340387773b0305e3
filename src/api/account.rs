//! Session and account endpoints: login, logout, register, current user.

use anyhow::{Context, Result};
use serde::Deserialize;

use super::client::{ApiError, ChatClient};
use crate::models::{Credentials, Registration};

/// Shown when the backend gives no reason for a failed registration.
pub const REGISTRATION_FALLBACK: &str = "Registration failed";

/// Id the client uses when the current user cannot be determined.
pub const UNKNOWN_USER_ID: i64 = -1;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// POST /login and persist the session cookie the backend sets.
pub async fn login(client: &ChatClient, credentials: &Credentials) -> Result<()> {
    client.post_json("/login", credentials).await?;

    let jar = client.cookies();
    anyhow::ensure!(
        jar.has_session(),
        "Login accepted but the backend set no session cookie"
    );
    client.persist_cookies()?;
    tracing::info!("Logged in as {}", credentials.username);
    Ok(())
}

/// POST /logout, then forget the session locally whatever the status was.
pub async fn logout(client: &ChatClient) -> Result<()> {
    match client.post_empty("/logout").await {
        Ok(status) => tracing::debug!("Logout answered {}", status),
        Err(e) => tracing::warn!("Logout request failed: {:#}", e),
    }
    client.clear_cookies();
    client.persist_cookies()
}

/// POST /register with the full profile.
pub async fn register(client: &ChatClient, registration: &Registration) -> Result<()> {
    client.post_json("/register", registration).await?;
    tracing::info!("Registered {}", registration.username);
    Ok(())
}

/// Message to show for a failed registration: the server's `message`, or
/// the generic fallback.
pub fn registration_error_message(err: &anyhow::Error) -> String {
    err.downcast_ref::<ApiError>()
        .and_then(ApiError::body)
        .and_then(|body| serde_json::from_str::<ErrorBody>(body).ok())
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| REGISTRATION_FALLBACK.to_string())
}

/// Message to show for a failed login.
pub fn login_error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Unauthorized { .. }) => "Login failed".to_string(),
        _ => format!("{:#}", err),
    }
}

/// GET /get-current-user as a bare JSON number.
pub async fn fetch_current_user_id(client: &ChatClient) -> Result<i64> {
    let resp = client.get("/get-current-user").await?;
    resp.json()
        .await
        .context("Failed to parse /get-current-user response")
}

/// Current user id, or `-1` when it cannot be fetched.
pub async fn current_user_id(client: &ChatClient) -> i64 {
    match fetch_current_user_id(client).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Could not fetch current user id: {:#}", e);
            UNKNOWN_USER_ID
        }
    }
}
