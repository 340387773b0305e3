//! Async backend: runs HTTP calls off the TUI event loop.
//!
//! The TUI sends `BackendCommand`s over a channel. Each one runs as its own
//! task against the shared client and reports back a `BackendResponse`.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::api;
use crate::api::client::ChatClient;
use crate::models::{ChatSummary, Credentials, Registration, User};

/// Requests from the TUI to the backend.
pub enum BackendCommand {
    Login(Credentials),
    Register(Registration),
    Logout,
    LoadChats,
    LoadCurrentUserId,
    SearchUser { username: String },
    CreateChat { recipient: User },
}

/// Results delivered back to the TUI.
pub enum BackendResponse {
    LoggedIn(Result<()>),
    Registered(Result<()>),
    LoggedOut,
    Chats(Result<Vec<ChatSummary>>),
    /// `-1` when the backend could not say.
    CurrentUserId(i64),
    SearchResult {
        username: String,
        result: Result<User>,
    },
    ChatCreated {
        recipient: User,
        result: Result<i64>,
    },
}

/// TUI-side handle.
pub struct Backend {
    cmd_tx: mpsc::UnboundedSender<BackendCommand>,
    resp_rx: mpsc::UnboundedReceiver<BackendResponse>,
}

impl Backend {
    /// Spawn the backend loop on the current runtime.
    pub fn start(client: Arc<ChatClient>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();

        tokio::spawn(backend_loop(client, cmd_rx, resp_tx));

        Self { cmd_tx, resp_rx }
    }

    pub fn send(&self, cmd: BackendCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("Backend channel closed -- command dropped");
        }
    }

    /// Next response; for use inside `tokio::select!`.
    pub async fn recv(&mut self) -> Option<BackendResponse> {
        self.resp_rx.recv().await
    }
}

async fn backend_loop(
    client: Arc<ChatClient>,
    mut cmd_rx: mpsc::UnboundedReceiver<BackendCommand>,
    resp_tx: mpsc::UnboundedSender<BackendResponse>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        let client = Arc::clone(&client);
        let resp_tx = resp_tx.clone();

        tokio::spawn(async move {
            let resp = match cmd {
                BackendCommand::Login(credentials) => {
                    BackendResponse::LoggedIn(api::login(&client, &credentials).await)
                }
                BackendCommand::Register(registration) => {
                    BackendResponse::Registered(api::register(&client, &registration).await)
                }
                BackendCommand::Logout => {
                    if let Err(e) = api::logout(&client).await {
                        tracing::warn!("Failed to persist logout: {:#}", e);
                    }
                    BackendResponse::LoggedOut
                }
                BackendCommand::LoadChats => {
                    BackendResponse::Chats(api::list_chats_data(&client).await)
                }
                BackendCommand::LoadCurrentUserId => {
                    BackendResponse::CurrentUserId(api::current_user_id(&client).await)
                }
                BackendCommand::SearchUser { username } => {
                    let result = api::find_user(&client, &username).await;
                    BackendResponse::SearchResult { username, result }
                }
                BackendCommand::CreateChat { recipient } => {
                    let result = api::create_chat(&client, &recipient.username).await;
                    BackendResponse::ChatCreated { recipient, result }
                }
            };
            let _ = resp_tx.send(resp);
        });
    }
}
