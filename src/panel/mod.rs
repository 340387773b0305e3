//! Chat panel: one live socket for one conversation.
//!
//! The socket runs in its own task. The panel owns the conversation state and
//! talks to the task only through channels: `PanelCommand`s go out,
//! `PanelEvent`s come back and are folded into the state with [`ChatPanel::apply`].
//! Dropping the panel drops the command sender, which closes the socket.

pub mod console;
mod socket;

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::client::Request;

use crate::api::client::ChatClient;
use crate::models::{InboundFrame, Message, Sender, User};
use socket::ChatSocket;

/// Connection lifecycle. Errors end in `Closed`, like a server close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "connected",
            ConnectionState::Closed => "closed",
        }
    }
}

/// Events reported by the socket task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    Opened,
    /// Raw text frame from the server.
    Frame(String),
    Closed,
}

/// Requests from the panel to the socket task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PanelCommand {
    Send(String),
    Close,
}

/// One open conversation.
pub struct ChatPanel {
    pub chat_id: i64,
    /// Id of the viewing user, `-1` if unknown.
    pub viewer_id: i64,
    pub other_user: Option<User>,
    state: ConnectionState,
    messages: Vec<Message>,
    cmd_tx: Option<mpsc::UnboundedSender<PanelCommand>>,
    event_rx: mpsc::UnboundedReceiver<PanelEvent>,
}

impl ChatPanel {
    /// Open a panel and start connecting its socket.
    ///
    /// Must be called inside a tokio runtime.
    pub fn open(client: &ChatClient, chat_id: i64, viewer_id: i64, other_user: Option<User>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        match client.chat_socket_request(chat_id) {
            Ok(request) => {
                tokio::spawn(run_socket(request, cmd_rx, event_tx));
            }
            Err(e) => {
                tracing::error!("Cannot open chat {}: {:#}", chat_id, e);
                let _ = event_tx.send(PanelEvent::Closed);
            }
        }

        Self {
            chat_id,
            viewer_id,
            other_user,
            state: ConnectionState::Connecting,
            messages: Vec::new(),
            cmd_tx: Some(cmd_tx),
            event_rx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Sending is enabled only while the socket is open.
    pub fn can_send(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Header label: the other user's username, or a generic title.
    pub fn title(&self) -> String {
        self.other_user
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_else(|| "Chat".to_string())
    }

    pub fn initials(&self) -> String {
        self.other_user
            .as_ref()
            .map(User::initials)
            .unwrap_or_default()
    }

    /// Fold one socket event into the panel state.
    pub fn apply(&mut self, event: PanelEvent) {
        if self.state == ConnectionState::Closed {
            return;
        }
        match event {
            PanelEvent::Opened => {
                tracing::info!("Chat {} connected", self.chat_id);
                self.state = ConnectionState::Open;
            }
            PanelEvent::Frame(text) => match InboundFrame::parse(&text) {
                Ok(frame) => self.messages.push(Message::from_frame(frame, self.viewer_id)),
                Err(e) => {
                    tracing::warn!("Dropping malformed frame on chat {}: {} ({})", self.chat_id, text, e);
                }
            },
            PanelEvent::Closed => {
                tracing::info!("Chat {} connection closed", self.chat_id);
                self.state = ConnectionState::Closed;
                self.cmd_tx = None;
            }
        }
    }

    /// Apply every event already queued. Returns true if any arrived.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.event_rx.try_recv() {
            self.apply(event);
            changed = true;
        }
        changed
    }

    /// Wait for the next socket event. `None` once the task is gone.
    pub async fn next_event(&mut self) -> Option<PanelEvent> {
        self.event_rx.recv().await
    }

    /// Send `text` as typed. Appends a local echo first.
    ///
    /// Returns false (and does nothing) for blank input or when not open.
    pub fn send(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || !self.can_send() {
            return false;
        }
        let Some(tx) = self.cmd_tx.as_ref() else {
            return false;
        };
        if tx.send(PanelCommand::Send(text.to_string())).is_err() {
            tracing::warn!("Chat {} socket task is gone", self.chat_id);
            self.state = ConnectionState::Closed;
            self.cmd_tx = None;
            return false;
        }
        self.messages.push(Message::new(
            Sender::Own,
            text,
            chrono::Utc::now().timestamp_millis(),
        ));
        true
    }

    /// Close the socket. In-flight frames are not drained.
    pub fn close(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(PanelCommand::Close);
        }
        self.state = ConnectionState::Closed;
    }
}

#[cfg(test)]
impl ChatPanel {
    /// Panel wired to test channels instead of a socket task.
    pub(crate) fn detached(
        chat_id: i64,
        viewer_id: i64,
        other_user: Option<User>,
    ) -> (
        Self,
        mpsc::UnboundedSender<PanelEvent>,
        mpsc::UnboundedReceiver<PanelCommand>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let panel = ChatPanel {
            chat_id,
            viewer_id,
            other_user,
            state: ConnectionState::Connecting,
            messages: Vec::new(),
            cmd_tx: Some(cmd_tx),
            event_rx,
        };
        (panel, event_tx, cmd_rx)
    }
}

impl Drop for ChatPanel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Socket task: connect, then shuttle frames until closed from either side.
async fn run_socket(
    request: Request,
    mut cmd_rx: mpsc::UnboundedReceiver<PanelCommand>,
    event_tx: mpsc::UnboundedSender<PanelEvent>,
) {
    let connected = tokio::select! {
        res = ChatSocket::connect(request) => res,
        _ = cmd_rx.recv() => {
            tracing::debug!("Panel closed while connecting");
            return;
        }
    };

    let mut socket = match connected {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("{:#}", e);
            let _ = event_tx.send(PanelEvent::Closed);
            return;
        }
    };

    if event_tx.send(PanelEvent::Opened).is_err() {
        socket.close().await;
        return;
    }

    loop {
        tokio::select! {
            frame = socket.recv_text() => match frame {
                Ok(Some(text)) => {
                    if event_tx.send(PanelEvent::Frame(text)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = event_tx.send(PanelEvent::Closed);
                    return;
                }
                Err(e) => {
                    tracing::warn!("{:#}", e);
                    let _ = event_tx.send(PanelEvent::Closed);
                    return;
                }
            },
            cmd = cmd_rx.recv() => match cmd {
                Some(PanelCommand::Send(text)) => {
                    if let Err(e) = socket.send_text(&text).await {
                        tracing::warn!("{:#}", e);
                        let _ = event_tx.send(PanelEvent::Closed);
                        return;
                    }
                }
                Some(PanelCommand::Close) | None => break,
            },
        }
    }

    socket.close().await;
    let _ = event_tx.send(PanelEvent::Closed);
}
