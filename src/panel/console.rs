//! Line-mode chat panel for the `open` and `chat` commands.
//!
//! Stdin lines are sent as they are typed; messages are printed as they
//! arrive. EOF, Ctrl-C or a server close ends the session.

use std::io::BufRead;

use anyhow::Result;
use tokio::sync::mpsc;

use super::{ChatPanel, ConnectionState};
use crate::api::client::ChatClient;
use crate::models::{Message, Sender, User};

/// Run one panel on stdin/stdout until it closes.
pub async fn run(
    client: ChatClient,
    chat_id: i64,
    viewer_id: i64,
    other_user: Option<User>,
) -> Result<()> {
    let panel = ChatPanel::open(&client, chat_id, viewer_id, other_user);
    println!("Connecting to chat {} with {}...", chat_id, panel.title());
    drive(panel, stdin_lines()).await;
    Ok(())
}

/// Stdin lines from a plain thread.
///
/// A blocking stdin read cannot be cancelled, so it stays off the runtime;
/// the thread is left behind when the session ends first.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(text) => {
                    if tx.send(text).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Reading stdin failed: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Shuttle lines into the panel and print what comes back.
async fn drive(mut panel: ChatPanel, mut lines: mpsc::UnboundedReceiver<String>) {
    loop {
        tokio::select! {
            event = panel.next_event() => {
                let Some(event) = event else { break };
                let seen = panel.messages().len();
                let was = panel.state();
                panel.apply(event);

                for msg in &panel.messages()[seen..] {
                    println!("{}", format_line(msg, &panel.title()));
                }
                match panel.state() {
                    ConnectionState::Open if was == ConnectionState::Connecting => {
                        println!("Connected. Type a message and press Enter (Ctrl-D to leave).");
                    }
                    ConnectionState::Closed => {
                        println!("Connection closed.");
                        break;
                    }
                    _ => {}
                }
            }
            line = lines.recv() => match line {
                Some(text) => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    if !panel.send(&text) {
                        println!("(not connected, message not sent)");
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    panel.close();
}

/// `[HH:MM:SS] who: text`
fn format_line(msg: &Message, other_name: &str) -> String {
    let who = match msg.sender {
        Sender::Own => "you",
        Sender::Other => other_name,
    };
    format!("[{}] {}: {}", msg.display_time(), who, msg.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_user;
    use crate::panel::{PanelCommand, PanelEvent};
    use std::time::Duration;

    #[test]
    fn test_format_line_names_sender() {
        let own = Message::new(Sender::Own, "hi", 0);
        let other = Message::new(Sender::Other, "yo", 0);
        assert!(format_line(&own, "ab").ends_with("] you: hi"));
        assert!(format_line(&other, "ab").ends_with("] ab: yo"));
    }

    fn panel() -> (
        ChatPanel,
        mpsc::UnboundedSender<PanelEvent>,
        mpsc::UnboundedReceiver<PanelCommand>,
    ) {
        ChatPanel::detached(1, 1, Some(sample_user(2, "Ada", "Byron", "ab")))
    }

    #[tokio::test]
    async fn test_server_close_ends_session_while_stdin_open() {
        let (panel, events, _cmds) = panel();
        let (_line_tx, lines) = mpsc::unbounded_channel();
        events.send(PanelEvent::Opened).unwrap();
        events.send(PanelEvent::Closed).unwrap();

        tokio::time::timeout(Duration::from_secs(1), drive(panel, lines))
            .await
            .expect("session kept running after the server closed");
    }

    #[tokio::test]
    async fn test_stdin_eof_closes_panel() {
        let (panel, events, mut cmds) = panel();
        let (line_tx, lines) = mpsc::unbounded_channel();
        events.send(PanelEvent::Opened).unwrap();
        line_tx.send("hello".to_string()).unwrap();
        line_tx.send("  ".to_string()).unwrap();
        drop(line_tx);

        tokio::time::timeout(Duration::from_secs(1), drive(panel, lines))
            .await
            .expect("session kept running after stdin ended");

        let mut sent = Vec::new();
        while let Ok(cmd) = cmds.try_recv() {
            sent.push(cmd);
        }
        assert_eq!(sent.last(), Some(&PanelCommand::Close));
        assert!(!sent.contains(&PanelCommand::Send("  ".into())));
    }
}
