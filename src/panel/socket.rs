//! Chat WebSocket connection and frame handling

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::{connect_async, tungstenite::Message};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub struct ChatSocket {
    stream: WsStream,
}

impl ChatSocket {
    /// Connect to a chat endpoint.
    ///
    /// The request already carries the session cookie; there is no further
    /// handshake on the socket itself.
    pub async fn connect(request: Request) -> Result<Self> {
        let uri = request.uri().to_string();
        tracing::info!("Connecting WebSocket to {}", uri);

        let (stream, response) = connect_async(request)
            .await
            .with_context(|| format!("WebSocket connection to {} failed", uri))?;

        tracing::info!("WebSocket connected (status={})", response.status());

        Ok(Self { stream })
    }

    /// Send a raw text frame.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        tracing::debug!("WS send: {}", text);
        self.stream
            .send(Message::Text(text.to_string()))
            .await
            .context("Failed to send WebSocket message")
    }

    /// Receive the next text frame, answering pings along the way.
    ///
    /// Returns `Ok(None)` once the server closes the connection.
    pub async fn recv_text(&mut self) -> Result<Option<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!("WS recv: {}", text);
                    return Ok(Some(text));
                }
                Some(Ok(Message::Ping(data))) => {
                    self.stream
                        .send(Message::Pong(data))
                        .await
                        .context("Failed to send pong")?;
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!("WebSocket closed: {:?}", frame);
                    return Ok(None);
                }
                Some(Ok(other)) => {
                    tracing::debug!("WS frame (ignored): {:?}", other);
                }
                Some(Err(e)) => {
                    return Err(e).context("WebSocket receive error");
                }
                None => {
                    return Ok(None);
                }
            }
        }
    }

    /// Close the connection without draining pending frames.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!("WebSocket close: {:#}", e);
        }
    }
}
