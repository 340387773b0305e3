//! Chat endpoints: summaries and create-or-fetch.

use anyhow::{Context, Result};

use super::client::ChatClient;
use crate::models::{ChatRequest, ChatSummary};

/// GET /get-chats.
pub async fn list_chats(client: &ChatClient) -> Result<Vec<ChatSummary>> {
    let resp = client.get("/get-chats").await?;
    resp.json().await.context("Failed to parse /get-chats response")
}

/// POST /chats: the backend returns the existing chat with `recipient` or a
/// freshly created one, as a bare id.
pub async fn create_chat(client: &ChatClient, recipient: &str) -> Result<i64> {
    let body = ChatRequest {
        recipient: recipient.to_string(),
    };
    let resp = client.post_json("/chats", &body).await?;
    let chat_id: i64 = resp.json().await.context("Failed to parse /chats response")?;
    tracing::debug!("Chat with {} is {}", recipient, chat_id);
    Ok(chat_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{client_for, response, serve};

    #[tokio::test]
    async fn test_create_chat_sends_recipient() {
        let (base, mut log) = serve(vec![response("200 OK", &[], "17")]).await;
        let chat_id = create_chat(&client_for(&base, Some("id=abc")), "ab")
            .await
            .unwrap();
        assert_eq!(chat_id, 17);

        let req = log.recv().await.unwrap();
        assert_eq!((req.method.as_str(), req.target.as_str()), ("POST", "/chats"));
        assert_eq!(req.header("cookie"), Some("id=abc"));
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        assert_eq!(body, serde_json::json!({"recipient": "ab"}));
    }

    #[tokio::test]
    async fn test_list_chats_accepts_empty_chat() {
        let body = r#"[
            {"chat_id":3,"last_message":null,"last_message_at":null,
             "other_user":{"id":2,"email":"b@c.d","first_name":"Bo","last_name":"Li","username":"bo"}},
            {"chat_id":4,"last_message":"hi","last_message_at":1700000000,
             "other_user":{"id":9,"email":"e@f.g","first_name":"Cy","last_name":"Do","username":"cy"}}
        ]"#;
        let (base, mut log) = serve(vec![response("200 OK", &[], body)]).await;
        let chats = list_chats(&client_for(&base, Some("id=abc"))).await.unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].preview(), "");
        assert!(chats[0].last_message_at.is_none());
        assert_eq!(chats[1].other_user.username, "cy");

        let req = log.recv().await.unwrap();
        assert_eq!(req.target, "/get-chats");
    }

    #[tokio::test]
    async fn test_create_chat_rejects_non_number() {
        let (base, _log) = serve(vec![response("200 OK", &[], r#"{"id":17}"#)]).await;
        tokio_test::assert_err!(create_chat(&client_for(&base, None), "ab").await);
    }
}
