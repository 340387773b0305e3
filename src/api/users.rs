//! User lookup endpoint (/get-user)

use anyhow::{Context, Result};

use super::client::ChatClient;
use crate::models::User;

/// Look a user up by exact username.
pub async fn find_user(client: &ChatClient, username: &str) -> Result<User> {
    let resp = client
        .get_with_query("/get-user", &[("username", username)])
        .await?;
    resp.json().await.context("Failed to parse /get-user response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::ApiError;
    use crate::api::test_server::{client_for, response, serve};

    #[tokio::test]
    async fn test_find_user_encodes_query() {
        let body = r#"{"id":5,"email":"a@b.c","first_name":"Ada","last_name":"Byron","username":"a b&c"}"#;
        let (base, mut log) = serve(vec![response(
            "200 OK",
            &["Content-Type: application/json"],
            body,
        )])
        .await;
        let user = find_user(&client_for(&base, Some("id=abc")), "a b&c")
            .await
            .unwrap();
        assert_eq!(user.id, 5);
        assert_eq!(user.username, "a b&c");

        let req = log.recv().await.unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.target, "/get-user?username=a+b%26c");
    }

    #[tokio::test]
    async fn test_find_user_not_found() {
        let (base, _log) = serve(vec![response("404 Not Found", &[], "")]).await;
        let err = find_user(&client_for(&base, None), "ghost").await.unwrap_err();
        let api = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api.status(), 404);
    }
}
