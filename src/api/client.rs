//! Cookie-authenticated HTTP client for the CheeChat backend
//!
//! Wraps reqwest::Client with the session cookie jar: every request carries
//! the jar as a `Cookie` header and every response's `Set-Cookie` headers are
//! absorbed back into it.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use reqwest::header::{COOKIE, SET_COOKIE};
use serde::Serialize;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;

use crate::auth::CookieJar;
use crate::config::Config;

/// HTTP failure with the status the backend returned.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("401 Unauthorized for {url}. Session may be invalid -- run 'cheechat login'.")]
    Unauthorized { url: String },
    #[error("HTTP {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
}

impl ApiError {
    /// Response body of a failed request, if one was captured.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            ApiError::Unauthorized { .. } => None,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiError::Status { status, .. } => *status,
            ApiError::Unauthorized { .. } => 401,
        }
    }
}

/// Client for the REST endpoints and the chat socket handshake.
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    ws_base_url: String,
    cookies: Arc<Mutex<CookieJar>>,
    cookie_file: Option<PathBuf>,
}

impl ChatClient {
    /// Build a client from the loaded config. No network traffic happens here.
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url().to_string(),
            ws_base_url: config.ws_base_url(),
            cookies: Arc::new(Mutex::new(config.cookies.clone())),
            cookie_file: config.file.clone(),
        }
    }

    /// Snapshot of the current cookie jar.
    pub fn cookies(&self) -> CookieJar {
        self.jar().clone()
    }

    /// Drop every cookie held in memory.
    pub fn clear_cookies(&self) {
        self.jar().clear();
    }

    /// Write the current jar to the config file, if there is one.
    pub fn persist_cookies(&self) -> Result<()> {
        match &self.cookie_file {
            Some(path) => Config::save_cookies(path, &self.cookies()),
            None => {
                tracing::debug!("No config file; cookies kept in memory");
                Ok(())
            }
        }
    }

    fn jar(&self) -> std::sync::MutexGuard<'_, CookieJar> {
        self.cookies.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_cookies(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.jar().header_value() {
            Some(cookie) => req.header(COOKIE, cookie),
            None => req,
        }
    }

    fn absorb_cookies(&self, resp: &reqwest::Response) {
        let mut jar = self.jar();
        for value in resp.headers().get_all(SET_COOKIE) {
            if let Ok(text) = value.to_str() {
                if jar.absorb_set_cookie(text) {
                    tracing::debug!("Session cookies updated by {}", resp.url().path());
                }
            }
        }
    }

    async fn execute(&self, req: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response> {
        let resp = self
            .with_cookies(req)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;
        self.absorb_cookies(&resp);
        Ok(resp)
    }

    /// GET `path` and fail on a non-success status.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        self.get_with_query(path, &[]).await
    }

    /// GET `path?query` and fail on a non-success status.
    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let resp = self.execute(self.http.get(&url).query(query), &url).await?;
        check_response(resp, &url).await
    }

    /// POST a JSON body to `path` and fail on a non-success status.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let resp = self.execute(self.http.post(&url).json(body), &url).await?;
        check_response(resp, &url).await
    }

    /// POST without a body. The status is returned, not checked.
    pub async fn post_empty(&self, path: &str) -> Result<reqwest::StatusCode> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let resp = self
            .execute(self.http.post(&url).header("Content-Length", "0"), &url)
            .await?;
        Ok(resp.status())
    }

    /// URL of the live socket for `chat_id`.
    pub fn chat_socket_url(&self, chat_id: i64) -> String {
        format!("{}/ws/chat/{}", self.ws_base_url, chat_id)
    }

    /// Handshake request for the chat socket, carrying the cookie jar.
    pub fn chat_socket_request(&self, chat_id: i64) -> Result<Request> {
        let url = self.chat_socket_url(chat_id);
        let mut req = url
            .as_str()
            .into_client_request()
            .with_context(|| format!("Invalid chat socket URL {}", url))?;
        if let Some(cookie) = self.jar().header_value() {
            let value = HeaderValue::from_str(&cookie).context("Cookie is not a valid header")?;
            req.headers_mut().insert("Cookie", value);
        }
        Ok(req)
    }
}

/// Check HTTP response status code and return a typed error on failure.
async fn check_response(resp: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized {
            url: url.to_string(),
        }
        .into());
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        }
        .into());
    }
    Ok(resp)
}
