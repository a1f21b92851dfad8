use std::time::Duration;

use rtcgit_core::{ConnectorError, Result};
use rtcgit_runtime_config::ConnectorConfig;
use serde::de::DeserializeOwned;

use crate::routing::Routing;

/// Shared HTTP plumbing: one `reqwest::Client` plus the routing strategy used
/// for GitLab traffic. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HostHttp {
    client: reqwest::Client,
    routing: Routing,
}

impl HostHttp {
    /// Create a new client with the given timeout, user agent and routing.
    pub fn new(timeout: Duration, user_agent: &str, routing: Routing) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ConnectorError::Transport(e.to_string()))?;
        Ok(Self { client, routing })
    }

    pub fn from_config(config: &ConnectorConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.http.timeout_secs),
            &config.github.user_agent,
            Routing::from_settings(&config.proxy),
        )
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, routing: Routing) -> Self {
        Self { client, routing }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn routing(&self) -> &Routing {
        &self.routing
    }
}

/// Parse an HTTP response: return the deserialized body on 2xx, or a
/// `HostRequestFailed` carrying `action` and the host's error message.
pub(crate) async fn parse_response<T: DeserializeOwned>(
    resp: reqwest::Response,
    action: &str,
) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ConnectorError::request_failed(
            action,
            error_message(status, &body),
        ));
    }
    resp.json()
        .await
        .map_err(|e| ConnectorError::request_failed(action, e.to_string()))
}

/// Like [`parse_response`], but a missing item (404, or 410 for deleted
/// GitHub issues) is `None` rather than an error.
pub(crate) async fn parse_optional<T: DeserializeOwned>(
    resp: reqwest::Response,
    action: &str,
) -> Result<Option<T>> {
    if is_missing(resp.status()) {
        return Ok(None);
    }
    parse_response(resp, action).await.map(Some)
}

/// Return the body as text on 2xx.
pub(crate) async fn response_text(resp: reqwest::Response, action: &str) -> Result<String> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ConnectorError::request_failed(action, e.to_string()))?;
    if !status.is_success() {
        return Err(ConnectorError::request_failed(
            action,
            error_message(status, &body),
        ));
    }
    Ok(body)
}

/// Discard the body, failing on non-2xx.
pub(crate) async fn expect_success(resp: reqwest::Response, action: &str) -> Result<()> {
    response_text(resp, action).await.map(|_| ())
}

pub(crate) fn send_failed(action: &str) -> impl FnOnce(reqwest::Error) -> ConnectorError + '_ {
    move |e| ConnectorError::request_failed(action, e.to_string())
}

fn is_missing(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE
}

/// Pull a human-readable message out of a GitHub/GitLab error body.
///
/// GitHub uses `{"message": "..."}`; GitLab uses `message` (sometimes an
/// object of field errors) or `error`.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(*key))
            .map(|message| match message {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            })
    });

    match from_json {
        Some(message) if !message.is_empty() => message,
        _ if !body.trim().is_empty() => format!("{status}: {}", body.trim()),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn error_message_prefers_json_message() {
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, r#"{"message":"Not Found"}"#),
            "Not Found"
        );
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"error":"invalid_token"}"#),
            "invalid_token"
        );
    }

    #[test]
    fn error_message_stringifies_structured_messages() {
        let message = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message":{"title":["can't be blank"]}}"#,
        );
        assert!(message.contains("can't be blank"));
    }

    #[test]
    fn error_message_falls_back_to_body_then_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "502 Bad Gateway: upstream down"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "500 Internal Server Error"
        );
    }
}
