//! Slack Web API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::metrics::SlackMetrics;

use super::ChatClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack API error in {method}: {error}")]
    Api { method: String, error: String },

    #[error("Failed to decode {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No Slack token configured")]
    MissingToken,
}

/// Result of `oauth.v2.access`.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthAccess {
    pub access_token: String,
    #[serde(default)]
    pub bot_user_id: Option<String>,
    #[serde(default)]
    pub team: Option<OAuthTeam>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTeam {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Result of `auth.test`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTest {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub user_id: String,
}

pub struct SlackClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl SlackClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, SlackError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(token.filter(|t| !t.is_empty())),
        })
    }

    /// Replace the bearer token used for subsequent calls.
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Trade an OAuth code for a bot token. Authenticated by client
    /// credentials, not by the bearer token.
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<OAuthAccess, SlackError> {
        let method = "oauth.v2.access";
        let response = self
            .http
            .post(self.url(method))
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| Self::failed(method, e))?;

        Self::parse(method, response).await
    }

    pub async fn auth_test(&self) -> Result<AuthTest, SlackError> {
        self.call("auth.test", &json!({})).await
    }

    /// Check `token` without installing it.
    pub async fn auth_test_with(&self, token: &str) -> Result<AuthTest, SlackError> {
        self.call_with("auth.test", token, &json!({})).await
    }

    /// Mark the bot user as active.
    pub async fn set_active(&self) -> Result<(), SlackError> {
        self.call::<Value>("users.setActive", &json!({})).await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, SlackError> {
        let token = self
            .token
            .read()
            .await
            .clone()
            .ok_or(SlackError::MissingToken)?;

        self.call_with(method, &token, body).await
    }

    async fn call_with<T: DeserializeOwned>(
        &self,
        method: &str,
        token: &str,
        body: &Value,
    ) -> Result<T, SlackError> {
        let response = self
            .http
            .post(self.url(method))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::failed(method, e))?;

        Self::parse(method, response).await
    }

    async fn parse<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, SlackError> {
        let body: Value = response
            .error_for_status()
            .map_err(|e| Self::failed(method, e))?
            .json()
            .await
            .map_err(|e| Self::failed(method, e))?;

        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            SlackMetrics::record_request(method, false);
            tracing::warn!(method = method, error = %error, "Slack API call rejected");
            return Err(SlackError::Api {
                method: method.to_string(),
                error,
            });
        }

        SlackMetrics::record_request(method, true);
        serde_json::from_value(body).map_err(|source| SlackError::Decode {
            method: method.to_string(),
            source,
        })
    }

    fn failed(method: &str, err: reqwest::Error) -> SlackError {
        SlackMetrics::record_request(method, false);
        tracing::warn!(method = method, error = %err, "Slack API request failed");
        SlackError::Http(err)
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }
}

#[async_trait]
impl ChatClient for SlackClient {
    async fn post_message(&self, channel: &str, blocks: Vec<Value>) -> Result<(), SlackError> {
        self.call::<Value>(
            "chat.postMessage",
            &json!({"channel": channel, "blocks": blocks}),
        )
        .await?;
        Ok(())
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        blocks: Vec<Value>,
    ) -> Result<(), SlackError> {
        self.call::<Value>(
            "chat.update",
            &json!({"channel": channel, "ts": ts, "blocks": blocks}),
        )
        .await?;
        Ok(())
    }

    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str) -> Result<(), SlackError> {
        self.call::<Value>(
            "chat.postEphemeral",
            &json!({"channel": channel, "user": user, "text": text}),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> SlackClient {
        SlackClient::new(server.uri(), Some("xoxb-test".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_post_message_sends_blocks_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_partial_json(json!({"channel": "C1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "ts": "1.2"})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .post_message("C1", vec![json!({"type": "divider"})])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_ok_false_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(path("/chat.postEphemeral"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "channel_not_found"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .post_ephemeral("C1", "U1", "hello")
            .await
            .unwrap_err();

        match err {
            SlackError::Api { method, error } => {
                assert_eq!(method, "chat.postEphemeral");
                assert_eq!(error, "channel_not_found");
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(path("/chat.update"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server)
            .update_message("C1", "1.2", Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SlackError::Http(_)));
    }

    #[tokio::test]
    async fn test_missing_token() {
        let server = MockServer::start().await;
        let client = SlackClient::new(server.uri(), None).unwrap();

        let err = client.auth_test().await.unwrap_err();
        assert!(matches!(err, SlackError::MissingToken));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth.v2.access"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("client_id=cid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "access_token": "xoxb-new",
                "bot_user_id": "B1",
                "team": {"id": "T1", "name": "Example"}
            })))
            .mount(&server)
            .await;

        let client = SlackClient::new(server.uri(), None).unwrap();
        let access = client.exchange_code("cid", "secret", "abc").await.unwrap();

        assert_eq!(access.access_token, "xoxb-new");
        assert_eq!(access.bot_user_id.as_deref(), Some("B1"));
    }

    #[tokio::test]
    async fn test_auth_test_with_leaves_current_token() {
        let server = MockServer::start().await;
        Mock::given(path("/auth.test"))
            .and(header("authorization", "Bearer xoxb-candidate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "invalid_auth"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/chat.postMessage"))
            .and(header("authorization", "Bearer xoxb-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;
        let client = client(&server);

        let err = client.auth_test_with("xoxb-candidate").await.unwrap_err();
        assert!(matches!(err, SlackError::Api { ref error, .. } if error == "invalid_auth"));

        client.post_message("C1", Vec::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_token_swaps_bearer() {
        let server = MockServer::start().await;
        Mock::given(path("/auth.test"))
            .and(header("authorization", "Bearer xoxb-new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "team": "Example",
                "team_id": "T1",
                "user": "queuebot",
                "user_id": "B1"
            })))
            .mount(&server)
            .await;

        let client = SlackClient::new(server.uri(), None).unwrap();
        assert!(!client.has_token().await);

        client.set_token("xoxb-new").await;
        let auth = client.auth_test().await.unwrap();

        assert_eq!(auth.user, "queuebot");
        assert_eq!(auth.team_id, "T1");
    }
}
