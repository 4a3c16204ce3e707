//! Fire-and-forget social posting sink.
//!
//! The agent's only outward surface: one pre-formatted text blob per
//! post, one outbound request, nothing consumed from the response beyond
//! success or failure.

use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde_json::json;
use tracing::debug;
use url::Url;

use dexray::{BoxFuture, SecretString};

/// Errors from the posting sink.
#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    /// The posting service answered with a non-success status.
    #[error("post rejected with status {0}")]
    Rejected(u16),

    /// Connection, timeout, or protocol error.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Accepts pre-formatted posts.
pub trait SocialSink: Send + Sync {
    /// Publishes one post.
    fn post<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), SocialError>>;
}

/// Posts `{"text": …}` to a bearer-authenticated HTTP endpoint.
pub struct HttpSocialSink {
    http: Client,
    endpoint: Url,
    token: SecretString,
}

impl std::fmt::Debug for HttpSocialSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSocialSink")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpSocialSink {
    /// Creates a sink for the given endpoint and bearer token.
    #[must_use]
    pub fn new(endpoint: Url, token: SecretString) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            token,
        }
    }
}

impl SocialSink for HttpSocialSink {
    fn post<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), SocialError>> {
        Box::pin(async move {
            debug!(chars = text.chars().count(), "publishing post");
            let response = self
                .http
                .post(self.endpoint.clone())
                .header(AUTHORIZATION, format!("Bearer {}", self.token.expose()))
                .json(&json!({ "text": text }))
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(SocialError::Rejected(status.as_u16()));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink(server: &MockServer) -> HttpSocialSink {
        let endpoint = format!("{}/2/tweets", server.uri()).parse().unwrap();
        HttpSocialSink::new(endpoint, SecretString::from("token-abc"))
    }

    #[tokio::test]
    async fn posts_text_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(header_exists("authorization"))
            .and(body_json(json!({"text": "gm"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        sink(&server).post("gm").await.unwrap();
    }

    #[tokio::test]
    async fn rejection_surfaces_the_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let result = sink(&server).post("gm").await;
        assert!(matches!(result, Err(SocialError::Rejected(403))));
    }
}
