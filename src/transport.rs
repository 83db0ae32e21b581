//! HTTP transport for Solr requests.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::response::error_message;

const USER_AGENT: &str = "solrpage/0.3 (cursor pagination client)";

/// Resolve user agent from config value.
/// - None => default solrpage user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config {
        None | Some("") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

/// Fetches a URL and returns the body text.
///
/// Implementations must fail with [`TransportError::Status`] for non-2xx responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Self::with_user_agent(timeout, None)
    }

    /// Create a new HTTP transport with custom user agent configuration.
    pub fn with_user_agent(
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, TransportError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| TransportError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        debug!(url = %url, "Sending search request");

        let start = Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "Network error during search request");
            TransportError::from(e)
        })?;
        let duration = start.elapsed();

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        debug!(
            status = %status,
            duration_ms = duration.as_millis() as u64,
            content_type = content_type,
            "Received search response"
        );

        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, body));
        }

        Ok(body)
    }
}

/// Map a non-2xx response to a transport error, preferring Solr's own message.
fn status_error(status: StatusCode, body: String) -> TransportError {
    let message = error_message(&body).unwrap_or(body);
    warn!(status = status.as_u16(), message = %message, "Solr returned an error");
    TransportError::Status {
        status: status.as_u16(),
        body: message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_user_agent_default() {
        let ua = resolve_user_agent(None);
        assert!(ua.contains("solrpage"));
        assert_eq!(resolve_user_agent(Some("")), ua);
    }

    #[test]
    fn test_resolve_user_agent_custom() {
        let ua = resolve_user_agent(Some("MyBot/1.0"));
        assert_eq!(ua, "MyBot/1.0");
    }

    #[test]
    fn test_status_error_uses_solr_message() {
        let body = r#"{"error":{"msg":"Cursor functionality requires a sort containing a uniqueKey field tie breaker","code":400}}"#;
        match status_error(StatusCode::BAD_REQUEST, body.to_string()) {
            TransportError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.starts_with("Cursor functionality"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_error_falls_back_to_body() {
        match status_error(StatusCode::BAD_GATEWAY, "upstream down".to_string()) {
            TransportError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
