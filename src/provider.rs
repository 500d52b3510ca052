//! HTTP implementation of the session protocol.
//!
//! Two calls per exchange, both carrying the same bearer and anti-forgery
//! headers:
//!
//! 1. `GET {base}/open` creates the session and returns its identifier in
//!    the `data` field of a JSON body
//! 2. `POST {base}/chat_message/{id}` sends the message and streams the
//!    reply back as `data:` lines

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{ChatError, SessionClient};
use crate::http::{add_extra_headers, build_http_client};
use crate::model::{MessageRequest, SessionHandle};
use crate::options::{Credentials, TransportOptions};
use crate::stream::{decode_chunk_stream, EventStream};

const CSRF_HEADER: &str = "X-CSRFTOKEN";

/// Chat service client over HTTP.
pub struct HttpChatClient {
    credentials: Credentials,
    transport: TransportOptions,
}

impl HttpChatClient {
    /// Create a client for one deployment.
    pub fn new(credentials: Credentials, transport: TransportOptions) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    /// Headers common to both protocol calls.
    fn auth_headers(&self) -> Result<HeaderMap, ChatError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", self.credentials.api_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|_| ChatError::Config("invalid API key".to_string()))?,
        );
        headers.insert(
            CSRF_HEADER,
            HeaderValue::from_str(self.credentials.csrf_token.expose_secret())
                .map_err(|_| ChatError::Config("invalid CSRF token".to_string()))?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl SessionClient for HttpChatClient {
    async fn open_session(&self) -> Result<SessionHandle, ChatError> {
        let url = self.credentials.endpoint("open");
        let http_client = build_http_client(&self.transport)?;

        let mut req = http_client
            .get(&url)
            .header(ACCEPT, "application/json")
            .headers(self.auth_headers()?);
        req = add_extra_headers(req, &self.transport.extra_headers);

        debug!(%url, "opening chat session");
        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(%status, "session open rejected");
            return Err(ChatError::OpenFailed(status));
        }

        let body: serde_json::Value = response.json().await?;
        let handle = body
            .get("data")
            .and_then(SessionHandle::from_json)
            .ok_or(ChatError::MissingSessionId)?;

        debug!(session = %handle, "session opened");
        Ok(handle)
    }

    async fn send_message(
        &self,
        handle: &SessionHandle,
        request: MessageRequest,
        cancel: CancellationToken,
    ) -> Result<EventStream, ChatError> {
        let url = self
            .credentials
            .endpoint(&format!("chat_message/{}", handle.as_str()));
        let http_client = build_http_client(&self.transport)?;

        let mut req = http_client
            .post(&url)
            .header(ACCEPT, "*/*")
            .headers(self.auth_headers()?);
        req = add_extra_headers(req, &self.transport.extra_headers);

        debug!(%url, "sending chat message");
        let response = req.json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            // Capture the body for diagnostics before failing.
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "message request rejected");
            return Err(ChatError::StreamFailed { status, body });
        }

        let chunks = response
            .bytes_stream()
            .map(|result| result.map_err(ChatError::from));
        Ok(Box::pin(decode_chunk_stream(chunks, cancel)))
    }
}
