//! Configuration types for the chat session client.

use std::collections::HashMap;
use std::time::Duration;

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Fixed credentials for one deployment of the chat service.
///
/// Both requests of an exchange carry the same bearer key and anti-forgery
/// token. Where these come from (config file, environment, UI) is the
/// caller's concern.
///
/// # Example
/// ```rust
/// use kbchat::options::Credentials;
///
/// let credentials = Credentials::new(
///     "http://localhost:8000/proxy",
///     "application-ad68...",
///     "BVENCq9R...",
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Base URL of the chat API, without a trailing slash.
    pub base_url: String,

    /// Bearer key sent in the `Authorization` header.
    pub api_key: SecretString,

    /// Anti-forgery token sent in the `X-CSRFTOKEN` header.
    pub csrf_token: SecretString,
}

impl Credentials {
    /// Create credentials for a deployment.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<SecretString>,
        csrf_token: impl Into<SecretString>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            csrf_token: csrf_token.into(),
        }
    }

    /// Join an endpoint path onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Transport-level options shared by both protocol calls.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Request timeout. Usually left unset for the streaming call, since a
    /// slow model can legitimately keep the connection open for a while.
    pub timeout: Option<Duration>,

    /// HTTP proxy URL.
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in every request.
    pub extra_headers: Option<HashMap<String, String>>,
}

impl TransportOptions {
    /// Create transport options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_string_redacts_debug() {
        let secret = SecretString::new("application-abc123".to_string());
        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(secret.expose_secret(), "application-abc123");
    }

    #[test]
    fn credentials_normalize_trailing_slash() {
        let credentials = Credentials::new("http://host/proxy/", "key", "csrf");
        assert_eq!(credentials.base_url, "http://host/proxy");
        assert_eq!(credentials.endpoint("open"), "http://host/proxy/open");
        assert_eq!(
            credentials.endpoint("/chat_message/abc"),
            "http://host/proxy/chat_message/abc"
        );
    }

    #[test]
    fn transport_options_builders() {
        let options = TransportOptions::new()
            .with_timeout(Duration::from_secs(30))
            .with_header("X-Trace".to_string(), "1".to_string());
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert_eq!(
            options.extra_headers.unwrap().get("X-Trace"),
            Some(&"1".to_string())
        );
    }
}
