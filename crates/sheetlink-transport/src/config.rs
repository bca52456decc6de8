//! Transport configuration.

use std::fmt;
use std::time::Duration;

/// Username/password pair sent as HTTP basic auth on every call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Endpoints and limits for [`HttpTransport`](crate::HttpTransport).
///
/// The defaults match a match server running locally.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Scheme, host and port of the server, e.g. `http://localhost:5000`.
    pub base_url: String,

    /// Upper bound on establishing a TCP connection.
    pub connect_timeout: Duration,

    /// Upper bound on a one-shot call and on receiving the headers of the
    /// state stream.
    pub request_timeout: Duration,

    /// Longest silence tolerated on an open state stream before it is
    /// reported as a timeout. `None` waits forever.
    pub read_timeout: Option<Duration>,

    /// Pause between attempts to open the state stream.
    pub reconnection_time: Duration,

    /// How many times opening the state stream is retried after a
    /// connection failure before the error is handed to the caller.
    /// 0 disables the transport-level retry.
    pub max_connect_retries: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            read_timeout: Some(Duration::from_secs(300)),
            reconnection_time: Duration::from_secs(5),
            max_connect_retries: 5,
        }
    }
}

impl TransportConfig {
    /// Default limits against the given server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Joins `path` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let cfg = TransportConfig::with_base_url("http://example.test:5000/");
        assert_eq!(cfg.endpoint("/shots"), "http://example.test:5000/shots");
        assert_eq!(
            cfg.endpoint("matches/abc/stream"),
            "http://example.test:5000/matches/abc/stream"
        );
    }

    #[test]
    fn test_defaults() {
        let cfg = TransportConfig::default();
        assert_eq!(cfg.base_url, "http://localhost:5000");
        assert_eq!(cfg.reconnection_time, Duration::from_secs(5));
        assert_eq!(cfg.max_connect_retries, 5);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("skip", "hunter2");
        let shown = format!("{creds:?}");
        assert!(shown.contains("skip"));
        assert!(!shown.contains("hunter2"));
    }
}
