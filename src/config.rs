use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

/// Connection settings for [`InferenceClient`](crate::InferenceClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the inference server, without the `/v2/...` path.
    pub endpoint: String,
    /// Whole-request timeout applied by the HTTP transport. `None` waits
    /// for as long as the server takes.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_localhost() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, "http://localhost:8080");
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn with_timeout_keeps_endpoint() {
        let config = ClientConfig::new("http://models:9000").with_timeout(Duration::from_secs(3));
        assert_eq!(config.endpoint, "http://models:9000");
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
    }
}
