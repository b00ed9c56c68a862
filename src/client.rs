use url::Url;

use crate::config::{ClientConfig, DEFAULT_ENDPOINT};
use crate::error::{PredictError, Result};
use crate::v2::{PredictionRequest, infer_path};

/// Handle on one inference server.
///
/// Holds no per-call state; cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
}

impl InferenceClient {
    /// Client for `endpoint` with default transport settings.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::from_config(&ClientConfig::new(endpoint))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Self::with_http_client(builder.build()?, &config.endpoint)
    }

    /// Reuses a caller-supplied `reqwest::Client`, e.g. one with proxies or
    /// custom TLS roots.
    pub fn with_http_client(http: reqwest::Client, endpoint: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url: normalize_endpoint(endpoint)?,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn infer_url(&self) -> String {
        format!("{}{}", self.base_url, infer_path())
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let invalid = |reason: String| PredictError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// One-shot prediction against `endpoint`, or `http://localhost:8080` when
/// `None`.
pub async fn predict(
    platform: &str,
    year: i64,
    genre: &str,
    publisher: &str,
    endpoint: Option<&str>,
) -> Result<f64> {
    let client = InferenceClient::new(endpoint.unwrap_or(DEFAULT_ENDPOINT))?;
    client
        .predict(&PredictionRequest::new(platform, year, genre, publisher))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_infer_url_from_base() {
        let client = InferenceClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            client.infer_url(),
            "http://localhost:8080/v2/models/video-game-sales-model/infer"
        );
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let client = InferenceClient::new("http://models.internal:9000/").unwrap();
        assert_eq!(client.base_url(), "http://models.internal:9000");
    }

    #[test]
    fn keeps_path_prefix() {
        let client = InferenceClient::new("https://gateway.example.com/sales/").unwrap();
        assert_eq!(
            client.infer_url(),
            "https://gateway.example.com/sales/v2/models/video-game-sales-model/infer"
        );
    }

    #[test]
    fn rejects_unparseable_endpoint() {
        let err = InferenceClient::new("not a url").unwrap_err();
        assert!(matches!(err, PredictError::InvalidEndpoint { .. }));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = InferenceClient::new("ftp://localhost:8080").unwrap_err();
        match err {
            PredictError::InvalidEndpoint { endpoint, reason } => {
                assert_eq!(endpoint, "ftp://localhost:8080");
                assert!(reason.contains("ftp"));
            }
            other => panic!("expected InvalidEndpoint, got {other:?}"),
        }
    }
}
