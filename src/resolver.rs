//! Public IP resolution over HTTP.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Something that can tell us our public address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the candidate address text from `source_url`.
    ///
    /// The returned string is not validated; callers parse it.
    async fn resolve(&self, source_url: &str) -> Result<String>;
}

/// Resolves the public address with a single unauthenticated GET.
pub struct HttpIpResolver {
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl IpSource for HttpIpResolver {
    async fn resolve(&self, source_url: &str) -> Result<String> {
        let response = self.client.get(source_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("IP source {} answered HTTP {}", source_url, status);
        }

        let text = response.text().await?;
        let candidate = text.trim().to_string();
        tracing::debug!("IP source {} returned {:?}", source_url, candidate);

        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DdnsError;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver() -> HttpIpResolver {
        HttpIpResolver::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_trims_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.5\n"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/ip", mock_server.uri());
        let ip = assert_ok!(resolver().resolve(&url).await);

        assert_eq!(ip, "203.0.113.5");
    }

    #[tokio::test]
    async fn test_resolve_ignores_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/ip", mock_server.uri());
        let body = assert_ok!(resolver().resolve(&url).await);

        assert_eq!(body, "unavailable");
    }

    #[tokio::test]
    async fn test_resolve_connection_failure() {
        let result = resolver().resolve("http://127.0.0.1:1/ip").await;

        assert!(matches!(assert_err!(result), DdnsError::Network(_)));
    }

    #[tokio::test]
    async fn test_resolve_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("203.0.113.5")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let resolver = HttpIpResolver::new(Duration::from_millis(200)).unwrap();
        let result = resolver.resolve(&mock_server.uri()).await;

        assert!(matches!(result, Err(DdnsError::Network(_))));
    }
}
