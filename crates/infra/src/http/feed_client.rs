//! Reqwest-backed implementation of the FeedFetcher port.
//!
//! One bounded fetch per call, no caching, no internal retries; retry
//! policy lives with the orchestrator's per-listing isolation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use roost_core::calendar::ports::FeedFetcher;
use roost_domain::constants::{FEED_FETCH_TIMEOUT_SECS, FEED_USER_AGENT};
use roost_domain::{Result, RoostError};
use tracing::{debug, instrument};

use crate::errors::InfraError;

/// HTTP client for external ICS calendar feeds
#[derive(Clone)]
pub struct IcsFeedClient {
    client: ReqwestClient,
}

impl IcsFeedClient {
    /// Create a client with the given per-request timeout.
    ///
    /// # Errors
    /// Returns `Config` if the underlying HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .user_agent(FEED_USER_AGENT)
            .no_proxy()
            .build()
            .map_err(|err| RoostError::Config(format!("failed to build feed client: {err}")))?;

        Ok(Self { client })
    }

    /// Convenience constructor with the default feed timeout.
    ///
    /// # Errors
    /// Returns `Config` if the underlying HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Duration::from_secs(FEED_FETCH_TIMEOUT_SECS))
    }
}

#[async_trait]
impl FeedFetcher for IcsFeedClient {
    #[instrument(skip(self))]
    async fn fetch_calendar(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| RoostError::from(InfraError::from(err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoostError::FeedUnavailable(format!(
                "calendar feed returned HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| RoostError::from(InfraError::from(err)))?;

        debug!(bytes = body.len(), "fetched calendar feed");

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const SAMPLE_ICS: &str =
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\nEND:VCALENDAR\r\n";

    fn client() -> IcsFeedClient {
        IcsFeedClient::new(Duration::from_millis(500)).unwrap()
    }

    #[tokio::test]
    async fn returns_body_and_sends_identifying_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", FEED_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_ICS))
            .expect(1)
            .mount(&server)
            .await;

        let body = client().fetch_calendar(&server.uri()).await.unwrap();

        assert_eq!(body, SAMPLE_ICS);
    }

    #[tokio::test]
    async fn non_success_status_is_feed_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client().fetch_calendar(&server.uri()).await.unwrap_err();

        match err {
            RoostError::FeedUnavailable(msg) => assert!(msg.contains("404")),
            other => panic!("expected feed unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn server_error_is_feed_unavailable_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = client().fetch_calendar(&server.uri()).await.unwrap_err();

        assert!(matches!(err, RoostError::FeedUnavailable(_)));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1, "a failing fetch is not retried internally");
    }

    #[tokio::test]
    async fn timeout_is_feed_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(SAMPLE_ICS)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = client().fetch_calendar(&server.uri()).await.unwrap_err();

        match err {
            RoostError::FeedUnavailable(msg) => assert!(msg.contains("timed out")),
            other => panic!("expected feed unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_feed_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client().fetch_calendar(&format!("http://{addr}")).await.unwrap_err();

        assert!(matches!(err, RoostError::FeedUnavailable(_)));
    }
}
