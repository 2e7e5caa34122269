//! Page transport with bounded retry.
//!
//! - [`PageSource`]: anything that can return the HTML of a URL
//! - [`HttpTransport`]: `reqwest` implementation with timeout and user agent
//! - [`RetryTransport`]: decorator retrying network errors with exponential
//!   backoff and jitter
//!
//! HTTP status errors are final and never retried. A request that exceeds its
//! timeout surfaces as [`TransportError::Network`].

use crate::config::FetchConfig;
use crate::error::TransportError;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Source of page bodies.
pub trait PageSource {
    /// Fetch the body of `url` as text.
    async fn get_page(&self, url: &str) -> Result<String, TransportError>;
}

/// Plain HTTP transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl PageSource for HttpTransport {
    #[instrument(level = "debug", skip(self))]
    async fn get_page(&self, url: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))
    }
}

/// Wrapper that retries network errors of any [`PageSource`].
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryTransport<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryTransport<T>
where
    T: PageSource,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl<T> fmt::Debug for RetryTransport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTransport")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> PageSource for RetryTransport<T>
where
    T: PageSource,
{
    async fn get_page(&self, url: &str) -> Result<String, TransportError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.get_page(url).await {
                Ok(page) => return Ok(page),
                Err(TransportError::Network(e)) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        debug!(
                            %url,
                            attempt,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            "get_page exhausted retries"
                        );
                        return Err(TransportError::Network(format!(
                            "{e} (gave up after {} retries)",
                            self.max_retries
                        )));
                    }

                    let mut delay = self.base_delay.saturating_mul(1u32 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        %url,
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "get_page attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
                Err(status) => return Err(status),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Fails with the given errors in turn, then serves a page.
    struct Flaky {
        errors: Vec<TransportError>,
        calls: Cell<usize>,
    }

    impl PageSource for Flaky {
        async fn get_page(&self, _url: &str) -> Result<String, TransportError> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            match self.errors.get(n) {
                Some(e) => Err(e.clone()),
                None => Ok("<html></html>".to_string()),
            }
        }
    }

    fn flaky(errors: Vec<TransportError>) -> Flaky {
        Flaky {
            errors,
            calls: Cell::new(0),
        }
    }

    #[tokio::test]
    async fn test_network_errors_are_retried() {
        let inner = flaky(vec![
            TransportError::Network("reset".into()),
            TransportError::Network("reset".into()),
        ]);
        let transport = RetryTransport::new(inner, 3, Duration::from_millis(1));
        assert!(transport.get_page("https://n.com").await.is_ok());
        assert_eq!(transport.inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let inner = flaky(vec![TransportError::Network("dns".into()); 5]);
        let transport = RetryTransport::new(inner, 1, Duration::from_millis(1));
        let err = transport.get_page("https://n.com").await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
        assert_eq!(transport.inner.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_status_errors_are_not_retried() {
        let inner = flaky(vec![TransportError::Status(404)]);
        let transport = RetryTransport::new(inner, 3, Duration::from_millis(1));
        assert_eq!(
            transport.get_page("https://n.com").await,
            Err(TransportError::Status(404))
        );
        assert_eq!(transport.inner.calls.get(), 1);
    }

    #[test]
    fn test_http_transport_builds_from_config() {
        assert!(HttpTransport::new(&FetchConfig::default()).is_ok());
    }
}
