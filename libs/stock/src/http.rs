use std::{future::Future, pin::Pin, sync::Arc};

use anyhow::Result;
use reqwest::{Client, Url, header::HeaderMap};
use tracing::{debug, warn};

use crate::FetchError;

/// Status, body and originating URL of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub url: Url,
    pub status: u16,
    pub body: String,
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>>;

/// A single GET round-trip. Errors are transport failures (connect, timeout, body read);
/// any status code, including non-200, is an `Ok`.
pub trait HttpTransport: Send + Sync {
    fn get<'a>(&'a self, url: &'a Url, headers: &'a HeaderMap) -> TransportFuture<'a>;
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get<'a>(&'a self, url: &'a Url, headers: &'a HeaderMap) -> TransportFuture<'a> {
        Box::pin(async move {
            let res = self
                .client
                .get(url.clone())
                .headers(headers.clone())
                .send()
                .await?;

            let status = res.status().as_u16();
            let body = res.text().await?;

            Ok(RawResponse {
                url: url.clone(),
                status,
                body,
            })
        })
    }
}

/// GET with a fixed attempt budget and no delay between attempts.
#[derive(Clone)]
pub struct HttpFetcher {
    transport: Arc<dyn HttpTransport>,
}

impl HttpFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Returns the first response with status 200. After `max_attempts` misses,
    /// fails with [`FetchError::Transient`] carrying the last status seen.
    pub async fn fetch(
        &self,
        url: &Url,
        headers: &HeaderMap,
        max_attempts: u32,
    ) -> Result<RawResponse, FetchError> {
        let max_attempts = max_attempts.max(1);
        let mut last_status = None;

        for attempt in 1..=max_attempts {
            match self.transport.get(url, headers).await {
                Ok(res) if res.status == 200 => {
                    debug!(attempt, url = %url, "fetch succeeded");
                    return Ok(res);
                }
                Ok(res) => {
                    warn!(attempt, url = %url, status = res.status, "fetch attempt failed");
                    last_status = Some(res.status);
                }
                Err(e) => {
                    warn!(attempt, url = %url, error = ?e, "fetch attempt failed");
                }
            }
        }

        Err(FetchError::Transient {
            url: url.to_string(),
            status: last_status,
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use anyhow::anyhow;

    use super::*;

    /// Replays one status per call; `None` simulates a transport error.
    struct StatusScript {
        statuses: Mutex<VecDeque<Option<u16>>>,
        calls: AtomicUsize,
    }

    impl StatusScript {
        fn new(statuses: &[Option<u16>]) -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpTransport for StatusScript {
        fn get<'a>(&'a self, url: &'a Url, _headers: &'a HeaderMap) -> TransportFuture<'a> {
            Box::pin(async move {
                let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                let next = self.statuses.lock().unwrap().pop_front().flatten();
                let status = next.ok_or_else(|| anyhow!("connection reset"))?;
                Ok(RawResponse {
                    url: url.clone(),
                    status,
                    body: format!("attempt {attempt}"),
                })
            })
        }
    }

    fn url() -> Url {
        Url::parse("https://data.example.test/v2/stocks/UNH/bars").unwrap()
    }

    #[tokio::test]
    async fn returns_first_success_without_spending_remaining_attempts() {
        let script = StatusScript::new(&[Some(503), Some(429), Some(200), Some(200)]);
        let fetcher = HttpFetcher::new(script.clone());

        let res = fetcher.fetch(&url(), &HeaderMap::new(), 3).await.unwrap();

        assert_eq!(res.status, 200);
        assert_eq!(res.body, "attempt 3");
        assert_eq!(script.calls(), 3);
    }

    #[tokio::test]
    async fn exhausts_budget_and_reports_last_status() {
        let script = StatusScript::new(&[Some(500), Some(500), Some(500), Some(200)]);
        let fetcher = HttpFetcher::new(script.clone());

        let err = fetcher.fetch(&url(), &HeaderMap::new(), 3).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::Transient {
                url: url().to_string(),
                status: Some(500),
                attempts: 3,
            }
        );
        assert_eq!(script.calls(), 3);
    }

    #[tokio::test]
    async fn only_exact_200_counts_as_success() {
        let script = StatusScript::new(&[Some(204), Some(201)]);
        let fetcher = HttpFetcher::new(script.clone());

        let err = fetcher.fetch(&url(), &HeaderMap::new(), 2).await.unwrap_err();

        assert!(matches!(err, FetchError::Transient { status: Some(201), .. }));
    }

    #[tokio::test]
    async fn transport_errors_count_as_failed_attempts() {
        let script = StatusScript::new(&[None, Some(200)]);
        let fetcher = HttpFetcher::new(script.clone());

        let res = fetcher.fetch(&url(), &HeaderMap::new(), 2).await.unwrap();

        assert_eq!(res.body, "attempt 2");
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let script = StatusScript::new(&[None]);
        let fetcher = HttpFetcher::new(script.clone());

        let err = fetcher.fetch(&url(), &HeaderMap::new(), 0).await.unwrap_err();

        assert!(matches!(
            err,
            FetchError::Transient {
                status: None,
                attempts: 1,
                ..
            }
        ));
        assert_eq!(script.calls(), 1);
    }
}
