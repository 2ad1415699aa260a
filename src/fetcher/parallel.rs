use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::Semaphore;

use crate::app::{PollerError, Result};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::{FetchResponse, Fetcher};

pub const DEFAULT_WORKERS: usize = 10;

/// One URL of a batch, tagged with its position in the caller's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub index: usize,
    pub url: String,
}

/// Outcome of a single [`FetchTask`].
#[derive(Debug)]
pub struct FetchResult {
    pub index: usize,
    pub url: String,
    pub outcome: Result<FetchResponse>,
}

impl FetchResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn response(&self) -> Option<&FetchResponse> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&PollerError> {
        self.outcome.as_ref().err()
    }
}

/// Fetches many URLs with at most `workers` requests in flight.
///
/// Every URL gets its own task up front; the semaphore only gates the
/// network call, so queued tasks cost nothing but a pending future.
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(DEFAULT_WORKERS)),
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(PollerError::InvalidConcurrency(workers));
        }

        Ok(Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetch every URL and return one result per URL, in completion order.
    ///
    /// A failing URL is reported in its own [`FetchResult`] and never stops
    /// the rest of the batch. Use [`FetchResult::index`] to restore input order.
    pub async fn fetch_all<I, S>(&self, urls: I) -> Vec<FetchResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pending = FuturesUnordered::new();

        for (index, url) in urls.into_iter().enumerate() {
            let task = FetchTask {
                index,
                url: url.into(),
            };
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();
            let url = task.url.clone();

            let handle = tokio::spawn(async move {
                fetch_single(fetcher.as_ref(), &semaphore, &url).await
            });

            pending.push(handle.map(move |joined| (task, joined)));
        }

        let total = pending.len();
        let mut results = Vec::with_capacity(total);

        while let Some((task, joined)) = pending.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Task join error for {}: {}", task.url, e);
                    Err(PollerError::TaskJoin(e.to_string()))
                }
            };

            if let Err(ref e) = outcome {
                tracing::warn!("Fetch #{} {} failed: {}", task.index, task.url, e);
            }

            results.push(FetchResult {
                index: task.index,
                url: task.url,
                outcome,
            });
        }

        let failed = results.iter().filter(|r| !r.is_ok()).count();
        tracing::info!(
            "Fetched {} URLs ({} failed, {} workers)",
            total,
            failed,
            self.workers
        );

        results
    }
}

async fn fetch_single(
    fetcher: &(dyn Fetcher + Send + Sync),
    semaphore: &Semaphore,
    url: &str,
) -> Result<FetchResponse> {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|_| PollerError::PermitPoolClosed)?;

    tracing::debug!("Fetching {}", url);
    fetcher.fetch(url).await
}

/// Fetch `urls` with at most `concurrency_limit` requests in flight.
///
/// Uses a default [`HttpFetcher`] when `fetcher` is `None`. Only an invalid
/// limit fails the whole call; per-URL failures land in the results.
pub async fn fetch_all<I, S>(
    urls: I,
    concurrency_limit: usize,
    fetcher: Option<Arc<dyn Fetcher + Send + Sync>>,
) -> Result<Vec<FetchResult>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    if concurrency_limit == 0 {
        return Err(PollerError::InvalidConcurrency(concurrency_limit));
    }

    let fetcher = match fetcher {
        Some(f) => f,
        None => Arc::new(HttpFetcher::new()?),
    };

    let pool = ParallelFetcher::with_workers(fetcher, concurrency_limit)?;
    Ok(pool.fetch_all(urls).await)
}
