use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::Instant;

use crate::app::{PollerError, Result};
use crate::fetcher::Fetcher;

/// GET `url` and return the body with the wall time the request took.
///
/// Anything but `200 OK` is an error, since device status pages answer
/// redirects and auth prompts with non-200 codes that carry no stats.
pub async fn fetch_timed(
    fetcher: &(dyn Fetcher + Send + Sync),
    url: &str,
) -> Result<(Vec<u8>, Duration)> {
    let started = Instant::now();
    let response = fetcher.fetch(url).await?;

    if response.status != StatusCode::OK {
        return Err(PollerError::HttpStatus {
            url: response.url,
            status: response.status.as_u16(),
        });
    }

    let elapsed = started.elapsed();
    tracing::debug!("Fetched {} in {}ms", url, elapsed.as_millis());

    Ok((response.body, elapsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchResponse;
    use async_trait::async_trait;

    struct FixedFetcher {
        status: StatusCode,
        delay: Duration,
    }

    #[async_trait]
    impl Fetcher for FixedFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchResponse> {
            tokio::time::sleep(self.delay).await;
            Ok(FetchResponse::new(url, self.status, b"stats".to_vec()))
        }
    }

    #[tokio::test]
    async fn test_reports_elapsed_time() {
        let fetcher = FixedFetcher {
            status: StatusCode::OK,
            delay: Duration::from_millis(50),
        };

        let (body, elapsed) = fetch_timed(&fetcher, "http://modem.test/").await.unwrap();

        assert_eq!(body, b"stats");
        assert!(elapsed >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_non_200_is_error() {
        let fetcher = FixedFetcher {
            status: StatusCode::NO_CONTENT,
            delay: Duration::ZERO,
        };

        let result = fetch_timed(&fetcher, "http://modem.test/").await;
        assert!(matches!(
            result,
            Err(PollerError::HttpStatus { status: 204, .. })
        ));
    }
}
