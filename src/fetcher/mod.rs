pub mod http_fetcher;
pub mod parallel;
pub mod timed;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use crate::app::{PollerError, Result};

/// A fully buffered HTTP response.
///
/// Non-2xx statuses are not errors at this layer; call
/// [`FetchResponse::error_for_status`] to treat them as such.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(url: impl Into<String>, status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(PollerError::HttpStatus {
                url: self.url,
                status: self.status.as_u16(),
            })
        }
    }
}

#[async_trait]
pub trait Fetcher {
    /// Issue a GET and read the whole body.
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status_passes_success() {
        let response = FetchResponse::new("http://modem.test/", StatusCode::OK, b"ok".to_vec());
        let response = response.error_for_status().unwrap();
        assert_eq!(response.text(), "ok");
    }

    #[test]
    fn test_error_for_status_rejects_server_error() {
        let response = FetchResponse::new(
            "http://modem.test/status",
            StatusCode::SERVICE_UNAVAILABLE,
            Vec::new(),
        );
        assert!(!response.is_success());

        match response.error_for_status() {
            Err(PollerError::HttpStatus { url, status }) => {
                assert_eq!(url, "http://modem.test/status");
                assert_eq!(status, 503);
            }
            other => panic!("expected HttpStatus error, got {:?}", other),
        }
    }

    #[test]
    fn test_text_is_lossy() {
        let response = FetchResponse::new("http://modem.test/", StatusCode::OK, vec![b'a', 0xff]);
        assert_eq!(response.text(), "a\u{fffd}");
    }
}
