//! Device statistics seam.
//!
//! Parsers for specific modem models live outside this crate; they plug in
//! by implementing [`DocsisModem`].

use async_trait::async_trait;

use crate::app::Result;

#[async_trait]
pub trait DocsisModem: Send + Sync {
    /// Parsed statistics; their shape is up to the implementation.
    type Stats: Send;

    async fn parse_stats(&self) -> Result<Self::Stats>;

    /// Reset the device's counters.
    async fn clear_stats(&self) -> Result<()>;
}

pub async fn fetch_stats<M: DocsisModem + ?Sized>(modem: &M) -> Result<M::Stats> {
    let stats = modem.parse_stats().await;
    if let Err(ref e) = stats {
        tracing::warn!("Failed to read modem stats: {}", e);
    }
    stats
}

pub async fn reset_stats<M: DocsisModem + ?Sized>(modem: &M) -> Result<()> {
    tracing::info!("Clearing modem stats");
    modem.clear_stats().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::app::PollerError;

    #[derive(Debug, PartialEq)]
    struct Counters {
        corrected: u32,
        uncorrectable: u32,
    }

    #[derive(Default)]
    struct FakeModem {
        corrected: AtomicU32,
        offline: bool,
    }

    #[async_trait]
    impl DocsisModem for FakeModem {
        type Stats = Counters;

        async fn parse_stats(&self) -> Result<Counters> {
            if self.offline {
                return Err(PollerError::Device("modem offline".into()));
            }
            Ok(Counters {
                corrected: self.corrected.load(Ordering::SeqCst),
                uncorrectable: 0,
            })
        }

        async fn clear_stats(&self) -> Result<()> {
            self.corrected.store(0, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fetch_then_reset() {
        let modem = FakeModem {
            corrected: AtomicU32::new(42),
            ..Default::default()
        };

        let before = tokio_test::assert_ok!(fetch_stats(&modem).await);
        assert_eq!(before.corrected, 42);

        tokio_test::assert_ok!(reset_stats(&modem).await);

        let after = fetch_stats(&modem).await.unwrap();
        assert_eq!(
            after,
            Counters {
                corrected: 0,
                uncorrectable: 0
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_error_is_passed_through() {
        let modem = FakeModem {
            offline: true,
            ..Default::default()
        };

        let err = tokio_test::assert_err!(fetch_stats(&modem).await);
        assert!(matches!(err, PollerError::Device(_)));
    }
}
