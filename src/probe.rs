use std::time::Duration;

use tokio::net::TcpStream;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether a TCP connection to `host:port` opens within `timeout`.
///
/// The connection is closed right away; nothing is sent.
pub async fn is_port_reachable(host: &str, port: u16, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            tracing::debug!("{}:{} unreachable: {}", host, port, e);
            false
        }
        Err(_) => {
            tracing::debug!("{}:{} timed out after {:?}", host, port, timeout);
            false
        }
    }
}
