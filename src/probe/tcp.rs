//! Single-port TCP connect probe

use crate::models::PortResult;
use crate::scanner::services::service_name;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;

/// Connect once to `host:port`
///
/// A refused or timed-out connect is `Closed`; anything else that prevents
/// the attempt (bad port, unresolvable host, unreachable network) is `Error`.
pub async fn probe_port(host: &str, port: u32, timeout: Duration) -> PortResult {
    let Some(port16) = u16::try_from(port).ok().filter(|p| *p != 0) else {
        return PortResult::error(port, format!("port out of range: {}", port));
    };

    match time::timeout(timeout, TcpStream::connect((host, port16))).await {
        Ok(Ok(_stream)) => PortResult::open(port, service_name(port16)),
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => PortResult::closed(port),
        Ok(Err(e)) => PortResult::error(port, e.to_string()),
        Err(_elapsed) => PortResult::closed(port),
    }
}

/// Whether a TCP connection to `addr` can be established within `timeout`
pub async fn can_connect(addr: &str, timeout: Duration) -> std::io::Result<()> {
    match time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(result) => result.map(|_| ()),
        Err(_) => Err(std::io::Error::new(
            ErrorKind::TimedOut,
            format!("connect to {} timed out", addr),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PortStatus;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = probe_port("127.0.0.1", u32::from(port), Duration::from_secs(1)).await;
        assert_eq!(result.status, PortStatus::Open);
        assert!(result.service.is_some());
    }

    #[tokio::test]
    async fn test_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = probe_port("127.0.0.1", u32::from(port), Duration::from_secs(1)).await;
        assert_eq!(result.status, PortStatus::Closed);
    }

    #[tokio::test]
    async fn test_out_of_range_port() {
        let result = probe_port("127.0.0.1", 99_999, Duration::from_millis(100)).await;
        assert_eq!(result.status, PortStatus::Error);
        assert!(result.error.unwrap().contains("out of range"));

        let zero = probe_port("127.0.0.1", 0, Duration::from_millis(100)).await;
        assert_eq!(zero.status, PortStatus::Error);
    }

    #[tokio::test]
    async fn test_can_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        assert!(can_connect(&addr, Duration::from_secs(1)).await.is_ok());
    }
}
