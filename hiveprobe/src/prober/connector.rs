//! Connection attempts against a probe target.

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// Performs a single liveness check against a socket address.
///
/// Implementations must not retry; the prober owns the polling schedule and
/// races every attempt against the probe's cancellation scope.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Attempts one connection. `Ok(())` means the endpoint accepted it.
    async fn connect(&self, target: SocketAddr) -> std::io::Result<()>;
}

/// Connector that opens a TCP connection and closes it straight away.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, target: SocketAddr) -> std::io::Result<()> {
        let stream = TcpStream::connect(target).await?;
        drop(stream);
        Ok(())
    }
}
