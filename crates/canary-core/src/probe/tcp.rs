use std::time::Duration;

use async_trait::async_trait;
use canary_types::CheckError;
use tokio::net::TcpStream;

use super::{Attempt, Prober};
use crate::container::ContainerHandle;

/// Passes when a TCP connection to the published port can be opened.
pub struct TcpSocketProber {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl TcpSocketProber {
    pub fn new(host: &str, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            connect_timeout,
        }
    }
}

#[async_trait]
impl Prober for TcpSocketProber {
    async fn probe(&self, _container: &dyn ContainerHandle) -> Result<Attempt, CheckError> {
        let addr = format!("{}:{}", self.host, self.port);
        let attempt = match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
        {
            Ok(Ok(_stream)) => Attempt::new(true),
            Ok(Err(e)) => Attempt::new(false).with("error", e.to_string()),
            Err(_) => Attempt::new(false).with("error", "connect timed out"),
        };
        Ok(attempt.with("address", addr))
    }

    fn kind(&self) -> &'static str {
        "tcpSocket"
    }
}
