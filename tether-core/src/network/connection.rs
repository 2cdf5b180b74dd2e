use std::fmt;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::error::TetherError;

/// Address of the peer on the network leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Open a TCP stream to the peer, giving up after `timeout`.
    pub async fn connect(&self, timeout: Duration) -> Result<TcpStream, TetherError> {
        let addr = self.to_string();
        debug!("connecting to {addr}");
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr.as_str()))
            .await
            .map_err(|_| TetherError::Timeout(timeout))??;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_host_colon_port() {
        let info = ConnectionInfo::new("10.0.0.7", 5001);
        assert_eq!(info.to_string(), "10.0.0.7:5001");
        assert_eq!(info.host(), "10.0.0.7");
        assert_eq!(info.port(), 5001);
    }

    #[tokio::test]
    async fn connect_reaches_a_local_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let info = ConnectionInfo::new("127.0.0.1", port);

        let (client, accepted) = tokio::join!(info.connect(Duration::from_secs(5)), listener.accept());
        assert!(client.is_ok());
        assert!(accepted.is_ok());
    }
}
