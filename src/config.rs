//! Server configuration.

use std::net::SocketAddr;

/// Process-level settings, sourced from CLI flags or the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the listener binds to (0 picks an ephemeral port).
    pub port: u16,
    /// The single origin allowed for cross-origin requests.
    pub allowed_origin: String,
}

impl Config {
    pub fn new(port: u16, allowed_origin: String) -> Self {
        Config {
            port,
            allowed_origin,
        }
    }

    /// Listen address: all interfaces on the configured port.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            allowed_origin: "http://localhost:5173".to_owned(),
        }
    }
}
