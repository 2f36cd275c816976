use std::{net::SocketAddr, time::Duration};

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "parkway-proxy",
    version,
    about = "Read-only proxy between the park map client and the park backend"
)]
pub struct ProxyConfig {
    /// Base URL of the park backend, without the `/v1` prefix
    #[arg(long, env = "BACKEND_API_URL", default_value = "http://localhost:8000")]
    pub backend_url: String,

    /// Address the proxy listens on
    #[arg(long, env = "PARKWAY_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Upper bound for every call to the backend, health checks included
    #[arg(long, env = "PARKWAY_TIMEOUT_SECS", default_value_t = 5)]
    pub timeout_secs: u64,
}

impl ProxyConfig {
    pub fn for_backend(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            timeout_secs: 5,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let config = ProxyConfig::parse_from([
            "parkway-proxy",
            "--backend-url",
            "http://api.internal:8000/",
            "--bind",
            "127.0.0.1:9000",
            "--timeout-secs",
            "2",
        ]);
        assert_eq!(config.base_url(), "http://api.internal:8000");
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }
}
