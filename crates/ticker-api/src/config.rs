//! 서버 바인드 설정.

use std::net::SocketAddr;

use anyhow::Context;

/// HTTP 서버 설정.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl ApiConfig {
    /// `API_HOST`, `API_PORT`에서 로드합니다.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let host = std::env::var("API_HOST").unwrap_or(defaults.host);
        let port = match std::env::var("API_PORT") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("API_PORT 값이 잘못되었습니다: {}", value))?,
            Err(_) => defaults.port,
        };
        Ok(Self { host, port })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("잘못된 바인드 주소: {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addr() {
        let addr = ApiConfig::default().addr().unwrap();
        assert_eq!(addr.port(), 3001);
        assert!(addr.ip().is_loopback());
    }
}
