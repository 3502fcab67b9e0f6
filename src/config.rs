use std::net::SocketAddr;

use anyhow::{Context, Result};

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_ADDR: &str = "FASTDO_ADDR";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://fastdo.db";
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub addr: SocketAddr,
}

impl AppConfig {
    /// Reads settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let database_url = value(ENV_DATABASE_URL).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let addr = value(ENV_ADDR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr.parse::<SocketAddr>().with_context(|| format!("invalid {ENV_ADDR}: {addr}"))?;
        Ok(Self { database_url, addr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset_or_blank() {
        let config = AppConfig::from_lookup(|key| (key == ENV_ADDR).then(|| " ".to_string())).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.addr, DEFAULT_ADDR.parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(|key| match key {
            ENV_DATABASE_URL => Some("sqlite::memory:".into()),
            ENV_ADDR => Some("0.0.0.0:8080".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.addr.port(), 8080);
    }

    #[test]
    fn rejects_bad_address() {
        let err = AppConfig::from_lookup(|key| (key == ENV_ADDR).then(|| "nowhere".to_string())).unwrap_err();
        assert!(err.to_string().contains(ENV_ADDR));
    }
}
