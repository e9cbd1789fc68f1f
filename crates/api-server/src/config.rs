use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;
use fmp_client::{FmpConfig, DEFAULT_BASE_URL, DEFAULT_PERIOD, DEFAULT_SYMBOL};
use std::env;
use std::time::Duration;

pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// Everything the server needs, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub fmp: FmpConfig,
    pub frontend_origin: HeaderValue,
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let api_key = lookup("FMP_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            bail!("FMP_API_KEY must be set to call the financial data provider");
        }

        let timeout_secs: u64 = var("UPSTREAM_TIMEOUT_SECS", "30")
            .parse()
            .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?;

        let origin = var("FRONTEND_ORIGIN", DEFAULT_FRONTEND_ORIGIN);
        let frontend_origin = HeaderValue::from_str(&origin)
            .with_context(|| format!("FRONTEND_ORIGIN is not a valid header value: {:?}", origin))?;

        let port = var("API_PORT", "8000")
            .parse()
            .context("API_PORT must be a port number")?;

        Ok(Self {
            fmp: FmpConfig {
                api_key: api_key.trim().to_string(),
                base_url: var("FMP_BASE_URL", DEFAULT_BASE_URL),
                symbol: var("FMP_SYMBOL", DEFAULT_SYMBOL),
                period: var("FMP_PERIOD", DEFAULT_PERIOD),
                timeout: Duration::from_secs(timeout_secs),
            },
            frontend_origin,
            host: var("API_HOST", "0.0.0.0"),
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("FMP_API_KEY", "secret")]).unwrap();
        assert_eq!(config.fmp.api_key, "secret");
        assert_eq!(config.fmp.base_url, "https://financialmodelingprep.com");
        assert_eq!(config.fmp.symbol, "AAPL");
        assert_eq!(config.fmp.period, "annual");
        assert_eq!(config.fmp.timeout, Duration::from_secs(30));
        assert_eq!(config.frontend_origin, "http://localhost:3000");
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        assert!(load(&[]).is_err());
        assert!(load(&[("FMP_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("FMP_API_KEY", "secret"),
            ("FMP_SYMBOL", "MSFT"),
            ("FRONTEND_ORIGIN", "https://app.example.com"),
            ("API_PORT", "9090"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.fmp.symbol, "MSFT");
        assert_eq!(config.frontend_origin, "https://app.example.com");
        assert_eq!(config.port, 9090);
        assert_eq!(config.fmp.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_port_is_reported() {
        let err = load(&[("FMP_API_KEY", "secret"), ("API_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
    }

    #[test]
    fn test_debug_output_hides_api_key() {
        let config = load(&[("FMP_API_KEY", "supersecretkey42")]).unwrap();
        let printed = format!("{:?}", config);
        assert!(printed.contains("supe...ey42"));
        assert!(!printed.contains("supersecretkey42"));
    }
}
