//! Process configuration, read once from the environment at startup

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_REGISTRY_URI: &str = "vulcand://127.0.0.1:4001/vulcand";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct RegistrarConfig {
    /// `REGISTRY_URI`: etcd host and key prefix
    pub registry_uri: String,
    /// `SERVICE_DOMAIN`: root domain appended to service names in frontend routes
    pub service_domain: String,
    /// `REGISTRAR_LISTEN`: address for /healthz and /metrics
    pub listen: SocketAddr,
    /// `REGISTRAR_STORE_TIMEOUT_SECS`: per-request etcd timeout
    pub store_timeout: Duration,
}

impl RegistrarConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let registry_uri =
            lookup("REGISTRY_URI").unwrap_or_else(|| DEFAULT_REGISTRY_URI.to_string());
        let service_domain = lookup("SERVICE_DOMAIN").unwrap_or_default();

        let listen = lookup("REGISTRAR_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen: SocketAddr = listen
            .parse()
            .with_context(|| format!("REGISTRAR_LISTEN is not a socket address: {}", listen))?;

        let store_timeout = match lookup("REGISTRAR_STORE_TIMEOUT_SECS") {
            Some(secs) => secs.parse::<u64>().with_context(|| {
                format!("REGISTRAR_STORE_TIMEOUT_SECS is not a number of seconds: {}", secs)
            })?,
            None => DEFAULT_STORE_TIMEOUT_SECS,
        };

        Ok(Self {
            registry_uri,
            service_domain,
            listen,
            store_timeout: Duration::from_secs(store_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RegistrarConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.registry_uri, DEFAULT_REGISTRY_URI);
        assert_eq!(config.service_domain, "");
        assert_eq!(config.listen, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.store_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = RegistrarConfig::from_lookup(lookup(&[
            ("REGISTRY_URI", "vulcand://etcd:2379/proxy"),
            ("SERVICE_DOMAIN", "example.com"),
            ("REGISTRAR_LISTEN", "127.0.0.1:9100"),
            ("REGISTRAR_STORE_TIMEOUT_SECS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.registry_uri, "vulcand://etcd:2379/proxy");
        assert_eq!(config.service_domain, "example.com");
        assert_eq!(config.listen.port(), 9100);
        assert_eq!(config.store_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = RegistrarConfig::from_lookup(lookup(&[("REGISTRAR_LISTEN", "nowhere")])).unwrap_err();
        assert!(err.to_string().contains("REGISTRAR_LISTEN"));

        let err = RegistrarConfig::from_lookup(lookup(&[("REGISTRAR_STORE_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("REGISTRAR_STORE_TIMEOUT_SECS"));
    }
}
