//! Builds vulcand adapters from a registry URI
//!
//! `vulcand://10.0.0.1:4001/vulcand` targets the etcd at `http://10.0.0.1:4001`
//! and writes under the `/vulcand` prefix. Without a host, the client's
//! default endpoint is used.

use crate::client::{EtcdClient, EtcdClientConfig};
use registrar_core::VulcandAdapter;
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Invalid registry URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Store endpoint and key prefix taken from a registry URI
#[derive(Clone, Debug, PartialEq)]
pub struct RegistryTarget {
    /// Empty when the URI carries no host
    pub endpoints: Vec<String>,
    pub prefix: String,
}

impl RegistryTarget {
    pub fn parse(uri: &str) -> Result<Self, FactoryError> {
        let url = Url::parse(uri).map_err(|e| FactoryError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        let endpoints = match url.host_str().filter(|host| !host.is_empty()) {
            Some(host) => match url.port() {
                Some(port) => vec![format!("http://{}:{}", host, port)],
                None => vec![format!("http://{}", host)],
            },
            None => Vec::new(),
        };

        Ok(Self {
            endpoints,
            prefix: url.path().trim_end_matches('/').to_string(),
        })
    }
}

/// Factory for etcd-backed vulcand adapters
#[derive(Clone, Debug)]
pub struct Factory {
    timeout: Duration,
}

impl Factory {
    /// `timeout` bounds each request the adapter's store client makes
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Build an adapter for `uri`, routing frontends under the `root` domain
    pub fn create(&self, uri: &str, root: &str) -> Result<VulcandAdapter<EtcdClient>, FactoryError> {
        let target = RegistryTarget::parse(uri)?;
        debug!(
            "vulcand: building adapter for endpoints {:?} prefix {:?} root {:?}",
            target.endpoints, target.prefix, root
        );

        let client = EtcdClient::new(EtcdClientConfig {
            endpoints: target.endpoints,
            timeout: self.timeout,
        })?;

        Ok(VulcandAdapter::new(client, target.prefix, root))
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new(EtcdClientConfig::default().timeout)
    }
}
