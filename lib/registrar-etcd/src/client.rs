//! etcd v2 HTTP client implementing the registrar's key-value store seam

use async_trait::async_trait;
use registrar_core::{CoreError, KvStore, Result};
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Endpoint used when no etcd host is configured
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:4001";

/// etcd client configuration
#[derive(Clone, Debug)]
pub struct EtcdClientConfig {
    /// Base URLs tried in order, e.g. `http://10.0.0.1:2379`
    pub endpoints: Vec<String>,
    /// Timeout for a single request to one endpoint
    pub timeout: Duration,
}

impl Default for EtcdClientConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            timeout: Duration::from_secs(5),
        }
    }
}

/// Error body returned by the etcd v2 API
#[derive(Debug, Deserialize)]
struct EtcdErrorBody {
    #[serde(rename = "errorCode")]
    error_code: u64,
    message: String,
    #[serde(default)]
    cause: Option<String>,
}

/// Client for the etcd v2 keys API
pub struct EtcdClient {
    http: Client,
    endpoints: Vec<String>,
}

impl EtcdClient {
    /// Create a new client. An empty endpoint list falls back to [`DEFAULT_ENDPOINT`].
    pub fn new(config: EtcdClientConfig) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let endpoints = if config.endpoints.is_empty() {
            vec![DEFAULT_ENDPOINT.to_string()]
        } else {
            config.endpoints
        };

        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Send a request to each endpoint in turn until one answers.
    ///
    /// Only connection failures and timeouts move on to the next endpoint; an
    /// answer from etcd, successful or not, is final.
    async fn send<F>(
        &self,
        key: &str,
        locate: fn(&str, &str) -> Result<Url>,
        build: F,
    ) -> Result<String>
    where
        F: Fn(Url) -> RequestBuilder + Send + Sync,
    {
        let mut last_error = None;

        for endpoint in &self.endpoints {
            let url = locate(endpoint, key)?;
            match build(url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response
                        .text()
                        .await
                        .map_err(|e| CoreError::StoreUnavailable(e.to_string()))?;

                    if (200..300).contains(&status) {
                        return Ok(body);
                    }
                    return Err(classify_failure(key, status, &body));
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!("etcd endpoint {} unreachable: {}", endpoint, e);
                    last_error = Some(e.to_string());
                }
                Err(e) if e.is_builder() => {
                    return Err(CoreError::StoreOperationFailed {
                        key: key.to_string(),
                        code: None,
                        message: format!("malformed request: {}", e),
                    });
                }
                Err(e) => return Err(CoreError::StoreUnavailable(e.to_string())),
            }
        }

        Err(CoreError::StoreUnavailable(
            last_error.unwrap_or_else(|| "no etcd endpoints configured".to_string()),
        ))
    }
}

#[async_trait]
impl KvStore for EtcdClient {
    async fn read(&self, path: &str) -> Result<String> {
        self.send(path, raw_url, |url| self.http.get(url)).await
    }

    async fn write(&self, key: &str, value: &str, ttl: u64) -> Result<()> {
        let mut params = vec![("value", value.to_string())];
        if ttl > 0 {
            params.push(("ttl", ttl.to_string()));
        }

        self.send(key, key_url, |url| self.http.put(url).form(&params))
            .await?;
        debug!("etcd: set {} (ttl {})", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str, recursive: bool) -> Result<()> {
        let recursive = if recursive { "true" } else { "false" };

        self.send(key, key_url, |url| {
            self.http.delete(url).query(&[("recursive", recursive)])
        })
        .await?;
        debug!("etcd: deleted {}", key);
        Ok(())
    }
}

/// URL of a key in the v2 keys API.
///
/// Every key segment is percent-encoded on its own, so `#`, `?` and `%` in a
/// service name or instance id stay part of that segment.
pub fn key_url(endpoint: &str, key: &str) -> Result<Url> {
    let segments = ["v2", "keys"]
        .into_iter()
        .chain(key.trim_start_matches('/').split('/'));
    endpoint_url(endpoint, key, segments)
}

/// URL of a raw endpoint such as `version`
pub fn raw_url(endpoint: &str, path: &str) -> Result<Url> {
    endpoint_url(endpoint, path, path.trim_start_matches('/').split('/'))
}

fn endpoint_url<'a, I>(endpoint: &str, key: &str, segments: I) -> Result<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let invalid = |reason: String| CoreError::StoreOperationFailed {
        key: key.to_string(),
        code: None,
        message: format!("invalid etcd endpoint {}: {}", endpoint, reason),
    };

    let mut url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map a non-2xx etcd answer onto the store error taxonomy
fn classify_failure(key: &str, status: u16, body: &str) -> CoreError {
    match serde_json::from_str::<EtcdErrorBody>(body) {
        Ok(err) => {
            let message = match err.cause {
                Some(cause) if !cause.is_empty() => format!("{} ({})", err.message, cause),
                _ => err.message,
            };
            CoreError::StoreOperationFailed {
                key: key.to_string(),
                code: Some(err.error_code),
                message,
            }
        }
        Err(_) if status >= 500 => {
            CoreError::StoreUnavailable(format!("etcd returned HTTP {}", status))
        }
        Err(_) => CoreError::StoreOperationFailed {
            key: key.to_string(),
            code: None,
            message: format!("etcd returned HTTP {}: {}", status, body.trim()),
        },
    }
}
