//! vulcand registration adapter
//!
//! Projects service lifecycle events onto vulcand's etcd layout. For every
//! eligible instance the adapter writes, in order:
//!
//! 1. the shared backend document (no TTL)
//! 2. the shared frontend document (no TTL)
//! 3. the per-instance server document (service TTL)
//!
//! Deregistration only removes the server document; the backend and frontend
//! may still be serving other instances of the same service.

use crate::document::{encode_backend, encode_frontend, encode_server};
use crate::paths::{backend_path, frontend_path, server_path};
use crate::policy::is_eligible;
use crate::store::{KvStore, VERSION_PATH};
use crate::{Result, Service};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Outcome of a successful register or refresh
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// Backend, frontend and server documents were written
    Registered,
    /// The service does not opt into routing; nothing was written
    Ignored,
}

/// Entry points the discovery layer drives, one call per lifecycle event
#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    /// Check that the store is reachable
    async fn probe(&self) -> Result<()>;

    async fn register(&self, service: &Service) -> Result<Registration>;

    async fn deregister(&self, service: &Service) -> Result<()>;

    async fn refresh(&self, service: &Service) -> Result<Registration>;
}

/// Adapter writing vulcand backends, frontends and servers into a [`KvStore`]
pub struct VulcandAdapter<S> {
    store: S,
    path: String,
    root: String,
}

impl<S: KvStore> VulcandAdapter<S> {
    /// `path` prefixes every key; `root` is the domain suffix used in frontend routes
    pub fn new(store: S, path: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
            root: root.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Write the backend and frontend for the service, backend first
    async fn ensure_service(&self, service: &Service) -> Result<()> {
        let bpath = backend_path(&self.path, &service.name);
        self.store.write(&bpath, &encode_backend()?, 0).await?;

        let fpath = frontend_path(&self.path, &service.name);
        self.store
            .write(&fpath, &encode_frontend(&service.name, &self.root)?, 0)
            .await?;

        Ok(())
    }

    async fn write_server(&self, service: &Service) -> Result<()> {
        let spath = server_path(&self.path, &service.name, &service.id);
        let body = encode_server(&service.ip, service.port)?;
        self.store.write(&spath, &body, service.ttl).await
    }
}

#[async_trait]
impl<S: KvStore> RegistryAdapter for VulcandAdapter<S> {
    async fn probe(&self) -> Result<()> {
        self.store.read(VERSION_PATH).await.map(|version| {
            debug!("vulcand: store answered version probe: {}", version.trim());
        })
    }

    async fn register(&self, service: &Service) -> Result<Registration> {
        if !is_eligible(service) {
            debug!("vulcand: ignoring {}/{}: no deploy attribute", service.name, service.id);
            return Ok(Registration::Ignored);
        }

        if let Err(e) = self.ensure_service(service).await {
            warn!("vulcand: failed to initialize service {}: {}", service.name, e);
            return Err(e);
        }

        if let Err(e) = self.write_server(service).await {
            warn!("vulcand: failed to register service {}/{}: {}", service.name, service.id, e);
            return Err(e);
        }

        info!(
            "vulcand: registered {}/{} at {}:{} (ttl {}s)",
            service.name, service.id, service.ip, service.port, service.ttl
        );
        Ok(Registration::Registered)
    }

    async fn deregister(&self, service: &Service) -> Result<()> {
        let spath = server_path(&self.path, &service.name, &service.id);
        if let Err(e) = self.store.delete(&spath, false).await {
            warn!("vulcand: failed to deregister service {}/{}: {}", service.name, service.id, e);
            return Err(e);
        }

        info!("vulcand: deregistered {}/{}", service.name, service.id);
        Ok(())
    }

    async fn refresh(&self, service: &Service) -> Result<Registration> {
        self.register(service).await
    }
}
