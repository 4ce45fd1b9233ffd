//! etcd v2 storage for the vulcand registrar
pub mod client;
pub mod factory;

#[cfg(test)]
mod testing;

pub use client::{EtcdClient, EtcdClientConfig};
pub use factory::{Factory, FactoryError, RegistryTarget};
