//! Service registration for vulcand
//!
//! This library provides:
//! - Key layout and routing documents for vulcand backends, frontends and servers
//! - The registration policy deciding which services are routed
//! - An adapter driving register/deregister/refresh against a key-value store

pub mod adapter;
pub mod document;
pub mod error;
pub mod paths;
pub mod policy;
pub mod service;
pub mod store;

pub use adapter::{Registration, RegistryAdapter, VulcandAdapter};
pub use error::{CoreError, Result, KEY_NOT_FOUND};
pub use service::Service;
pub use store::{KvStore, MemoryStore};
