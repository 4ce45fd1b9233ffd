//! Routing documents written to the store for vulcand
//!
//! Field names and ordering match what vulcand reads back, so the serialized
//! bodies are stable byte for byte for identical input.

use crate::Result;
use serde::Serialize;

/// The only backend/frontend kind this adapter produces
pub const HTTP: &str = "http";

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BackendDocument {
    #[serde(rename = "Type")]
    pub kind: &'static str,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FrontendDocument {
    #[serde(rename = "Type")]
    pub kind: &'static str,
    #[serde(rename = "BackendId")]
    pub backend_id: String,
    #[serde(rename = "Route")]
    pub route: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ServerDocument {
    #[serde(rename = "URL")]
    pub url: String,
}

impl BackendDocument {
    pub fn http() -> Self {
        Self { kind: HTTP }
    }
}

impl FrontendDocument {
    /// Frontend routing `<name>.<root>` to the backend of the same name
    pub fn for_service(name: &str, root: &str) -> Self {
        Self {
            kind: HTTP,
            backend_id: name.to_string(),
            route: host_route(name, root),
        }
    }
}

impl ServerDocument {
    pub fn for_address(host: &str, port: u16) -> Self {
        Self {
            url: format!("http://{}", join_host_port(host, port)),
        }
    }
}

/// vulcand route expression matching the Host header
pub fn host_route(name: &str, root: &str) -> String {
    format!("Host(`{}.{}`)", name, root)
}

/// `host:port`, bracketing IPv6 literals
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

pub fn encode_backend() -> Result<String> {
    Ok(serde_json::to_string(&BackendDocument::http())?)
}

pub fn encode_frontend(name: &str, root: &str) -> Result<String> {
    Ok(serde_json::to_string(&FrontendDocument::for_service(name, root))?)
}

pub fn encode_server(host: &str, port: u16) -> Result<String> {
    Ok(serde_json::to_string(&ServerDocument::for_address(host, port))?)
}
