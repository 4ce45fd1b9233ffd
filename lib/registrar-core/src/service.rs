//! Service instances as reported by the discovery layer
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// A running service instance. Owned by the discovery layer; the adapter only reads it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Service {
    /// Instance identifier, unique per running instance
    pub id: String,
    /// Logical service name shared by all instances
    pub name: String,
    pub ip: String,
    /// 1-65535; port 0 is rejected when deserializing
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    /// Seconds before the store may expire the server entry; 0 disables expiry
    #[serde(default)]
    pub ttl: u64,
}

impl Service {
    pub fn new(name: impl Into<String>, id: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ip: ip.into(),
            port,
            attrs: HashMap::new(),
            ttl: 0,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let port = u16::deserialize(deserializer)?;
    if port == 0 {
        return Err(de::Error::invalid_value(
            Unexpected::Unsigned(0),
            &"a port between 1 and 65535",
        ));
    }
    Ok(port)
}
