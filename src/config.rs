//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::chaos::ChaosConfig;

/// Main configuration for the mock API server.
///
/// Every input is optional: no OpenAPI document means the spec route serves
/// an empty body, no dataset means an empty store, and zero chaos settings
/// disable injection entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: SocketAddr,

    /// OpenAPI document served on the spec route.
    #[serde(default)]
    pub openapi_spec: Option<PathBuf>,

    /// JSON dataset loaded into the object store at startup.
    #[serde(default)]
    pub dataset: Option<PathBuf>,

    /// Failure simulation settings.
    #[serde(default)]
    pub chaos: ChaosConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".parse().unwrap(),
            openapi_spec: None,
            dataset: None,
            chaos: ChaosConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.chaos.validate()
    }
}
