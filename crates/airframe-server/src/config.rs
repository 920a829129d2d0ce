use std::net::SocketAddr;
use std::path::Path;

use airframe_store::document::{DocumentBackend, MemoryDocumentClient, DEFAULT_TABLE_PREFIX};
use airframe_store::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Storage backend selected at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Document,
}

impl std::str::FromStr for BackendKind {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Self::Memory),
            "document" => Ok(Self::Document),
            other => Err(ServerError::Config(format!(
                "unknown backend {other:?} (expected memory or document)"
            ))),
        }
    }
}

/// Deployment profile. Controls log level and format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Dev,
    #[default]
    Production,
}

impl Profile {
    /// Default `tracing` filter directive for this profile.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Self::Dev => "debug",
            Self::Production => "info",
        }
    }

    pub fn json_logs(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub backend: BackendKind,
    pub profile: Profile,
    /// Table name prefix for the document backend.
    pub table_prefix: String,
    /// Upper bound applied to a query's `limit`; `0` leaves it uncapped.
    pub max_query_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            backend: BackendKind::Memory,
            profile: Profile::Production,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            max_query_limit: 1000,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(format!("invalid TOML: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Clamp a requested query limit to `max_query_limit`. An unlimited
    /// request (`0`) becomes the cap itself.
    pub fn effective_limit(&self, requested: usize) -> usize {
        match (self.max_query_limit, requested) {
            (0, requested) => requested,
            (max, 0) => max,
            (max, requested) => requested.min(max),
        }
    }

    /// Construct the object store this config selects.
    pub fn build_store(&self) -> ObjectStore {
        match self.backend {
            BackendKind::Memory => ObjectStore::in_memory(),
            BackendKind::Document => ObjectStore::new(DocumentBackend::with_prefix(
                MemoryDocumentClient::new(),
                self.table_prefix.clone(),
            )),
        }
    }
}
