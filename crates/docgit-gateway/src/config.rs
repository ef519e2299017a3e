use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::query::QueryOptions;

/// Connection settings for the document database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URLs of the database servers. Only the first entry is
    /// contacted; the rest are accepted but unused.
    pub endpoints: Vec<String>,
    /// Name of the database holding the repository.
    pub database: String,
    /// Idle connections kept open per host. Does not cap the number of
    /// concurrent connections.
    pub conn_limit: usize,
    pub auth: Option<BasicAuth>,
    /// Ask the server to sync writes to disk before acknowledging them.
    pub wait_for_sync: bool,
    /// Documents fetched per cursor round trip; server default when unset.
    pub batch_size: Option<u32>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["http://localhost:8529".into()],
            database: "docgit".into(),
            conn_limit: 32,
            auth: None,
            wait_for_sync: true,
            batch_size: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl GatewayConfig {
    /// Default settings pointed at one endpoint and database.
    pub fn new(endpoint: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            endpoints: vec![endpoint.into()],
            database: database.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> GatewayResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| GatewayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> GatewayResult<()> {
        if self.endpoints.is_empty() {
            return Err(GatewayError::Config("no endpoints configured".into()));
        }
        if self.endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(GatewayError::Config("endpoint must not be empty".into()));
        }
        if self.database.is_empty() {
            return Err(GatewayError::Config("database name must not be empty".into()));
        }
        if self.conn_limit == 0 {
            return Err(GatewayError::Config("conn_limit must be at least 1".into()));
        }
        Ok(())
    }

    /// Options for read queries.
    pub fn read_options(&self) -> QueryOptions {
        QueryOptions {
            batch_size: self.batch_size,
            ..QueryOptions::default()
        }
    }

    /// Options for modification queries.
    pub fn write_options(&self) -> QueryOptions {
        QueryOptions {
            wait_for_sync: self.wait_for_sync,
            ..QueryOptions::default()
        }
    }
}
