//! Collaborator service configuration.
//!
//! Loaded from environment variables:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GRAPH_SERVICE_URL` | `http://127.0.0.1:5062` |
//! | `INDEX_SERVICE_URL` | `http://127.0.0.1:5077` |
//! | `UPSTREAM_TIMEOUT_SECS` | `30` |

use std::env;
use std::time::Duration;

use tracing::debug;

use entityinfo_core::defaults::{GRAPH_SERVICE_URL, INDEX_SERVICE_URL, UPSTREAM_TIMEOUT_SECS};
use entityinfo_core::{Error, Result};

/// Base URLs and timeout for the graph store and search index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Graph-store proxy root, without the `/v1/neo4j/` suffix.
    pub graph_url: String,
    /// Search-index service root, without the `/v1/` suffix.
    pub index_url: String,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            graph_url: GRAPH_SERVICE_URL.to_string(),
            index_url: INDEX_SERVICE_URL.to_string(),
            timeout_secs: UPSTREAM_TIMEOUT_SECS,
        }
    }
}

impl UpstreamConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let timeout_secs = match env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                Error::Config(format!("UPSTREAM_TIMEOUT_SECS must be an integer, got {}", raw))
            })?,
            Err(_) => UPSTREAM_TIMEOUT_SECS,
        };

        let config = Self {
            graph_url: env::var("GRAPH_SERVICE_URL").unwrap_or_else(|_| GRAPH_SERVICE_URL.to_string()),
            index_url: env::var("INDEX_SERVICE_URL").unwrap_or_else(|_| INDEX_SERVICE_URL.to_string()),
            timeout_secs,
        }
        .normalized();
        config.validate()?;

        debug!(
            subsystem = "upstream",
            component = "config",
            graph_url = %config.graph_url,
            index_url = %config.index_url,
            timeout_secs = config.timeout_secs,
            "Loaded upstream configuration"
        );
        Ok(config)
    }

    /// Config pointing both collaborators at one base URL (tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            graph_url: base_url.clone(),
            index_url: base_url,
            timeout_secs: UPSTREAM_TIMEOUT_SECS,
        }
        .normalized()
    }

    /// Strip trailing slashes from the base URLs.
    pub fn normalized(mut self) -> Self {
        self.graph_url = self.graph_url.trim_end_matches('/').to_string();
        self.index_url = self.index_url.trim_end_matches('/').to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("GRAPH_SERVICE_URL", &self.graph_url),
            ("INDEX_SERVICE_URL", &self.index_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    name, url
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "UPSTREAM_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Root of the v1 graph API (`nodes/...`).
    pub fn graph_v1(&self) -> String {
        format!("{}/v1/neo4j", self.graph_url)
    }

    /// Root of the v2 graph API (`relations/query`).
    pub fn graph_v2(&self) -> String {
        format!("{}/v2/neo4j", self.graph_url)
    }

    /// Root of the index API (`entity/file`).
    pub fn index_v1(&self) -> String {
        format!("{}/v1", self.index_url)
    }
}
