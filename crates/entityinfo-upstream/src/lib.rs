//! # entityinfo-upstream
//!
//! HTTP clients for the services EntityInfo orchestrates: the graph-store
//! proxy that owns File/Folder/User/Container nodes, and the search index
//! that mirrors file attributes.
//!
//! [`mock`] provides in-memory implementations of both for tests.

pub mod config;
pub mod graph;
pub mod index;
pub mod mock;

pub use config::UpstreamConfig;
pub use graph::HttpGraphStore;
pub use index::HttpSearchIndex;

use entityinfo_core::{Error, Result};

/// Return the response if its status is 2xx, else an `Upstream` error carrying the body.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Upstream {
        service,
        status,
        body,
    })
}

pub(crate) fn build_client(config: &UpstreamConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}
