//! # entityinfo-api
//!
//! HTTP surface of EntityInfo: manifest, attribute and workbench CRUD over
//! the relational store, and the attachment workflow that writes file
//! attributes to the graph store and the search index.

pub mod envelope;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;

pub use envelope::ApiResponse;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
