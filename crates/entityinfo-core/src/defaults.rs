//! Default constants for EntityInfo.
//!
//! Shared values live here so the server, repositories, and upstream
//! clients agree on them.

// =============================================================================
// SERVER
// =============================================================================

/// Default bind address.
pub const SERVER_HOST: &str = "127.0.0.1";

/// Default listening port.
pub const SERVER_PORT: u16 = 5066;

/// Default allowed CORS origin.
pub const ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Largest accepted request body.
pub const REQUEST_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// DATABASE
// =============================================================================

/// Default connection string.
pub const DATABASE_URL: &str = "postgres://localhost/entityinfo";

/// Default pool size.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Default minimum idle connections.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Seconds to wait for a pooled connection.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Idle connections are closed after this many seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Connections are recycled after this many seconds.
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// UPSTREAM SERVICES
// =============================================================================

/// Default graph-store proxy base URL.
pub const GRAPH_SERVICE_URL: &str = "http://127.0.0.1:5062";

/// Default search-index service base URL.
pub const INDEX_SERVICE_URL: &str = "http://127.0.0.1:5077";

/// Request timeout for collaborator calls.
pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Collaborator calls slower than this are logged at WARN.
pub const UPSTREAM_SLOW_THRESHOLD_MS: u128 = 5_000;

// =============================================================================
// MANIFEST RULES
// =============================================================================

/// Maximum characters in a `text` attribute value.
pub const TEXT_MAX_LEN: usize = 100;

/// Maximum manifests per project.
pub const MAX_MANIFESTS_PER_PROJECT: i64 = 10;

/// Maximum characters in an attribute name or choice token.
pub const NAME_MAX_LEN: usize = 32;

// =============================================================================
// RESPONSE ENVELOPE
// =============================================================================

/// Page index reported by single-page responses.
pub const ENVELOPE_PAGE: i64 = 0;

/// Total reported by single-page responses.
pub const ENVELOPE_TOTAL: i64 = 1;

/// Page count reported by single-page responses.
pub const ENVELOPE_NUM_OF_PAGES: i64 = 1;
