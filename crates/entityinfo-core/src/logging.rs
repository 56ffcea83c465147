//! Structured logging field names shared by every EntityInfo crate.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Request failed with a server-side cause |
//! | WARN  | Partial failure or slow collaborator call |
//! | INFO  | Lifecycle events, attachment outcomes, pool creation |
//! | DEBUG | Decision points, resolved file counts |
//! | TRACE | Per-node traversal steps |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID taken from the `x-request-id` header (UUIDv7).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "upstream"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "resolver", "attachment", "graph", "index", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Global entity id of the file or folder being operated on.
pub const GEID: &str = "geid";

/// Manifest id being attached or edited.
pub const MANIFEST_ID: &str = "manifest_id";

/// Project code scoping a manifest or workbench entry.
pub const PROJECT_CODE: &str = "project_code";

/// Graph node label queried.
pub const LABEL: &str = "label";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of files a geid list resolved to.
pub const FILE_COUNT: &str = "file_count";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Database table affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";

/// Index document is behind the graph node.
pub const INDEX_STALE: &str = "index_stale";
