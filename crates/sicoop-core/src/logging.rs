//! Structured logging schema and field name constants for Sicoop.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log queries can filter by the same names across the client core, the
//! PostgREST layer and the API server.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Failed mutation or fetch surfaced to the user |
//! | INFO  | Lifecycle events (startup, navigation), mutation completions |
//! | DEBUG | Decision points (invalidation policy, pagination window) |
//! | TRACE | Per-row iteration (filter passes, delivered notifications) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "core", "db", "api"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "list_manager", "dispatcher", "rest", "notification_processor"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "list", "create", "set_status", "assign", "confirm"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Remote collection (table) being operated on.
pub const COLLECTION: &str = "collection";

/// Record identifier being mutated.
pub const RECORD_ID: &str = "record_id";

/// Dispatcher action key.
pub const ACTION_KEY: &str = "action_key";

/// Role of the signed-in user.
pub const ROLE: &str = "role";

/// Screen being navigated to.
pub const SCREEN: &str = "screen";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a list call.
pub const RESULT_COUNT: &str = "result_count";

/// Number of notifications processed in a batch.
pub const PROCESSED_COUNT: &str = "processed_count";

/// Requested page (1-based).
pub const PAGE: &str = "page";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// HTTP status code returned by the remote store.
pub const STATUS_CODE: &str = "status_code";
