//! Centralized default constants for Sicoop.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// PAGINATION
// =============================================================================

/// Page size of the user-management list (served by the remote store).
pub const USER_PAGE_SIZE: u32 = 10;

/// First page number (pages are 1-based in the UI).
pub const FIRST_PAGE: u32 = 1;

// =============================================================================
// REMOTE STORE
// =============================================================================

/// Default Supabase URL for a local stack (`supabase start`).
pub const SUPABASE_URL: &str = "http://127.0.0.1:54321";

/// Path prefix of the PostgREST tabular API.
pub const REST_PATH: &str = "/rest/v1";

/// Path prefix of remote procedure calls.
pub const RPC_PATH: &str = "/rest/v1/rpc";

/// Timeout for a single remote call in seconds.
pub const REMOTE_TIMEOUT_SECS: u64 = 30;

/// Remote procedure that changes a user's role.
pub const ROLE_UPDATE_FUNCTION: &str = "update_user_role";

// =============================================================================
// NOTIFICATION PROCESSING
// =============================================================================

/// Route of the batch notification processing endpoint.
pub const PROCESS_NOTIFICATIONS_PATH: &str = "/api/process-pending-notifications";

/// Default base URL of the Sicoop API server.
pub const API_URL: &str = "http://127.0.0.1:3000";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Maximum pending notifications handled per processing call.
pub const NOTIFICATION_BATCH_LIMIT: usize = 50;

/// Timeout of a webhook delivery request in seconds.
pub const WEBHOOK_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// TOASTS
// =============================================================================

/// How long a toast stays visible, in milliseconds.
pub const TOAST_TTL_MS: u64 = 4_000;

/// Maximum toasts kept in the queue; older ones are dropped first.
pub const TOAST_LIMIT: usize = 5;

// =============================================================================
// DISPLAY
// =============================================================================

/// Label shown for an empty reference field.
pub const UNASSIGNED_LABEL: &str = "Não atribuído";
