//! Centralized default constants for kbdesk.
//!
//! **This module is the single source of truth** for shared default values.
//! Client configuration, the upload orchestrator, and the view layer all
//! reference these constants instead of defining their own magic numbers.

// =============================================================================
// REMOTE API
// =============================================================================

/// Default base URL of the document endpoints.
pub const API_URL: &str = "http://localhost:5000/api/document";

/// Upper bound on a single remote request in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("kbdesk/", env!("CARGO_PKG_VERSION"));

/// Environment variable overriding [`API_URL`].
pub const ENV_API_URL: &str = "KBDESK_API_URL";

/// Environment variable overriding [`REQUEST_TIMEOUT_SECS`].
pub const ENV_TIMEOUT_SECS: &str = "KBDESK_TIMEOUT_SECS";

// =============================================================================
// FALLBACK MESSAGES
// =============================================================================

/// Used when an upload error payload carries no message.
pub const MSG_UPLOAD_FAILED: &str = "Upload failed";

/// Used when a list error payload carries no message.
pub const MSG_LIST_FAILED: &str = "Failed to fetch documents";

/// Used when a single delete error payload carries no message.
pub const MSG_DELETE_FAILED: &str = "Failed to delete document";

/// Used when a batch delete error payload carries no message.
pub const MSG_DELETE_MANY_FAILED: &str = "Failed to delete documents";

/// Used when a download error payload carries no message.
pub const MSG_DOWNLOAD_FAILED: &str = "Failed to download document";

// =============================================================================
// UPLOADS
// =============================================================================

/// Pause after a completed file so the finished state is observable.
pub const UPLOAD_SETTLE_MS: u64 = 500;

/// Interval between simulated progress ticks.
pub const PROGRESS_TICK_MS: u64 = 100;

/// Smallest simulated progress increment per tick.
pub const PROGRESS_STEP_MIN: f64 = 0.0;

/// Largest simulated progress increment per tick.
pub const PROGRESS_STEP_MAX: f64 = 20.0;

/// Simulated progress never passes this value while a real call is pending.
pub const PROGRESS_CEILING: f64 = 90.0;

/// Maximum upload size accepted by the document store (50 MB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// File extensions offered by the upload picker.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "md", "js", "sql", "yaml", "pptx",
];

// =============================================================================
// NOTICES
// =============================================================================

/// Lifetime of transient success notices in milliseconds.
pub const NOTICE_TTL_MS: u64 = 3000;

// =============================================================================
// VIEW
// =============================================================================

/// Initial number of documents per page.
pub const ITEMS_PER_PAGE: usize = 5;

/// Maximum number of page buttons rendered by the pager.
pub const PAGER_WINDOW: usize = 5;

// =============================================================================
// EVENTS
// =============================================================================

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;
