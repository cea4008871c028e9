//! Constants for the remote client (timeouts, endpoints, retry caps).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large exports).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// API base URL used when neither `--api-url` nor a folder link host is available.
pub const DEFAULT_API_BASE_URL: &str = "https://platform.quip.com";

/// Maximum Retry-After header value (1 hour) to prevent excessive delays.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);
