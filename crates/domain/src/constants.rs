//! Domain-wide constants

/// Default delay between consecutive platform API calls within one pass,
/// in milliseconds. External APIs rate-limit bursts of status updates.
pub const DEFAULT_ITEM_DELAY_MS: u64 = 300;

/// Default upper bound for a single platform's hide/restore pass, in seconds.
pub const DEFAULT_PLATFORM_TIMEOUT_SECS: u64 = 120;

/// Tokens expiring within this window are refreshed before use, in seconds.
pub const DEFAULT_TOKEN_REFRESH_BUFFER_SECS: i64 = 120;

/// Default weekly sweep cadence: Sunday 04:00 UTC, after havdalah has passed
/// in every supported location.
pub const DEFAULT_SWEEP_CRON: &str = "0 0 4 * * Sun";

/// Platform label used for the aggregate history row of a pass.
pub const AGGREGATE_PLATFORM_LABEL: &str = "automatic";
