//! Widget-level constants and environment configuration.

use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Labnet";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long to wait for the host SDK handshake before falling back
/// to the mock host so the UI is never blocked indefinitely.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Short settle delay before surfacing a notification for a detected
/// order, so a snapshot still in flight can supersede it.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Auto-dismiss timeout for host push notifications (host-side, seconds).
pub const NOTIFICATION_TIMEOUT_SECS: u32 = 30;

/// Delay before auto-collapsing the widget after a vendor selection.
pub const AUTO_COLLAPSE_DELAY: Duration = Duration::from_secs(3);

/// Env var holding the telemetry project token. Absent or empty means
/// every telemetry call is a no-op.
pub const TELEMETRY_TOKEN_ENV: &str = "LABNET_TELEMETRY_TOKEN";

/// Env var overriding the telemetry ingestion endpoint.
pub const TELEMETRY_ENDPOINT_ENV: &str = "LABNET_TELEMETRY_ENDPOINT";

/// Default telemetry ingestion endpoint.
pub const DEFAULT_TELEMETRY_ENDPOINT: &str = "https://api.mixpanel.com/track";

/// Env flag forcing the mock host (development bypass, skips handshake).
pub const BYPASS_HOST_ENV: &str = "LABNET_BYPASS_HOST";

/// Default log filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "info,labnet=debug"
}

/// Telemetry token from the environment, if configured.
pub fn telemetry_token() -> Option<String> {
    std::env::var(TELEMETRY_TOKEN_ENV)
        .ok()
        .filter(|t| !t.is_empty())
}

/// Telemetry endpoint, env override or default.
pub fn telemetry_endpoint() -> String {
    std::env::var(TELEMETRY_ENDPOINT_ENV)
        .ok()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_TELEMETRY_ENDPOINT.to_string())
}

/// Whether the host handshake should be bypassed entirely.
pub fn bypass_host() -> bool {
    matches!(
        std::env::var(BYPASS_HOST_ENV).as_deref(),
        Ok("1") | Ok("true")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_timeout_is_five_seconds() {
        assert_eq!(HANDSHAKE_TIMEOUT, Duration::from_secs(5));
    }

    #[test]
    fn settle_delay_is_shorter_than_notification_timeout() {
        assert!(SETTLE_DELAY < Duration::from_secs(NOTIFICATION_TIMEOUT_SECS as u64));
    }

    #[test]
    fn app_name_is_labnet() {
        assert_eq!(APP_NAME, "Labnet");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn default_endpoint_is_https() {
        assert!(DEFAULT_TELEMETRY_ENDPOINT.starts_with("https://"));
    }
}
