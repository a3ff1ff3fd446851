//! Labnet — embedded lab-ordering widget core.
//!
//! Watches patient/order context pushed by the surrounding clinical
//! host, decides when the widget is enabled and when to surface a
//! lab-ordering prompt, and reports engagement telemetry. The host
//! boundary is [`host::HostClient`]; the presentation layer consumes
//! [`orchestrator::UiSignal`]s.

pub mod badge;
pub mod config;
pub mod dispatch;
pub mod eligibility;
pub mod feed;
pub mod host;
pub mod identity;
pub mod locations;
pub mod models;
pub mod orchestrator;
pub mod session;
pub mod telemetry;

use tracing_subscriber::EnvFilter;

/// Initialize tracing once per process. Safe to call from tests;
/// repeated calls are ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
