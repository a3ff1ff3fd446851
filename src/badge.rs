//! Engagement / badge controller.
//!
//! Maintains the host-visible unread badge and the visibility-driven
//! telemetry, independent of notification delivery. The badge is a
//! boolean has-unread indicator: set to 1 once per session while the
//! widget has not yet been opened, cleared the first time it is.

use crate::eligibility::Activation;
use crate::host::HostClient;
use crate::session::SessionState;
use crate::telemetry::{events, TelemetrySink};

/// Recompute the badge after an activation change.
///
/// Enabled + widget off screen + never opened + badge not yet set this
/// session → badge 1. A widget the user is already looking at has
/// nothing unread, so no badge is armed while it stays visible.
pub fn sync_on_activation(session: &mut SessionState, host_visible: bool, host: &dyn HostClient) {
    if session.activation != Some(Activation::Enabled) {
        return;
    }
    if host_visible {
        return;
    }
    if session.milestones.app_opened || session.milestones.badge_set {
        return;
    }
    // Marked before the host call: a failed badge set is not retried.
    session.milestones.fire_badge_set();
    if let Err(e) = host.set_badge(1) {
        tracing::warn!(error = %e, "Failed to set unread badge");
    } else {
        tracing::debug!("Unread badge set");
    }
}

/// Handle the widget becoming visible in the host.
///
/// The "app opened" telemetry event fires on every transition to
/// visible; badge clearing and the opened milestone fire once per
/// session so the badge is not re-armed later.
pub fn on_visibility_open(
    session: &mut SessionState,
    host: &dyn HostClient,
    telemetry: &dyn TelemetrySink,
) {
    telemetry.track(events::APP_OPENED, serde_json::Value::Null);

    if session.milestones.fire_app_opened() {
        if let Err(e) = host.hide_badge() {
            tracing::warn!(error = %e, "Failed to clear unread badge");
        }
        tracing::debug!("Widget opened for the first time this session");
    }
}
