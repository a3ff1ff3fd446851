//! Notification dispatcher — channel selection and at-most-once delivery.
//!
//! The dedup key is marked shown *before* any delivery attempt:
//! delivery is intent to show, not confirmed receipt, and a slow or
//! failing host channel must not produce a second attempt. At-most-once
//! is prioritized over at-least-once — a failed push is not retried.

use uuid::Uuid;

use crate::config;
use crate::host::{
    ActionButton, ActionButtons, ButtonStyle, HostClient, NotificationPayload,
};
use crate::identity::DedupKey;
use crate::models::{Order, PatientSnapshot};
use crate::session::SessionState;
use crate::telemetry::{events, TelemetrySink};

// ═══════════════════════════════════════════
// Outcomes
// ═══════════════════════════════════════════

/// Delivery channel chosen by host visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// In-widget, self-dismissing message; no host-level call.
    Toast,
    /// Host-level push notification.
    Push,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Toast => "toast",
            Self::Push => "push",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No order id and no patient id: idempotence cannot be
    /// guaranteed, so the opportunity is skipped.
    NoIdentity,
    /// This key already delivered a notification this session.
    AlreadyShown,
}

/// Result of a dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Delivered { channel: Channel, key: DedupKey },
}

// ═══════════════════════════════════════════
// Copy
// ═══════════════════════════════════════════

/// Patient-personalized notification text.
pub fn notification_text(patient: Option<&PatientSnapshot>) -> String {
    let name = patient
        .and_then(|p| p.first_name.as_deref())
        .unwrap_or("your patient");
    format!(
        "Choose a lab in the Preferred Lab Network to help {name} \
         access higher-quality lab services with faster results"
    )
}

fn push_payload(text: String) -> NotificationPayload {
    NotificationPayload {
        text,
        notification_id: format!("lab-order-{}", Uuid::new_v4()),
        timeout_in_sec: config::NOTIFICATION_TIMEOUT_SECS,
        action_buttons: ActionButtons {
            left_button: ActionButton {
                text: "Dismiss".to_string(),
                button_style: ButtonStyle::Link,
                open_app_button: false,
            },
            right_button: ActionButton {
                text: "Select a lab".to_string(),
                button_style: ButtonStyle::Primary,
                open_app_button: true,
            },
        },
    }
}

// ═══════════════════════════════════════════
// Dispatch
// ═══════════════════════════════════════════

/// Attempt to deliver a notification for an eligible order.
///
/// Host visible → toast (rendered in-widget by the presentation
/// layer); hidden → host push. Host delivery failures are logged and
/// swallowed; the shown mark is never rolled back.
pub fn dispatch(
    order: &Order,
    patient: Option<&PatientSnapshot>,
    host_visible: bool,
    session: &mut SessionState,
    host: &dyn HostClient,
    telemetry: &dyn TelemetrySink,
) -> Outcome {
    let Some(key) = DedupKey::for_opportunity(Some(order), patient) else {
        tracing::debug!("No dedup identity for order — skipping notification");
        return Outcome::Skipped(SkipReason::NoIdentity);
    };

    if order.is_unconfirmed() {
        tracing::debug!(%key, "Unconfirmed order — deduping on the patient-scoped key");
    }

    if session.shown_keys.has_fired(&key) {
        tracing::debug!(%key, "Notification already shown for key — skipping");
        return Outcome::Skipped(SkipReason::AlreadyShown);
    }

    // Intent to show: marked before delivery so a slow or failing host
    // channel cannot cause a duplicate attempt.
    session.shown_keys.mark_fired(key.clone());

    let text = notification_text(patient);
    let channel = if host_visible {
        tracing::info!(%key, "Showing in-widget toast");
        Channel::Toast
    } else {
        let payload = push_payload(text);
        if let Err(e) = host.show_notification(&payload) {
            tracing::warn!(%key, error = %e, "Push notification delivery failed");
        } else {
            tracing::info!(%key, id = %payload.notification_id, "Push notification delivered");
        }
        Channel::Push
    };

    // One popup-shown telemetry event per session, regardless of how
    // many distinct orders triggered notifications.
    if session.milestones.fire_popup_shown() {
        telemetry.track(
            events::POPUP_SHOWN,
            serde_json::json!({
                "channel": channel.as_str(),
                "dedup_key": key.as_str(),
            }),
        );
    }

    Outcome::Delivered { channel, key }
}
