//! Host SDK surface — the hub boundary.
//!
//! The surrounding clinical application ("the hub") embeds the widget
//! and brokers all EHR data and UI chrome. Everything the widget asks
//! of it goes through [`HostClient`]; the concrete transport lives in
//! the host-integration shell, not here. When the handshake fails or
//! times out the widget degrades to [`MockHost`] so the UI stays
//! usable — every host call becomes a no-op.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config;
use crate::eligibility::Activation;

// ═══════════════════════════════════════════
// Notification payload
// ═══════════════════════════════════════════

/// Button style understood by the host notification chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ButtonStyle {
    Link,
    Primary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionButton {
    pub text: String,
    pub button_style: ButtonStyle,
    /// When set, clicking the button asks the host to bring the widget
    /// to the foreground.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub open_app_button: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionButtons {
    pub left_button: ActionButton,
    pub right_button: ActionButton,
}

/// Host-level push notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub text: String,
    pub notification_id: String,
    pub timeout_in_sec: u32,
    pub action_buttons: ActionButtons,
}

// ═══════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Host SDK unavailable")]
    Unavailable,
    #[error("Host SDK handshake failed: {0}")]
    Handshake(String),
    #[error("Host call failed: {0}")]
    Call(String),
}

// ═══════════════════════════════════════════
// HostClient trait
// ═══════════════════════════════════════════

/// Everything the widget core asks of the hub.
///
/// Delivery failures are reported as errors but never propagate past
/// the caller: the worst case is a missed notification, never a crash.
pub trait HostClient: Send + Sync {
    /// Enable or disable the widget in the host chrome.
    fn set_activation_status(&self, status: Activation) -> Result<(), HostError>;

    /// Show a host-level push notification.
    fn show_notification(&self, payload: &NotificationPayload) -> Result<(), HostError>;

    /// Set the unread badge count on the widget icon.
    fn set_badge(&self, count: u32) -> Result<(), HostError>;

    /// Hide the unread badge.
    fn hide_badge(&self) -> Result<(), HostError>;

    /// Whether the widget is currently open (visible) in the host.
    fn is_app_open(&self) -> bool;

    /// Collapse the widget panel.
    fn close_app(&self) -> Result<(), HostError>;

    /// User identifier from the host session context, when known.
    fn session_user_id(&self) -> Option<String> {
        None
    }
}

// ═══════════════════════════════════════════
// Mock host (degraded mode)
// ═══════════════════════════════════════════

/// No-op host used when the handshake fails, times out, or is bypassed
/// for development. Keeps the widget usable without a hub.
#[derive(Debug, Default)]
pub struct MockHost;

impl HostClient for MockHost {
    fn set_activation_status(&self, status: Activation) -> Result<(), HostError> {
        tracing::debug!(%status, "MockHost: setActivationStatus ignored");
        Ok(())
    }

    fn show_notification(&self, payload: &NotificationPayload) -> Result<(), HostError> {
        tracing::debug!(id = %payload.notification_id, "MockHost: pushNotification ignored");
        Ok(())
    }

    fn set_badge(&self, count: u32) -> Result<(), HostError> {
        tracing::debug!(count, "MockHost: badge set ignored");
        Ok(())
    }

    fn hide_badge(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn is_app_open(&self) -> bool {
        false
    }

    fn close_app(&self) -> Result<(), HostError> {
        Ok(())
    }
}

// ═══════════════════════════════════════════
// Handshake
// ═══════════════════════════════════════════

/// Await the host SDK handshake, bounded by
/// [`config::HANDSHAKE_TIMEOUT`]. On timeout or error the widget falls
/// back to [`MockHost`] with a non-fatal warning.
pub async fn connect<F>(handshake: F) -> Arc<dyn HostClient>
where
    F: Future<Output = Result<Arc<dyn HostClient>, HostError>>,
{
    if config::bypass_host() {
        tracing::warn!("Host handshake bypassed — using mock host");
        return Arc::new(MockHost);
    }

    match tokio::time::timeout(config::HANDSHAKE_TIMEOUT, handshake).await {
        Ok(Ok(host)) => {
            tracing::info!("Host SDK handshake complete");
            host
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Host SDK handshake failed — using mock host");
            Arc::new(MockHost)
        }
        Err(_) => {
            tracing::warn!(
                timeout = ?config::HANDSHAKE_TIMEOUT,
                "Host SDK handshake timed out — using mock host"
            );
            Arc::new(MockHost)
        }
    }
}

// ═══════════════════════════════════════════
// Test double
// ═══════════════════════════════════════════
