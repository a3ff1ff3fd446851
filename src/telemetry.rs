//! Best-effort engagement telemetry.
//!
//! Telemetry is fire-and-forget and isolated by a failure boundary: a
//! sink that cannot deliver logs a warning and drops the event. Nothing
//! here may ever affect eligibility, activation, or notification
//! delivery. Without a configured token every call is a no-op.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config;

/// Milestone and engagement event names.
pub mod events {
    /// A dedup-worthy lab order was detected (at-most-once per key).
    pub const LAB_ORDER_DETECTED: &str = "lab_order_detected";
    /// A notification popup was surfaced (at-most-once per session).
    pub const POPUP_SHOWN: &str = "popup_shown";
    /// The widget became visible in the host (every transition).
    pub const APP_OPENED: &str = "app_opened";
    /// The push notification's primary action was clicked.
    pub const NOTIFICATION_CLICKED: &str = "notification_clicked";
    /// A lab vendor was selected in the widget.
    pub const VENDOR_SELECTED: &str = "vendor_selected";
    /// A patient session began (at-most-once per session).
    pub const SESSION_STARTED: &str = "session_started";
}

/// Engagement telemetry sink. `track` and `identify` never fail from
/// the caller's point of view.
pub trait TelemetrySink: Send + Sync {
    fn track(&self, event: &str, properties: Value);
    fn identify(&self, user_id: &str);
}

// ═══════════════════════════════════════════
// No-op sink
// ═══════════════════════════════════════════

/// Used when no telemetry token is configured.
#[derive(Debug, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn track(&self, event: &str, _properties: Value) {
        tracing::trace!(event, "Telemetry disabled — event dropped");
    }

    fn identify(&self, _user_id: &str) {}
}

// ═══════════════════════════════════════════
// HTTP sink
// ═══════════════════════════════════════════

/// Posts events to the configured ingestion endpoint.
///
/// Posts run on detached tasks so a slow or failing endpoint never
/// blocks the orchestrator loop. Called outside a runtime (pure unit
/// tests), events are dropped with a debug log.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpSink {
    pub fn new(token: String, endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            token,
        }
    }

    fn post(&self, body: Value) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime — telemetry event dropped");
            return;
        };
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        handle.spawn(async move {
            match client.post(&endpoint).json(&body).send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(status = %response.status(), "Telemetry endpoint rejected event");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Telemetry delivery failed");
                }
            }
        });
    }
}

impl TelemetrySink for HttpSink {
    fn track(&self, event: &str, properties: Value) {
        let mut properties = match properties {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        properties.insert("token".to_string(), json!(self.token));
        properties.insert(
            "timestamp".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );

        self.post(json!({ "event": event, "properties": properties }));
    }

    fn identify(&self, user_id: &str) {
        self.post(json!({
            "event": "$identify",
            "properties": {
                "token": self.token,
                "distinct_id": user_id,
            }
        }));
    }
}

/// Build the sink from the environment: HTTP when a token is
/// configured, no-op otherwise.
pub fn sink_from_env() -> Arc<dyn TelemetrySink> {
    match config::telemetry_token() {
        Some(token) => {
            tracing::info!("Telemetry enabled");
            Arc::new(HttpSink::new(token, config::telemetry_endpoint()))
        }
        None => {
            tracing::info!("No telemetry token configured — telemetry disabled");
            Arc::new(NoopSink)
        }
    }
}

// ═══════════════════════════════════════════
// Test double
// ═══════════════════════════════════════════

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Captures events in memory for assertions.
    #[derive(Debug, Default)]
    pub struct CapturingSink {
        pub events: Mutex<Vec<(String, Value)>>,
        pub identified: Mutex<Vec<String>>,
    }

    impl CapturingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<(String, Value)> {
            self.events.lock().unwrap().clone()
        }

        pub fn count_of(&self, event: &str) -> usize {
            self.events().iter().filter(|(name, _)| name == event).count()
        }
    }

    impl TelemetrySink for CapturingSink {
        fn track(&self, event: &str, properties: Value) {
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), properties));
        }

        fn identify(&self, user_id: &str) {
            self.identified.lock().unwrap().push(user_id.to_string());
        }
    }
}
