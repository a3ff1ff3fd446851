//! Context feed adapter — normalizes host-pushed entities.
//!
//! The host delivers patient, order and visibility updates as loosely
//! structured payloads on its own callback thread. This adapter turns
//! them into typed [`ContextEvent`]s and forwards them, in delivery
//! order, to the orchestrator's event queue. Unparseable payloads
//! normalize to the empty/absent form with a warning — never an error.

use tokio::sync::mpsc;

use crate::models::{Order, PatientSnapshot, RawOrder, RawPatient};

// ═══════════════════════════════════════════
// Topics and events
// ═══════════════════════════════════════════

/// Host subscription topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Patient,
    Orders,
    Encounter,
    Claim,
    Referral,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Orders => "orders",
            Self::Encounter => "encounter",
            Self::Claim => "claim",
            Self::Referral => "referral",
        }
    }

    pub fn all() -> &'static [Topic] {
        &[
            Self::Patient,
            Self::Orders,
            Self::Encounter,
            Self::Claim,
            Self::Referral,
        ]
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized context update, ready for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextEvent {
    /// Patient context replaced wholesale; `None` = patient left.
    Patient(Option<PatientSnapshot>),
    /// Order list replaced wholesale.
    Orders(Vec<Order>),
    /// Widget visibility in the host changed.
    Visibility(bool),
}

// ═══════════════════════════════════════════
// Payload normalization
// ═══════════════════════════════════════════

/// Normalize a raw patient payload. `null`/missing means the patient
/// left; a malformed object degrades to absent.
pub fn patient_event(payload: &serde_json::Value) -> ContextEvent {
    if payload.is_null() {
        return ContextEvent::Patient(None);
    }
    match serde_json::from_value::<RawPatient>(payload.clone()) {
        Ok(raw) => ContextEvent::Patient(Some(raw.into())),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed patient payload — treating as absent");
            ContextEvent::Patient(None)
        }
    }
}

/// Normalize a raw orders payload. Anything that is not an array
/// degrades to an empty order list; malformed entries are dropped.
pub fn orders_event(payload: &serde_json::Value) -> ContextEvent {
    let Some(entries) = payload.as_array() else {
        if !payload.is_null() {
            tracing::warn!("Malformed orders payload — treating as empty");
        }
        return ContextEvent::Orders(Vec::new());
    };

    let orders = entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<RawOrder>(entry.clone()) {
            Ok(raw) => Some(Order::from(raw)),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed order entry");
                None
            }
        })
        .collect();
    ContextEvent::Orders(orders)
}

/// Normalize an app-open-status payload: a bare bool or an object
/// carrying `isAppOpen`.
pub fn visibility_event(payload: &serde_json::Value) -> ContextEvent {
    let open = payload
        .as_bool()
        .or_else(|| payload.get("isAppOpen").and_then(|v| v.as_bool()))
        .unwrap_or(false);
    ContextEvent::Visibility(open)
}

// ═══════════════════════════════════════════
// Feed + subscription bookkeeping
// ═══════════════════════════════════════════

/// Forwards normalized events to the orchestrator queue.
///
/// The host-integration shell registers one `ContextFeed` handler per
/// topic; handlers are synchronous because the host delivers one event
/// at a time on its own thread.
#[derive(Debug, Clone)]
pub struct ContextFeed {
    tx: mpsc::UnboundedSender<ContextEvent>,
}

impl ContextFeed {
    pub fn new(tx: mpsc::UnboundedSender<ContextEvent>) -> Self {
        Self { tx }
    }

    /// Handle a raw payload for a topic. Topics the core does not
    /// consume (encounter, claim, referral) are acknowledged and
    /// dropped.
    pub fn handle(&self, topic: Topic, payload: &serde_json::Value) {
        let event = match topic {
            Topic::Patient => patient_event(payload),
            Topic::Orders => orders_event(payload),
            Topic::Encounter | Topic::Claim | Topic::Referral => {
                tracing::trace!(%topic, "Ignoring non-core topic update");
                return;
            }
        };
        self.forward(event);
    }

    /// Handle an app-open-status change from the host.
    pub fn handle_visibility(&self, payload: &serde_json::Value) {
        self.forward(visibility_event(payload));
    }

    fn forward(&self, event: ContextEvent) {
        // Send fails only after orchestrator teardown; late host
        // callbacks are expected then and must not panic.
        if self.tx.send(event).is_err() {
            tracing::debug!("Context event after orchestrator teardown — dropped");
        }
    }
}

/// Keeps a host subscription alive; unsubscribes on drop so handlers
/// never leak across widget re-mounts.
pub struct SubscriptionGuard {
    topic: &'static str,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new(topic: &'static str, unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            topic,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            tracing::debug!(topic = self.topic, "Unsubscribing from host topic");
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("topic", &self.topic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    #[test]
    fn null_patient_payload_means_absent() {
        assert_eq!(patient_event(&json!(null)), ContextEvent::Patient(None));
    }

    #[test]
    fn patient_payload_normalizes() {
        let event = patient_event(&json!({
            "identifiers": { "patientId": "p1" },
            "demographics": { "firstName": "Jane" }
        }));
        let ContextEvent::Patient(Some(patient)) = event else {
            panic!("expected present patient");
        };
        assert_eq!(patient.id.as_deref(), Some("p1"));
    }

    #[test]
    fn malformed_patient_payload_degrades_to_absent() {
        assert_eq!(patient_event(&json!("bogus")), ContextEvent::Patient(None));
    }

    #[test]
    fn orders_payload_normalizes_and_drops_malformed_entries() {
        let event = orders_event(&json!([
            { "basicInformation": { "type": "LAB" }, "identifiers": { "ehrOrderId": "o1" } },
            "not-an-order",
            { "basicInformation": { "type": "DX" } }
        ]));
        let ContextEvent::Orders(orders) = event else {
            panic!("expected orders");
        };
        assert_eq!(orders.len(), 2);
        assert!(orders[0].is_lab());
        assert!(!orders[1].is_lab());
    }

    #[test]
    fn non_array_orders_payload_is_empty() {
        assert_eq!(orders_event(&json!(null)), ContextEvent::Orders(vec![]));
        assert_eq!(orders_event(&json!({"x": 1})), ContextEvent::Orders(vec![]));
    }

    #[test]
    fn visibility_payload_forms() {
        assert_eq!(visibility_event(&json!(true)), ContextEvent::Visibility(true));
        assert_eq!(
            visibility_event(&json!({ "isAppOpen": true })),
            ContextEvent::Visibility(true)
        );
        assert_eq!(visibility_event(&json!(null)), ContextEvent::Visibility(false));
    }

    #[tokio::test]
    async fn feed_forwards_core_topics_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let feed = ContextFeed::new(tx);

        feed.handle(Topic::Patient, &json!({ "identifiers": { "patientId": "p1" } }));
        feed.handle(Topic::Encounter, &json!({ "whatever": 1 }));
        feed.handle(Topic::Orders, &json!([]));
        feed.handle_visibility(&json!(true));

        assert!(matches!(rx.recv().await, Some(ContextEvent::Patient(Some(_)))));
        assert_eq!(rx.recv().await, Some(ContextEvent::Orders(vec![])));
        assert_eq!(rx.recv().await, Some(ContextEvent::Visibility(true)));
    }

    #[tokio::test]
    async fn feed_survives_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let feed = ContextFeed::new(tx);
        drop(rx);
        // Must not panic.
        feed.handle(Topic::Orders, &json!([]));
    }

    #[test]
    fn subscription_guard_unsubscribes_on_drop() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let guard = SubscriptionGuard::new("patient", move || {
            flag.store(true, Ordering::Relaxed);
        });
        assert!(!fired.load(Ordering::Relaxed));
        drop(guard);
        assert!(fired.load(Ordering::Relaxed));
    }

    #[test]
    fn all_topics_have_wire_names() {
        let names: Vec<&str> = Topic::all().iter().map(|t| t.as_str()).collect();
        assert_eq!(names, ["patient", "orders", "encounter", "claim", "referral"]);
    }
}
