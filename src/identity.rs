//! Identity tracking for at-most-once notification and telemetry.
//!
//! Every notification/tracking opportunity gets a stable [`DedupKey`]:
//! the EHR order id when present, else a key synthesized from the
//! patient id. No key means no delivery — without a stable identity we
//! cannot guarantee idempotence, so the opportunity is skipped.

use std::collections::HashSet;

use crate::models::{Order, PatientSnapshot};

/// Prefix for keys synthesized from the patient id when the order
/// carries no EHR order id yet.
const PATIENT_KEY_PREFIX: &str = "patient:";

/// Derived identity for a notification/tracking opportunity.
///
/// The same real-world order or patient context always yields the same
/// key within a session; distinct opportunities never share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    /// Derive the key for an opportunity, order id first, patient
    /// fallback second. Returns `None` when neither identity exists.
    pub fn for_opportunity(
        order: Option<&Order>,
        patient: Option<&PatientSnapshot>,
    ) -> Option<Self> {
        if let Some(id) = order.and_then(|o| o.ehr_order_id.as_deref()) {
            if !id.is_empty() {
                return Some(Self(id.to_string()));
            }
        }
        patient
            .and_then(|p| p.id.as_deref())
            .map(|id| Self(format!("{PATIENT_KEY_PREFIX}{id}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of keys that already fired. Marking an existing key is a no-op,
/// which makes every caller idempotent by construction.
#[derive(Debug, Default)]
pub struct FiredSet {
    keys: HashSet<DedupKey>,
}

impl FiredSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self, key: &DedupKey) -> bool {
        self.keys.contains(key)
    }

    /// Mark a key as fired. Returns `true` only on the first marking.
    pub fn mark_fired(&mut self, key: DedupKey) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
