//! Typed snapshots of host-pushed clinical context.
//!
//! The host delivers loosely structured payloads; everything here is
//! optional at the wire level and validated before use. Snapshots are
//! immutable values replaced wholesale on every context update — the
//! orchestrator never mutates them in place.

use serde::Deserialize;

// ═══════════════════════════════════════════
// Normalized snapshots
// ═══════════════════════════════════════════

/// The active patient context. Absence of the whole snapshot (a `None`
/// at the call site) means no active clinical context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientSnapshot {
    /// Opaque patient identifier from the host EHR.
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
}

impl PatientSnapshot {
    /// Notification pre-condition: the personalized copy needs a name.
    pub fn has_display_name(&self) -> bool {
        self.first_name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Order type tag. Only `Lab` is relevant to activation/notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderType {
    Lab,
    Other(String),
}

impl OrderType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "LAB" => Self::Lab,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_lab(&self) -> bool {
        matches!(self, Self::Lab)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lab => write!(f, "LAB"),
            Self::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// A single clinical order from the host order list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub order_type: OrderType,
    /// EHR order id. `None` means the order is still unconfirmed.
    pub ehr_order_id: Option<String>,
    /// Created timestamp as reported by the EHR. `None` means pending.
    pub created_date: Option<String>,
}

impl Order {
    pub fn is_lab(&self) -> bool {
        self.order_type.is_lab()
    }

    /// The EHR has not assigned the order an id yet.
    pub fn is_unconfirmed(&self) -> bool {
        self.ehr_order_id.is_none()
    }
}

// ═══════════════════════════════════════════
// Raw wire shapes (lenient)
// ═══════════════════════════════════════════

/// Patient payload as pushed by the host. All fields optional; unknown
/// fields ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPatient {
    pub identifiers: RawPatientIdentifiers,
    pub demographics: RawDemographics,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPatientIdentifiers {
    pub patient_id: Option<String>,
    pub ehr_patient_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDemographics {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
}

/// Order payload as pushed by the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOrder {
    pub basic_information: RawOrderBasics,
    pub identifiers: RawOrderIdentifiers,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOrderBasics {
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub created_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOrderIdentifiers {
    pub ehr_order_id: Option<String>,
}

/// Empty strings from the EHR carry no identity; normalize them away.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<RawPatient> for PatientSnapshot {
    fn from(raw: RawPatient) -> Self {
        Self {
            // Prefer the host-scoped id, fall back to the EHR-native one.
            id: non_empty(raw.identifiers.patient_id)
                .or_else(|| non_empty(raw.identifiers.ehr_patient_id)),
            first_name: non_empty(raw.demographics.first_name),
            last_name: non_empty(raw.demographics.last_name),
            date_of_birth: non_empty(raw.demographics.date_of_birth),
        }
    }
}

impl From<RawOrder> for Order {
    fn from(raw: RawOrder) -> Self {
        Self {
            order_type: raw
                .basic_information
                .order_type
                .as_deref()
                .map(OrderType::from_tag)
                .unwrap_or_else(|| OrderType::Other(String::new())),
            ehr_order_id: non_empty(raw.identifiers.ehr_order_id),
            created_date: non_empty(raw.basic_information.created_date),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Patient with id and first name — the common eligible shape.
    pub fn patient(id: &str, first_name: &str) -> PatientSnapshot {
        PatientSnapshot {
            id: Some(id.to_string()),
            first_name: Some(first_name.to_string()),
            last_name: None,
            date_of_birth: None,
        }
    }

    pub fn lab_order(ehr_order_id: Option<&str>) -> Order {
        Order {
            order_type: OrderType::Lab,
            ehr_order_id: ehr_order_id.map(str::to_string),
            created_date: None,
        }
    }

    pub fn other_order(tag: &str) -> Order {
        Order {
            order_type: OrderType::from_tag(tag),
            ehr_order_id: None,
            created_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_type_lab_round_trip() {
        assert!(OrderType::from_tag("LAB").is_lab());
        assert_eq!(OrderType::from_tag("LAB").to_string(), "LAB");
        assert!(!OrderType::from_tag("DX").is_lab());
        assert_eq!(OrderType::from_tag("DX").to_string(), "DX");
    }

    #[test]
    fn raw_order_normalizes_empty_id_to_none() {
        let raw: RawOrder = serde_json::from_value(serde_json::json!({
            "basicInformation": { "type": "LAB", "createdDate": "" },
            "identifiers": { "ehrOrderId": "" }
        }))
        .unwrap();
        let order: Order = raw.into();
        assert!(order.is_lab());
        assert!(order.is_unconfirmed());
        assert!(order.created_date.is_none());
    }

    #[test]
    fn raw_order_keeps_present_id() {
        let raw: RawOrder = serde_json::from_value(serde_json::json!({
            "basicInformation": { "type": "LAB", "createdDate": "2026-08-20" },
            "identifiers": { "ehrOrderId": "o-42" }
        }))
        .unwrap();
        let order: Order = raw.into();
        assert_eq!(order.ehr_order_id.as_deref(), Some("o-42"));
        assert_eq!(order.created_date.as_deref(), Some("2026-08-20"));
    }

    #[test]
    fn raw_order_missing_sections_degrade() {
        let raw: RawOrder = serde_json::from_value(serde_json::json!({})).unwrap();
        let order: Order = raw.into();
        assert!(!order.is_lab());
        assert!(order.is_unconfirmed());
    }

    #[test]
    fn raw_patient_prefers_host_scoped_id() {
        let raw: RawPatient = serde_json::from_value(serde_json::json!({
            "identifiers": { "patientId": "p1", "ehrPatientId": "ehr-9" },
            "demographics": { "firstName": "Jane" }
        }))
        .unwrap();
        let patient: PatientSnapshot = raw.into();
        assert_eq!(patient.id.as_deref(), Some("p1"));
        assert!(patient.has_display_name());
    }

    #[test]
    fn raw_patient_falls_back_to_ehr_id() {
        let raw: RawPatient = serde_json::from_value(serde_json::json!({
            "identifiers": { "patientId": "", "ehrPatientId": "ehr-9" },
            "demographics": {}
        }))
        .unwrap();
        let patient: PatientSnapshot = raw.into();
        assert_eq!(patient.id.as_deref(), Some("ehr-9"));
        assert!(!patient.has_display_name());
    }

    #[test]
    fn whitespace_only_fields_normalize_to_none() {
        let raw: RawPatient = serde_json::from_value(serde_json::json!({
            "identifiers": { "patientId": "  " },
            "demographics": { "firstName": "   " }
        }))
        .unwrap();
        let patient: PatientSnapshot = raw.into();
        assert!(patient.id.is_none());
        assert!(!patient.has_display_name());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let raw: Result<RawPatient, _> = serde_json::from_value(serde_json::json!({
            "identifiers": { "patientId": "p1", "mrn": "123" },
            "demographics": { "firstName": "Jane", "pronouns": "they/them" },
            "insurance": { "plan": "X" }
        }));
        assert!(raw.is_ok());
    }
}
