//! Activation and notification-worthiness rules.
//!
//! Pure and total: absent or malformed fields degrade to "not
//! eligible", never to an error. Rules in precedence order:
//! 1. No patient → disabled, no eligible order.
//! 2. Patient but no LAB order → disabled, no eligible order.
//! 3. Patient and at least one LAB order → enabled; the eligible order
//!    is the first LAB order, provided the patient has a display name
//!    (the notification copy is personalized).

use serde::Serialize;

use crate::models::{Order, PatientSnapshot};

/// Widget activation decision, last value sent to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Activation {
    Enabled,
    Disabled,
}

impl Activation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
        }
    }
}

impl std::fmt::Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of evaluating the current snapshots.
#[derive(Debug)]
pub struct Evaluation<'a> {
    pub activation: Activation,
    /// The order worth notifying about, when one exists.
    pub eligible_order: Option<&'a Order>,
}

/// Evaluate the current patient/orders snapshots.
pub fn evaluate<'a>(
    patient: Option<&PatientSnapshot>,
    orders: &'a [Order],
) -> Evaluation<'a> {
    let Some(patient) = patient else {
        return Evaluation {
            activation: Activation::Disabled,
            eligible_order: None,
        };
    };

    let first_lab = orders.iter().find(|o| o.is_lab());
    let Some(first_lab) = first_lab else {
        return Evaluation {
            activation: Activation::Disabled,
            eligible_order: None,
        };
    };

    Evaluation {
        activation: Activation::Enabled,
        eligible_order: patient.has_display_name().then_some(first_lab),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::{lab_order, other_order, patient};

    #[test]
    fn no_patient_disables() {
        let orders = vec![lab_order(Some("o1"))];
        let eval = evaluate(None, &orders);
        assert_eq!(eval.activation, Activation::Disabled);
        assert!(eval.eligible_order.is_none());
    }

    #[test]
    fn patient_without_lab_order_disables() {
        let orders = vec![other_order("DX"), other_order("RX")];
        let eval = evaluate(Some(&patient("p1", "Jane")), &orders);
        assert_eq!(eval.activation, Activation::Disabled);
        assert!(eval.eligible_order.is_none());
    }

    #[test]
    fn patient_with_empty_order_list_disables() {
        let eval = evaluate(Some(&patient("p1", "Jane")), &[]);
        assert_eq!(eval.activation, Activation::Disabled);
    }

    #[test]
    fn patient_with_lab_order_enables() {
        let orders = vec![other_order("DX"), lab_order(Some("o1"))];
        let eval = evaluate(Some(&patient("p1", "Jane")), &orders);
        assert_eq!(eval.activation, Activation::Enabled);
        assert_eq!(
            eval.eligible_order.and_then(|o| o.ehr_order_id.as_deref()),
            Some("o1")
        );
    }

    #[test]
    fn first_lab_order_wins() {
        let orders = vec![lab_order(Some("o1")), lab_order(Some("o2"))];
        let eval = evaluate(Some(&patient("p1", "Jane")), &orders);
        assert_eq!(
            eval.eligible_order.and_then(|o| o.ehr_order_id.as_deref()),
            Some("o1")
        );
    }

    #[test]
    fn nameless_patient_enables_but_is_not_notification_worthy() {
        let nameless = PatientSnapshot {
            id: Some("p1".into()),
            first_name: None,
            last_name: None,
            date_of_birth: None,
        };
        let orders = vec![lab_order(Some("o1"))];
        let eval = evaluate(Some(&nameless), &orders);
        assert_eq!(eval.activation, Activation::Enabled);
        assert!(eval.eligible_order.is_none());
    }

    #[test]
    fn activation_wire_form() {
        assert_eq!(Activation::Enabled.as_str(), "ENABLED");
        assert_eq!(Activation::Disabled.to_string(), "DISABLED");
        assert_eq!(
            serde_json::to_string(&Activation::Enabled).unwrap(),
            "\"ENABLED\""
        );
    }
}
