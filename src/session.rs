//! Per-session dedup and milestone state, plus the reset controller.
//!
//! `SessionState` is the single owned value behind every "has this
//! fired" question; it lives for exactly one active patient context and
//! is cleared as one atomic operation when that context ends. Only the
//! orchestrator mutates it.

use crate::eligibility::Activation;
use crate::identity::FiredSet;

// ═══════════════════════════════════════════
// Session state
// ═══════════════════════════════════════════

/// Session-scoped single-fire events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MilestoneFlags {
    /// A notification popup was shown at least once.
    pub popup_shown: bool,
    /// The widget was opened in the host at least once.
    pub app_opened: bool,
    /// The unread badge was set this session.
    pub badge_set: bool,
    /// The push notification's primary action was clicked.
    pub notification_clicked: bool,
    /// Session start was reported to telemetry.
    pub login: bool,
}

impl MilestoneFlags {
    /// Fire a flag. Returns `true` only the first time.
    fn fire(flag: &mut bool) -> bool {
        let first = !*flag;
        *flag = true;
        first
    }

    pub fn fire_popup_shown(&mut self) -> bool {
        Self::fire(&mut self.popup_shown)
    }

    pub fn fire_app_opened(&mut self) -> bool {
        Self::fire(&mut self.app_opened)
    }

    pub fn fire_badge_set(&mut self) -> bool {
        Self::fire(&mut self.badge_set)
    }

    pub fn fire_notification_clicked(&mut self) -> bool {
        Self::fire(&mut self.notification_clicked)
    }

    pub fn fire_login(&mut self) -> bool {
        Self::fire(&mut self.login)
    }
}

/// All per-session state, owned by the orchestrator.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Keys already delivered a notification.
    pub shown_keys: FiredSet,
    /// Keys already reported as "detected" to telemetry.
    pub tracked_keys: FiredSet,
    pub milestones: MilestoneFlags,
    /// Last activation value sent to the host, if any.
    pub activation: Option<Activation>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything in one operation. A fresh patient context must
    /// see no trace of the previous one.
    pub fn reset(&mut self) {
        self.shown_keys.clear();
        self.tracked_keys.clear();
        self.milestones = MilestoneFlags::default();
        self.activation = None;
    }
}

// ═══════════════════════════════════════════
// Reset controller
// ═══════════════════════════════════════════

/// Patient-presence transition observed by the reset controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Same phase, same patient: redundant snapshot delivery. Must not
    /// reset anything — this is the central idempotence guarantee.
    None,
    /// Idle → active: a patient context began.
    Started,
    /// Active → idle: the patient left; clear all session state.
    Ended,
    /// Active → active with a different patient id: the previous
    /// context ended and a new one began in the same update.
    Changed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Active { patient_id: String },
}

/// Watches patient presence and decides when the session resets.
#[derive(Debug)]
pub struct ResetController {
    phase: Phase,
}

impl ResetController {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    /// Observe the current patient id (or its absence) and report the
    /// transition, if any. Idle→idle and same-patient active→active
    /// observations report [`Transition::None`].
    pub fn observe(&mut self, patient_id: Option<&str>) -> Transition {
        let transition = match (&self.phase, patient_id) {
            (Phase::Idle, None) => Transition::None,
            (Phase::Idle, Some(_)) => Transition::Started,
            (Phase::Active { .. }, None) => Transition::Ended,
            (Phase::Active { patient_id: current }, Some(id)) => {
                if current.as_str() == id {
                    Transition::None
                } else {
                    Transition::Changed
                }
            }
        };

        match (&transition, patient_id) {
            (Transition::Started | Transition::Changed, Some(id)) => {
                self.phase = Phase::Active {
                    patient_id: id.to_string(),
                };
            }
            (Transition::Ended, _) => self.phase = Phase::Idle,
            _ => {}
        }
        transition
    }
}

impl Default for ResetController {
    fn default() -> Self {
        Self::new()
    }
}
