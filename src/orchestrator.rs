//! Engagement notification orchestrator.
//!
//! Single logical thread of control: every context update, visibility
//! change, user action and timer expiry arrives as a [`Command`] on one
//! queue and is handled in delivery order. Delayed actions re-read the
//! *current* state when they fire — a timer carries only the session
//! generation it was scheduled under, and is ignored once a reset has
//! bumped it. Redundant snapshot delivery is harmless everywhere:
//! evaluation is idempotent over the latest snapshot and delivery is
//! deduplicated per key.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::badge;
use crate::config;
use crate::dispatch::{self, Channel, Outcome};
use crate::eligibility::{evaluate, Activation};
use crate::feed::ContextEvent;
use crate::host::HostClient;
use crate::identity::DedupKey;
use crate::locations::Provider;
use crate::models::{Order, PatientSnapshot};
use crate::session::{ResetController, SessionState, Transition};
use crate::telemetry::{events, TelemetrySink};

// ═══════════════════════════════════════════
// Signals
// ═══════════════════════════════════════════

/// Navigation signals to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    /// Back to the entry screen (context was torn down).
    Entry,
    /// Selection confirmed, show the confirmation screen.
    Confirmation,
}

/// Outcomes the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub enum UiSignal {
    Activation(Activation),
    /// Self-dismissing in-widget message.
    Toast(String),
    Navigate(Nav),
}

/// User interaction with a host push notification, reported back by
/// the host. The primary button also asks the host to bring the widget
/// to the foreground; that part needs no call from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Dismissed,
    SelectLab,
}

// ═══════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════

#[derive(Debug)]
enum Command {
    Context(ContextEvent),
    NotificationAction(NotificationAction),
    VendorSelected(Provider),
    SettleElapsed { generation: u64 },
    CollapseElapsed { generation: u64 },
    Shutdown,
}

// ═══════════════════════════════════════════
// Orchestrator
// ═══════════════════════════════════════════

/// Owns all per-session state and decides, on every update, whether to
/// (re)activate the widget, alert the user, and report engagement.
struct Orchestrator {
    session: SessionState,
    reset: ResetController,
    patient: Option<PatientSnapshot>,
    orders: Vec<Order>,
    host_visible: bool,
    /// Bumped on every session teardown; pending timers scheduled
    /// under an older generation are ignored when they expire.
    generation: u64,
    host: Arc<dyn HostClient>,
    telemetry: Arc<dyn TelemetrySink>,
    ui: mpsc::UnboundedSender<UiSignal>,
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Orchestrator {
    fn new(
        host: Arc<dyn HostClient>,
        telemetry: Arc<dyn TelemetrySink>,
        ui: mpsc::UnboundedSender<UiSignal>,
        cmd_tx: mpsc::UnboundedSender<Command>,
    ) -> Self {
        let host_visible = host.is_app_open();
        Self {
            session: SessionState::new(),
            reset: ResetController::new(),
            patient: None,
            orders: Vec::new(),
            host_visible,
            generation: 0,
            host,
            telemetry,
            ui,
            cmd_tx,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            if matches!(command, Command::Shutdown) {
                break;
            }
            self.handle(command);
        }
        tracing::info!("Orchestrator loop ended");
    }

    /// Handle one command. Synchronous on purpose: no suspension point
    /// can interleave another handler while session state is mid-update.
    fn handle(&mut self, command: Command) {
        match command {
            Command::Context(ContextEvent::Patient(patient)) => {
                self.patient = patient;
                self.after_context_change();
            }
            Command::Context(ContextEvent::Orders(orders)) => {
                self.orders = orders;
                self.after_context_change();
            }
            Command::Context(ContextEvent::Visibility(open)) => {
                let was_open = self.host_visible;
                self.host_visible = open;
                if open && !was_open {
                    badge::on_visibility_open(
                        &mut self.session,
                        &*self.host,
                        &*self.telemetry,
                    );
                }
            }
            Command::NotificationAction(NotificationAction::Dismissed) => {
                tracing::debug!("Push notification dismissed");
            }
            Command::NotificationAction(NotificationAction::SelectLab) => {
                if self.session.milestones.fire_notification_clicked() {
                    self.telemetry
                        .track(events::NOTIFICATION_CLICKED, serde_json::Value::Null);
                }
            }
            Command::VendorSelected(provider) => {
                self.telemetry.track(
                    events::VENDOR_SELECTED,
                    json!({ "vendor": provider.as_str() }),
                );
                self.send_ui(UiSignal::Navigate(Nav::Confirmation));
                self.schedule_collapse();
            }
            Command::SettleElapsed { generation } => {
                if generation == self.generation {
                    self.try_dispatch();
                } else {
                    tracing::debug!(generation, "Stale settle timer ignored");
                }
            }
            Command::CollapseElapsed { generation } => {
                if generation == self.generation {
                    if let Err(e) = self.host.close_app() {
                        tracing::warn!(error = %e, "Auto-collapse failed");
                    }
                } else {
                    tracing::debug!(generation, "Stale collapse timer ignored");
                }
            }
            // Consumed by run() before dispatching here.
            Command::Shutdown => {}
        }
    }

    // ── Context recompute ───────────────────────────────────

    fn after_context_change(&mut self) {
        let patient_id = self.patient.as_ref().and_then(|p| p.id.as_deref());
        match self.reset.observe(patient_id) {
            Transition::None => {}
            Transition::Started => self.begin_session(),
            Transition::Ended => self.end_session(),
            Transition::Changed => {
                self.end_session();
                self.begin_session();
            }
        }

        let (activation, eligible) = {
            let evaluation = evaluate(self.patient.as_ref(), &self.orders);
            (evaluation.activation, evaluation.eligible_order.cloned())
        };
        self.apply_activation(activation);
        badge::sync_on_activation(&mut self.session, self.host_visible, &*self.host);

        if let Some(order) = eligible {
            self.track_detection(&order);
            self.schedule_settle();
        }
    }

    fn begin_session(&mut self) {
        tracing::info!("Patient context started");
        if self.session.milestones.fire_login() {
            self.telemetry
                .track(events::SESSION_STARTED, serde_json::Value::Null);
        }
    }

    /// Clear all per-session state as one operation and invalidate
    /// every pending timer.
    fn end_session(&mut self) {
        tracing::info!(
            shown = self.session.shown_keys.len(),
            tracked = self.session.tracked_keys.len(),
            "Patient context ended — resetting session"
        );
        self.session.reset();
        // The previous patient's order list must not leak into the next
        // session; the host pushes a fresh snapshot for the new context.
        self.orders.clear();
        self.generation += 1;
        self.send_ui(UiSignal::Navigate(Nav::Entry));
    }

    fn apply_activation(&mut self, activation: Activation) {
        if self.session.activation == Some(activation) {
            return;
        }
        if let Err(e) = self.host.set_activation_status(activation) {
            tracing::warn!(error = %e, "Failed to update activation status");
        }
        self.session.activation = Some(activation);
        self.send_ui(UiSignal::Activation(activation));
        tracing::info!(%activation, "Activation updated");
    }

    /// "Order detected" telemetry, at-most-once per dedup key,
    /// decoupled from whether delivery later succeeds.
    fn track_detection(&mut self, order: &Order) {
        let Some(key) = DedupKey::for_opportunity(Some(order), self.patient.as_ref()) else {
            return;
        };
        if self.session.tracked_keys.mark_fired(key.clone()) {
            self.telemetry.track(
                events::LAB_ORDER_DETECTED,
                json!({ "dedup_key": key.as_str() }),
            );
        }
    }

    // ── Timers ──────────────────────────────────────────────

    /// Let a detected order settle briefly before surfacing it. The
    /// expiry handler re-reads current state; nothing is captured here
    /// except the generation.
    fn schedule_settle(&self) {
        let generation = self.generation;
        let tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(config::SETTLE_DELAY).await;
            let _ = tx.send(Command::SettleElapsed { generation });
        });
    }

    fn schedule_collapse(&self) {
        let generation = self.generation;
        let tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(config::AUTO_COLLAPSE_DELAY).await;
            let _ = tx.send(Command::CollapseElapsed { generation });
        });
    }

    fn try_dispatch(&mut self) {
        let eligible = evaluate(self.patient.as_ref(), &self.orders)
            .eligible_order
            .cloned();
        let Some(order) = eligible else {
            tracing::debug!("Order no longer eligible at settle expiry");
            return;
        };

        let outcome = dispatch::dispatch(
            &order,
            self.patient.as_ref(),
            self.host_visible,
            &mut self.session,
            &*self.host,
            &*self.telemetry,
        );
        if let Outcome::Delivered {
            channel: Channel::Toast,
            ..
        } = outcome
        {
            let text = dispatch::notification_text(self.patient.as_ref());
            self.send_ui(UiSignal::Toast(text));
        }
    }

    fn send_ui(&self, signal: UiSignal) {
        if self.ui.send(signal).is_err() {
            tracing::debug!("Presentation layer gone — UI signal dropped");
        }
    }
}

// ═══════════════════════════════════════════
// Handle
// ═══════════════════════════════════════════

/// Running orchestrator instance, one per widget session.
///
/// Dropping the handle shuts the loop down; pending timers become
/// no-ops because their channel is closed.
pub struct OrchestratorHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    context_tx: mpsc::UnboundedSender<ContextEvent>,
    join: JoinHandle<()>,
    forwarder: JoinHandle<()>,
}

impl OrchestratorHandle {
    /// Sender for the context feed adapter.
    pub fn context_sender(&self) -> mpsc::UnboundedSender<ContextEvent> {
        self.context_tx.clone()
    }

    /// The user picked a vendor in the widget.
    pub fn select_vendor(&self, provider: Provider) {
        let _ = self.cmd_tx.send(Command::VendorSelected(provider));
    }

    /// The host reported a notification interaction.
    pub fn notification_action(&self, action: NotificationAction) {
        let _ = self.cmd_tx.send(Command::NotificationAction(action));
    }

    /// Graceful shutdown: stop the loop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        let _ = self.join.await;
        self.forwarder.abort();
    }
}

/// Start the orchestrator on the current runtime.
///
/// Identifies the telemetry user from the host session context once at
/// startup. UI signals go to `ui`; feed the returned handle's context
/// sender into a [`crate::feed::ContextFeed`].
pub fn spawn(
    host: Arc<dyn HostClient>,
    telemetry: Arc<dyn TelemetrySink>,
    ui: mpsc::UnboundedSender<UiSignal>,
) -> OrchestratorHandle {
    if let Some(user_id) = host.session_user_id() {
        telemetry.identify(&user_id);
    }

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (context_tx, mut context_rx) = mpsc::unbounded_channel::<ContextEvent>();

    // Bridge feed events onto the command queue, preserving order.
    let bridge_tx = cmd_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(event) = context_rx.recv().await {
            if bridge_tx.send(Command::Context(event)).is_err() {
                break;
            }
        }
    });

    let orchestrator = Orchestrator::new(host, telemetry, ui, cmd_tx.clone());
    let join = tokio::spawn(orchestrator.run(cmd_rx));

    OrchestratorHandle {
        cmd_tx,
        context_tx,
        join,
        forwarder,
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
