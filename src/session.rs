//! The gesture session state machine.
//!
//! At most one gesture is tracked at a time.  The machine is either
//! [`SessionState::Idle`] or [`SessionState::Active`]:
//!
//! ```text
//!            begin                       update (key matches)
//!   Idle ───────────────▶ Active ◀───────────────────────┐
//!    ▲                     │  │                          │
//!    │        end          │  └──────────────────────────┘
//!    └─────────────────────┘
//! ```
//!
//! * `begin` while `Active` discards the stale session and starts over.
//! * `update` with a different key than the one the session started with is
//!   ignored and the session is kept.
//! * `end` always returns to `Idle`, whether or not anything fires.
//!
//! The machine never dispatches anything itself.  [`GestureSession::end`]
//! returns an [`EndOutcome`] and the caller acts on
//! [`EndOutcome::Fired`].

use crate::action::ActionSpec;
use crate::bindings::{Binding, BindingTable, Thresholds};
use crate::gesture::{DeviceType, GestureAttrs, GestureKey, GestureType};
use log::{debug, warn};

/// A gesture between its `begin` and `end` events.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    /// Key derived from the `begin` event; `None` for gestures that cannot
    /// be bound (unsupported type, unknown direction).
    pub key: Option<GestureKey>,
    /// Binding captured at `begin`; `None` when the gesture is unmapped.
    pub binding: Option<Binding>,
    pub device: DeviceType,
    pub started_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    Active(ActiveSession),
}

/// What an `update` event did.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The event belongs to the active session.
    Tracked,
    /// The event's key differs from the session's key; ignored.
    Mismatch,
    /// No session is active; ignored.
    NoSession,
}

/// What an `end` event did.  The session is `Idle` afterwards in every case.
#[derive(Debug, Clone, PartialEq)]
pub enum EndOutcome {
    /// The gesture completed and this action must be dispatched once.
    Fired(ActionSpec),
    /// The gesture is bound but did not reach its threshold.
    BelowThreshold,
    /// The gesture has no binding.
    Unbound,
    /// The event's key differs from the session's key.
    Mismatch,
    /// No session was active.
    NoSession,
}

/// Whether a gesture that ended at `percentage` counts as completed.
///
/// Taps always complete.  Swipes and pinches complete when the floor of
/// `percentage` is at least their threshold.  Anything else never completes.
pub fn threshold_reached(kind: GestureType, percentage: f64, thresholds: Thresholds) -> bool {
    let meets = |threshold: u32| {
        percentage.is_finite() && percentage.floor() >= f64::from(threshold)
    };
    match kind {
        GestureType::Tap => true,
        GestureType::Swipe => meets(thresholds.swipe),
        GestureType::Pinch => meets(thresholds.pinch),
        GestureType::Unsupported => false,
    }
}

/// Owner of the single session slot.
#[derive(Debug, Default)]
pub struct GestureSession {
    state: SessionState,
}

impl GestureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Start a new session.  Returns `true` if a stale session was discarded.
    pub fn begin(&mut self, attrs: &GestureAttrs, table: &BindingTable) -> bool {
        let replaced = self.is_active();
        if replaced {
            warn!("new gesture started before another was completed, clearing the old one");
        }

        let key = attrs.key();
        let binding = key.and_then(|k| table.lookup(&k)).cloned();
        debug!(
            "gesture started: ({}) {} {} fingers: {} → {}",
            attrs.device,
            attrs.kind,
            attrs.direction,
            attrs.fingers,
            binding
                .as_ref()
                .map(|b| b.action.to_string())
                .unwrap_or_else(|| "unbound".into())
        );

        self.state = SessionState::Active(ActiveSession {
            key,
            binding,
            device: attrs.device,
            started_at: attrs.time,
        });
        replaced
    }

    /// Validate an `update` against the active session.
    pub fn update(&mut self, attrs: &GestureAttrs) -> UpdateOutcome {
        let SessionState::Active(session) = &self.state else {
            warn!("gesture update without an active gesture, ignoring");
            return UpdateOutcome::NoSession;
        };
        if attrs.key() != session.key {
            warn!("gesture mismatch (update event does not match starting gesture)");
            return UpdateOutcome::Mismatch;
        }
        debug!("gesture update: progress: {}", attrs.percentage.floor());
        UpdateOutcome::Tracked
    }

    /// Finish the active session and decide whether its action fires.
    ///
    /// The binding captured at `begin` is used, so a reload in the middle of
    /// a gesture cannot change which action fires.  Thresholds come from
    /// `table`, the latest published table.
    pub fn end(&mut self, attrs: &GestureAttrs, table: &BindingTable) -> EndOutcome {
        let SessionState::Active(session) = std::mem::take(&mut self.state) else {
            warn!("gesture end without an active gesture, ignoring");
            return EndOutcome::NoSession;
        };

        if attrs.key() != session.key {
            warn!("gesture mismatch (end event does not match starting gesture)");
            return EndOutcome::Mismatch;
        }

        let Some(binding) = session.binding else {
            debug!("{} end: no action bound", attrs.kind);
            return EndOutcome::Unbound;
        };

        let reached = threshold_reached(attrs.kind, attrs.percentage, table.thresholds());
        debug!(
            "{} end: progress: {} after {}ms - activating {}? {}",
            attrs.kind,
            attrs.percentage.floor(),
            attrs.time.saturating_sub(session.started_at),
            binding.action,
            if reached { "yes" } else { "no" }
        );

        if reached {
            EndOutcome::Fired(binding.action)
        } else {
            EndOutcome::BelowThreshold
        }
    }
}
