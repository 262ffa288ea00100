//! The orchestrator that ties the binding table, the session state machine
//! and the dispatcher together.
//!
//! [`GestureManager`] is the only consumer of gesture events.  It owns the
//! session slot and the dispatcher, and reads the binding table through a
//! [`SharedBindings`] handle so reloads published from another thread take
//! effect at the next event.

use crate::bindings::SharedBindings;
use crate::dispatch::Dispatch;
use crate::gesture::{GestureAttrs, GestureEvent};
use crate::session::{EndOutcome, GestureSession, SessionState};
use crate::traits::GestureHandler;
use log::{debug, info};
use std::sync::mpsc;

/// Routes gesture events through the session machine and fires completed
/// gestures' actions.
///
/// # Typical usage
///
/// ```ignore
/// let bindings = SharedBindings::default();
/// bindings.reload(&config.gestures);
/// let mut manager = GestureManager::new(bindings, ActionDispatcher::new(desktop));
/// manager.run(event_rx);
/// ```
pub struct GestureManager<X: Dispatch> {
    bindings: SharedBindings,
    session: GestureSession,
    dispatcher: X,
}

impl<X: Dispatch> GestureManager<X> {
    pub fn new(bindings: SharedBindings, dispatcher: X) -> Self {
        Self {
            bindings,
            session: GestureSession::new(),
            dispatcher,
        }
    }

    pub fn session(&self) -> &SessionState {
        self.session.state()
    }

    pub fn dispatcher(&self) -> &X {
        &self.dispatcher
    }

    pub fn bindings(&self) -> &SharedBindings {
        &self.bindings
    }

    /// Process events until every sender has been dropped.
    pub fn run(&mut self, events: mpsc::Receiver<GestureEvent>) {
        info!("touchbind running");
        for event in events {
            self.handle(&event);
        }
        info!("all event sources closed, exiting");
    }
}

impl<X: Dispatch> GestureHandler for GestureManager<X> {
    fn begin(&mut self, attrs: &GestureAttrs) {
        let table = self.bindings.load();
        self.session.begin(attrs, &table);
    }

    fn update(&mut self, attrs: &GestureAttrs) {
        self.session.update(attrs);
    }

    fn end(&mut self, attrs: &GestureAttrs) {
        let table = self.bindings.load();
        match self.session.end(attrs, &table) {
            EndOutcome::Fired(action) => {
                info!("{} gesture completed, running {}", attrs.kind, action);
                self.dispatcher.dispatch(&action);
            }
            outcome => debug!("gesture ended without action: {:?}", outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionSpec, BuiltinAction};
    use crate::config::GestureSettings;
    use crate::dispatch::tests::{RecordingDesktop, RecordingLauncher};
    use crate::dispatch::ActionDispatcher;
    use crate::gesture::{DeviceType, GestureDirection, GestureType};

    /// Dispatcher double that only records what it was asked to run.
    #[derive(Default)]
    struct Recorder {
        dispatched: Vec<ActionSpec>,
    }

    impl Dispatch for Recorder {
        fn dispatch(&mut self, action: &ActionSpec) {
            self.dispatched.push(action.clone());
        }
    }

    fn bindings(threshold: u32) -> SharedBindings {
        let mut settings = GestureSettings::with_bindings([
            ("swipe-left-3", "WORKSPACE_NEXT"),
            ("swipe-right-3", "WORKSPACE_PREVIOUS"),
            ("tap-2", "EXEC:notify-send hello"),
        ]);
        settings.swipe_percent_threshold = threshold;
        let shared = SharedBindings::default();
        shared.reload(&settings);
        shared
    }

    fn make_manager() -> GestureManager<Recorder> {
        GestureManager::new(bindings(50), Recorder::default())
    }

    fn attrs(kind: GestureType, direction: GestureDirection, percentage: f64, fingers: u32) -> GestureAttrs {
        GestureAttrs {
            kind,
            direction,
            percentage,
            fingers,
            device: DeviceType::Touchpad,
            time: 0,
        }
    }

    fn left(p: f64) -> GestureAttrs {
        attrs(GestureType::Swipe, GestureDirection::Left, p, 3)
    }

    fn right(p: f64) -> GestureAttrs {
        attrs(GestureType::Swipe, GestureDirection::Right, p, 3)
    }

    const NEXT: ActionSpec = ActionSpec::Builtin(BuiltinAction::WorkspaceNext);
    const PREVIOUS: ActionSpec = ActionSpec::Builtin(BuiltinAction::WorkspacePrevious);

    #[test]
    fn completed_swipe_dispatches_once() {
        let mut m = make_manager();
        m.begin(&left(10.0));
        m.update(&left(40.0));
        m.end(&left(60.0));
        assert_eq!(m.dispatcher().dispatched, vec![NEXT]);
        assert_eq!(m.session(), &SessionState::Idle);
    }

    #[test]
    fn incomplete_swipe_dispatches_nothing() {
        let mut m = make_manager();
        m.begin(&left(10.0));
        m.update(&left(20.0));
        m.end(&left(30.0));
        assert!(m.dispatcher().dispatched.is_empty());
        assert_eq!(m.session(), &SessionState::Idle);
    }

    #[test]
    fn updates_never_dispatch() {
        let mut m = make_manager();
        m.begin(&left(10.0));
        for p in [60.0, 80.0, 100.0] {
            m.update(&left(p));
        }
        assert!(m.dispatcher().dispatched.is_empty());
        assert!(matches!(m.session(), SessionState::Active(_)));
    }

    #[test]
    fn restarted_gesture_uses_only_new_binding() {
        let mut m = make_manager();
        m.begin(&left(10.0));
        m.begin(&right(0.0));
        m.end(&right(80.0));
        assert_eq!(m.dispatcher().dispatched, vec![PREVIOUS]);
    }

    #[test]
    fn mismatched_events_never_dispatch() {
        let mut m = make_manager();
        m.begin(&left(10.0));
        m.update(&right(70.0));
        m.end(&right(90.0));
        assert!(m.dispatcher().dispatched.is_empty());
        assert_eq!(m.session(), &SessionState::Idle);
    }

    #[test]
    fn tap_dispatches_at_zero_percent() {
        let mut m = make_manager();
        let tap = attrs(GestureType::Tap, GestureDirection::Unknown, 0.0, 2);
        m.begin(&tap);
        m.end(&tap);
        assert_eq!(
            m.dispatcher().dispatched,
            vec![ActionSpec::Exec("notify-send hello".into())]
        );
    }

    #[test]
    fn handle_routes_tagged_events() {
        let mut m = make_manager();
        for ev in [
            GestureEvent::Begin(left(10.0)),
            GestureEvent::Update(left(40.0)),
            GestureEvent::End(left(60.0)),
        ] {
            m.handle(&ev);
        }
        assert_eq!(m.dispatcher().dispatched, vec![NEXT]);
    }

    #[test]
    fn reload_between_gestures_takes_effect() {
        let mut m = make_manager();
        let writer = m.bindings().clone();
        writer.reload(&GestureSettings::with_bindings([("swipe-left-3", "CLOSE")]));

        m.begin(&left(0.0));
        m.end(&left(100.0));
        assert_eq!(
            m.dispatcher().dispatched,
            vec![ActionSpec::Builtin(BuiltinAction::Close)]
        );
    }

    #[test]
    fn run_drains_channel_in_order() {
        let mut m = make_manager();
        let (tx, rx) = mpsc::channel();
        let tap = attrs(GestureType::Tap, GestureDirection::Unknown, 0.0, 2);
        for ev in [
            GestureEvent::Begin(left(10.0)),
            GestureEvent::End(left(60.0)),
            GestureEvent::Begin(tap.clone()),
            GestureEvent::End(tap),
        ] {
            tx.send(ev).unwrap();
        }
        drop(tx);
        m.run(rx);
        assert_eq!(
            m.dispatcher().dispatched,
            vec![NEXT, ActionSpec::Exec("notify-send hello".into())]
        );
    }

    /// End-to-end: events through the manager into a recording desktop.
    #[test]
    fn swipe_switches_workspace_on_desktop() {
        let dispatcher =
            ActionDispatcher::with_launcher(RecordingDesktop::default(), RecordingLauncher::default());
        dispatcher.set_natural_scroll(false);
        let mut m = GestureManager::new(bindings(50), dispatcher);

        m.begin(&left(10.0));
        m.update(&left(40.0));
        m.end(&left(60.0));
        // Natural scroll off: next is to the left of workspace 2.
        assert_eq!(m.dispatcher().desktop().calls(), vec!["activate 1"]);

        m.begin(&left(10.0));
        m.end(&left(30.0));
        assert_eq!(m.dispatcher().desktop().calls(), vec!["activate 1"]);
    }

    #[test]
    fn exec_failure_does_not_disturb_the_session() {
        let dispatcher = ActionDispatcher::with_launcher(
            RecordingDesktop::default(),
            RecordingLauncher {
                fail: true,
                ..RecordingLauncher::default()
            },
        );
        let mut m = GestureManager::new(bindings(50), dispatcher);
        let tap = attrs(GestureType::Tap, GestureDirection::Unknown, 0.0, 2);
        m.begin(&tap);
        m.end(&tap);
        assert_eq!(m.session(), &SessionState::Idle);
        assert_eq!(
            m.dispatcher().launcher().launched.borrow()[0],
            vec!["notify-send", "hello"]
        );

        // The next gesture still works.
        m.begin(&tap);
        m.end(&tap);
        assert_eq!(m.dispatcher().launcher().launched.borrow().len(), 2);
    }
}
