//! Tests for the reconciliation engine

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::*;
use crate::policy::Policy;
use crate::presenter::StatusPresenter;
use crate::settings::MemoryStore;

/// Everything the engine told the presenter, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PresenterEvent {
    Status(Status),
    RestartStarted,
    RestartFinished,
}

#[derive(Debug, Clone, Default)]
struct RecordingPresenter {
    events: Arc<Mutex<Vec<PresenterEvent>>>,
}

impl RecordingPresenter {
    fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, event: PresenterEvent) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }
}

impl StatusPresenter for RecordingPresenter {
    fn on_status_changed(&mut self, status: Status) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::Status(status));
    }

    fn on_restart_started(&mut self) {
        self.events.lock().unwrap().push(PresenterEvent::RestartStarted);
    }

    fn on_restart_finished(&mut self) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::RestartFinished);
    }
}

/// Engine over a memory store, with handles kept for inspection
async fn engine_with(
    policy: Policy,
    initial: bool,
) -> (
    Engine<MemoryStore, RecordingPresenter>,
    MemoryStore,
    RecordingPresenter,
) {
    let store = MemoryStore::new(initial);
    let presenter = RecordingPresenter::new();
    let engine = Engine::start(policy, store.clone(), presenter.clone())
        .await
        .expect("engine start");
    (engine, store, presenter)
}

// ─────────────────────────────────────────────────────────────────
// Poll
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_poll_tracks_backend_value() {
    let (mut engine, store, presenter) = engine_with(Policy::default(), true).await;
    assert_eq!(engine.status(), Status::On);

    // Outside actor flips the key
    store.set_value(false);
    engine.dispatch(Message::PollTick).await;
    assert_eq!(engine.status(), Status::Off);
    assert_eq!(presenter.events(), vec![PresenterEvent::Status(Status::Off)]);

    store.set_value(true);
    engine.dispatch(Message::PollTick).await;
    assert_eq!(engine.status(), Status::On);
    assert_eq!(
        presenter.events(),
        vec![
            PresenterEvent::Status(Status::Off),
            PresenterEvent::Status(Status::On)
        ]
    );
}

#[tokio::test]
async fn test_settled_poll_emits_nothing() {
    let (mut engine, _store, presenter) = engine_with(Policy::default(), true).await;

    engine.dispatch(Message::PollTick).await;
    engine.dispatch(Message::PollTick).await;

    assert!(presenter.events().is_empty());
    assert_eq!(engine.status(), Status::On);
}

#[tokio::test]
async fn test_always_on_converges() {
    let policy = Policy {
        always_on: true,
        ..Policy::default()
    };
    let (mut engine, store, presenter) = engine_with(policy, true).await;

    store.set_value(false);
    engine.dispatch(Message::PollTick).await;

    // Exactly one enable write; the poll reports what it read
    assert_eq!(store.writes(), vec![true]);
    assert!(store.value());
    assert_eq!(engine.status(), Status::Off);

    engine.dispatch(Message::PollTick).await;
    assert_eq!(engine.status(), Status::On);
    assert_eq!(store.writes(), vec![true]);
    assert_eq!(
        presenter.events(),
        vec![
            PresenterEvent::Status(Status::Off),
            PresenterEvent::Status(Status::On)
        ]
    );
}

#[tokio::test]
async fn test_refresh_forces_a_poll() {
    let (mut engine, store, presenter) = engine_with(Policy::default(), true).await;

    store.set_value(false);
    engine.dispatch(Message::RequestRefresh).await;

    assert_eq!(engine.status(), Status::Off);
    assert_eq!(presenter.events(), vec![PresenterEvent::Status(Status::Off)]);
}

// ─────────────────────────────────────────────────────────────────
// Toggle
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_toggle_flips_and_rereads() {
    let (mut engine, store, presenter) = engine_with(Policy::default(), true).await;

    engine.dispatch(Message::RequestToggle).await;
    assert_eq!(engine.status(), Status::Off);
    assert_eq!(store.writes(), vec![false]);
    assert_eq!(presenter.events(), vec![PresenterEvent::Status(Status::Off)]);
}

#[tokio::test]
async fn test_toggle_twice_returns_to_original() {
    let (mut engine, store, _presenter) = engine_with(Policy::default(), true).await;

    engine.dispatch(Message::RequestToggle).await;
    engine.dispatch(Message::RequestToggle).await;

    // Two writes, none skipped or duplicated, back where we started
    assert_eq!(store.writes(), vec![false, true]);
    assert_eq!(engine.status(), Status::On);
    assert!(store.value());
}

// ─────────────────────────────────────────────────────────────────
// Restart pulse
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_restart_two_phase_sequence() {
    let (mut engine, store, presenter) = engine_with(Policy::default(), true).await;

    engine.dispatch(Message::RequestRestart).await;
    assert!(engine.state().restart_in_flight);
    assert!(!store.value());
    assert_eq!(store.writes(), vec![false]);
    assert_eq!(presenter.events(), vec![PresenterEvent::RestartStarted]);

    engine.dispatch(Message::ResumeRestart).await;
    assert!(!engine.state().restart_in_flight);
    assert!(store.value());
    assert_eq!(store.writes(), vec![false, true]);
    // StatusChanged(On) strictly before RestartFinished
    assert_eq!(
        presenter.events(),
        vec![
            PresenterEvent::RestartStarted,
            PresenterEvent::Status(Status::On),
            PresenterEvent::RestartFinished
        ]
    );
}

#[tokio::test]
async fn test_restart_is_idempotent_while_in_flight() {
    let (mut engine, store, presenter) = engine_with(Policy::default(), true).await;

    engine.dispatch(Message::RequestRestart).await;
    engine.dispatch(Message::RequestRestart).await;
    engine.dispatch(Message::RequestRestart).await;

    // No extra backend writes, no extra started emission
    assert_eq!(store.writes(), vec![false]);
    assert_eq!(presenter.count(PresenterEvent::RestartStarted), 1);

    engine.dispatch(Message::ResumeRestart).await;
    assert_eq!(store.writes(), vec![false, true]);
    assert_eq!(presenter.count(PresenterEvent::RestartFinished), 1);
}

#[tokio::test]
async fn test_resume_without_pulse_is_a_noop() {
    let (mut engine, store, presenter) = engine_with(Policy::default(), true).await;

    engine.dispatch(Message::ResumeRestart).await;

    assert!(store.writes().is_empty());
    assert!(presenter.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_restart_end_to_end_through_the_loop() {
    let store = MemoryStore::new(true);
    let presenter = RecordingPresenter::new();
    let mut engine = Engine::start(Policy::default(), store.clone(), presenter.clone())
        .await
        .expect("engine start");
    let handle = engine.handle();

    let task = tokio::spawn(async move {
        engine.run().await;
    });

    handle.request_restart().await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Off-phase took effect immediately
    assert!(!store.value());
    assert_eq!(presenter.events(), vec![PresenterEvent::RestartStarted]);

    // Let the scheduled resume elapse
    tokio::time::sleep(DEFAULT_RESTART_DELAY + Duration::from_millis(100)).await;

    assert!(store.value());
    assert_eq!(store.writes(), vec![false, true]);
    assert_eq!(
        presenter.events(),
        vec![
            PresenterEvent::RestartStarted,
            PresenterEvent::Status(Status::On),
            PresenterEvent::RestartFinished
        ]
    );

    handle.quit().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_poll_ticker_drives_reconciliation() {
    let store = MemoryStore::new(true);
    let presenter = RecordingPresenter::new();
    let mut engine = Engine::start(Policy::default(), store.clone(), presenter.clone())
        .await
        .expect("engine start");
    let handle = engine.handle();

    let task = tokio::spawn(async move {
        engine.run().await;
    });

    // Outside actor flips the key; the next periodic tick picks it up
    store.set_value(false);
    tokio::time::sleep(DEFAULT_POLL_INTERVAL + Duration::from_millis(100)).await;

    assert_eq!(presenter.events(), vec![PresenterEvent::Status(Status::Off)]);

    handle.quit().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_startup_restart_policy_pulses_immediately() {
    let policy = Policy {
        restart_on_startup: true,
        ..Policy::default()
    };
    let (engine, store, presenter) = engine_with(policy, true).await;

    assert!(engine.state().restart_in_flight);
    assert!(!store.value());
    assert_eq!(presenter.events(), vec![PresenterEvent::RestartStarted]);
}

// ─────────────────────────────────────────────────────────────────
// Lifecycle events
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unlock_restarts_when_policy_set() {
    let policy = Policy {
        restart_on_unlock: true,
        ..Policy::default()
    };
    let (mut engine, store, presenter) = engine_with(policy, true).await;

    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::ScreenUnlocked))
        .await;

    assert!(engine.state().restart_in_flight);
    assert_eq!(store.writes(), vec![false]);
    assert_eq!(presenter.count(PresenterEvent::RestartStarted), 1);
}

#[tokio::test]
async fn test_unlock_without_policy_writes_nothing() {
    let (mut engine, store, presenter) = engine_with(Policy::default(), true).await;

    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::ScreenLocked))
        .await;
    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::ScreenUnlocked))
        .await;

    assert!(store.writes().is_empty());
    assert!(presenter.events().is_empty());
}

#[tokio::test]
async fn test_flicker_consumes_armed_state_once() {
    let policy = Policy {
        restart_on_monitor_flicker: true,
        ..Policy::default()
    };
    let (mut engine, store, presenter) = engine_with(policy, true).await;

    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::MonitorGoingOff))
        .await;
    assert!(engine.state().monitor_armed);

    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::MonitorFlicker))
        .await;
    assert!(!engine.state().monitor_armed);
    assert_eq!(presenter.count(PresenterEvent::RestartStarted), 1);
    assert_eq!(store.writes(), vec![false]);

    // Finish the pulse, then a lone flicker must not restart again
    engine.dispatch(Message::ResumeRestart).await;
    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::MonitorFlicker))
        .await;
    assert_eq!(presenter.count(PresenterEvent::RestartStarted), 1);
}

#[tokio::test]
async fn test_flicker_without_going_off_is_ignored() {
    let policy = Policy {
        restart_on_monitor_flicker: true,
        ..Policy::default()
    };
    let (mut engine, store, presenter) = engine_with(policy, true).await;

    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::MonitorFlicker))
        .await;

    assert!(store.writes().is_empty());
    assert!(presenter.events().is_empty());
}

#[tokio::test]
async fn test_monitor_restored_disarms() {
    let policy = Policy {
        restart_on_monitor_flicker: true,
        ..Policy::default()
    };
    let (mut engine, store, _presenter) = engine_with(policy, true).await;

    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::MonitorGoingOff))
        .await;
    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::MonitorRestored))
        .await;
    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::MonitorFlicker))
        .await;

    // Normal power-off/on: flicker after restore does not restart
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_any_dispatch_between_going_off_and_flicker_disarms() {
    let policy = Policy {
        restart_on_monitor_flicker: true,
        ..Policy::default()
    };
    let (mut engine, store, _presenter) = engine_with(policy, true).await;

    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::MonitorGoingOff))
        .await;
    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::ScreenLocked))
        .await;
    assert!(!engine.state().monitor_armed);

    engine
        .dispatch(Message::Lifecycle(LifecycleEvent::MonitorFlicker))
        .await;
    assert!(store.writes().is_empty());
}

// ─────────────────────────────────────────────────────────────────
// Backend failures
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_startup_fails_when_backend_unreachable() {
    let store = MemoryStore::new(true);
    store.set_offline(true);

    let result = Engine::start(Policy::default(), store, RecordingPresenter::new()).await;
    assert!(matches!(result, Err(Error::Backend { .. })));
}

#[tokio::test]
async fn test_poll_survives_backend_outage() {
    let (mut engine, store, presenter) = engine_with(Policy::default(), true).await;

    store.set_offline(true);
    engine.dispatch(Message::PollTick).await;
    assert_eq!(engine.status(), Status::On);
    assert!(presenter.events().is_empty());

    // Backend returns with a new value; the next poll converges
    store.set_offline(false);
    store.set_value(false);
    engine.dispatch(Message::PollTick).await;
    assert_eq!(engine.status(), Status::Off);
}

#[tokio::test]
async fn test_backend_failure_mid_restart_resets_flags() {
    let (mut engine, store, presenter) = engine_with(Policy::default(), true).await;

    store.set_offline(true);
    engine.dispatch(Message::RequestRestart).await;

    // Pulse abandoned: flags reset, presenter released
    assert!(!engine.state().restart_in_flight);
    assert!(!engine.state().monitor_armed);
    assert_eq!(
        presenter.events(),
        vec![
            PresenterEvent::RestartStarted,
            PresenterEvent::RestartFinished
        ]
    );

    // A stale resume from the abandoned pulse is ignored
    engine.dispatch(Message::ResumeRestart).await;
    assert_eq!(presenter.count(PresenterEvent::RestartFinished), 1);

    // Once the backend is back, a new pulse works end to end
    store.set_offline(false);
    engine.dispatch(Message::RequestRestart).await;
    engine.dispatch(Message::ResumeRestart).await;
    assert_eq!(store.writes(), vec![false, true]);
    assert_eq!(presenter.count(PresenterEvent::RestartFinished), 2);
}
