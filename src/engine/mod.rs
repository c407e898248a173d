//! Reconciliation engine - the single serialized decision point
//!
//! Every external stimulus (poll timer, session bus events, user requests)
//! is funneled into one message channel drained by one loop, so backend
//! reads and writes never interleave unpredictably. The engine owns
//! `EngineState`; nothing else mutates it.

pub mod message;
pub mod state;

#[cfg(test)]
mod tests;

use std::time::Duration;

use tokio::sync::mpsc;

use crate::common::prelude::*;
use crate::policy::Policy;
use crate::presenter::StatusPresenter;
use crate::settings::SettingStore;

pub use message::{LifecycleEvent, Message};
pub use state::{EngineState, Status};

/// How often the backend is polled for drift
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Delay between the off-phase and the resume step of a restart pulse
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(1);

/// Message channel capacity
const CHANNEL_CAPACITY: usize = 64;

/// Cloneable handle for feeding requests into the engine loop
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Message>,
}

impl EngineHandle {
    /// Raw sender, for input sources that produce messages themselves
    pub fn sender(&self) -> mpsc::Sender<Message> {
        self.tx.clone()
    }

    pub async fn request_toggle(&self) -> Result<()> {
        self.send(Message::RequestToggle).await
    }

    pub async fn request_restart(&self) -> Result<()> {
        self.send(Message::RequestRestart).await
    }

    pub async fn request_refresh(&self) -> Result<()> {
        self.send(Message::RequestRefresh).await
    }

    pub async fn quit(&self) -> Result<()> {
        self.send(Message::Quit).await
    }

    async fn send(&self, msg: Message) -> Result<()> {
        self.tx.send(msg).await.map_err(|_| Error::ChannelClosed)
    }
}

/// Reconciliation engine over a settings backend and a presenter
pub struct Engine<S, P> {
    state: EngineState,
    policy: Policy,
    store: S,
    presenter: P,
    msg_tx: mpsc::Sender<Message>,
    msg_rx: mpsc::Receiver<Message>,
    poll_interval: Duration,
    restart_delay: Duration,
}

impl<S, P> Engine<S, P>
where
    S: SettingStore,
    P: StatusPresenter,
{
    /// Create the engine and read the initial status from the backend.
    ///
    /// Fails with `Error::Backend` if the backend is unreachable; there is
    /// no degraded mode, the caller is expected to exit. If the policy asks
    /// for a restart on startup the pulse begins here, before the loop runs;
    /// its resume step is queued behind whatever arrives first.
    pub async fn start(policy: Policy, store: S, presenter: P) -> Result<Self> {
        let status = Status::from(store.read_enabled().await?);
        info!("Night light is: {}", status);

        let (msg_tx, msg_rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);

        let mut engine = Self {
            state: EngineState::new(status),
            policy,
            store,
            presenter,
            msg_tx,
            msg_rx,
            poll_interval: DEFAULT_POLL_INTERVAL,
            restart_delay: DEFAULT_RESTART_DELAY,
        };

        if policy.restart_on_startup {
            engine.begin_restart().await;
        }

        Ok(engine)
    }

    /// Override the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the restart resume delay
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Handle for input sources and the presenter request surface
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            tx: self.msg_tx.clone(),
        }
    }

    /// Last status confirmed by a backend read
    pub fn status(&self) -> Status {
        self.state.status
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &EngineState {
        &self.state
    }

    /// Run the reconciliation loop until `Message::Quit` arrives.
    pub async fn run(&mut self) {
        spawn_poll_ticker(self.msg_tx.clone(), self.poll_interval);

        while let Some(msg) = self.msg_rx.recv().await {
            if msg == Message::Quit {
                info!("Quit requested");
                break;
            }
            self.dispatch(msg).await;
        }
    }

    /// Process a single message. Exposed so tests can drive the engine
    /// without the loop.
    pub async fn dispatch(&mut self, msg: Message) {
        match msg {
            Message::PollTick => self.poll(false).await,
            Message::RequestRefresh => self.poll(true).await,
            Message::RequestToggle => self.toggle().await,
            Message::RequestRestart => self.begin_restart().await,
            Message::ResumeRestart => self.finish_restart().await,
            Message::Lifecycle(event) => self.handle_lifecycle(event).await,
            Message::Quit => {}
        }
    }

    /// Read the backend and reconcile.
    ///
    /// A forced poll (user refresh) reports the fresh status at info level,
    /// the periodic one stays quiet unless something changed.
    async fn poll(&mut self, forced: bool) {
        let enabled = match self.store.read_enabled().await {
            Ok(value) => value,
            Err(e) => return self.on_backend_error("poll", e),
        };
        let fresh = Status::from(enabled);

        if forced {
            info!("Night light is: {}", fresh);
        }

        if self.policy.always_on && fresh == Status::Off {
            debug!("always-on: re-enabling night light");
            if let Err(e) = self.enable().await {
                return self.on_backend_error("always-on enable", e);
            }
        }

        // The status change is emitted for the value actually read; the
        // always-on write above is only observed by the next poll.
        if fresh != self.state.status {
            self.state.status = fresh;
            self.presenter.on_status_changed(fresh);
        }
    }

    /// Flip the setting, then re-read so the presenter sees backend truth.
    async fn toggle(&mut self) {
        let write = if self.state.status.is_on() {
            self.disable().await
        } else {
            self.enable().await
        };
        if let Err(e) = write {
            return self.on_backend_error("toggle", e);
        }

        match self.store.read_enabled().await {
            Ok(value) => {
                let fresh = Status::from(value);
                self.state.status = fresh;
                self.presenter.on_status_changed(fresh);
            }
            Err(e) => self.on_backend_error("toggle re-read", e),
        }
    }

    /// Phase one of the restart pulse: force off now, schedule the resume.
    ///
    /// A no-op while a pulse is already in flight, so concurrent triggers
    /// (unlock mid-restart, double click) never double-schedule the resume.
    async fn begin_restart(&mut self) {
        if self.state.restart_in_flight {
            debug!("restart already in flight, ignoring");
            return;
        }

        self.state.restart_in_flight = true;
        self.presenter.on_restart_started();

        if let Err(e) = self.disable().await {
            return self.on_backend_error("restart off-phase", e);
        }

        let tx = self.msg_tx.clone();
        let delay = self.restart_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Message::ResumeRestart).await;
        });
    }

    /// Phase two: force on, re-read, report.
    async fn finish_restart(&mut self) {
        if !self.state.restart_in_flight {
            // The pulse was abandoned after a backend error.
            return;
        }

        if let Err(e) = self.enable().await {
            return self.on_backend_error("restart resume", e);
        }

        match self.store.read_enabled().await {
            Ok(value) => {
                let fresh = Status::from(value);
                self.state.status = fresh;
                self.presenter.on_status_changed(fresh);
                self.presenter.on_restart_finished();
                self.state.restart_in_flight = false;
            }
            Err(e) => self.on_backend_error("restart re-read", e),
        }
    }

    /// Apply the policy to a lifecycle event.
    ///
    /// Every dispatch except `MonitorGoingOff` clears the armed flag, so a
    /// flicker consumes the pending power-down exactly once. This mirrors
    /// the noisy signal sequence the idle monitor actually produces.
    async fn handle_lifecycle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::ScreenLocked => {
                info!("Screen locked");
            }
            LifecycleEvent::ScreenUnlocked => {
                info!("Screen unlocked");
                if self.policy.restart_on_unlock {
                    self.begin_restart().await;
                }
            }
            LifecycleEvent::MonitorGoingOff => {
                info!("Monitor off");
                self.state.monitor_armed = true;
                return;
            }
            LifecycleEvent::MonitorRestored => {
                info!("Monitor on");
            }
            LifecycleEvent::MonitorFlicker => {
                info!("Monitor flickers");
                if self.state.monitor_armed && self.policy.restart_on_monitor_flicker {
                    self.begin_restart().await;
                }
            }
        }
        self.state.monitor_armed = false;
    }

    /// Write True to the backend. No implicit read-back; callers that need
    /// authoritative status re-read afterward.
    async fn enable(&mut self) -> Result<()> {
        self.store.write_enabled(true).await
    }

    /// Write False to the backend
    async fn disable(&mut self) -> Result<()> {
        self.store.write_enabled(false).await
    }

    /// Backend failure mid-run: abandon the operation, reset transient
    /// flags, let the next poll converge once the backend returns. The
    /// presenter is released from a pending restart but never told why.
    fn on_backend_error(&mut self, context: &str, err: Error) {
        error!("backend error during {}: {}", context, err);
        if self.state.restart_in_flight {
            self.state.restart_in_flight = false;
            self.presenter.on_restart_finished();
        }
        self.state.monitor_armed = false;
    }
}

/// Spawn the periodic poll ticker feeding `Message::PollTick` into the loop
fn spawn_poll_ticker(tx: mpsc::Sender<Message>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; the loop below starts
        // polling one full interval after startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if tx.send(Message::PollTick).await.is_err() {
                break;
            }
        }
    });
}
