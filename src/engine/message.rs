//! Message types for the reconciliation loop (TEA pattern)

/// Lifecycle notifications delivered by the session bus watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The screensaver reported the session locked
    ScreenLocked,
    /// The screensaver reported the session unlocked
    ScreenUnlocked,
    /// The idle monitor armed a user-active watch (display powering down)
    MonitorGoingOff,
    /// The idle monitor dropped its watch (display back without a flicker)
    MonitorRestored,
    /// A watch fired while a power-down was pending (display flickered back)
    MonitorFlicker,
}

/// All possible messages processed by the engine loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Periodic poll tick
    PollTick,

    /// Lifecycle event from the session bus
    Lifecycle(LifecycleEvent),

    // ─────────────────────────────────────────────────────────
    // Presenter Requests
    // ─────────────────────────────────────────────────────────
    /// User asked to turn night light on/off
    RequestToggle,
    /// User asked for a restart pulse
    RequestRestart,
    /// User asked for an out-of-band poll
    RequestRefresh,

    // ─────────────────────────────────────────────────────────
    // Internal Sequencing
    // ─────────────────────────────────────────────────────────
    /// Scheduled resume step of an in-flight restart pulse
    ResumeRestart,

    /// Request to quit the daemon
    Quit,
}
