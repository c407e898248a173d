//! Engine state (Model in TEA pattern)

use std::fmt;

/// Night light status as last observed in the settings backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    On,
    Off,
}

impl Status {
    pub fn is_on(self) -> bool {
        self == Status::On
    }
}

impl From<bool> for Status {
    fn from(enabled: bool) -> Self {
        if enabled {
            Status::On
        } else {
            Status::Off
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::On => write!(f, "On"),
            Status::Off => write!(f, "Off"),
        }
    }
}

/// Mutable engine state, owned exclusively by the reconciliation loop
#[derive(Debug)]
pub struct EngineState {
    /// Last status confirmed by a backend read. Never assumed from a write.
    pub status: Status,

    /// True between the off-phase of a restart pulse and its resume step.
    /// Guards re-entrancy of the restart control surface.
    pub restart_in_flight: bool,

    /// True after a monitor-going-off notification that has not yet been
    /// consumed by a flicker or cleared by the next dispatch.
    pub monitor_armed: bool,
}

impl EngineState {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            restart_in_flight: false,
            monitor_armed: false,
        }
    }
}
