//! Nightlightd Library
//!
//! A background watchdog that keeps the GNOME night light setting in line
//! with a startup policy and pulses it off/on when the session unlocks or
//! the monitor power-cycles.

// Module declarations
pub mod common;
pub mod engine;
pub mod policy;
pub mod presenter;
pub mod settings;
pub mod signals;
pub mod watcher;

// Re-export main entry points
pub use engine::{Engine, EngineHandle};
pub use policy::{Args, Policy};
