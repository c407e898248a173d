//! Nightlightd - night light watchdog for GNOME desktops
//!
//! This is the binary entry point. All logic lives in the library.

use std::process::ExitCode;

use clap::Parser;
use nightlightd::common::logging;
use nightlightd::common::prelude::*;
use nightlightd::presenter::{spawn_stdin_control, LogPresenter};
use nightlightd::settings::GsettingsStore;
use nightlightd::watcher::LifecycleWatcher;
use nightlightd::{signals, Args, Engine, Policy};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let policy = Policy::from(&args);

    if let Err(e) = logging::init() {
        eprintln!("warning: failed to initialize logging: {}", e);
    }
    policy.log_summary();

    let store = GsettingsStore::night_light();
    let presenter = LogPresenter::new();

    let mut engine = match Engine::start(policy, store, presenter).await {
        Ok(engine) => engine,
        Err(e) => {
            // No degraded mode: an indicator with no reliable backend has
            // no purpose, so say so once and exit non-zero.
            error!("{}", e);
            eprintln!("nightlightd: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let handle = engine.handle();
    signals::spawn_signal_handler(handle.sender());
    spawn_stdin_control(handle.sender());

    if let Err(e) = LifecycleWatcher::start(handle.sender()).await {
        warn!("running without lifecycle events: {}", e);
    }

    engine.run().await;

    info!("Nightlightd exiting");
    ExitCode::SUCCESS
}
