//! Startup policy flags
//!
//! The four policy bits are set once from the command line and never change
//! for the lifetime of the process. Unknown flags are ignored so that older
//! builds keep working when launchers pass newer options.

use clap::Parser;

/// Command line arguments
///
/// `ignore_errors` keeps unrecognized flags from aborting startup.
#[derive(Parser, Debug, Default)]
#[command(name = "nightlightd")]
#[command(about = "A night light watchdog daemon for GNOME desktops")]
#[command(ignore_errors = true)]
pub struct Args {
    /// Re-enable night light whenever a poll finds it off
    #[arg(long)]
    pub always_on: bool,

    /// Pulse night light off/on once at startup
    #[arg(long)]
    pub restart_on_startup: bool,

    /// Pulse night light off/on when the screen unlocks
    #[arg(long)]
    pub restart_on_unlock: bool,

    /// Pulse night light off/on when the monitor flickers back from power-off
    #[arg(long)]
    pub restart_on_monitor_flicker: bool,
}

/// Immutable policy derived from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    pub always_on: bool,
    pub restart_on_startup: bool,
    pub restart_on_unlock: bool,
    pub restart_on_monitor_flicker: bool,
}

impl From<&Args> for Policy {
    fn from(args: &Args) -> Self {
        Self {
            always_on: args.always_on,
            restart_on_startup: args.restart_on_startup,
            restart_on_unlock: args.restart_on_unlock,
            restart_on_monitor_flicker: args.restart_on_monitor_flicker,
        }
    }
}

impl Policy {
    /// Build a policy from raw flag strings, ignoring anything unrecognized.
    pub fn from_flags<I, T>(flags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let argv = std::iter::once("nightlightd".to_string())
            .chain(flags.into_iter().map(Into::into));
        match Args::try_parse_from(argv) {
            Ok(args) => Policy::from(&args),
            Err(_) => Policy::default(),
        }
    }

    /// Log the effective policy, one line per flag.
    pub fn log_summary(&self) {
        let state = |on: bool| if on { "Enabled" } else { "Disabled" };
        tracing::info!("---------------------------");
        tracing::info!("Always on: {}", state(self.always_on));
        tracing::info!("Restart on startup: {}", state(self.restart_on_startup));
        tracing::info!("Restart on unlock: {}", state(self.restart_on_unlock));
        tracing::info!(
            "Restart on monitor flicker: {}",
            state(self.restart_on_monitor_flicker)
        );
        tracing::info!("---------------------------");
    }
}
