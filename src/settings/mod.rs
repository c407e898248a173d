//! Settings backend - the single external boolean cell
//!
//! The engine is the sole writer in the normal flow, but outside actors
//! (GNOME control center, other indicators) can flip the key at any time,
//! which is why every mutation path in the engine re-reads instead of
//! trusting its own last write.

mod gsettings;
mod memory;

pub use gsettings::GsettingsStore;
pub use memory::MemoryStore;

use crate::common::prelude::*;

/// GSettings schema holding the night light switch
pub const NIGHT_LIGHT_SCHEMA: &str = "org.gnome.settings-daemon.plugins.color";

/// Key for the night light enabled boolean
pub const NIGHT_LIGHT_KEY: &str = "night-light-enabled";

/// Get/set access to one boolean setting.
///
/// Schema and key are fixed at construction; the trait itself carries no
/// identifiers. Both operations fail with `Error::Backend` when the store
/// is unreachable.
#[trait_variant::make(Send)]
pub trait SettingStore {
    /// Read the current value of the boolean
    async fn read_enabled(&self) -> Result<bool>;

    /// Write the boolean. No implicit read-back; callers that need
    /// authoritative status re-read afterward.
    async fn write_enabled(&self, value: bool) -> Result<()>;
}
