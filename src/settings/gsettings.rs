//! GSettings-backed setting store
//!
//! Shells out to the `gsettings` CLI rather than linking the GIO stack; the
//! key is read at most once per poll interval so process spawn cost is
//! irrelevant here.

use tokio::process::Command;

use super::{SettingStore, NIGHT_LIGHT_KEY, NIGHT_LIGHT_SCHEMA};
use crate::common::prelude::*;

/// Boolean setting stored under a fixed GSettings schema/key pair
#[derive(Debug, Clone)]
pub struct GsettingsStore {
    schema: String,
    key: String,
}

impl GsettingsStore {
    pub fn new(schema: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            key: key.into(),
        }
    }

    /// Store over the GNOME night light switch
    pub fn night_light() -> Self {
        Self::new(NIGHT_LIGHT_SCHEMA, NIGHT_LIGHT_KEY)
    }
}

impl SettingStore for GsettingsStore {
    async fn read_enabled(&self) -> Result<bool> {
        let output = Command::new("gsettings")
            .args(["get", &self.schema, &self.key])
            .output()
            .await
            .map_err(|e| Error::backend(format!("failed to run gsettings: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::backend(format!(
                "gsettings get failed: {}",
                stderr.trim()
            )));
        }

        parse_boolean(&String::from_utf8_lossy(&output.stdout))
    }

    async fn write_enabled(&self, value: bool) -> Result<()> {
        let literal = if value { "true" } else { "false" };
        let output = Command::new("gsettings")
            .args(["set", &self.schema, &self.key, literal])
            .output()
            .await
            .map_err(|e| Error::backend(format!("failed to run gsettings: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::backend(format!(
                "gsettings set failed: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Parse the output of `gsettings get` for a boolean key
fn parse_boolean(raw: &str) -> Result<bool> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::backend(format!(
            "unexpected gsettings value: {:?}",
            other
        ))),
    }
}
