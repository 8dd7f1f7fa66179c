use crate::debugger::{Debugger, HostRuntime, MAX_SPEED};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Debugger settings read from a JSON file. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebuggerConfig {
    pub speed: u8,
    pub break_on_error: bool,
    pub stop_on_entry: bool,
    pub breakpoints_file: Option<PathBuf>,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            speed: MAX_SPEED,
            break_on_error: false,
            stop_on_entry: false,
            breakpoints_file: None,
        }
    }
}

impl DebuggerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn apply<R: HostRuntime + ?Sized>(&self, debugger: &mut Debugger<R>) {
        debugger.set_speed(self.speed);
        debugger.set_break_on_error(self.break_on_error);
    }
}
