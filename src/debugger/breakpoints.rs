use super::types::{Breakpoint, BreakpointEntry, BreakpointId, BreakpointState};
use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Breakpoints keyed by BASIC line number; at most one per line.
#[derive(Debug, Default)]
pub struct Breakpoints {
    points: BTreeMap<u32, Breakpoint>,
    next_id: u64,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the breakpoint at `line`, replacing whatever was there.
    pub fn add(&mut self, line: u32, condition: Option<String>) -> Breakpoint {
        self.next_id += 1;
        let bp = Breakpoint {
            id: BreakpointId(self.next_id),
            line,
            enabled: true,
            condition,
            hit_count: 0,
        };
        debug!(line, condition = ?bp.condition, "breakpoint set");
        self.points.insert(line, bp.clone());
        bp
    }

    pub fn remove(&mut self, line: u32) -> Option<Breakpoint> {
        let removed = self.points.remove(&line);
        if removed.is_some() {
            debug!(line, "breakpoint removed");
        }
        removed
    }

    /// Flips `enabled` on an existing breakpoint, or adds an enabled one.
    pub fn toggle(&mut self, line: u32) -> Breakpoint {
        match self.points.get_mut(&line) {
            Some(bp) => {
                bp.enabled = !bp.enabled;
                debug!(line, enabled = bp.enabled, "breakpoint toggled");
                bp.clone()
            }
            None => self.add(line, None),
        }
    }

    pub fn get(&self, line: u32) -> Option<&Breakpoint> {
        self.points.get(&line)
    }

    pub(crate) fn get_mut(&mut self, line: u32) -> Option<&mut Breakpoint> {
        self.points.get_mut(&line)
    }

    pub fn contains(&self, line: u32) -> bool {
        self.points.contains_key(&line)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.points.values()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn export(&self) -> BreakpointState {
        BreakpointState {
            breakpoints: self
                .points
                .values()
                .map(|bp| BreakpointEntry {
                    line: bp.line,
                    enabled: bp.enabled,
                    condition: bp.condition.clone(),
                })
                .collect(),
        }
    }

    /// Replaces the whole set with the entries of `state`.
    pub fn import(&mut self, state: &BreakpointState) {
        self.clear();
        for entry in &state.breakpoints {
            self.add(entry.line, entry.condition.clone());
            if let Some(bp) = self.points.get_mut(&entry.line) {
                bp.enabled = entry.enabled;
            }
        }
    }
}

impl BreakpointState {
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a breakpoint file. A missing file is an empty set.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
