use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A source line identifier: a BASIC line number or a generated label.
/// Only numbers can carry breakpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineId {
    Number(u32),
    Label(String),
}

impl LineId {
    pub fn number(&self) -> Option<u32> {
        match self {
            LineId::Number(n) => Some(*n),
            LineId::Label(_) => None,
        }
    }
}

impl Default for LineId {
    fn default() -> Self {
        LineId::Number(0)
    }
}

impl From<u32> for LineId {
    fn from(n: u32) -> Self {
        LineId::Number(n)
    }
}

impl From<&str> for LineId {
    fn from(label: &str) -> Self {
        LineId::Label(label.to_string())
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineId::Number(n) => write!(f, "{n}"),
            LineId::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugState {
    Idle,
    Running,
    Paused,
    Stepping,
}

impl fmt::Display for DebugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DebugState::Idle => "idle",
            DebugState::Running => "running",
            DebugState::Paused => "paused",
            DebugState::Stepping => "stepping",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakpointId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub id: BreakpointId,
    pub line: u32,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub hit_count: u32,
}

/// One entry of the persisted breakpoint document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointEntry {
    pub line: u32,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// The breakpoint set as handed to whatever stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointState {
    #[serde(default)]
    pub breakpoints: Vec<BreakpointEntry>,
}

/// A runtime error captured by the error breakpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: i32,
    pub message: String,
    pub line: LineId,
    pub info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub len: Option<usize>,
}

/// Point-in-time view of the debuggee. Not updated as execution continues.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSnapshot {
    pub line: LineId,
    pub state: DebugState,
    /// Return labels, innermost call first.
    pub gosub_stack: Vec<LineId>,
    pub variables: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub return_label: LineId,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRange {
    pub line: LineId,
    pub start_pos: usize,
    pub end_pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DebugEventKind {
    Paused,
    Resumed,
    Step,
    Error,
    Breakpoint,
    StateChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugEvent {
    #[serde(rename = "type")]
    pub kind: DebugEventKind,
    pub snapshot: DebugSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoint: Option<Breakpoint>,
}
