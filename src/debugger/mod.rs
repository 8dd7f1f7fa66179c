//! The debugger engine: breakpoints, stepping, throttling and the error
//! breakpoint, all driven from the runtime's per-line hook.

mod breakpoints;
mod context;
mod events;
mod runtime;
mod speed;
mod stepping;
mod types;

pub use breakpoints::Breakpoints;
pub use context::{ConditionEvaluator, Debugger};
pub use events::{EventBus, Listener, ListenerId};
pub use runtime::{HostRuntime, StopReason, StopRequest, PAUSE_PRIORITY, THROTTLE_PRIORITY};
pub use speed::{SpeedPolicy, MAX_SPEED};
pub use stepping::{call_stack, StepMode};
pub use types::{
    Breakpoint, BreakpointEntry, BreakpointId, BreakpointState, DebugEvent, DebugEventKind,
    DebugSnapshot, DebugState, ErrorInfo, LineId, LineRange, StackFrame,
};
