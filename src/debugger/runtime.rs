use super::types::LineId;
use crate::variables::Variables;
use std::cell::RefCell;

/// Priority of a debugger pause. Matches the runtime's other "debug" stops.
pub const PAUSE_PRIORITY: u8 = 70;

/// Priority of a throttle yield; any real pause outranks it.
pub const THROTTLE_PRIORITY: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Full pause: the program waits for a resume or step command.
    Pause,
    /// Speed throttling: resume after the debugger's next delay.
    Throttle,
}

/// A request for the host to stop at its next safe point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopRequest {
    pub reason: StopReason,
    pub priority: u8,
}

impl StopRequest {
    pub fn pause() -> Self {
        Self {
            reason: StopReason::Pause,
            priority: PAUSE_PRIORITY,
        }
    }

    pub fn throttle() -> Self {
        Self {
            reason: StopReason::Throttle,
            priority: THROTTLE_PRIORITY,
        }
    }
}

/// What the debugger needs from the runtime executing the program.
///
/// All methods take `&self`; implementations keep their mutable state behind
/// `Cell`/`RefCell` because the debugger holds a shared handle while the
/// runtime is executing. The runtime must call the debugger's line hook once
/// per executed line, in execution order, without holding a borrow of its
/// variables across the call.
pub trait HostRuntime {
    /// Ask for a cooperative stop. A pending request with a higher priority
    /// is kept.
    fn request_stop(&self, request: StopRequest);

    /// Drop any pending stop request.
    fn clear_stop(&self);

    /// Route runtime errors to the debugger's error handler, or stop doing so.
    fn set_error_trap(&self, installed: bool);

    /// Return labels of the active GOSUB calls, innermost first.
    fn gosub_stack(&self) -> Vec<LineId>;

    fn gosub_depth(&self) -> usize {
        self.gosub_stack().len()
    }

    fn variables(&self) -> &RefCell<Variables>;

    /// Output from statements run in the console.
    fn print(&self, text: &str);
}
