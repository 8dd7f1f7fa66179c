use super::breakpoints::Breakpoints;
use super::events::{EventBus, ListenerId};
use super::runtime::{HostRuntime, StopRequest};
use super::speed::{SpeedPolicy, MAX_SPEED};
use super::stepping::{self, StepMode};
use super::types::{
    Breakpoint, BreakpointState, DebugEvent, DebugEventKind, DebugSnapshot, DebugState, ErrorInfo,
    LineId, LineRange, StackFrame,
};
use crate::error::{EvalError, RuntimeFault};
use crate::evaluator::Evaluator;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::{debug, info, trace, warn};

/// Decides whether a breakpoint condition holds.
pub type ConditionEvaluator = Box<dyn FnMut(&str) -> Result<bool, EvalError>>;

/// The debugger state machine, driven by the runtime's line hook.
pub struct Debugger<R: HostRuntime + ?Sized> {
    runtime: Rc<R>,
    state: DebugState,
    breakpoints: Breakpoints,
    speed: u8,
    speed_policy: SpeedPolicy,
    break_on_error: bool,
    last_error: Option<ErrorInfo>,
    step_mode: Option<StepMode>,
    step_depth: usize,
    /// Line whose breakpoint must not fire on the next visit.
    skip_breakpoint: Option<u32>,
    /// Line whose error must not pause again right after a resume.
    skip_error_line: Option<LineId>,
    /// Set when a step starts so the line it starts from does not complete it.
    skip_step_check: bool,
    /// Line a throttle yield stopped on. Its re-entry is not counted again.
    throttled_line: Option<LineId>,
    current_line: LineId,
    line_counter: u32,
    next_delay: u64,
    source_map: HashMap<String, (usize, usize)>,
    condition_evaluator: Option<ConditionEvaluator>,
    evaluator: Option<Evaluator>,
    events: EventBus,
}

impl<R: HostRuntime + ?Sized> Debugger<R> {
    /// Attaches to `runtime` and installs the error trap.
    pub fn new(runtime: Rc<R>) -> Self {
        runtime.set_error_trap(true);
        Self {
            runtime,
            state: DebugState::Idle,
            breakpoints: Breakpoints::new(),
            speed: MAX_SPEED,
            speed_policy: SpeedPolicy::default(),
            break_on_error: false,
            last_error: None,
            step_mode: None,
            step_depth: 0,
            skip_breakpoint: None,
            skip_error_line: None,
            skip_step_check: false,
            throttled_line: None,
            current_line: LineId::default(),
            line_counter: 0,
            next_delay: 0,
            source_map: HashMap::new(),
            condition_evaluator: None,
            evaluator: None,
            events: EventBus::default(),
        }
    }

    pub fn runtime(&self) -> &Rc<R> {
        &self.runtime
    }

    pub fn state(&self) -> DebugState {
        self.state
    }

    pub fn current_line(&self) -> &LineId {
        &self.current_line
    }

    /// Delay in milliseconds the host should wait before resuming after the
    /// last line. Zero unless that line hit a throttle boundary.
    pub fn next_delay(&self) -> u64 {
        self.next_delay
    }

    pub fn on(&mut self, listener: impl Fn(&DebugEvent) + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&self, kind: DebugEventKind, breakpoint: Option<Breakpoint>) {
        if self.events.is_empty() {
            return;
        }
        let event = DebugEvent {
            kind,
            snapshot: self.snapshot(),
            breakpoint,
        };
        self.events.emit(&event);
    }

    fn set_state(&mut self, state: DebugState) {
        if self.state == state {
            return;
        }
        debug!(from = %self.state, to = %state, "debugger state change");
        self.state = state;
        self.emit(DebugEventKind::StateChange, None);
    }

    /// A program run begins: leave idle and forget markers from earlier runs.
    pub fn start(&mut self) {
        self.clear_markers();
        self.line_counter = 0;
        self.set_state(DebugState::Running);
    }

    /// Back to idle. Breakpoints and settings are kept.
    pub fn reset(&mut self) {
        self.clear_markers();
        self.line_counter = 0;
        self.next_delay = 0;
        self.set_state(DebugState::Idle);
    }

    /// Removes the error trap from the runtime.
    pub fn detach(&mut self) {
        self.runtime.set_error_trap(false);
    }

    fn clear_markers(&mut self) {
        self.step_mode = None;
        self.step_depth = 0;
        self.skip_breakpoint = None;
        self.skip_error_line = None;
        self.skip_step_check = false;
        self.throttled_line = None;
        self.last_error = None;
    }

    pub fn pause(&mut self) {
        self.set_state(DebugState::Paused);
        self.runtime.request_stop(StopRequest::pause());
        self.emit(DebugEventKind::Paused, None);
    }

    pub fn resume(&mut self) {
        if let Some(error) = self.last_error.take() {
            self.skip_error_line = Some(error.line);
        }
        if self.state == DebugState::Paused {
            self.skip_breakpoint = self.current_line.number();
        }
        self.step_mode = None;
        self.set_state(DebugState::Running);
        self.runtime.clear_stop();
        self.emit(DebugEventKind::Resumed, None);
    }

    pub fn step_into(&mut self) {
        self.begin_step(StepMode::Into);
    }

    pub fn step_over(&mut self) {
        self.begin_step(StepMode::Over);
    }

    pub fn step_out(&mut self) {
        self.begin_step(StepMode::Out);
    }

    fn begin_step(&mut self, mode: StepMode) {
        if self.state == DebugState::Idle {
            debug!(?mode, "step ignored, no program running");
            return;
        }
        if let Some(error) = self.last_error.take() {
            self.skip_error_line = Some(error.line);
        }
        if self.state == DebugState::Paused {
            self.skip_breakpoint = self.current_line.number();
            self.skip_step_check = true;
        }
        self.step_mode = Some(mode);
        self.step_depth = self.runtime.gosub_depth();
        trace!(?mode, depth = self.step_depth, "step");
        self.set_state(DebugState::Stepping);
        self.runtime.clear_stop();
    }

    /// Called by the runtime before each line executes.
    pub fn on_line(&mut self, line: LineId) {
        self.current_line = line;
        self.next_delay = 0;
        if self.state == DebugState::Idle {
            return;
        }

        if self
            .skip_error_line
            .as_ref()
            .is_some_and(|skipped| *skipped != self.current_line)
        {
            self.skip_error_line = None;
        }

        if self.throttled_line.take().as_ref() == Some(&self.current_line) {
            trace!(line = %self.current_line, "resumed after throttle yield");
            return;
        }

        // The host re-enters the hook for the line it stopped on.
        let resumed_here =
            self.skip_breakpoint.is_some() && self.skip_breakpoint == self.current_line.number();

        let hit = self.check_breakpoint();
        let step_done = hit.is_none() && self.check_step();

        if hit.is_none() && !step_done {
            if !resumed_here {
                self.throttle();
            }
            return;
        }

        self.step_mode = None;
        self.line_counter = 0;
        self.set_state(DebugState::Paused);
        self.runtime.request_stop(StopRequest::pause());
        match hit {
            Some(breakpoint) => {
                info!(line = breakpoint.line, hits = breakpoint.hit_count, "breakpoint hit");
                self.emit(DebugEventKind::Breakpoint, Some(breakpoint));
            }
            None => self.emit(DebugEventKind::Step, None),
        }
    }

    fn check_breakpoint(&mut self) -> Option<Breakpoint> {
        let line = self.current_line.number()?;
        // Spent on the first numeric line visited, breakpoint or not.
        if let Some(skip) = self.skip_breakpoint.take() {
            if skip == line {
                return None;
            }
        }

        let condition = {
            let breakpoint = self.breakpoints.get(line)?;
            if !breakpoint.enabled {
                return None;
            }
            breakpoint.condition.clone()
        };

        if let (Some(condition), Some(evaluate)) = (condition, self.condition_evaluator.as_mut()) {
            match evaluate(&condition) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(err) => {
                    warn!(line, %condition, error = %err, "breakpoint condition failed");
                    return None;
                }
            }
        }

        let breakpoint = self.breakpoints.get_mut(line)?;
        breakpoint.hit_count += 1;
        Some(breakpoint.clone())
    }

    fn check_step(&mut self) -> bool {
        let Some(mode) = self.step_mode else {
            return false;
        };
        if std::mem::take(&mut self.skip_step_check) {
            return false;
        }
        mode.should_pause(self.runtime.gosub_depth(), self.step_depth)
    }

    fn throttle(&mut self) {
        let Some(chunk) = self.speed_policy.lines_per_chunk else {
            return;
        };
        if self.speed == 0 {
            self.set_state(DebugState::Paused);
            self.runtime.request_stop(StopRequest::pause());
            self.emit(DebugEventKind::Step, None);
            return;
        }
        self.line_counter += 1;
        if self.line_counter >= chunk {
            self.line_counter = 0;
            self.next_delay = self.speed_policy.delay_ms;
            self.throttled_line = Some(self.current_line.clone());
            trace!(delay_ms = self.next_delay, "throttle yield");
            self.runtime.request_stop(StopRequest::throttle());
            self.emit(DebugEventKind::Step, None);
        }
    }

    /// The runtime's error trap. Returns whether the debugger took the error
    /// and paused; `false` lets the program's own handling proceed.
    pub fn handle_error(&mut self, fault: &RuntimeFault) -> bool {
        if !self.break_on_error {
            return false;
        }
        let line = fault.line.clone().unwrap_or_else(|| self.current_line.clone());
        if self.skip_error_line.as_ref() == Some(&line) {
            self.skip_error_line = None;
            debug!(%line, "error already reported on this line, passing through");
            return false;
        }

        let code = fault.code.map_or(-1, i32::from);
        warn!(%line, code, message = %fault.message, "runtime error");
        self.last_error = Some(ErrorInfo {
            code,
            message: fault.message.clone(),
            line: line.clone(),
            info: fault.info.clone(),
            pos: fault.pos,
            len: fault.len,
        });
        self.current_line = line;
        self.step_mode = None;
        self.set_state(DebugState::Paused);
        self.runtime.request_stop(StopRequest::pause());
        self.emit(DebugEventKind::Error, None);
        true
    }

    pub fn set_break_on_error(&mut self, enabled: bool) {
        self.break_on_error = enabled;
    }

    pub fn break_on_error(&self) -> bool {
        self.break_on_error
    }

    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    /// Sets the speed, clamped to `0..=100`, and restarts the line count.
    pub fn set_speed(&mut self, speed: u8) {
        self.speed = speed.min(MAX_SPEED);
        self.speed_policy = SpeedPolicy::for_speed(self.speed);
        self.line_counter = 0;
        debug!(speed = self.speed, policy = ?self.speed_policy, "speed changed");
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn add_breakpoint(&mut self, line: u32, condition: Option<String>) -> Breakpoint {
        self.breakpoints.add(line, condition)
    }

    pub fn remove_breakpoint(&mut self, line: u32) -> Option<Breakpoint> {
        self.breakpoints.remove(line)
    }

    pub fn toggle_breakpoint(&mut self, line: u32) -> Breakpoint {
        self.breakpoints.toggle(line)
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn breakpoint(&self, line: u32) -> Option<&Breakpoint> {
        self.breakpoints.get(line)
    }

    /// Breakpoints in line order.
    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        self.breakpoints.iter().cloned().collect()
    }

    pub fn export_breakpoints(&self) -> BreakpointState {
        self.breakpoints.export()
    }

    pub fn import_breakpoints(&mut self, state: &BreakpointState) {
        self.breakpoints.import(state);
    }

    pub fn set_condition_evaluator(&mut self, evaluator: Option<ConditionEvaluator>) {
        self.condition_evaluator = evaluator;
    }

    pub fn snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            line: self.current_line.clone(),
            state: self.state,
            gosub_stack: self.runtime.gosub_stack(),
            variables: self.variables(),
            error: self.last_error.clone(),
        }
    }

    /// Frames from the current line outwards.
    pub fn call_stack(&self) -> Vec<StackFrame> {
        stepping::call_stack(&self.current_line, &self.runtime.gosub_stack())
    }

    pub fn variables(&self) -> BTreeMap<String, Value> {
        self.runtime.variables().borrow().to_map()
    }

    /// Maps line labels to `(start, length)` character spans in the source.
    pub fn set_source_map(&mut self, source_map: HashMap<String, (usize, usize)>) {
        self.source_map = source_map;
    }

    pub fn line_range(&self, line: &LineId) -> Option<LineRange> {
        let &(start, len) = self.source_map.get(&line.to_string())?;
        Some(LineRange {
            line: line.clone(),
            start_pos: start,
            end_pos: start + len,
        })
    }

    pub fn current_line_range(&self) -> Option<LineRange> {
        self.line_range(&self.current_line)
    }

    pub fn set_evaluator(&mut self, evaluator: Option<Evaluator>) {
        self.evaluator = evaluator;
    }

    /// Evaluates an expression against the paused program's variables.
    pub fn eval(&self, expression: &str) -> Result<Value, EvalError> {
        let evaluator = self.evaluator.ok_or(EvalError::NoEvaluator)?;
        if self.state != DebugState::Paused {
            return Err(EvalError::NotPaused("evaluate"));
        }
        evaluator.evaluate(expression, &*self.runtime)
    }

    /// Executes a statement in the paused program's context.
    pub fn exec(&self, statement: &str) -> Result<(), EvalError> {
        let evaluator = self.evaluator.ok_or(EvalError::NoEvaluator)?;
        if self.state != DebugState::Paused {
            return Err(EvalError::NotPaused("execute"));
        }
        evaluator.execute(statement, &*self.runtime)
    }
}

impl<R: HostRuntime + ?Sized + 'static> Debugger<R> {
    /// Attaches an evaluator and routes breakpoint conditions through it.
    pub fn use_evaluator_conditions(&mut self) {
        let evaluator = self.evaluator.unwrap_or_default();
        self.evaluator = Some(evaluator);
        self.condition_evaluator = Some(evaluator.condition(Rc::clone(&self.runtime)));
    }
}

impl<R: HostRuntime + ?Sized> std::fmt::Debug for Debugger<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debugger")
            .field("state", &self.state)
            .field("current_line", &self.current_line)
            .field("speed", &self.speed)
            .field("breakpoints", &self.breakpoints.len())
            .field("step_mode", &self.step_mode)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
