use crate::debugger::{Debugger, HostRuntime, LineId, StopReason, StopRequest};
use crate::error::{BasicError, LoadError, RuntimeFault};
use crate::evaluator::{run_statement, Flow};
use crate::parser::Program;
use crate::variables::Variables;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info};

/// A statement within the program: index into the sorted lines, then into
/// the line's statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub statement: usize,
}

/// An active GOSUB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Number of the line holding the GOSUB.
    pub return_label: u32,
    resume: Position,
}

/// Runtime state shared between the host loop and the debugger.
#[derive(Debug, Default)]
pub struct VmState {
    stop: RefCell<Option<StopRequest>>,
    gosub: RefCell<Vec<Frame>>,
    variables: RefCell<Variables>,
    output: RefCell<String>,
    error_trap: Cell<bool>,
}

impl VmState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the pending stop request, if any.
    pub fn take_stop(&self) -> Option<StopRequest> {
        self.stop.borrow_mut().take()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.borrow().is_some()
    }

    pub fn error_trap_installed(&self) -> bool {
        self.error_trap.get()
    }

    /// Drains everything printed since the last call.
    pub fn take_output(&self) -> String {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    fn push_frame(&self, frame: Frame) {
        self.gosub.borrow_mut().push(frame);
    }

    /// Helper: unwind the innermost GOSUB.
    fn leave_context(&self) -> Option<Frame> {
        self.gosub.borrow_mut().pop()
    }

    fn reset(&self) {
        self.stop.borrow_mut().take();
        self.gosub.borrow_mut().clear();
        self.variables.borrow_mut().clear();
        self.output.borrow_mut().clear();
    }
}

impl HostRuntime for VmState {
    fn request_stop(&self, request: StopRequest) {
        let mut stop = self.stop.borrow_mut();
        if stop.map_or(true, |pending| request.priority >= pending.priority) {
            *stop = Some(request);
        }
    }

    fn clear_stop(&self) {
        self.stop.borrow_mut().take();
    }

    fn set_error_trap(&self, installed: bool) {
        self.error_trap.set(installed);
    }

    fn gosub_stack(&self) -> Vec<LineId> {
        self.gosub
            .borrow()
            .iter()
            .rev()
            .map(|frame| LineId::Number(frame.return_label))
            .collect()
    }

    fn gosub_depth(&self) -> usize {
        self.gosub.borrow().len()
    }

    fn variables(&self) -> &RefCell<Variables> {
        &self.variables
    }

    fn print(&self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }
}

/// How a call to [`ScriptHost::run`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Finished,
    /// The debugger asked for a stop before `line` ran. Waiting `delay`
    /// milliseconds before the next `run` keeps the selected speed.
    Stopped {
        line: LineId,
        reason: StopReason,
        delay: u64,
    },
    Failed(RuntimeFault),
}

/// Runs a program under the debugger, one resumable slice at a time.
#[derive(Debug)]
pub struct ScriptHost {
    program: Program,
    vm: Rc<VmState>,
    debugger: Debugger<VmState>,
    pc: Position,
    finished: bool,
}

impl ScriptHost {
    pub fn new(program: Program) -> Self {
        let vm = Rc::new(VmState::new());
        let mut debugger = Debugger::new(Rc::clone(&vm));
        debugger.set_source_map(program.source_map());
        debugger.use_evaluator_conditions();
        Self {
            program,
            vm,
            debugger,
            pc: Position::default(),
            finished: true,
        }
    }

    pub fn load(source: &str) -> Result<Self, LoadError> {
        Ok(Self::new(Program::parse(source)?))
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn vm(&self) -> &Rc<VmState> {
        &self.vm
    }

    pub fn debugger(&self) -> &Debugger<VmState> {
        &self.debugger
    }

    pub fn debugger_mut(&mut self) -> &mut Debugger<VmState> {
        &mut self.debugger
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn position(&self) -> Position {
        self.pc
    }

    /// Starts a fresh run from the first line. With `stop_on_entry` the
    /// first line pauses before it executes.
    pub fn start(&mut self, stop_on_entry: bool) {
        self.vm.reset();
        self.pc = Position::default();
        self.finished = false;
        self.debugger.start();
        if stop_on_entry {
            self.debugger.step_into();
        }
        info!(lines = self.program.len(), stop_on_entry, "program started");
    }

    /// Runs until the program ends, fails, or the debugger requests a stop.
    /// Calling it again after a stop continues from the same point.
    pub fn run(&mut self) -> RunOutcome {
        if self.finished {
            return RunOutcome::Finished;
        }
        loop {
            let Some(number) = self.program.get(self.pc.line).map(|line| line.number) else {
                self.finish();
                return RunOutcome::Finished;
            };

            if self.pc.statement == 0 {
                self.debugger.on_line(LineId::Number(number));
                if let Some(stop) = self.vm.take_stop() {
                    debug!(line = number, reason = ?stop.reason, "stopped before line");
                    return RunOutcome::Stopped {
                        line: LineId::Number(number),
                        reason: stop.reason,
                        delay: self.debugger.next_delay(),
                    };
                }
            }

            if let Err(fault) = self.run_line() {
                let fault = fault.at_line(number);
                if self.vm.error_trap_installed() && self.debugger.handle_error(&fault) {
                    self.vm.take_stop();
                    return RunOutcome::Stopped {
                        line: fault.line.clone().unwrap_or(LineId::Number(number)),
                        reason: StopReason::Pause,
                        delay: 0,
                    };
                }
                info!(line = number, error = %fault, "program failed");
                self.finish();
                return RunOutcome::Failed(fault);
            }
            if self.finished {
                self.finish();
                return RunOutcome::Finished;
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.vm.clear_stop();
        self.debugger.reset();
        info!("program finished");
    }

    /// Runs the rest of the current line, leaving `pc` on the next statement
    /// to execute. A failing statement leaves `pc` on itself.
    fn run_line(&mut self) -> Result<(), RuntimeFault> {
        let line = &self.program.lines()[self.pc.line];
        let statements = &line.compiled.statements;

        while let Some(stmt) = statements.get(self.pc.statement) {
            match run_statement(stmt, &*self.vm)? {
                Flow::Next => self.pc.statement += 1,
                Flow::Goto(target) => {
                    self.pc = jump(&self.program, target)?;
                    return Ok(());
                }
                Flow::Gosub(target) => {
                    let destination = jump(&self.program, target)?;
                    self.vm.push_frame(Frame {
                        return_label: line.number,
                        resume: Position {
                            line: self.pc.line,
                            statement: self.pc.statement + 1,
                        },
                    });
                    self.pc = destination;
                    return Ok(());
                }
                Flow::Return => {
                    let frame = self
                        .vm
                        .leave_context()
                        .ok_or_else(|| RuntimeFault::from(BasicError::UnexpectedReturn))?;
                    self.pc = frame.resume;
                    return Ok(());
                }
                Flow::End => {
                    self.finished = true;
                    return Ok(());
                }
            }
        }

        self.pc = Position {
            line: self.pc.line + 1,
            statement: 0,
        };
        Ok(())
    }
}

fn jump(program: &Program, target: u32) -> Result<Position, RuntimeFault> {
    let line = program
        .index_of(target)
        .ok_or_else(|| RuntimeFault::from(BasicError::LineDoesNotExist).with_info(target.to_string()))?;
    Ok(Position { line, statement: 0 })
}
