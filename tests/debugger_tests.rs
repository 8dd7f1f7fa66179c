use basic_debugger::debugger::{
    BreakpointState, DebugEvent, DebugEventKind, DebugState, Debugger, HostRuntime, LineId,
    StopReason, StopRequest, PAUSE_PRIORITY, THROTTLE_PRIORITY,
};
use basic_debugger::error::{EvalError, RuntimeFault};
use basic_debugger::evaluator::Evaluator;
use basic_debugger::value::Value;
use basic_debugger::variables::Variables;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

// Runtime double that records everything the debugger asks of it
#[derive(Default)]
struct MockRuntime {
    stops: RefCell<Vec<StopRequest>>,
    clears: Cell<usize>,
    error_trap: Cell<bool>,
    gosub: RefCell<Vec<LineId>>,
    variables: RefCell<Variables>,
    printed: RefCell<String>,
}

impl MockRuntime {
    fn take_stops(&self) -> Vec<StopRequest> {
        std::mem::take(&mut *self.stops.borrow_mut())
    }

    fn gosub(&self, return_line: u32) {
        self.gosub.borrow_mut().insert(0, LineId::Number(return_line));
    }

    fn ret(&self) {
        self.gosub.borrow_mut().remove(0);
    }
}

impl HostRuntime for MockRuntime {
    fn request_stop(&self, request: StopRequest) {
        self.stops.borrow_mut().push(request);
    }

    fn clear_stop(&self) {
        self.clears.set(self.clears.get() + 1);
    }

    fn set_error_trap(&self, installed: bool) {
        self.error_trap.set(installed);
    }

    fn gosub_stack(&self) -> Vec<LineId> {
        self.gosub.borrow().clone()
    }

    fn variables(&self) -> &RefCell<Variables> {
        &self.variables
    }

    fn print(&self, text: &str) {
        self.printed.borrow_mut().push_str(text);
    }
}

fn setup() -> (Rc<MockRuntime>, Debugger<MockRuntime>) {
    let runtime = Rc::new(MockRuntime::default());
    let mut debugger = Debugger::new(Rc::clone(&runtime));
    debugger.start();
    (runtime, debugger)
}

fn record(debugger: &mut Debugger<MockRuntime>) -> Rc<RefCell<Vec<DebugEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    debugger.on(move |event| sink.borrow_mut().push(event.clone()));
    events
}

fn kinds(events: &Rc<RefCell<Vec<DebugEvent>>>) -> Vec<DebugEventKind> {
    events.borrow().iter().map(|e| e.kind).collect()
}

/// Pauses on `line` through a breakpoint, then removes the breakpoint.
fn pause_at(runtime: &MockRuntime, debugger: &mut Debugger<MockRuntime>, line: u32) {
    debugger.add_breakpoint(line, None);
    debugger.on_line(LineId::Number(line));
    assert_eq!(debugger.state(), DebugState::Paused);
    debugger.remove_breakpoint(line);
    runtime.take_stops();
}

#[cfg(test)]
mod state_tests {
    use super::*;

    #[test]
    fn test_new_debugger_installs_error_trap() {
        let runtime = Rc::new(MockRuntime::default());
        let mut debugger = Debugger::new(Rc::clone(&runtime));
        assert!(runtime.error_trap.get());
        assert_eq!(debugger.state(), DebugState::Idle);

        debugger.detach();
        assert!(!runtime.error_trap.get());
    }

    #[test]
    fn test_idle_hook_only_records_line() {
        let runtime = Rc::new(MockRuntime::default());
        let mut debugger = Debugger::new(Rc::clone(&runtime));
        debugger.add_breakpoint(10, None);
        debugger.on_line(LineId::Number(10));

        assert_eq!(debugger.current_line(), &LineId::Number(10));
        assert_eq!(debugger.state(), DebugState::Idle);
        assert!(runtime.take_stops().is_empty());
        assert_eq!(debugger.breakpoint(10).unwrap().hit_count, 0);
    }

    #[test]
    fn test_pause_and_resume_events() {
        let (runtime, mut debugger) = setup();
        let events = record(&mut debugger);

        debugger.pause();
        assert_eq!(debugger.state(), DebugState::Paused);
        assert_eq!(runtime.take_stops(), vec![StopRequest::pause()]);

        debugger.resume();
        assert_eq!(debugger.state(), DebugState::Running);
        assert_eq!(runtime.clears.get(), 1);

        assert_eq!(
            kinds(&events),
            vec![
                DebugEventKind::StateChange,
                DebugEventKind::Paused,
                DebugEventKind::StateChange,
                DebugEventKind::Resumed,
            ]
        );
    }

    #[test]
    fn test_state_change_only_on_actual_change() {
        let (_runtime, mut debugger) = setup();
        let events = record(&mut debugger);
        debugger.pause();
        debugger.pause();
        let changes = kinds(&events)
            .into_iter()
            .filter(|k| *k == DebugEventKind::StateChange)
            .count();
        assert_eq!(changes, 1);
    }

    #[test]
    fn test_off_stops_delivery() {
        let (_runtime, mut debugger) = setup();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let id = debugger.on(move |_| seen.set(seen.get() + 1));
        debugger.pause();
        let before = count.get();
        assert!(before > 0);

        assert!(debugger.off(id));
        debugger.resume();
        assert_eq!(count.get(), before);
        assert!(!debugger.off(id));
    }

    #[test]
    fn test_listeners_called_in_order() {
        let (_runtime, mut debugger) = setup();
        let order = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second"] {
            let order = Rc::clone(&order);
            debugger.on(move |_| order.borrow_mut().push(name));
        }
        debugger.pause();
        assert_eq!(
            order.borrow()[..2],
            ["first", "second"],
            "state change reaches listeners in registration order"
        );
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let (runtime, mut debugger) = setup();
        pause_at(&runtime, &mut debugger, 10);
        debugger.step_over();
        debugger.reset();
        assert_eq!(debugger.state(), DebugState::Idle);

        debugger.on_line(LineId::Number(20));
        assert!(runtime.take_stops().is_empty());
    }

    #[test]
    fn test_snapshot_contents() {
        let (runtime, mut debugger) = setup();
        runtime.variables.borrow_mut().set("aR", 5.0);
        runtime.gosub(10);
        debugger.on_line(LineId::Number(100));

        let snapshot = debugger.snapshot();
        assert_eq!(snapshot.line, LineId::Number(100));
        assert_eq!(snapshot.state, DebugState::Running);
        assert_eq!(snapshot.gosub_stack, vec![LineId::Number(10)]);
        assert_eq!(snapshot.variables.get("aR"), Some(&Value::Number(5.0)));
        assert!(snapshot.error.is_none());
    }
}

#[cfg(test)]
mod breakpoint_tests {
    use super::*;

    #[test]
    fn test_breakpoint_pauses_and_counts_hits() {
        let (runtime, mut debugger) = setup();
        let events = record(&mut debugger);
        debugger.add_breakpoint(20, None);

        debugger.on_line(LineId::Number(10));
        assert_eq!(debugger.state(), DebugState::Running);
        assert!(runtime.take_stops().is_empty());

        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Paused);
        let stops = runtime.take_stops();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].priority, PAUSE_PRIORITY);

        let events = events.borrow();
        let hit = events.last().unwrap();
        assert_eq!(hit.kind, DebugEventKind::Breakpoint);
        assert_eq!(hit.breakpoint.as_ref().unwrap().hit_count, 1);
        assert_eq!(hit.snapshot.line, LineId::Number(20));
    }

    #[test]
    fn test_resume_marker_is_spent_on_first_visit() {
        let (runtime, mut debugger) = setup();
        pause_at(&runtime, &mut debugger, 10);
        debugger.resume();

        // no breakpoint on the re-entered line, the marker still goes
        debugger.on_line(LineId::Number(10));
        assert_eq!(debugger.state(), DebugState::Running);

        // a one-line loop comes straight back to 10
        debugger.add_breakpoint(10, None);
        debugger.on_line(LineId::Number(10));
        assert_eq!(debugger.state(), DebugState::Paused);
        assert_eq!(debugger.breakpoint(10).unwrap().hit_count, 1);
    }

    #[test]
    fn test_add_overwrites_existing() {
        let (_runtime, mut debugger) = setup();
        let first = debugger.add_breakpoint(10, Some("a>1".into()));
        let second = debugger.add_breakpoint(10, None);
        assert_ne!(first.id, second.id);
        assert_eq!(debugger.breakpoints().len(), 1);
        assert!(debugger.breakpoint(10).unwrap().condition.is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_runtime, mut debugger) = setup();
        debugger.add_breakpoint(10, None);
        assert!(debugger.remove_breakpoint(10).is_some());
        assert!(debugger.remove_breakpoint(10).is_none());
    }

    #[test]
    fn test_resume_skips_same_line_once() {
        let (runtime, mut debugger) = setup();
        debugger.add_breakpoint(20, None);
        debugger.on_line(LineId::Number(20));
        debugger.resume();
        runtime.take_stops();

        // the host re-enters the line it stopped on
        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Running);
        assert!(runtime.take_stops().is_empty());

        // next iteration of a loop hits again
        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Paused);
        assert_eq!(debugger.breakpoint(20).unwrap().hit_count, 2);
    }

    #[test]
    fn test_skip_marker_cleared_by_other_line() {
        let (runtime, mut debugger) = setup();
        debugger.add_breakpoint(20, None);
        debugger.on_line(LineId::Number(20));
        debugger.resume();
        runtime.take_stops();

        debugger.on_line(LineId::Number(30));
        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Paused);
    }

    #[test]
    fn test_toggle_creates_then_disables() {
        let (runtime, mut debugger) = setup();
        let created = debugger.toggle_breakpoint(30);
        assert!(created.enabled);

        let toggled = debugger.toggle_breakpoint(30);
        assert!(!toggled.enabled);

        debugger.on_line(LineId::Number(30));
        assert_eq!(debugger.state(), DebugState::Running);
        assert!(runtime.take_stops().is_empty());
    }

    #[test]
    fn test_labels_never_match() {
        let (runtime, mut debugger) = setup();
        debugger.add_breakpoint(0, None);
        debugger.on_line(LineId::from("gosub_return_1"));
        assert!(runtime.take_stops().is_empty());
    }

    #[test]
    fn test_conditional_breakpoint_uses_evaluator() {
        let (runtime, mut debugger) = setup();
        debugger.use_evaluator_conditions();
        debugger.add_breakpoint(20, Some("x > 5".into()));

        runtime.variables.borrow_mut().set("xR", 3.0);
        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Running);
        assert_eq!(debugger.breakpoint(20).unwrap().hit_count, 0);

        runtime.variables.borrow_mut().set("xR", 7.0);
        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Paused);
        assert_eq!(debugger.breakpoint(20).unwrap().hit_count, 1);
    }

    #[test]
    fn test_failing_condition_is_false() {
        let (runtime, mut debugger) = setup();
        debugger.use_evaluator_conditions();
        debugger.add_breakpoint(20, Some("1+".into()));

        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Running);
        assert!(runtime.take_stops().is_empty());
    }

    #[test]
    fn test_condition_evaluator_error_is_swallowed() {
        let (_runtime, mut debugger) = setup();
        debugger.set_condition_evaluator(Some(Box::new(|_: &str| Err(EvalError::NotAllowed))));
        debugger.add_breakpoint(20, Some("anything".into()));
        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Running);
    }

    #[test]
    fn test_condition_without_evaluator_matches() {
        let (_runtime, mut debugger) = setup();
        debugger.add_breakpoint(20, Some("x > 5".into()));
        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Paused);
    }

    #[test]
    fn test_export_clear_import_restores_set() {
        let (_runtime, mut debugger) = setup();
        debugger.add_breakpoint(10, None);
        debugger.add_breakpoint(20, Some("a$=\"x\"".into()));
        debugger.toggle_breakpoint(20);

        let exported = debugger.export_breakpoints();
        debugger.clear_breakpoints();
        assert!(debugger.breakpoints().is_empty());

        debugger.import_breakpoints(&exported);
        assert_eq!(debugger.export_breakpoints(), exported);
        let restored = debugger.breakpoint(20).unwrap();
        assert!(!restored.enabled);
        assert_eq!(restored.condition.as_deref(), Some("a$=\"x\""));
    }

    #[test]
    fn test_import_replaces_store() {
        let (_runtime, mut debugger) = setup();
        debugger.add_breakpoint(99, None);
        let state = BreakpointState::from_json(
            r#"{"breakpoints":[{"line":10,"enabled":true},{"line":30,"enabled":false,"condition":"i=3"}]}"#,
        )
        .unwrap();
        debugger.import_breakpoints(&state);

        let lines: Vec<u32> = debugger.breakpoints().iter().map(|bp| bp.line).collect();
        assert_eq!(lines, vec![10, 30]);
    }

    #[test]
    fn test_breakpoint_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("breakpoints.json");

        let (_runtime, mut debugger) = setup();
        debugger.add_breakpoint(40, Some("n>2".into()));
        debugger.export_breakpoints().save(&path).unwrap();

        let loaded = BreakpointState::load(&path).unwrap();
        assert_eq!(loaded, debugger.export_breakpoints());

        let missing = BreakpointState::load(&dir.path().join("none.json")).unwrap();
        assert!(missing.breakpoints.is_empty());
    }
}

#[cfg(test)]
mod stepping_tests {
    use super::*;

    #[test]
    fn test_step_into_pauses_on_next_line() {
        let (runtime, mut debugger) = setup();
        let events = record(&mut debugger);
        pause_at(&runtime, &mut debugger, 10);

        debugger.step_into();
        assert_eq!(debugger.state(), DebugState::Stepping);

        debugger.on_line(LineId::Number(10));
        assert_eq!(debugger.state(), DebugState::Stepping);

        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Paused);
        assert_eq!(events.borrow().last().unwrap().kind, DebugEventKind::Step);
        assert_eq!(runtime.take_stops(), vec![StopRequest::pause()]);
    }

    #[test]
    fn test_step_over_skips_subroutine() {
        let (runtime, mut debugger) = setup();
        pause_at(&runtime, &mut debugger, 10);
        debugger.step_over();

        debugger.on_line(LineId::Number(10));
        runtime.gosub(10);
        debugger.on_line(LineId::Number(100));
        debugger.on_line(LineId::Number(110));
        assert_eq!(debugger.state(), DebugState::Stepping);

        runtime.ret();
        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Paused);
        assert_eq!(debugger.current_line(), &LineId::Number(20));
    }

    #[test]
    fn test_step_out_waits_for_return() {
        let (runtime, mut debugger) = setup();
        runtime.gosub(10);
        pause_at(&runtime, &mut debugger, 100);
        debugger.step_out();

        debugger.on_line(LineId::Number(100));
        debugger.on_line(LineId::Number(110));
        assert_eq!(debugger.state(), DebugState::Stepping);

        runtime.ret();
        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Paused);
    }

    #[test]
    fn test_breakpoint_wins_over_step() {
        let (runtime, mut debugger) = setup();
        pause_at(&runtime, &mut debugger, 10);
        debugger.add_breakpoint(100, None);
        debugger.step_over();

        debugger.on_line(LineId::Number(10));
        runtime.gosub(10);
        debugger.on_line(LineId::Number(100));
        assert_eq!(debugger.state(), DebugState::Paused);
        assert_eq!(debugger.breakpoint(100).unwrap().hit_count, 1);
    }

    #[test]
    fn test_step_while_idle_is_ignored() {
        let runtime = Rc::new(MockRuntime::default());
        let mut debugger = Debugger::new(Rc::clone(&runtime));
        debugger.step_into();
        assert_eq!(debugger.state(), DebugState::Idle);
    }

    #[test]
    fn test_call_stack_frames() {
        let (runtime, mut debugger) = setup();
        runtime.gosub(10);
        runtime.gosub(20);
        debugger.on_line(LineId::Number(100));

        let frames: Vec<(LineId, usize)> = debugger
            .call_stack()
            .into_iter()
            .map(|f| (f.return_label, f.depth))
            .collect();
        assert_eq!(
            frames,
            vec![
                (LineId::Number(100), 2),
                (LineId::Number(20), 1),
                (LineId::Number(10), 0),
            ]
        );
    }
}

#[cfg(test)]
mod speed_tests {
    use super::*;

    #[test]
    fn test_full_speed_never_stops() {
        let (runtime, mut debugger) = setup();
        for line in 1..=1000 {
            debugger.on_line(LineId::Number(line));
        }
        assert!(runtime.take_stops().is_empty());
        assert_eq!(debugger.next_delay(), 0);
    }

    #[test]
    fn test_half_speed_yields_every_eleven_lines() {
        let (runtime, mut debugger) = setup();
        let events = record(&mut debugger);
        debugger.set_speed(50);

        for line in 1..=10 {
            debugger.on_line(LineId::Number(line));
        }
        assert!(runtime.take_stops().is_empty());

        debugger.on_line(LineId::Number(11));
        let stops = runtime.take_stops();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].reason, StopReason::Throttle);
        assert_eq!(stops[0].priority, THROTTLE_PRIORITY);
        assert_eq!(debugger.next_delay(), 100);
        assert_eq!(debugger.state(), DebugState::Running);
        assert_eq!(events.borrow().last().unwrap().kind, DebugEventKind::Step);

        debugger.on_line(LineId::Number(12));
        assert_eq!(debugger.next_delay(), 0);
    }

    #[test]
    fn test_reentry_after_yield_is_not_counted() {
        let (runtime, mut debugger) = setup();
        debugger.set_speed(50);

        for line in 1..=11 {
            debugger.on_line(LineId::Number(line));
        }
        assert_eq!(runtime.take_stops().len(), 1);

        // the host hooks line 11 again before running it
        debugger.on_line(LineId::Number(11));
        assert_eq!(debugger.next_delay(), 0);
        for line in 12..=21 {
            debugger.on_line(LineId::Number(line));
        }
        assert!(runtime.take_stops().is_empty());

        debugger.on_line(LineId::Number(22));
        assert_eq!(runtime.take_stops().len(), 1);
    }

    #[test]
    fn test_one_line_chunks_advance() {
        let (runtime, mut debugger) = setup();
        debugger.set_speed(1);

        debugger.on_line(LineId::Number(10));
        assert_eq!(runtime.take_stops().len(), 1);
        assert_eq!(debugger.next_delay(), 198);

        debugger.on_line(LineId::Number(10));
        assert!(runtime.take_stops().is_empty());

        debugger.on_line(LineId::Number(20));
        assert_eq!(runtime.take_stops().len(), 1);
    }

    #[test]
    fn test_speed_zero_pauses_every_line() {
        let (runtime, mut debugger) = setup();
        debugger.set_speed(0);
        debugger.on_line(LineId::Number(10));
        assert_eq!(debugger.state(), DebugState::Paused);
        assert_eq!(runtime.take_stops(), vec![StopRequest::pause()]);

        debugger.resume();
        debugger.on_line(LineId::Number(10));
        assert_eq!(debugger.state(), DebugState::Running);
        debugger.on_line(LineId::Number(20));
        assert_eq!(debugger.state(), DebugState::Paused);
    }

    #[test]
    fn test_speed_is_clamped() {
        let (_runtime, mut debugger) = setup();
        debugger.set_speed(200);
        assert_eq!(debugger.speed(), 100);
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    fn fault(code: u16, line: u32) -> RuntimeFault {
        RuntimeFault::with_code(code).at_line(line)
    }

    fn armed() -> (Rc<MockRuntime>, Debugger<MockRuntime>) {
        let (runtime, mut debugger) = setup();
        debugger.set_break_on_error(true);
        (runtime, debugger)
    }

    #[test]
    fn test_error_breakpoint_captures_error() {
        let (runtime, mut debugger) = armed();
        let events = record(&mut debugger);
        debugger.on_line(LineId::Number(20));

        assert!(debugger.handle_error(&fault(33, 20)));
        assert_eq!(debugger.state(), DebugState::Paused);
        assert_eq!(runtime.take_stops(), vec![StopRequest::pause()]);

        let error = debugger.snapshot().error.unwrap();
        assert_eq!(error.code, 33);
        assert_eq!(error.message, "Unknown error");
        assert_eq!(error.line, LineId::Number(20));
        assert_eq!(events.borrow().last().unwrap().kind, DebugEventKind::Error);
    }

    #[test]
    fn test_resumed_error_passes_through_once() {
        let (_runtime, mut debugger) = armed();
        debugger.on_line(LineId::Number(20));
        assert!(debugger.handle_error(&fault(5, 20)));

        debugger.resume();
        assert!(debugger.snapshot().error.is_none());
        assert!(!debugger.handle_error(&fault(5, 20)));
        assert_eq!(debugger.state(), DebugState::Running);
    }

    #[test]
    fn test_error_on_another_line_pauses_again() {
        let (_runtime, mut debugger) = armed();
        debugger.on_line(LineId::Number(20));
        assert!(debugger.handle_error(&fault(5, 20)));
        debugger.resume();

        debugger.on_line(LineId::Number(30));
        assert!(debugger.handle_error(&fault(5, 30)));
    }

    #[test]
    fn test_error_without_code() {
        let (_runtime, mut debugger) = armed();
        debugger.on_line(LineId::Number(40));
        let mut unknown = RuntimeFault::with_code(0);
        unknown.code = None;
        unknown.message = "host failure".into();
        assert!(debugger.handle_error(&unknown));

        let error = debugger.last_error().unwrap();
        assert_eq!(error.code, -1);
        assert_eq!(error.line, LineId::Number(40));
    }

    #[test]
    fn test_break_on_error_off_by_default() {
        let (runtime, mut debugger) = setup();
        assert!(!debugger.break_on_error());
        assert!(!debugger.handle_error(&fault(11, 10)));
        assert!(runtime.take_stops().is_empty());
        assert_eq!(debugger.state(), DebugState::Running);
    }

    #[test]
    fn test_step_from_error_passes_it_through() {
        let (_runtime, mut debugger) = armed();
        debugger.on_line(LineId::Number(20));
        assert!(debugger.handle_error(&fault(5, 20)));

        debugger.step_over();
        assert!(debugger.last_error().is_none());
        debugger.on_line(LineId::Number(20));
        assert!(!debugger.handle_error(&fault(5, 20)));
        assert_eq!(debugger.state(), DebugState::Stepping);
    }
}

#[cfg(test)]
mod console_api_tests {
    use super::*;

    #[test]
    fn test_eval_needs_evaluator_and_pause() {
        let (runtime, mut debugger) = setup();
        assert_eq!(debugger.eval("1+2"), Err(EvalError::NoEvaluator));

        debugger.set_evaluator(Some(Evaluator::new()));
        assert_eq!(debugger.eval("1+2"), Err(EvalError::NotPaused("evaluate")));
        assert_eq!(debugger.exec("a=1"), Err(EvalError::NotPaused("execute")));

        pause_at(&runtime, &mut debugger, 10);
        assert_eq!(debugger.eval("1+2"), Ok(Value::Number(3.0)));
    }

    #[test]
    fn test_exec_changes_live_variables() {
        let (runtime, mut debugger) = setup();
        debugger.set_evaluator(Some(Evaluator::new()));
        pause_at(&runtime, &mut debugger, 10);

        debugger.exec("let x=42").unwrap();
        assert_eq!(debugger.eval("x"), Ok(Value::Number(42.0)));
        assert_eq!(debugger.variables().get("xR"), Some(&Value::Number(42.0)));

        debugger.exec("print \"hi\"").unwrap();
        assert_eq!(*runtime.printed.borrow(), "hi\n");
        assert_eq!(debugger.exec("goto 10"), Err(EvalError::NotAllowed));
        assert_eq!(debugger.state(), DebugState::Paused);
    }

    #[test]
    fn test_source_map_ranges() {
        let (_runtime, mut debugger) = setup();
        let mut map = HashMap::new();
        map.insert("10".to_string(), (0, 12));
        map.insert("20".to_string(), (13, 8));
        debugger.set_source_map(map);

        assert!(debugger.current_line_range().is_none());
        debugger.on_line(LineId::Number(20));
        let range = debugger.current_line_range().unwrap();
        assert_eq!(range.start_pos, 13);
        assert_eq!(range.end_pos, 21);
        assert!(debugger.line_range(&LineId::Number(30)).is_none());
    }
}
