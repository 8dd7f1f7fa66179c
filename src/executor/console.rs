use super::runner::{RunOutcome, ScriptHost};
use crate::debugger::{DebugState, LineId, StopReason};
use crate::error::EvalError;
use crate::value::Value;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const HELP: &str = "Commands: (c)ontinue, (s)tep into, (n)ext/step over, (o)ut, (b) <line> [if <cond>], \
(d)elete <line>, (t)oggle <line>, (bl) list, (bt) backtrace, vars, speed <n>, eval <expr>, exec <stmt>, (q)uit";

/// A line typed at the debugger prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Continue,
    StepInto,
    StepOver,
    StepOut,
    Pause,
    Break { line: u32, condition: Option<String> },
    Delete(u32),
    Toggle(u32),
    List,
    Backtrace,
    Vars,
    Speed(u8),
    Eval(String),
    Exec(String),
    Help,
    Quit,
    /// Anything else: tried as an expression, then as a statement.
    Input(String),
    /// Blank line; steps into like the bare prompt always has.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("unbalanced quotes")]
    UnbalancedQuotes,

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid line number: {0}")]
    InvalidLine(String),

    #[error("invalid speed: {0} (0-100)")]
    InvalidSpeed(String),
}

/// Splits `rest` with shell-like quoting and returns its single argument.
fn single_argument(rest: &str, command: &'static str) -> Result<String, ConsoleError> {
    let mut lexer = shlex::Shlex::new(rest);
    let arg = lexer.next();
    if lexer.had_error {
        return Err(ConsoleError::UnbalancedQuotes);
    }
    arg.ok_or(ConsoleError::MissingArgument(command))
}

fn line_argument(rest: &str, command: &'static str) -> Result<u32, ConsoleError> {
    let arg = single_argument(rest, command)?;
    arg.parse().map_err(|_| ConsoleError::InvalidLine(arg))
}

fn raw_argument(rest: &str, command: &'static str) -> Result<String, ConsoleError> {
    if rest.is_empty() {
        Err(ConsoleError::MissingArgument(command))
    } else {
        Ok(rest.to_string())
    }
}

pub fn parse_command(input: &str) -> Result<ConsoleCommand, ConsoleError> {
    let input = input.trim();
    let (word, rest) = match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => ConsoleCommand::Empty,
        "c" | "continue" => ConsoleCommand::Continue,
        "s" | "step" | "into" => ConsoleCommand::StepInto,
        "n" | "next" | "over" => ConsoleCommand::StepOver,
        "o" | "out" => ConsoleCommand::StepOut,
        "p" | "pause" => ConsoleCommand::Pause,
        "b" | "break" => {
            let lower = rest.to_ascii_lowercase();
            let (line, condition) = match lower.find(" if ") {
                Some(idx) => (&rest[..idx], Some(rest[idx + 4..].trim().to_string())),
                None => (rest, None),
            };
            ConsoleCommand::Break {
                line: line_argument(line, "b")?,
                condition: condition.filter(|c| !c.is_empty()),
            }
        }
        "d" | "delete" => ConsoleCommand::Delete(line_argument(rest, "d")?),
        "t" | "toggle" => ConsoleCommand::Toggle(line_argument(rest, "t")?),
        "bl" => ConsoleCommand::List,
        "bt" | "where" => ConsoleCommand::Backtrace,
        "vars" => ConsoleCommand::Vars,
        "speed" => {
            let arg = single_argument(rest, "speed")?;
            match arg.parse::<u8>() {
                Ok(speed) if speed <= 100 => ConsoleCommand::Speed(speed),
                _ => return Err(ConsoleError::InvalidSpeed(arg)),
            }
        }
        "eval" => ConsoleCommand::Eval(raw_argument(rest, "eval")?),
        "exec" => ConsoleCommand::Exec(raw_argument(rest, "exec")?),
        "h" | "help" => ConsoleCommand::Help,
        "q" | "quit" => ConsoleCommand::Quit,
        _ => ConsoleCommand::Input(input.to_string()),
    };
    Ok(command)
}

fn show_value(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("{s:?}"),
        Value::Number(_) => value.to_string(),
    }
}

fn flush_program_output(host: &ScriptHost, out: &mut impl Write) -> io::Result<()> {
    let text = host.vm().take_output();
    if !text.is_empty() {
        write!(out, "{text}")?;
        out.flush()?;
    }
    Ok(())
}

fn show_stop(host: &ScriptHost, line: &LineId, out: &mut impl Write) -> io::Result<()> {
    let debugger = host.debugger();
    match debugger.last_error() {
        Some(error) => writeln!(
            out,
            "\n💥 Error {} at line {}: {}",
            error.code, error.line, error.message
        )?,
        None => writeln!(out, "\n🔍 Stopped at line {line}")?,
    }
    let text = line
        .number()
        .and_then(|n| host.program().index_of(n))
        .and_then(|index| host.program().get(index));
    if let Some(source) = text {
        writeln!(out, "    {}", source.text.trim_end())?;
    }
    Ok(())
}

fn report_eval(result: Result<(), EvalError>, out: &mut impl Write) -> io::Result<()> {
    if let Err(err) = result {
        writeln!(out, "❌ {err}")?;
    }
    Ok(())
}

/// Whether a prompt command hands control back to the program.
enum Prompt {
    Stay,
    Run,
    Quit,
}

fn handle_command(
    host: &mut ScriptHost,
    command: ConsoleCommand,
    out: &mut impl Write,
) -> io::Result<Prompt> {
    match command {
        ConsoleCommand::Continue => {
            host.debugger_mut().resume();
            return Ok(Prompt::Run);
        }
        ConsoleCommand::StepInto | ConsoleCommand::Empty => {
            host.debugger_mut().step_into();
            return Ok(Prompt::Run);
        }
        ConsoleCommand::StepOver => {
            host.debugger_mut().step_over();
            return Ok(Prompt::Run);
        }
        ConsoleCommand::StepOut => {
            host.debugger_mut().step_out();
            return Ok(Prompt::Run);
        }
        ConsoleCommand::Quit => return Ok(Prompt::Quit),
        ConsoleCommand::Pause => writeln!(out, "Already paused")?,
        ConsoleCommand::Break { line, condition } => {
            let breakpoint = host.debugger_mut().add_breakpoint(line, condition);
            writeln!(out, "Breakpoint {} at line {}", breakpoint.id.0, breakpoint.line)?;
        }
        ConsoleCommand::Delete(line) => match host.debugger_mut().remove_breakpoint(line) {
            Some(_) => writeln!(out, "Breakpoint at line {line} removed")?,
            None => writeln!(out, "No breakpoint at line {line}")?,
        },
        ConsoleCommand::Toggle(line) => {
            let breakpoint = host.debugger_mut().toggle_breakpoint(line);
            let status = if breakpoint.enabled { "enabled" } else { "disabled" };
            writeln!(out, "Breakpoint at line {line} {status}")?;
        }
        ConsoleCommand::List => {
            let breakpoints = host.debugger().breakpoints();
            if breakpoints.is_empty() {
                writeln!(out, "No breakpoints")?;
            }
            for bp in breakpoints {
                let status = if bp.enabled { "" } else { " (disabled)" };
                let condition = bp
                    .condition
                    .as_deref()
                    .map(|c| format!(" if {c}"))
                    .unwrap_or_default();
                writeln!(
                    out,
                    "  #{} line {}{}{} hits={}",
                    bp.id.0, bp.line, condition, status, bp.hit_count
                )?;
            }
        }
        ConsoleCommand::Backtrace => {
            let frames = host.debugger().call_stack();
            writeln!(out, "=== Call Stack ({} frames) ===", frames.len())?;
            for (i, frame) in frames.iter().enumerate() {
                writeln!(out, "  #{i}: line {} (depth {})", frame.return_label, frame.depth)?;
            }
        }
        ConsoleCommand::Vars => {
            let variables = host.debugger().variables();
            if variables.is_empty() {
                writeln!(out, "<no variables>")?;
            }
            for (name, value) in &variables {
                writeln!(out, "  {name}={}", show_value(value))?;
            }
        }
        ConsoleCommand::Speed(speed) => {
            host.debugger_mut().set_speed(speed);
            writeln!(out, "Speed {speed}")?;
        }
        ConsoleCommand::Eval(expression) => match host.debugger().eval(&expression) {
            Ok(value) => writeln!(out, "{}", show_value(&value))?,
            Err(err) => writeln!(out, "❌ {err}")?,
        },
        ConsoleCommand::Exec(statement) => {
            let result = host.debugger().exec(&statement);
            flush_program_output(host, out)?;
            report_eval(result, out)?;
        }
        ConsoleCommand::Input(text) => match host.debugger().eval(&text) {
            Ok(value) => writeln!(out, "{}", show_value(&value))?,
            Err(eval_err) => {
                let result = host.debugger().exec(&text);
                flush_program_output(host, out)?;
                match result {
                    Ok(()) => {}
                    Err(EvalError::NotAllowed) => report_eval(Err(EvalError::NotAllowed), out)?,
                    Err(_) => report_eval(Err(eval_err), out)?,
                }
            }
        },
        ConsoleCommand::Help => writeln!(out, "{HELP}")?,
    }
    Ok(Prompt::Stay)
}

/// Drives `host` from an interactive prompt until the program ends or the
/// user quits. The caller has already started the host.
pub fn run_console(
    host: &mut ScriptHost,
    mut input: impl BufRead,
    mut out: impl Write,
) -> io::Result<()> {
    let mut shown_help = false;

    loop {
        let outcome = host.run();
        flush_program_output(host, &mut out)?;

        let line = match outcome {
            RunOutcome::Finished => {
                writeln!(out, "✅ Program finished")?;
                return Ok(());
            }
            RunOutcome::Failed(fault) => {
                let at = fault.line.as_ref().map(|l| format!(" in {l}")).unwrap_or_default();
                writeln!(out, "❌ {fault}{at}")?;
                return Ok(());
            }
            RunOutcome::Stopped {
                reason: StopReason::Throttle,
                delay,
                ..
            } => {
                thread::sleep(Duration::from_millis(delay));
                continue;
            }
            RunOutcome::Stopped { line, .. } => line,
        };

        show_stop(host, &line, &mut out)?;
        if !shown_help {
            writeln!(out, "{HELP}")?;
            shown_help = true;
        }

        loop {
            write!(out, "> ")?;
            out.flush()?;

            let mut buf = String::new();
            if input.read_line(&mut buf)? == 0 {
                debug!("console input closed");
                return Ok(());
            }

            let command = match parse_command(&buf) {
                Ok(command) => command,
                Err(err) => {
                    writeln!(out, "❓ {err}")?;
                    continue;
                }
            };
            debug!(?command, "console command");

            match handle_command(host, command, &mut out)? {
                Prompt::Stay => {}
                Prompt::Run => break,
                Prompt::Quit => return Ok(()),
            }
            if host.debugger().state() != DebugState::Paused {
                break;
            }
        }
    }
}
