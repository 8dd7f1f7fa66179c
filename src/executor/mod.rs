mod console;
mod runner;

pub use console::{parse_command, run_console, ConsoleCommand, ConsoleError};
pub use runner::{Frame, Position, RunOutcome, ScriptHost, VmState};
