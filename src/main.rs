use basic_debugger::config::DebuggerConfig;
use basic_debugger::debugger::BreakpointState;
use basic_debugger::executor::{run_console, ScriptHost};
use clap::Parser;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "basic-debugger", about = "Step through a line-numbered BASIC program")]
struct Args {
    /// Program to debug.
    program: PathBuf,

    /// Execution speed, 0 (pause on every line) to 100 (full speed).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    speed: Option<u8>,

    /// Pause when the program raises an error.
    #[arg(long)]
    break_on_error: Option<bool>,

    /// JSON file the breakpoints are loaded from and saved to.
    #[arg(long)]
    breakpoints: Option<PathBuf>,

    /// JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pause before the first line.
    #[arg(long)]
    stop_on_entry: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => DebuggerConfig::load(path)?,
        None => DebuggerConfig::default(),
    };
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if let Some(break_on_error) = args.break_on_error {
        config.break_on_error = break_on_error;
    }
    if args.stop_on_entry {
        config.stop_on_entry = true;
    }
    if args.breakpoints.is_some() {
        config.breakpoints_file = args.breakpoints.clone();
    }

    let source = fs::read_to_string(&args.program)?;
    let mut host = ScriptHost::load(&source)?;
    config.apply(host.debugger_mut());

    if let Some(path) = &config.breakpoints_file {
        let state = BreakpointState::load(path)?;
        info!(count = state.breakpoints.len(), path = %path.display(), "loaded breakpoints");
        host.debugger_mut().import_breakpoints(&state);
    }

    host.start(config.stop_on_entry);
    let stdin = io::stdin();
    run_console(&mut host, stdin.lock(), io::stdout())?;

    if let Some(path) = &config.breakpoints_file {
        host.debugger().export_breakpoints().save(path)?;
        info!(path = %path.display(), "saved breakpoints");
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "debugger failed");
            eprintln!("❌ {err}");
            ExitCode::FAILURE
        }
    }
}
