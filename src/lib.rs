//! Interactive debugger for line-numbered BASIC programs.
//!
//! The [`debugger::Debugger`] is driven by a per-line hook from whatever
//! runtime executes the program; [`executor::ScriptHost`] is a complete
//! runtime for the BASIC subset understood by [`parser`].

pub mod config;
pub mod debugger;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod parser;
pub mod value;
pub mod variables;
