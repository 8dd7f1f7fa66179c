use crate::debugger::LineId;
use std::io;
use thiserror::Error;

/// BASIC error codes raised by the interpreter, numbered as in Locomotive
/// BASIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicError {
    UnexpectedReturn,
    ImproperArgument,
    Overflow,
    LineDoesNotExist,
    DivisionByZero,
    TypeMismatch,
    StringTooLong,
}

impl BasicError {
    pub fn code(self) -> u16 {
        match self {
            BasicError::UnexpectedReturn => 3,
            BasicError::ImproperArgument => 5,
            BasicError::Overflow => 6,
            BasicError::LineDoesNotExist => 8,
            BasicError::DivisionByZero => 11,
            BasicError::TypeMismatch => 13,
            BasicError::StringTooLong => 15,
        }
    }
}

/// Message for a BASIC error code, as raised by `ERROR n`.
pub fn error_message(code: u16) -> &'static str {
    match code {
        1 => "Unexpected NEXT",
        2 => "Syntax error",
        3 => "Unexpected RETURN",
        4 => "DATA exhausted",
        5 => "Improper argument",
        6 => "Overflow",
        7 => "Memory full",
        8 => "Line does not exist",
        9 => "Subscript out of range",
        10 => "Array already dimensioned",
        11 => "Division by zero",
        12 => "Invalid direct command",
        13 => "Type mismatch",
        14 => "String space full",
        15 => "String too long",
        16 => "String expression too complex",
        17 => "Cannot CONTinue",
        18 => "Unknown user function",
        19 => "RESUME missing",
        20 => "Unexpected RESUME",
        21 => "Direct command found",
        22 => "Operand missing",
        23 => "Line too long",
        24 => "EOF met",
        25 => "File type error",
        26 => "NEXT missing",
        27 => "File already open",
        28 => "Unknown command",
        29 => "WEND missing",
        30 => "Unexpected WEND",
        31 => "File not open",
        32 => "Broken",
        _ => "Unknown error",
    }
}

/// Errors found while compiling a line of BASIC.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Syntax error: {message}")]
    Syntax { message: String, pos: usize },

    #[error("Type mismatch")]
    TypeMismatch { pos: usize },

    #[error("Unknown function {name}")]
    UnknownFunction { name: String, pos: usize },
}

impl CompileError {
    pub(crate) fn syntax(message: impl Into<String>, pos: usize) -> Self {
        CompileError::Syntax {
            message: message.into(),
            pos,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            CompileError::TypeMismatch { .. } => BasicError::TypeMismatch.code(),
            CompileError::Syntax { .. } | CompileError::UnknownFunction { .. } => 2,
        }
    }

    pub fn pos(&self) -> usize {
        match self {
            CompileError::Syntax { pos, .. }
            | CompileError::TypeMismatch { pos }
            | CompileError::UnknownFunction { pos, .. } => *pos,
        }
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, CompileError::TypeMismatch { .. })
    }
}

/// A runtime error raised while a guest program runs. This is what the host
/// hands to the debugger's error trap.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RuntimeFault {
    pub code: Option<u16>,
    pub message: String,
    pub line: Option<LineId>,
    pub info: String,
    pub pos: Option<usize>,
    pub len: Option<usize>,
}

impl RuntimeFault {
    /// A fault for `ERROR code`.
    pub fn with_code(code: u16) -> Self {
        Self {
            code: Some(code),
            message: error_message(code).to_string(),
            line: None,
            info: String::new(),
            pos: None,
            len: None,
        }
    }

    pub fn at_line(mut self, line: impl Into<LineId>) -> Self {
        if self.line.is_none() {
            self.line = Some(line.into());
        }
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }
}

impl From<BasicError> for RuntimeFault {
    fn from(err: BasicError) -> Self {
        RuntimeFault::with_code(err.code())
    }
}

/// Failure of a console evaluation. Never affects the debugger's state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeFault),

    #[error("Command not allowed in console")]
    NotAllowed,

    #[error("No evaluator attached")]
    NoEvaluator,

    #[error("Must be paused to {0}")]
    NotPaused(&'static str),
}

/// Errors raised while turning source text into a runnable program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("line {physical}: missing line number")]
    MissingLineNumber { physical: usize },

    #[error("{source} in {line}")]
    Compile { line: u32, source: CompileError },

    #[error("program is empty")]
    Empty,
}

/// Errors reading or writing configuration and breakpoint files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
