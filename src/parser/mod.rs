//! Compiler for single lines of Locomotive-style BASIC.
//!
//! A line is tokenized, parsed and type checked in one pass; the result is a
//! [`CompiledLine`] the interpreter can run against a variable table.

mod commands;
mod expression;
mod lexer;
mod program;
mod statements;
mod types;

pub use commands::{first_keyword, is_blocked_in_console, BLOCKED_COMMANDS};
pub use lexer::{tokenize, Keyword, Token, TokenKind};
pub use program::{Program, SourceLine};
pub use types::{BinaryOp, Branch, Builtin, CompiledLine, Expr, PrintItem, Stmt, UnaryOp, VarRef};

use crate::error::CompileError;

pub(crate) struct Parser {
    tokens: Vec<Token>,
    index: usize,
    end: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, end: usize) -> Self {
        Self {
            tokens,
            index: 0,
            end,
        }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|token| &token.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    /// Source offset of the next token, or the end of the line.
    fn pos(&self) -> usize {
        self.tokens
            .get(self.index)
            .map_or(self.end, |token| token.pos)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), CompileError> {
        if self.eat(&kind) {
            return Ok(());
        }
        let found = self
            .peek()
            .map_or_else(|| "end of line".to_string(), expression::describe);
        Err(CompileError::syntax(
            format!("expected {what} but found {found}"),
            self.pos(),
        ))
    }
}

/// Compiles one line, with an optional leading line number.
pub fn compile_line(source: &str) -> Result<CompiledLine, CompileError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens, source.chars().count());

    let number = match parser.peek() {
        Some(TokenKind::Number(_)) => Some(parser.line_number()?),
        _ => None,
    };
    let statements = parser.statement_list()?;

    if let Some(kind) = parser.peek() {
        return Err(CompileError::syntax(
            format!("unexpected {}", expression::describe(kind)),
            parser.pos(),
        ));
    }

    Ok(CompiledLine { number, statements })
}
