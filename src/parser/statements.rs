use super::expression::describe;
use super::lexer::{Keyword, TokenKind};
use super::types::{Branch, PrintItem, Stmt, VarRef};
use super::Parser;
use crate::error::CompileError;
use crate::value::ValueType;
use crate::variables::{mangle, type_of};

impl Parser {
    /// Parses `stmt {: stmt}` up to the end of the line or an `ELSE` that
    /// belongs to an enclosing `IF`.
    pub(crate) fn statement_list(&mut self) -> Result<Vec<Stmt>, CompileError> {
        let mut statements = Vec::new();
        loop {
            while self.eat(&TokenKind::Colon) {}
            if self.at_end() || self.peek() == Some(&TokenKind::Keyword(Keyword::Else)) {
                return Ok(statements);
            }

            let stmt = self.statement()?;
            let is_rem = stmt == Stmt::Rem;
            statements.push(stmt);
            if is_rem {
                return Ok(statements);
            }

            match self.peek() {
                None | Some(TokenKind::Keyword(Keyword::Else)) => return Ok(statements),
                Some(TokenKind::Colon) => {}
                Some(TokenKind::Keyword(Keyword::Rem)) => {
                    self.advance();
                    statements.push(Stmt::Rem);
                    return Ok(statements);
                }
                Some(other) => {
                    return Err(CompileError::syntax(
                        format!("expected ':' but found {}", describe(other)),
                        self.pos(),
                    ))
                }
            }
        }
    }

    fn statement(&mut self) -> Result<Stmt, CompileError> {
        let pos = self.pos();
        let Some(kind) = self.peek().cloned() else {
            return Err(CompileError::syntax("expected a statement", pos));
        };

        match kind {
            TokenKind::Ident(_) => self.assignment(),
            TokenKind::Keyword(keyword) => {
                self.advance();
                match keyword {
                    Keyword::Let => self.assignment(),
                    Keyword::Print => self.print(),
                    Keyword::If => self.if_statement(),
                    Keyword::Goto => Ok(Stmt::Goto(self.line_number()?)),
                    Keyword::Gosub => Ok(Stmt::Gosub(self.line_number()?)),
                    Keyword::Return => Ok(Stmt::Return),
                    Keyword::End => Ok(Stmt::End),
                    Keyword::Stop => Ok(Stmt::Stop),
                    Keyword::Clear => Ok(Stmt::Clear),
                    Keyword::Rem => Ok(Stmt::Rem),
                    Keyword::Error => {
                        let value_pos = self.pos();
                        let code = self.expression()?;
                        if code.value_type() != ValueType::Number {
                            return Err(CompileError::TypeMismatch { pos: value_pos });
                        }
                        Ok(Stmt::Error(code))
                    }
                    other => Err(CompileError::syntax(
                        format!("unsupported command {}", describe(&TokenKind::Keyword(other))),
                        pos,
                    )),
                }
            }
            other => Err(CompileError::syntax(
                format!("unexpected {}", describe(&other)),
                pos,
            )),
        }
    }

    fn assignment(&mut self) -> Result<Stmt, CompileError> {
        let pos = self.pos();
        let name = match self.advance().map(|token| token.kind) {
            Some(TokenKind::Ident(name)) => name,
            _ => return Err(CompileError::syntax("expected a variable name", pos)),
        };
        let target = VarRef {
            key: mangle(&name),
            ty: type_of(&name),
        };
        self.expect(TokenKind::Eq, "'='")?;

        let value_pos = self.pos();
        let value = self.expression()?;
        if value.value_type() != target.ty {
            return Err(CompileError::TypeMismatch { pos: value_pos });
        }
        Ok(Stmt::Let { target, value })
    }

    fn print(&mut self) -> Result<Stmt, CompileError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None
                | Some(TokenKind::Colon)
                | Some(TokenKind::Keyword(Keyword::Else))
                | Some(TokenKind::Keyword(Keyword::Rem)) => break,
                Some(TokenKind::Semicolon) => {
                    self.advance();
                    items.push(PrintItem::Joined);
                }
                Some(TokenKind::Comma) => {
                    self.advance();
                    items.push(PrintItem::NextZone);
                }
                Some(_) => items.push(PrintItem::Expr(self.expression()?)),
            }
        }
        Ok(Stmt::Print(items))
    }

    fn if_statement(&mut self) -> Result<Stmt, CompileError> {
        let cond_pos = self.pos();
        let cond = self.expression()?;
        if cond.value_type() != ValueType::Number {
            return Err(CompileError::TypeMismatch { pos: cond_pos });
        }

        let then = if self.eat(&TokenKind::Keyword(Keyword::Then)) {
            self.branch()?
        } else if self.eat(&TokenKind::Keyword(Keyword::Goto)) {
            Branch::Line(self.line_number()?)
        } else {
            return Err(CompileError::syntax("expected THEN or GOTO", self.pos()));
        };

        let otherwise = if self.eat(&TokenKind::Keyword(Keyword::Else)) {
            Some(self.branch()?)
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    fn branch(&mut self) -> Result<Branch, CompileError> {
        if let Some(TokenKind::Number(_)) = self.peek() {
            return Ok(Branch::Line(self.line_number()?));
        }
        let statements = self.statement_list()?;
        if statements.is_empty() {
            return Err(CompileError::syntax("empty branch", self.pos()));
        }
        Ok(Branch::Statements(statements))
    }

    pub(crate) fn line_number(&mut self) -> Result<u32, CompileError> {
        let pos = self.pos();
        match self.advance().map(|token| token.kind) {
            Some(TokenKind::Number(n)) if n.fract() == 0.0 && (1.0..=65535.0).contains(&n) => {
                Ok(n as u32)
            }
            _ => Err(CompileError::syntax("expected a line number", pos)),
        }
    }
}
