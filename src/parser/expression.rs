use super::lexer::{Keyword, TokenKind};
use super::types::{BinaryOp, Builtin, Expr, UnaryOp, VarRef};
use super::Parser;
use crate::error::CompileError;
use crate::value::ValueType;
use crate::variables::{mangle, type_of};

/// Builds a binary node, rejecting operand types the operator cannot take.
fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, pos: usize) -> Result<Expr, CompileError> {
    let (left, right) = (lhs.value_type(), rhs.value_type());
    let accepted = if op == BinaryOp::Add || op.is_comparison() {
        left == right
    } else {
        left == ValueType::Number && right == ValueType::Number
    };
    if !accepted {
        return Err(CompileError::TypeMismatch { pos });
    }
    Ok(Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn numeric_operand(expr: &Expr, pos: usize) -> Result<(), CompileError> {
    if expr.value_type() == ValueType::Number {
        Ok(())
    } else {
        Err(CompileError::TypeMismatch { pos })
    }
}

impl Parser {
    pub(crate) fn expression(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.and_expr()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Keyword(Keyword::Or)) => BinaryOp::Or,
                Some(TokenKind::Keyword(Keyword::Xor)) => BinaryOp::Xor,
                _ => return Ok(lhs),
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.and_expr()?;
            lhs = binary(op, lhs, rhs, pos)?;
        }
    }

    fn and_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.not_expr()?;
        while self.peek() == Some(&TokenKind::Keyword(Keyword::And)) {
            let pos = self.pos();
            self.advance();
            let rhs = self.not_expr()?;
            lhs = binary(BinaryOp::And, lhs, rhs, pos)?;
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, CompileError> {
        if self.peek() == Some(&TokenKind::Keyword(Keyword::Not)) {
            let pos = self.pos();
            self.advance();
            let operand = self.not_expr()?;
            numeric_operand(&operand, pos)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Eq) => BinaryOp::Eq,
                Some(TokenKind::Ne) => BinaryOp::Ne,
                Some(TokenKind::Lt) => BinaryOp::Lt,
                Some(TokenKind::Gt) => BinaryOp::Gt,
                Some(TokenKind::Le) => BinaryOp::Le,
                Some(TokenKind::Ge) => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.additive()?;
            lhs = binary(op, lhs, rhs, pos)?;
        }
    }

    fn additive(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.mod_expr()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.mod_expr()?;
            lhs = binary(op, lhs, rhs, pos)?;
        }
    }

    fn mod_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.int_div()?;
        while self.peek() == Some(&TokenKind::Keyword(Keyword::Mod)) {
            let pos = self.pos();
            self.advance();
            let rhs = self.int_div()?;
            lhs = binary(BinaryOp::Mod, lhs, rhs, pos)?;
        }
        Ok(lhs)
    }

    fn int_div(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.multiplicative()?;
        while self.peek() == Some(&TokenKind::Backslash) {
            let pos = self.pos();
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = binary(BinaryOp::IntDiv, lhs, rhs, pos)?;
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs, pos)?;
        }
    }

    fn unary(&mut self) -> Result<Expr, CompileError> {
        match self.peek() {
            Some(TokenKind::Minus) => {
                let pos = self.pos();
                self.advance();
                let operand = self.unary()?;
                numeric_operand(&operand, pos)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            Some(TokenKind::Plus) => {
                let pos = self.pos();
                self.advance();
                let operand = self.unary()?;
                numeric_operand(&operand, pos)?;
                Ok(operand)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.primary()?;
        while self.peek() == Some(&TokenKind::Caret) {
            let pos = self.pos();
            self.advance();
            let rhs = self.power_operand()?;
            lhs = binary(BinaryOp::Pow, lhs, rhs, pos)?;
        }
        Ok(lhs)
    }

    /// An exponent may carry its own sign: `2^-1`.
    fn power_operand(&mut self) -> Result<Expr, CompileError> {
        if self.peek() == Some(&TokenKind::Minus) {
            let pos = self.pos();
            self.advance();
            let operand = self.power_operand()?;
            numeric_operand(&operand, pos)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, CompileError> {
        let pos = self.pos();
        let Some(token) = self.advance() else {
            return Err(CompileError::syntax("unexpected end of line", pos));
        };
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                if self.peek() == Some(&TokenKind::LParen) {
                    return self.call(&name, pos);
                }
                Ok(Expr::Var(VarRef {
                    key: mangle(&name),
                    ty: type_of(&name),
                }))
            }
            other => Err(CompileError::syntax(
                format!("unexpected {}", describe(&other)),
                pos,
            )),
        }
    }

    fn call(&mut self, name: &str, pos: usize) -> Result<Expr, CompileError> {
        let Some(func) = Builtin::from_name(&name.to_ascii_lowercase()) else {
            return Err(CompileError::UnknownFunction {
                name: name.to_string(),
                pos,
            });
        };
        self.expect(TokenKind::LParen, "'('")?;

        let mut args = Vec::new();
        if self.peek() != Some(&TokenKind::RParen) {
            loop {
                let arg_pos = self.pos();
                let arg = self.expression()?;
                let params = func.params();
                let expected = params[args.len().min(params.len() - 1)];
                if arg.value_type() != expected {
                    return Err(CompileError::TypeMismatch { pos: arg_pos });
                }
                args.push(arg);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        let (min, max) = func.arity();
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            return Err(CompileError::syntax(
                format!("wrong number of arguments for {name}"),
                pos,
            ));
        }
        Ok(Expr::Call { func, args })
    }
}

pub(crate) fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number {n}"),
        TokenKind::Str(s) => format!("string \"{s}\""),
        TokenKind::Ident(name) => format!("identifier {name}"),
        TokenKind::Keyword(keyword) => format!("keyword {}", format!("{keyword:?}").to_uppercase()),
        other => format!("'{}'", symbol(other)),
    }
}

fn symbol(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Backslash => "\\",
        TokenKind::Caret => "^",
        TokenKind::Eq => "=",
        TokenKind::Ne => "<>",
        TokenKind::Lt => "<",
        TokenKind::Gt => ">",
        TokenKind::Le => "<=",
        TokenKind::Ge => ">=",
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::Comma => ",",
        TokenKind::Semicolon => ";",
        TokenKind::Colon => ":",
        _ => "?",
    }
}
