use crate::debugger::HostRuntime;
use crate::error::{BasicError, RuntimeFault};
use crate::parser::{BinaryOp, Branch, Builtin, Expr, PrintItem, Stmt, UnaryOp};
use crate::value::{format_number, Value};
use crate::variables::Variables;
use std::cmp::Ordering;

/// Width of a PRINT zone, in characters.
const ZONE_WIDTH: usize = 13;

const MAX_STRING_LEN: usize = 255;

/// Where control goes after a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Next,
    Goto(u32),
    Gosub(u32),
    Return,
    End,
}

/// Runs statements in order until one transfers control elsewhere.
pub fn run_statements<R: HostRuntime + ?Sized>(
    statements: &[Stmt],
    runtime: &R,
) -> Result<Flow, RuntimeFault> {
    for stmt in statements {
        match run_statement(stmt, runtime)? {
            Flow::Next => {}
            flow => return Ok(flow),
        }
    }
    Ok(Flow::Next)
}

pub fn run_statement<R: HostRuntime + ?Sized>(
    stmt: &Stmt,
    runtime: &R,
) -> Result<Flow, RuntimeFault> {
    match stmt {
        Stmt::Let { target, value } => {
            let value = eval_expr(value, &runtime.variables().borrow())?;
            runtime.variables().borrow_mut().assign(&target.key, value)?;
            Ok(Flow::Next)
        }
        Stmt::Print(items) => {
            let text = print_text(items, &runtime.variables().borrow())?;
            runtime.print(&text);
            Ok(Flow::Next)
        }
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            let taken = number(&eval_expr(cond, &runtime.variables().borrow())?)? != 0.0;
            let branch = if taken { Some(then) } else { otherwise.as_ref() };
            match branch {
                None => Ok(Flow::Next),
                Some(Branch::Line(line)) => Ok(Flow::Goto(*line)),
                Some(Branch::Statements(statements)) => run_statements(statements, runtime),
            }
        }
        Stmt::Goto(line) => Ok(Flow::Goto(*line)),
        Stmt::Gosub(line) => Ok(Flow::Gosub(*line)),
        Stmt::Return => Ok(Flow::Return),
        Stmt::End | Stmt::Stop => Ok(Flow::End),
        Stmt::Error(code) => {
            let code = number(&eval_expr(code, &runtime.variables().borrow())?)?.round();
            if !(0.0..=255.0).contains(&code) {
                return Err(BasicError::ImproperArgument.into());
            }
            Err(RuntimeFault::with_code(code as u16))
        }
        Stmt::Clear => {
            runtime.variables().borrow_mut().clear();
            Ok(Flow::Next)
        }
        Stmt::Rem => Ok(Flow::Next),
    }
}

fn print_text(items: &[PrintItem], vars: &Variables) -> Result<String, RuntimeFault> {
    let mut out = String::new();
    let mut newline = true;
    for item in items {
        match item {
            PrintItem::Expr(expr) => {
                match eval_expr(expr, vars)? {
                    Value::Number(n) if n >= 0.0 => out.push_str(&format!(" {} ", format_number(n))),
                    Value::Number(n) => out.push_str(&format!("{} ", format_number(n))),
                    Value::Str(s) => out.push_str(&s),
                }
                newline = true;
            }
            PrintItem::Joined => newline = false,
            PrintItem::NextZone => {
                let column = out.chars().count();
                out.push_str(&" ".repeat(ZONE_WIDTH - column % ZONE_WIDTH));
                newline = false;
            }
        }
    }
    if newline {
        out.push('\n');
    }
    Ok(out)
}

fn number(value: &Value) -> Result<f64, RuntimeFault> {
    value
        .as_number()
        .ok_or_else(|| BasicError::TypeMismatch.into())
}

fn text(value: &Value) -> Result<&str, RuntimeFault> {
    value.as_str().ok_or_else(|| BasicError::TypeMismatch.into())
}

fn checked(n: f64) -> Result<Value, RuntimeFault> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(BasicError::Overflow.into())
    }
}

fn truth(b: bool) -> Value {
    Value::Number(if b { -1.0 } else { 0.0 })
}

/// Rounds to a 16-bit integer. Values up to &FFFF wrap to negative.
fn to_int(n: f64) -> Result<i16, RuntimeFault> {
    let rounded = n.round();
    if (-32768.0..=32767.0).contains(&rounded) {
        Ok(rounded as i16)
    } else if (32768.0..=65535.0).contains(&rounded) {
        Ok((rounded - 65536.0) as i16)
    } else {
        Err(BasicError::Overflow.into())
    }
}

/// Evaluates an expression against the variable table.
pub fn eval_expr(expr: &Expr, vars: &Variables) -> Result<Value, RuntimeFault> {
    match expr {
        Expr::Number(n) => checked(*n),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Var(var) => Ok(vars.value_of(&var.key, var.ty)),
        Expr::Unary { op, operand } => {
            let n = number(&eval_expr(operand, vars)?)?;
            match op {
                UnaryOp::Neg => checked(-n),
                UnaryOp::Not => Ok(Value::Number(f64::from(!to_int(n)?))),
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, vars)?;
            let rhs = eval_expr(rhs, vars)?;
            binary(*op, lhs, rhs)
        }
        Expr::Call { func, args } => {
            let args = args
                .iter()
                .map(|arg| eval_expr(arg, vars))
                .collect::<Result<Vec<_>, _>>()?;
            call(*func, &args)
        }
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeFault> {
    if op.is_comparison() {
        let ordering = match (&lhs, &rhs) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => return Err(BasicError::TypeMismatch.into()),
        };
        let holds = match op {
            BinaryOp::Eq => ordering == Ordering::Equal,
            BinaryOp::Ne => ordering != Ordering::Equal,
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::Gt => ordering == Ordering::Greater,
            BinaryOp::Le => ordering != Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        return Ok(truth(holds));
    }

    if let (BinaryOp::Add, Value::Str(a), Value::Str(b)) = (op, &lhs, &rhs) {
        if a.chars().count() + b.chars().count() > MAX_STRING_LEN {
            return Err(BasicError::StringTooLong.into());
        }
        return Ok(Value::Str(format!("{a}{b}")));
    }

    let a = number(&lhs)?;
    let b = number(&rhs)?;
    match op {
        BinaryOp::Add => checked(a + b),
        BinaryOp::Sub => checked(a - b),
        BinaryOp::Mul => checked(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(BasicError::DivisionByZero.into());
            }
            checked(a / b)
        }
        BinaryOp::IntDiv | BinaryOp::Mod => {
            let (a, b) = (i32::from(to_int(a)?), i32::from(to_int(b)?));
            if b == 0 {
                return Err(BasicError::DivisionByZero.into());
            }
            let result = if op == BinaryOp::IntDiv { a / b } else { a % b };
            checked(f64::from(result))
        }
        BinaryOp::Pow => checked(a.powf(b)),
        BinaryOp::And => Ok(Value::Number(f64::from(to_int(a)? & to_int(b)?))),
        BinaryOp::Or => Ok(Value::Number(f64::from(to_int(a)? | to_int(b)?))),
        BinaryOp::Xor => Ok(Value::Number(f64::from(to_int(a)? ^ to_int(b)?))),
        _ => Err(BasicError::TypeMismatch.into()),
    }
}

/// A count argument for the string functions: 0..=255.
fn count(value: &Value) -> Result<usize, RuntimeFault> {
    let n = number(value)?.round();
    if (0.0..=255.0).contains(&n) {
        Ok(n as usize)
    } else {
        Err(BasicError::ImproperArgument.into())
    }
}

/// Parses the longest numeric prefix, as `VAL` does. Anything else is 0.
fn parse_leading_number(s: &str) -> f64 {
    let s = s.trim_start();
    let candidate: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        .collect();
    (1..=candidate.len())
        .rev()
        .find_map(|end| candidate[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn call(func: Builtin, args: &[Value]) -> Result<Value, RuntimeFault> {
    let improper = || -> RuntimeFault { BasicError::ImproperArgument.into() };
    match func {
        Builtin::Abs => checked(number(&args[0])?.abs()),
        Builtin::Int => checked(number(&args[0])?.floor()),
        Builtin::Fix => checked(number(&args[0])?.trunc()),
        Builtin::Sgn => {
            let n = number(&args[0])?;
            let sign = if n > 0.0 {
                1.0
            } else if n < 0.0 {
                -1.0
            } else {
                0.0
            };
            Ok(Value::Number(sign))
        }
        Builtin::Sqr => {
            let n = number(&args[0])?;
            if n < 0.0 {
                return Err(improper());
            }
            checked(n.sqrt())
        }
        Builtin::Sin => checked(number(&args[0])?.sin()),
        Builtin::Cos => checked(number(&args[0])?.cos()),
        Builtin::Tan => checked(number(&args[0])?.tan()),
        Builtin::Atn => checked(number(&args[0])?.atan()),
        Builtin::Exp => checked(number(&args[0])?.exp()),
        Builtin::Log => {
            let n = number(&args[0])?;
            if n <= 0.0 {
                return Err(improper());
            }
            checked(n.ln())
        }
        Builtin::Len => Ok(Value::Number(text(&args[0])?.chars().count() as f64)),
        Builtin::Asc => {
            let first = text(&args[0])?.chars().next().ok_or_else(improper)?;
            Ok(Value::Number(f64::from(u32::from(first))))
        }
        Builtin::Val => Ok(Value::Number(parse_leading_number(text(&args[0])?))),
        Builtin::Chr => {
            let code = count(&args[0])?;
            let byte = u8::try_from(code).map_err(|_| improper())?;
            Ok(Value::Str(char::from(byte).to_string()))
        }
        Builtin::Str => {
            let n = number(&args[0])?;
            let formatted = if n >= 0.0 {
                format!(" {}", format_number(n))
            } else {
                format_number(n)
            };
            Ok(Value::Str(formatted))
        }
        Builtin::Left => {
            let n = count(&args[1])?;
            Ok(Value::Str(text(&args[0])?.chars().take(n).collect()))
        }
        Builtin::Right => {
            let s = text(&args[0])?;
            let n = count(&args[1])?;
            let skip = s.chars().count().saturating_sub(n);
            Ok(Value::Str(s.chars().skip(skip).collect()))
        }
        Builtin::Mid => {
            let s = text(&args[0])?;
            let start = count(&args[1])?;
            if start == 0 {
                return Err(improper());
            }
            let len = match args.get(2) {
                Some(len) => count(len)?,
                None => MAX_STRING_LEN,
            };
            Ok(Value::Str(s.chars().skip(start - 1).take(len).collect()))
        }
        Builtin::Upper => Ok(Value::Str(text(&args[0])?.to_uppercase())),
        Builtin::Lower => Ok(Value::Str(text(&args[0])?.to_lowercase())),
        Builtin::Min | Builtin::Max => {
            let mut result = number(&args[0])?;
            for arg in &args[1..] {
                let n = number(arg)?;
                result = if func == Builtin::Min {
                    result.min(n)
                } else {
                    result.max(n)
                };
            }
            Ok(Value::Number(result))
        }
    }
}
