//! Console evaluation: compiles a snippet on demand and runs it against the
//! live variables of the paused program.

pub mod interpreter;

pub use interpreter::{eval_expr, run_statement, run_statements, Flow};

use crate::debugger::{ConditionEvaluator, HostRuntime};
use crate::error::EvalError;
use crate::parser::{compile_line, is_blocked_in_console, CompiledLine};
use crate::value::Value;
use crate::variables::mangle;
use std::rc::Rc;
use tracing::{debug, trace};

/// Name of the temporary that receives an evaluated expression.
const RESULT_NAME: &str = "eval.result";

/// Stateless expression/statement evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates `expression` by compiling `LET eval.result=(expression)`,
    /// retrying with a string temporary on a type mismatch, and reading the
    /// temporary back.
    pub fn evaluate<R: HostRuntime + ?Sized>(
        &self,
        expression: &str,
        runtime: &R,
    ) -> Result<Value, EvalError> {
        let mut name = RESULT_NAME.to_string();
        let mut compiled = compile_line(&format!("1 let {name}=({expression})"));
        if compiled.as_ref().is_err_and(|err| err.is_type_mismatch()) {
            name.push('$');
            compiled = compile_line(&format!("1 let {name}=({expression})"));
        }
        let compiled = compiled?;

        let outcome = self.run(&compiled, runtime);
        let key = mangle(&name);
        let value = runtime.variables().borrow_mut().remove(&key);
        outcome?;

        trace!(expression, %key, ?value, "evaluated");
        Ok(value.unwrap_or_default())
    }

    /// Runs `statement` for its side effects. Statements that would move the
    /// program counter are refused.
    pub fn execute<R: HostRuntime + ?Sized>(
        &self,
        statement: &str,
        runtime: &R,
    ) -> Result<(), EvalError> {
        if is_blocked_in_console(statement) {
            return Err(EvalError::NotAllowed);
        }
        let compiled = compile_line(&format!("1 {statement}"))?;
        self.run(&compiled, runtime)
    }

    fn run<R: HostRuntime + ?Sized>(
        &self,
        compiled: &CompiledLine,
        runtime: &R,
    ) -> Result<(), EvalError> {
        match run_statements(&compiled.statements, runtime)? {
            Flow::Next => Ok(()),
            flow => {
                debug!(?flow, "control transfer refused in console");
                Err(EvalError::NotAllowed)
            }
        }
    }

    /// A condition evaluator for breakpoints: the condition holds when it
    /// evaluates to a non-zero number or a non-empty string.
    pub fn condition<R: HostRuntime + ?Sized + 'static>(self, runtime: Rc<R>) -> ConditionEvaluator {
        Box::new(move |condition: &str| Ok(self.evaluate(condition, &*runtime)?.is_truthy()))
    }
}
