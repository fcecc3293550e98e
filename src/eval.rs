//! Two-tier argument expression evaluation.
//!
//! Tier one asks the host to constant-fold the expression with no observable
//! side effects. Only when that fails does tier two compile and run the
//! fragment through the host's incremental compilation service, which is
//! strictly slower and may mutate global state. Callers that need
//! side-effect-free evaluation must rely on tier one succeeding.

use crate::args::ArgStack;
use crate::error::{CallError, Severity};
use crate::host::{ArgExpr, DiagnosticSink, ExpressionService};
use crate::value::TypedValue;

/// Evaluates argument expressions against a host expression service.
pub struct ArgEvaluator<'a> {
    exprs: &'a dyn ExpressionService,
    diag: &'a dyn DiagnosticSink,
}

impl<'a> ArgEvaluator<'a> {
    pub fn new(exprs: &'a dyn ExpressionService, diag: &'a dyn DiagnosticSink) -> Self {
        Self { exprs, diag }
    }

    /// Evaluate one expression: constant fold first, full compilation as the
    /// fallback.
    pub fn evaluate(&self, expr: &ArgExpr) -> Result<TypedValue, CallError> {
        if let Some(value) = self.exprs.eval_constant(expr) {
            return Ok(value);
        }
        self.exprs.eval_compiled(expr.text())
    }

    /// Evaluate a comma-separated argument list onto `stack`.
    ///
    /// The stack is reset first, then expressions are evaluated left to
    /// right. Evaluation stops at the first failing expression and keeps the
    /// successfully evaluated prefix; the failure is reported to the
    /// diagnostic sink. A short stack is rejected later, at marshal time,
    /// never silently zero-filled.
    pub fn eval_arg_list(&self, text: &str, stack: &mut ArgStack) {
        stack.reset();
        for expr in self.exprs.find_arg_exprs(text) {
            match self.evaluate(&expr) {
                Ok(value) => stack.push(value),
                Err(err) => {
                    self.diag.report(
                        Severity::Error,
                        "ArgEvaluator::eval_arg_list",
                        &format!("{err}"),
                    );
                    break;
                }
            }
        }
    }
}
