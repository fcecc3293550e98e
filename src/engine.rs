//! The invocation engine: resolve a callable, bind arguments, invoke.
//!
//! [`CallFunc`] owns exactly one callable binding and one argument stack at a
//! time. The binding is a three-way state: never resolved (`Unset`), resolved
//! with no match (`NoMatch`, still a binding attempt callers can inspect),
//! or usable (`Bound`). Binding anything new unconditionally discards pending
//! arguments and any cached executable entry; stale arguments are never
//! carried across different resolved functions.
//!
//! Invocation runs the fixed sequence: obtain an entry (cached or freshly
//! compiled), marshal the argument stack against the formal parameters,
//! adjust the receiver by the stored subobject offset, call, extract. Every
//! failure short-circuits before the native call, so a rejected invocation
//! has no partial side effects.
//!
//! One engine instance is single-threaded by contract: no internal locking,
//! callers serialize access or keep one instance per thread. Obtaining an
//! entry may block for as long as the host's compilation takes.

use std::sync::Arc;

use crate::args::ArgStack;
use crate::error::{CallError, Severity};
use crate::eval::ArgEvaluator;
use crate::host::{
    ArgExpr, CallFrame, CodegenService, DiagnosticSink, EntryPoint, ExpressionService, ScopeInfo,
};
use crate::marshal::{marshal_args, widen};
use crate::types::{DataType, MatchMode, MethodDecl};
use crate::value::TypedValue;

/// A usable binding: declaration, receiver adjustment, cached entry.
#[derive(Debug)]
struct BoundMethod {
    decl: MethodDecl,
    /// Byte offset from a derived-object address to the subobject the
    /// implementation expects.
    this_offset: isize,
    entry: Option<EntryPoint>,
    /// Entry production already failed for this binding; do not ask again
    /// until re-bound.
    entry_failed: bool,
}

impl BoundMethod {
    fn new(decl: MethodDecl, this_offset: isize) -> Self {
        Self {
            decl,
            this_offset,
            entry: None,
            entry_failed: false,
        }
    }
}

/// Binding state of the engine.
#[derive(Debug)]
enum MethodSlot {
    /// No resolution attempted, or explicitly cleared.
    Unset,
    /// A lookup ran and found nothing; distinguishable from `Unset`.
    NoMatch,
    Bound(BoundMethod),
}

/// Marshaled argument values, valid for one argument-stack generation.
#[derive(Debug)]
struct MarshalCache {
    generation: u64,
    values: Vec<TypedValue>,
}

/// Dynamic function invocation engine.
///
/// Typical use: resolve with [`CallFunc::set_func`] /
/// [`CallFunc::set_func_proto`] / [`CallFunc::set_method`], populate
/// arguments directly or from expression text, then invoke through one of
/// the `exec_*` entry points.
pub struct CallFunc {
    exprs: Arc<dyn ExpressionService>,
    codegen: Arc<dyn CodegenService>,
    diag: Arc<dyn DiagnosticSink>,
    slot: MethodSlot,
    args: ArgStack,
    mode: MatchMode,
    marshal_cache: Option<MarshalCache>,
}

impl CallFunc {
    pub fn new(
        exprs: Arc<dyn ExpressionService>,
        codegen: Arc<dyn CodegenService>,
        diag: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            exprs,
            codegen,
            diag,
            slot: MethodSlot::Unset,
            args: ArgStack::new(),
            mode: MatchMode::default(),
            marshal_cache: None,
        }
    }

    // ------------------------------------------------------------------
    // State inspection
    // ------------------------------------------------------------------

    /// Whether a usable declaration is bound.
    pub fn is_valid(&self) -> bool {
        matches!(self.slot, MethodSlot::Bound(_))
    }

    /// Whether any resolution attempt has been recorded, usable or not.
    pub fn has_slot(&self) -> bool {
        !matches!(self.slot, MethodSlot::Unset)
    }

    /// The bound declaration, if usable.
    pub fn method(&self) -> Option<&MethodDecl> {
        match &self.slot {
            MethodSlot::Bound(bound) => Some(&bound.decl),
            _ => None,
        }
    }

    /// The receiver adjustment of the current binding.
    pub fn this_offset(&self) -> Option<isize> {
        match &self.slot {
            MethodSlot::Bound(bound) => Some(bound.this_offset),
            _ => None,
        }
    }

    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    pub fn args(&self) -> &ArgStack {
        &self.args
    }

    /// Direct access for pushing argument values. Any mutation bumps the
    /// stack generation, which invalidates the cached marshal buffer.
    pub fn args_mut(&mut self) -> &mut ArgStack {
        &mut self.args
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Clear the binding and all pending arguments.
    pub fn reset(&mut self) {
        self.bind(MethodSlot::Unset);
    }

    /// Resolve by name plus literal argument-list text, then evaluate that
    /// text onto the argument stack.
    ///
    /// A lone `")"` is accepted as meaning "no arguments" (legacy
    /// convention). Returns the receiver byte offset on success.
    pub fn set_func(
        &mut self,
        scope: &dyn ScopeInfo,
        name: &str,
        arglist: &str,
        receiver_const: bool,
    ) -> Option<isize> {
        self.bind(MethodSlot::Unset);
        self.mode = MatchMode::Convert;
        if !scope.is_valid() {
            self.report("CallFunc::set_func", &CallError::InvalidScope);
            return None;
        }
        let arglist = if arglist == ")" { "" } else { arglist };
        match scope.find_by_arglist(name, arglist, receiver_const) {
            Some((decl, offset)) => {
                self.slot = MethodSlot::Bound(BoundMethod::new(decl, offset));
                // The lookup already parsed the list; evaluate it again here
                // to populate the stack.
                let exprs = Arc::clone(&self.exprs);
                let diag = Arc::clone(&self.diag);
                ArgEvaluator::new(exprs.as_ref(), diag.as_ref())
                    .eval_arg_list(arglist, &mut self.args);
                Some(offset)
            }
            None => {
                self.report(
                    "CallFunc::set_func",
                    &CallError::NoMatchingCallable { name: name.into() },
                );
                self.slot = MethodSlot::NoMatch;
                None
            }
        }
    }

    /// Resolve by name plus an explicit parameter-type prototype.
    ///
    /// `mode` controls both the lookup and, later, which conversions the
    /// marshaler applies. Returns the receiver byte offset on success.
    pub fn set_func_proto(
        &mut self,
        scope: &dyn ScopeInfo,
        name: &str,
        proto: &[DataType],
        receiver_const: bool,
        mode: MatchMode,
    ) -> Option<isize> {
        self.bind(MethodSlot::Unset);
        self.mode = mode;
        if !scope.is_valid() {
            self.report("CallFunc::set_func_proto", &CallError::InvalidScope);
            return None;
        }
        match scope.find_by_prototype(name, proto, receiver_const, mode) {
            Some((decl, offset)) => {
                self.slot = MethodSlot::Bound(BoundMethod::new(decl, offset));
                Some(offset)
            }
            None => {
                self.report(
                    "CallFunc::set_func_proto",
                    &CallError::NoMatchingCallable { name: name.into() },
                );
                self.slot = MethodSlot::NoMatch;
                None
            }
        }
    }

    /// Adopt an already-resolved declaration. No lookup is performed and no
    /// receiver adjustment is known, so the offset is zero.
    pub fn set_method(&mut self, decl: MethodDecl) {
        self.bind(MethodSlot::Bound(BoundMethod::new(decl, 0)));
        self.mode = MatchMode::Convert;
    }

    // ------------------------------------------------------------------
    // Argument binding
    // ------------------------------------------------------------------

    /// Reset the stack and evaluate a comma-separated argument list onto it.
    /// On a failing expression the successfully evaluated prefix is kept.
    pub fn set_args(&mut self, params: &str) {
        let exprs = Arc::clone(&self.exprs);
        let diag = Arc::clone(&self.diag);
        ArgEvaluator::new(exprs.as_ref(), diag.as_ref()).eval_arg_list(params, &mut self.args);
    }

    /// Replace the stack with the given integer values.
    pub fn set_args_slice(&mut self, values: &[i64]) {
        self.args.set_from_slice(values);
    }

    /// Evaluate one expression and append its value to the argument stack.
    /// Reports the failure and leaves the stack unchanged when the
    /// expression cannot be reduced to a value.
    pub fn push_arg_expr(&mut self, text: &str) -> bool {
        let exprs = Arc::clone(&self.exprs);
        let diag = Arc::clone(&self.diag);
        let evaluated = ArgEvaluator::new(exprs.as_ref(), diag.as_ref())
            .evaluate(&ArgExpr::new(text));
        match evaluated {
            Ok(value) => {
                self.args.push(value);
                true
            }
            Err(err) => {
                self.report("CallFunc::push_arg_expr", &err);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------

    /// Run the full invocation sequence, returning the extracted value.
    ///
    /// This is the `Result` form behind the `exec_*` entry points; use it
    /// when the failure itself matters to the caller.
    pub fn try_exec(&mut self, receiver: Option<usize>) -> Result<TypedValue, CallError> {
        let mode = self.mode;
        let MethodSlot::Bound(bound) = &mut self.slot else {
            return Err(CallError::InvocationOnInvalidCallable);
        };

        // (a) Obtain the executable entry, cached or freshly produced.
        let entry = match &bound.entry {
            Some(entry) => entry.clone(),
            None => {
                if bound.entry_failed {
                    return Err(CallError::AddressResolutionFailed {
                        name: bound.decl.name.clone(),
                    });
                }
                match self.codegen.entry_for(&bound.decl) {
                    Some(entry) => {
                        bound.entry = Some(entry.clone());
                        entry
                    }
                    None => {
                        bound.entry_failed = true;
                        return Err(CallError::AddressResolutionFailed {
                            name: bound.decl.name.clone(),
                        });
                    }
                }
            }
        };

        // (b) Reconcile arguments with formal parameters, before any code
        // runs.
        let marshaled = match &self.marshal_cache {
            Some(cache) if cache.generation == self.args.generation() => cache.values.clone(),
            _ => {
                let values = marshal_args(self.args.values(), &bound.decl.params, mode)?;
                self.marshal_cache = Some(MarshalCache {
                    generation: self.args.generation(),
                    values: values.clone(),
                });
                values
            }
        };

        // (c) Apply the subobject offset to the receiver address.
        let adjusted = receiver.map(|addr| (addr as isize + bound.this_offset) as usize);

        // (d) Call through the entry.
        let mut frame = CallFrame::new(adjusted, &marshaled);
        entry.call(&mut frame);

        // (e) Extract.
        Ok(frame.take_return())
    }

    /// Invoke and discard any produced value.
    pub fn exec(&mut self, receiver: Option<usize>) {
        if let Err(err) = self.try_exec(receiver) {
            self.report("CallFunc::exec", &err);
        }
    }

    /// Invoke and keep the full typed result. `None` on any failure.
    pub fn exec_with_value(&mut self, receiver: Option<usize>) -> Option<TypedValue> {
        match self.try_exec(receiver) {
            Ok(value) => Some(value),
            Err(err) => {
                self.report("CallFunc::exec_with_value", &err);
                None
            }
        }
    }

    /// Invoke and extract a narrow integer. The raw return is sign/zero
    /// extended per the formal return type's signedness, then narrowed;
    /// floating-point returns truncate toward zero, mirroring the argument
    /// marshaling rule. Returns 0 on any failure.
    pub fn exec_int(&mut self, receiver: Option<usize>) -> i32 {
        match self.try_exec(receiver) {
            Ok(value) => widen(&value).unwrap_or(0) as i32,
            Err(err) => {
                self.report("CallFunc::exec_int", &err);
                0
            }
        }
    }

    /// Invoke and extract a wide integer; floating-point returns truncate
    /// toward zero. Returns 0 on any failure.
    pub fn exec_int64(&mut self, receiver: Option<usize>) -> i64 {
        match self.try_exec(receiver) {
            Ok(value) => widen(&value).unwrap_or(0),
            Err(err) => {
                self.report("CallFunc::exec_int64", &err);
                0
            }
        }
    }

    /// Invoke and extract a floating-point value in the native binary
    /// representation; no float/double truncation is added by this layer.
    /// Returns 0.0 on any failure.
    pub fn exec_double(&mut self, receiver: Option<usize>) -> f64 {
        match self.try_exec(receiver) {
            Ok(value) => value.as_f64().unwrap_or(0.0),
            Err(err) => {
                self.report("CallFunc::exec_double", &err);
                0.0
            }
        }
    }

    // ------------------------------------------------------------------

    fn bind(&mut self, slot: MethodSlot) {
        self.slot = slot;
        self.args.reset();
        self.marshal_cache = None;
    }

    fn report(&self, component: &str, err: &CallError) {
        self.diag.report(Severity::Error, component, &err.to_string());
    }
}
