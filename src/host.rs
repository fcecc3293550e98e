//! Collaborator contracts and the native call surface.
//!
//! The engine does not parse source, rank overloads, or compile code itself.
//! It consumes those services through the traits in this module:
//!
//! - [`ScopeInfo`]: argument-list-aware and prototype-aware lookup within
//!   one class scope.
//! - [`ExpressionService`]: splits an argument list into expressions and
//!   evaluates one, either as a side-effect-free constant or through full
//!   compilation.
//! - [`CodegenService`]: turns a resolved declaration into an executable
//!   [`EntryPoint`]. Producing an entry may trigger just-in-time compilation
//!   and can block for as long as that takes.
//! - [`DiagnosticSink`]: fire-and-forget diagnostic reporting.
//!
//! [`EntryRegistry`] is a map-backed `CodegenService` for hosts that compile
//! entries ahead of time.

use std::fmt;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::error::Severity;
use crate::types::{DataType, DeclId, MatchMode, MethodDecl};
use crate::value::TypedValue;

/// One argument expression produced by [`ExpressionService::find_arg_exprs`].
///
/// The engine treats the expression as opaque apart from its source text,
/// which is what the compilation fallback re-submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgExpr {
    text: String,
}

impl ArgExpr {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for ArgExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Lookup interface of one class scope.
///
/// Both lookups return the matched declaration plus the byte offset from a
/// derived-object address to the subobject the implementation expects, or
/// `None` when nothing matches.
pub trait ScopeInfo {
    /// Whether this scope descriptor is usable at all.
    fn is_valid(&self) -> bool;

    /// Match by name plus literal argument-list text.
    fn find_by_arglist(
        &self,
        name: &str,
        arglist: &str,
        receiver_const: bool,
    ) -> Option<(MethodDecl, isize)>;

    /// Match by name plus an explicit parameter-type prototype.
    fn find_by_prototype(
        &self,
        name: &str,
        proto: &[DataType],
        receiver_const: bool,
        mode: MatchMode,
    ) -> Option<(MethodDecl, isize)>;
}

/// Expression splitting and evaluation, provided by the host front end.
pub trait ExpressionService {
    /// Split a comma-separated argument list into individual expressions.
    /// An empty or all-whitespace list yields no expressions.
    fn find_arg_exprs(&self, text: &str) -> Vec<ArgExpr>;

    /// Constant-fold one expression with no observable side effects.
    /// `None` means the expression is not a compile-time constant.
    fn eval_constant(&self, expr: &ArgExpr) -> Option<TypedValue>;

    /// Compile and run the fragment as a freestanding statement, capturing
    /// its produced value. May mutate global state.
    fn eval_compiled(&self, text: &str) -> Result<TypedValue, crate::error::CallError>;
}

/// Produces executable entries for resolved declarations.
pub trait CodegenService {
    /// A callable entry for `decl`, or `None` when compilation/linking
    /// cannot provide one.
    fn entry_for(&self, decl: &MethodDecl) -> Option<EntryPoint>;
}

/// Fire-and-forget diagnostic reporting.
pub trait DiagnosticSink {
    fn report(&self, severity: Severity, component: &str, message: &str);
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _severity: Severity, _component: &str, _message: &str) {}
}

/// A recorded diagnostic, as captured by [`CollectingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub component: String,
    pub message: String,
}

/// Sink that records every report; useful in tests and tooling.
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn reports(&self) -> Vec<Diagnostic> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of reports at or above `severity`.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.reports()
            .iter()
            .filter(|d| d.severity >= severity)
            .count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, severity: Severity, component: &str, message: &str) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(Diagnostic {
                severity,
                component: component.to_string(),
                message: message.to_string(),
            });
        }
    }
}

/// The frame handed to an entry point for one call.
///
/// Carries the adjusted receiver address, the marshaled argument values in
/// positional order, and a slot for the return value.
pub struct CallFrame<'a> {
    receiver: Option<usize>,
    args: &'a [TypedValue],
    ret: TypedValue,
}

impl<'a> CallFrame<'a> {
    pub fn new(receiver: Option<usize>, args: &'a [TypedValue]) -> Self {
        Self {
            receiver,
            args,
            ret: TypedValue::Void,
        }
    }

    /// The effective receiver address (already offset-adjusted), if any.
    pub fn receiver(&self) -> Option<usize> {
        self.receiver
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn arg(&self, index: usize) -> Option<&TypedValue> {
        self.args.get(index)
    }

    pub fn args(&self) -> &[TypedValue] {
        self.args
    }

    /// Argument widened to `i64`; arguments are already in formal types, so
    /// this is extension only.
    pub fn arg_i64(&self, index: usize) -> Option<i64> {
        self.arg(index).and_then(TypedValue::as_i64)
    }

    pub fn arg_f64(&self, index: usize) -> Option<f64> {
        self.arg(index).and_then(TypedValue::as_f64)
    }

    pub fn set_return(&mut self, value: impl Into<TypedValue>) {
        self.ret = value.into();
    }

    pub fn take_return(self) -> TypedValue {
        self.ret
    }
}

/// An executable entry produced by codegen for one declaration.
///
/// Cloning shares the underlying callable; [`EntryPoint::ptr_eq`] tells
/// whether two handles refer to the same compiled entry.
#[derive(Clone)]
pub struct EntryPoint(Arc<dyn Fn(&mut CallFrame) + Send + Sync>);

impl EntryPoint {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut CallFrame) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Perform the call this entry stands for.
    pub fn call(&self, frame: &mut CallFrame) {
        (self.0)(frame)
    }

    /// Whether both handles point at the same compiled entry.
    pub fn ptr_eq(&self, other: &EntryPoint) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint").finish_non_exhaustive()
    }
}

/// Map-backed [`CodegenService`]: declaration identity to compiled entry.
///
/// Hosts that compile entries up front register them here; `entry_for` is
/// then a plain lookup. Registering under an existing id replaces the entry.
#[derive(Debug, Default)]
pub struct EntryRegistry {
    entries: FxHashMap<DeclId, EntryPoint>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: DeclId, entry: EntryPoint) {
        self.entries.insert(id, entry);
    }

    pub fn contains(&self, id: DeclId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CodegenService for EntryRegistry {
    fn entry_for(&self, decl: &MethodDecl) -> Option<EntryPoint> {
        self.entries.get(&decl.id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeclId, TypeKind};

    fn decl(id: u64) -> MethodDecl {
        MethodDecl::new(
            DeclId::new(id),
            "f",
            vec![],
            DataType::plain(TypeKind::Void),
        )
    }

    #[test]
    fn test_registry_lookup_and_replace() {
        let mut registry = EntryRegistry::new();
        assert!(registry.is_empty());

        registry.register(DeclId::new(1), EntryPoint::new(|f| f.set_return(1i32)));
        registry.register(DeclId::new(1), EntryPoint::new(|f| f.set_return(2i32)));
        assert_eq!(registry.len(), 1);

        let entry = registry.entry_for(&decl(1)).unwrap();
        let mut frame = CallFrame::new(None, &[]);
        entry.call(&mut frame);
        assert_eq!(frame.take_return(), TypedValue::I32(2));

        assert!(registry.entry_for(&decl(2)).is_none());
    }

    #[test]
    fn test_entry_identity() {
        let a = EntryPoint::new(|_| {});
        let b = a.clone();
        let c = EntryPoint::new(|_| {});
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_frame_receiver_and_args() {
        let args = [TypedValue::I32(10), TypedValue::F64(0.5)];
        let frame = CallFrame::new(Some(0x40), &args);
        assert_eq!(frame.receiver(), Some(0x40));
        assert_eq!(frame.arg_i64(0), Some(10));
        assert_eq!(frame.arg_f64(1), Some(0.5));
        assert_eq!(frame.arg(2), None);
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.report(Severity::Warning, "engine", "first");
        sink.report(Severity::Error, "engine", "second");
        assert_eq!(sink.reports().len(), 2);
        assert_eq!(sink.count_at_least(Severity::Error), 1);
    }
}
