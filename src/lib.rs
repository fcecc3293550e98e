//! Dynamic function invocation engine.
//!
//! `callfunc` bridges three representations of "a function": a symbolic
//! query (scope + name + argument text or prototype), a resolved declaration
//! with full type information, and an executable entry point. It keeps the
//! three synchronized across repeated argument rebinding and invocation.
//!
//! The host front end, expression evaluator, and compilation service are
//! consumed through the traits in [`host`]; this crate performs none of that
//! work itself.
//!
//! ```ignore
//! let mut cf = CallFunc::new(exprs, codegen, diag);
//! cf.set_func(&scope, "Bar", "3, 4.5", false);
//! let result = cf.exec_int(Some(obj_addr));
//! ```

pub mod args;
pub mod engine;
pub mod error;
pub mod eval;
pub mod host;
mod marshal;
pub mod types;
pub mod value;

pub use args::ArgStack;
pub use engine::CallFunc;
pub use error::{CallError, Severity};
pub use eval::ArgEvaluator;
pub use host::{
    ArgExpr, CallFrame, CodegenService, CollectingSink, DiagnosticSink, EntryPoint,
    EntryRegistry, ExpressionService, NullSink, ScopeInfo,
};
pub use types::{DataType, DeclId, MatchMode, MethodDecl, TypeKind, TypeQualifiers};
pub use value::TypedValue;
