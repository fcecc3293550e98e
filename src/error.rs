//! Error taxonomy and diagnostic severities.
//!
//! Every failure the engine can surface is a [`CallError`] variant. Internal
//! paths propagate them with `Result` and `?`; the zero-returning `exec_*`
//! surface converts them into a diagnostic report plus an empty result (see
//! [`crate::engine::CallFunc`]). There is no retry anywhere: recovery is
//! always caller-driven (re-bind, fix arguments, re-resolve).

use thiserror::Error;

/// Failures surfaced by resolution, argument evaluation, and invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The enclosing scope descriptor is itself unusable; resolution did not
    /// run and the engine holds no binding.
    #[error("scope is invalid")]
    InvalidScope,

    /// Lookup ran and found nothing. The engine keeps a bound-but-invalid
    /// slot so callers can distinguish "never resolved" from "resolved, no
    /// match".
    #[error("no matching callable for '{name}'")]
    NoMatchingCallable { name: String },

    /// An argument expression could not be reduced to a value. Arguments
    /// evaluated before this one are retained.
    #[error("could not evaluate argument expression '{expr}'")]
    EvalFailure { expr: String },

    /// A pushed value's category has no marshaling rule for the formal
    /// parameter slot it landed in.
    #[error("no marshaling rule for {type_name} value at argument {index}")]
    UnsupportedArgumentType { index: usize, type_name: String },

    /// Arity or conversion mismatch detected before any code executed.
    #[error("argument mismatch: {detail}")]
    ArgumentMismatch { detail: String },

    /// The compilation/linking service could not produce a callable entry.
    /// Not retryable for the current binding.
    #[error("could not produce an executable entry for '{name}'")]
    AddressResolutionFailed { name: String },

    /// An invocation entry point was called without a usable bound
    /// declaration.
    #[error("attempt to invoke while no usable callable is bound")]
    InvocationOnInvalidCallable,
}

/// Severity attached to every diagnostic report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}
