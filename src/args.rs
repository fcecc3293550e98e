//! The pending call's argument stack.
//!
//! Insertion order is positional call order. The stack never validates what
//! is pushed; whether a value can be marshaled into a formal parameter is
//! decided at invocation time. Every mutation bumps a generation counter,
//! which the engine uses to invalidate any cached marshal buffer.

use crate::value::TypedValue;

/// Ordered, mutable sequence of argument values for the pending call.
#[derive(Debug, Default)]
pub struct ArgStack {
    values: Vec<TypedValue>,
    generation: u64,
}

impl ArgStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all pending arguments.
    pub fn reset(&mut self) {
        self.values.clear();
        self.generation += 1;
    }

    /// Append one value. Always accepted; marshaling validates later.
    pub fn push(&mut self, value: impl Into<TypedValue>) {
        self.values.push(value.into());
        self.generation += 1;
    }

    pub fn push_i32(&mut self, value: i32) {
        self.push(TypedValue::I32(value));
    }

    pub fn push_i64(&mut self, value: i64) {
        self.push(TypedValue::I64(value));
    }

    pub fn push_u64(&mut self, value: u64) {
        self.push(TypedValue::U64(value));
    }

    pub fn push_f64(&mut self, value: f64) {
        self.push(TypedValue::F64(value));
    }

    /// Replace the whole stack with the given integer values.
    pub fn set_from_slice(&mut self, values: &[i64]) {
        self.reset();
        for &v in values {
            self.push_i64(v);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[TypedValue] {
        &self.values
    }

    /// Monotonic counter bumped on every mutation; cached marshal state
    /// keyed off an older generation is stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_order() {
        let mut stack = ArgStack::new();
        stack.push_i32(3);
        stack.push_f64(4.5);
        assert_eq!(
            stack.values(),
            &[TypedValue::I32(3), TypedValue::F64(4.5)]
        );
    }

    #[test]
    fn test_mutations_bump_generation() {
        let mut stack = ArgStack::new();
        let start = stack.generation();
        stack.push_i64(1);
        assert!(stack.generation() > start);
        let pushed = stack.generation();
        stack.reset();
        assert!(stack.is_empty());
        assert!(stack.generation() > pushed);
    }

    #[test]
    fn test_set_from_slice_discards_prior() {
        let mut stack = ArgStack::new();
        stack.push_f64(9.0);
        stack.set_from_slice(&[1, 2, 3]);
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.values()[0], TypedValue::I64(1));
        assert_eq!(stack.values()[2], TypedValue::I64(3));
    }

    #[test]
    fn test_push_accepts_unsupported_categories() {
        // Validation is deferred to marshal time.
        let mut stack = ArgStack::new();
        stack.push(TypedValue::Void);
        assert_eq!(stack.len(), 1);
    }
}
