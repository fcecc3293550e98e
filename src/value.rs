//! Typed values exchanged between the argument stack, the marshaler, and
//! invoked entry points.
//!
//! A [`TypedValue`] is a tagged union whose payload width always matches its
//! tag. Values are cheap `Copy` types; once constructed they are never
//! mutated in place. The accessors perform the sign/zero extension implied by
//! the tag's signedness, so extracting an `I16(-1)` as `i64` yields `-1`
//! while `U16(0xffff)` yields `65535`.

use crate::types::{DataType, TypeKind};

/// A scalar or pointer value together with its semantic type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    Void,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Opaque address payload.
    Ptr(usize),
}

impl TypedValue {
    /// The semantic type this value carries.
    pub fn data_type(&self) -> DataType {
        DataType::plain(self.kind())
    }

    /// The primitive category of this value.
    pub fn kind(&self) -> TypeKind {
        match self {
            TypedValue::Void => TypeKind::Void,
            TypedValue::Bool(_) => TypeKind::Bool,
            TypedValue::I8(_) => TypeKind::Int8,
            TypedValue::I16(_) => TypeKind::Int16,
            TypedValue::I32(_) => TypeKind::Int32,
            TypedValue::I64(_) => TypeKind::Int64,
            TypedValue::U8(_) => TypeKind::UInt8,
            TypedValue::U16(_) => TypeKind::UInt16,
            TypedValue::U32(_) => TypeKind::UInt32,
            TypedValue::U64(_) => TypeKind::UInt64,
            TypedValue::F32(_) => TypeKind::Float,
            TypedValue::F64(_) => TypeKind::Double,
            TypedValue::Ptr(_) => TypeKind::Ptr,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypedValue::Void)
    }

    /// Widen to `i64`: sign-extend signed integers, zero-extend unsigned
    /// ones, map `Bool` to 0/1 and `Ptr` to its address bits.
    ///
    /// Returns `None` for `Void` and floating-point values.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            TypedValue::Bool(b) => Some(b as i64),
            TypedValue::I8(v) => Some(v as i64),
            TypedValue::I16(v) => Some(v as i64),
            TypedValue::I32(v) => Some(v as i64),
            TypedValue::I64(v) => Some(v),
            TypedValue::U8(v) => Some(v as i64),
            TypedValue::U16(v) => Some(v as i64),
            TypedValue::U32(v) => Some(v as i64),
            TypedValue::U64(v) => Some(v as i64),
            TypedValue::Ptr(v) => Some(v as i64),
            TypedValue::Void | TypedValue::F32(_) | TypedValue::F64(_) => None,
        }
    }

    /// Widen to `u64` bits; same domain as [`TypedValue::as_i64`].
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            TypedValue::Bool(b) => Some(b as u64),
            TypedValue::I8(v) => Some(v as u64),
            TypedValue::I16(v) => Some(v as u64),
            TypedValue::I32(v) => Some(v as u64),
            TypedValue::I64(v) => Some(v as u64),
            TypedValue::U8(v) => Some(v as u64),
            TypedValue::U16(v) => Some(v as u64),
            TypedValue::U32(v) => Some(v as u64),
            TypedValue::U64(v) => Some(v),
            TypedValue::Ptr(v) => Some(v as u64),
            TypedValue::Void | TypedValue::F32(_) | TypedValue::F64(_) => None,
        }
    }

    /// Numeric value as `f64`. Integers convert by value, `F32` widens
    /// without added truncation.
    ///
    /// Returns `None` for `Void` and `Ptr`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            TypedValue::Bool(b) => Some(b as u8 as f64),
            TypedValue::I8(v) => Some(v as f64),
            TypedValue::I16(v) => Some(v as f64),
            TypedValue::I32(v) => Some(v as f64),
            TypedValue::I64(v) => Some(v as f64),
            TypedValue::U8(v) => Some(v as f64),
            TypedValue::U16(v) => Some(v as f64),
            TypedValue::U32(v) => Some(v as f64),
            TypedValue::U64(v) => Some(v as f64),
            TypedValue::F32(v) => Some(v as f64),
            TypedValue::F64(v) => Some(v),
            TypedValue::Void | TypedValue::Ptr(_) => None,
        }
    }
}

impl From<()> for TypedValue {
    fn from(_: ()) -> Self {
        TypedValue::Void
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::Bool(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        TypedValue::I32(value)
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        TypedValue::I64(value)
    }
}

impl From<u32> for TypedValue {
    fn from(value: u32) -> Self {
        TypedValue::U32(value)
    }
}

impl From<u64> for TypedValue {
    fn from(value: u64) -> Self {
        TypedValue::U64(value)
    }
}

impl From<f32> for TypedValue {
    fn from(value: f32) -> Self {
        TypedValue::F32(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        TypedValue::F64(value)
    }
}

impl From<usize> for TypedValue {
    fn from(value: usize) -> Self {
        TypedValue::Ptr(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_extension() {
        assert_eq!(TypedValue::I16(-1).as_i64(), Some(-1));
        assert_eq!(TypedValue::I8(-128).as_i64(), Some(-128));
    }

    #[test]
    fn test_zero_extension() {
        assert_eq!(TypedValue::U16(0xffff).as_i64(), Some(65535));
        assert_eq!(TypedValue::U8(0xff).as_u64(), Some(255));
    }

    #[test]
    fn test_float_widening() {
        assert_eq!(TypedValue::F32(1.5).as_f64(), Some(1.5));
        assert_eq!(TypedValue::I32(3).as_f64(), Some(3.0));
    }

    #[test]
    fn test_domain_boundaries() {
        assert_eq!(TypedValue::F64(1.0).as_i64(), None);
        assert_eq!(TypedValue::Ptr(0x1000).as_f64(), None);
        assert_eq!(TypedValue::Void.as_i64(), None);
        assert_eq!(TypedValue::Ptr(0x1000).as_i64(), Some(0x1000));
    }

    #[test]
    fn test_kind_matches_payload() {
        assert_eq!(TypedValue::from(3i32).kind(), TypeKind::Int32);
        assert_eq!(TypedValue::from(4.5f64).kind(), TypeKind::Double);
        assert_eq!(TypedValue::from(0usize).kind(), TypeKind::Ptr);
    }
}
