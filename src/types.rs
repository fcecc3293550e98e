//! Semantic type model shared by the resolver and the marshaler.
//!
//! Declarations produced by a host scope lookup describe their parameters and
//! return type with [`DataType`]: a primitive [`TypeKind`] plus
//! [`TypeQualifiers`]. The same model drives prototype matching
//! (exact vs. conversion, see [`MatchMode`]) and argument marshaling.

use std::fmt;

use bitflags::bitflags;

/// Primitive type categories recognized by the calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    /// Opaque address (object handles, out-parameters, `this` returns).
    Ptr,
}

impl TypeKind {
    /// True for the signed and unsigned integer categories.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            TypeKind::Int8
                | TypeKind::Int16
                | TypeKind::Int32
                | TypeKind::Int64
                | TypeKind::UInt8
                | TypeKind::UInt16
                | TypeKind::UInt32
                | TypeKind::UInt64
        )
    }

    /// True for the signed integer categories.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            TypeKind::Int8 | TypeKind::Int16 | TypeKind::Int32 | TypeKind::Int64
        )
    }

    /// True for `Float` and `Double`.
    pub fn is_floating(self) -> bool {
        matches!(self, TypeKind::Float | TypeKind::Double)
    }

    /// Payload width in bits.
    pub fn width_bits(self) -> u32 {
        match self {
            TypeKind::Void => 0,
            TypeKind::Bool | TypeKind::Int8 | TypeKind::UInt8 => 8,
            TypeKind::Int16 | TypeKind::UInt16 => 16,
            TypeKind::Int32 | TypeKind::UInt32 | TypeKind::Float => 32,
            TypeKind::Int64 | TypeKind::UInt64 | TypeKind::Double => 64,
            TypeKind::Ptr => usize::BITS,
        }
    }

    /// Canonical declaration-text name.
    pub fn name(self) -> &'static str {
        match self {
            TypeKind::Void => "void",
            TypeKind::Bool => "bool",
            TypeKind::Int8 => "int8",
            TypeKind::Int16 => "int16",
            TypeKind::Int32 => "int",
            TypeKind::Int64 => "int64",
            TypeKind::UInt8 => "uint8",
            TypeKind::UInt16 => "uint16",
            TypeKind::UInt32 => "uint",
            TypeKind::UInt64 => "uint64",
            TypeKind::Float => "float",
            TypeKind::Double => "double",
            TypeKind::Ptr => "ptr",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Qualifiers carried alongside a [`TypeKind`] in declarations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeQualifiers: u8 {
        const CONST = 1;
        const REFERENCE = 1 << 1;
    }
}

impl Default for TypeQualifiers {
    fn default() -> Self {
        TypeQualifiers::empty()
    }
}

/// A parameter or return type: primitive category plus qualifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType {
    pub kind: TypeKind,
    pub quals: TypeQualifiers,
}

impl DataType {
    /// An unqualified type of the given kind.
    pub const fn plain(kind: TypeKind) -> Self {
        Self {
            kind,
            quals: TypeQualifiers::empty(),
        }
    }

    /// The same type with `CONST` added.
    pub fn as_const(self) -> Self {
        Self {
            kind: self.kind,
            quals: self.quals | TypeQualifiers::CONST,
        }
    }

    /// The same kind with all qualifiers removed.
    pub fn unqualified(self) -> Self {
        DataType::plain(self.kind)
    }

    /// Whether a value of this type can be bound to a parameter of `target`
    /// under the given match mode.
    ///
    /// `Exact` accepts identical kinds only (qualifiers are ignored, matching
    /// how by-value parameters shed top-level const). `Convert` additionally
    /// accepts the implicit numeric conversions: integer widening and
    /// narrowing, integer to floating point and back, float to double, and
    /// integer to bool. Pointer and void never convert.
    pub fn can_convert_to(self, target: DataType, mode: MatchMode) -> bool {
        if self.kind == target.kind {
            return true;
        }
        if mode == MatchMode::Exact {
            return false;
        }
        let from = self.kind;
        match target.kind {
            k if k.is_integer() => {
                from.is_integer() || from.is_floating() || from == TypeKind::Bool
            }
            TypeKind::Float | TypeKind::Double => {
                from.is_integer() || from.is_floating() || from == TypeKind::Bool
            }
            TypeKind::Bool => from.is_integer(),
            // Ptr only matches Ptr, Void matches nothing.
            _ => false,
        }
    }
}

impl From<TypeKind> for DataType {
    fn from(kind: TypeKind) -> Self {
        DataType::plain(kind)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quals.contains(TypeQualifiers::CONST) {
            write!(f, "const ")?;
        }
        write!(f, "{}", self.kind)?;
        if self.quals.contains(TypeQualifiers::REFERENCE) {
            write!(f, "&")?;
        }
        Ok(())
    }
}

/// Identity of a resolved declaration.
///
/// Two lookups that produce the same `DeclId` refer to the same concrete
/// function; entry-point caches key off this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(u64);

impl DeclId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decl_{}", self.0)
    }
}

/// Policy controlling which prototype matches are accepted during resolution
/// and which conversions are applied during marshaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Only identical parameter kinds match.
    Exact,
    /// Implicitly convertible argument types also match.
    #[default]
    Convert,
}

/// A resolved method or function declaration, as returned by a scope lookup.
///
/// Declarations are plain values; the engine owns at most one at a time and
/// treats `id` equality as semantic identity.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub id: DeclId,
    pub name: String,
    pub params: Vec<DataType>,
    pub ret: DataType,
    /// Whether the implicit receiver is const-qualified.
    pub is_const: bool,
}

impl MethodDecl {
    pub fn new(
        id: DeclId,
        name: impl Into<String>,
        params: Vec<DataType>,
        ret: DataType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            params,
            ret,
            is_const: false,
        }
    }

    pub fn with_const(mut self, is_const: bool) -> Self {
        self.is_const = is_const;
        self
    }
}

impl fmt::Display for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.ret, self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ")")?;
        if self.is_const {
            write!(f, " const")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_categories() {
        assert!(TypeKind::Int32.is_integer());
        assert!(TypeKind::UInt64.is_integer());
        assert!(!TypeKind::Double.is_integer());
        assert!(TypeKind::Int8.is_signed());
        assert!(!TypeKind::UInt8.is_signed());
        assert!(TypeKind::Float.is_floating());
        assert_eq!(TypeKind::Int16.width_bits(), 16);
        assert_eq!(TypeKind::Double.width_bits(), 64);
    }

    #[test]
    fn test_exact_match_ignores_qualifiers() {
        let plain = DataType::plain(TypeKind::Int32);
        let konst = plain.as_const();
        assert!(konst.can_convert_to(plain, MatchMode::Exact));
        assert!(plain.can_convert_to(konst, MatchMode::Exact));
    }

    #[test]
    fn test_exact_match_rejects_conversion() {
        let int = DataType::plain(TypeKind::Int32);
        let dbl = DataType::plain(TypeKind::Double);
        assert!(!int.can_convert_to(dbl, MatchMode::Exact));
        assert!(int.can_convert_to(dbl, MatchMode::Convert));
    }

    #[test]
    fn test_pointer_never_converts() {
        let ptr = DataType::plain(TypeKind::Ptr);
        let int = DataType::plain(TypeKind::Int64);
        assert!(!ptr.can_convert_to(int, MatchMode::Convert));
        assert!(!int.can_convert_to(ptr, MatchMode::Convert));
        assert!(ptr.can_convert_to(ptr, MatchMode::Exact));
    }

    #[test]
    fn test_decl_display() {
        let decl = MethodDecl::new(
            DeclId::new(7),
            "Bar",
            vec![
                DataType::plain(TypeKind::Int32),
                DataType::plain(TypeKind::Double),
            ],
            DataType::plain(TypeKind::Int32),
        )
        .with_const(true);
        assert_eq!(decl.to_string(), "int Bar(int, double) const");
    }
}
