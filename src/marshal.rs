//! Argument marshaling: reconciling pushed values with formal parameters.
//!
//! Runs at invocation time, after an entry point has been obtained and
//! before any code executes. A rejected call therefore has no partial side
//! effects. Conversions follow the active [`MatchMode`]: `Exact` permits
//! identity only (qualifiers aside), `Convert` additionally applies the
//! implicit numeric conversions, with C++ value semantics (narrowing wraps,
//! float-to-int truncates toward zero).

use crate::error::CallError;
use crate::types::{DataType, MatchMode, TypeKind};
use crate::value::TypedValue;

/// Marshal the whole argument stack against the formal parameter list.
///
/// Returns the values re-expressed in the formal types, in positional order.
pub(crate) fn marshal_args(
    args: &[TypedValue],
    params: &[DataType],
    mode: MatchMode,
) -> Result<Vec<TypedValue>, CallError> {
    if args.len() != params.len() {
        return Err(CallError::ArgumentMismatch {
            detail: format!(
                "expected {} argument(s), have {}",
                params.len(),
                args.len()
            ),
        });
    }
    args.iter()
        .zip(params)
        .enumerate()
        .map(|(index, (value, param))| marshal_one(value, *param, mode, index))
        .collect()
}

/// Marshal one value into one formal parameter slot.
fn marshal_one(
    value: &TypedValue,
    param: DataType,
    mode: MatchMode,
    index: usize,
) -> Result<TypedValue, CallError> {
    let from = value.data_type();

    // Void has no marshaling rule in any position.
    if from.kind == TypeKind::Void || param.kind == TypeKind::Void {
        return Err(CallError::UnsupportedArgumentType {
            index,
            type_name: from.kind.name().to_string(),
        });
    }

    if !from.can_convert_to(param, mode) {
        return Err(CallError::ArgumentMismatch {
            detail: format!(
                "argument {} has type {} but parameter expects {}",
                index, from, param
            ),
        });
    }

    if from.kind == param.kind {
        return Ok(*value);
    }

    // from != param and the conversion is permitted: numeric categories only.
    let converted = match param.kind {
        TypeKind::Bool => value.as_i64().map(|v| TypedValue::Bool(v != 0)),
        TypeKind::Int8 => widen(value).map(|v| TypedValue::I8(v as i8)),
        TypeKind::Int16 => widen(value).map(|v| TypedValue::I16(v as i16)),
        TypeKind::Int32 => widen(value).map(|v| TypedValue::I32(v as i32)),
        TypeKind::Int64 => widen(value).map(TypedValue::I64),
        TypeKind::UInt8 => widen(value).map(|v| TypedValue::U8(v as u8)),
        TypeKind::UInt16 => widen(value).map(|v| TypedValue::U16(v as u16)),
        TypeKind::UInt32 => widen(value).map(|v| TypedValue::U32(v as u32)),
        TypeKind::UInt64 => widen(value).map(|v| TypedValue::U64(v as u64)),
        TypeKind::Float => value.as_f64().map(|v| TypedValue::F32(v as f32)),
        TypeKind::Double => value.as_f64().map(TypedValue::F64),
        TypeKind::Ptr | TypeKind::Void => None,
    };

    converted.ok_or_else(|| CallError::UnsupportedArgumentType {
        index,
        type_name: from.kind.name().to_string(),
    })
}

/// Integer view of a numeric value: extension for integers, truncation
/// toward zero for floating point. Shared with the integer `exec_*` return
/// extraction, which applies the same rule to floating returns.
pub(crate) fn widen(value: &TypedValue) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}
