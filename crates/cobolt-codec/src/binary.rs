//! COMP / COMP-4 / BINARY and COMP-5 decoders.

use cobolt_copybook::Field;
use cobolt_core::{function, DecodeError, DecodeErrorExt as _, DecodeResult, ReadCursor, Scalar};

use crate::scaled;

/// Big-endian two's-complement binary (COMP / COMP-4 / BINARY).
pub(crate) fn decode_binary(bytes: &[u8], field: &Field) -> DecodeResult<Scalar> {
    let mut src = ReadCursor::new(bytes);
    let signed = field.signed();

    let value: i128 = match bytes.len() {
        2 if signed => i128::from(src.read_i16_be()),
        2 => i128::from(src.read_u16_be()),
        4 if signed => i128::from(src.read_i32_be()),
        4 => i128::from(src.read_u32_be()),
        8 if signed => i128::from(src.read_i64_be()),
        8 => i128::from(src.read_u64_be()),
        other => return Err(DecodeError::unsupported_size(function!(), other)),
    };

    Ok(scaled(value, field.scale()))
}

/// COMP-5: as BINARY, but in the host's native byte order.
pub(crate) fn decode_native_binary(bytes: &[u8], field: &Field) -> DecodeResult<Scalar> {
    let mut src = ReadCursor::new(bytes);
    let signed = field.signed();

    let value: i128 = match bytes.len() {
        2 if signed => i128::from(src.read_i16_ne()),
        2 => i128::from(src.read_u16_ne()),
        4 if signed => i128::from(src.read_i32_ne()),
        4 => i128::from(src.read_u32_ne()),
        8 if signed => i128::from(src.read_i64_ne()),
        8 => i128::from(src.read_u64_ne()),
        other => return Err(DecodeError::unsupported_size(function!(), other)),
    };

    Ok(scaled(value, field.scale()))
}
