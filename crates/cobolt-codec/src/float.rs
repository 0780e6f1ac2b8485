//! COMP-1 / COMP-2 decoders: IEEE-754 big-endian floats.

use cobolt_core::{function, DecodeError, DecodeErrorExt as _, DecodeResult, ReadCursor, Scalar};

pub(crate) fn decode_single(bytes: &[u8]) -> DecodeResult<Scalar> {
    if bytes.len() != 4 {
        return Err(DecodeError::unsupported_size(function!(), bytes.len()));
    }
    let mut src = ReadCursor::new(bytes);
    Ok(Scalar::Float(f64::from(src.read_f32_be())))
}

pub(crate) fn decode_double(bytes: &[u8]) -> DecodeResult<Scalar> {
    if bytes.len() != 8 {
        return Err(DecodeError::unsupported_size(function!(), bytes.len()));
    }
    let mut src = ReadCursor::new(bytes);
    Ok(Scalar::Float(src.read_f64_be()))
}
