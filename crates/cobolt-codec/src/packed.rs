//! COMP-3 (packed decimal) and COMP-6 (unsigned packed) decoders.

use cobolt_copybook::Field;
use cobolt_core::{function, DecodeError, DecodeErrorExt as _, DecodeResult, Scalar};

use crate::scaled;

/// COMP-3: two BCD nibbles per byte, the final low nibble carrying the sign.
///
/// Positive signs are `A`, `C`, `E`, `F`; negative are `B`, `D`. Any other
/// final nibble, or any non-digit among the remaining nibbles, is a decode
/// error.
pub(crate) fn decode_packed(bytes: &[u8], field: &Field) -> DecodeResult<Scalar> {
    let Some((&last, head)) = bytes.split_last() else {
        return Err(DecodeError::not_enough_bytes(function!(), 0, 1));
    };

    let mut value: i128 = 0;

    for &byte in head {
        value = push_digit(value, byte >> 4, bytes)?;
        value = push_digit(value, byte & 0x0F, bytes)?;
    }
    value = push_digit(value, last >> 4, bytes)?;

    let negative = match last & 0x0F {
        0x0A | 0x0C | 0x0E | 0x0F => false,
        0x0B | 0x0D => true,
        nibble => return Err(DecodeError::invalid_sign_nibble(function!(), nibble)),
    };

    if negative {
        value = -value;
    }

    Ok(scaled(value, field.scale()))
}

/// COMP-6: as COMP-3 but every nibble is a digit; there is no sign.
pub(crate) fn decode_unsigned_packed(bytes: &[u8], field: &Field) -> DecodeResult<Scalar> {
    let mut value: i128 = 0;

    for &byte in bytes {
        value = push_digit(value, byte >> 4, bytes)?;
        value = push_digit(value, byte & 0x0F, bytes)?;
    }

    Ok(scaled(value, field.scale()))
}

fn push_digit(value: i128, nibble: u8, bytes: &[u8]) -> DecodeResult<i128> {
    if nibble > 9 {
        return Err(DecodeError::invalid_digit_nibble(function!(), nibble));
    }
    value
        .checked_mul(10)
        .and_then(|v| v.checked_add(i128::from(nibble)))
        .ok_or_else(|| DecodeError::value_overflow(function!(), bytes.len() * 2))
}
