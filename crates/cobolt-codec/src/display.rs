//! DISPLAY decoders: alphanumeric text, zoned decimal, and separate-sign
//! zoned decimal.

use cobolt_copybook::{Field, FieldFlags};
use cobolt_core::{function, CodePage, DecodeError, DecodeErrorExt as _, DecodeResult, Scalar};

use crate::scaled;

/// Alphanumeric DISPLAY: one character per byte through the code page.
pub(crate) fn decode_text(bytes: &[u8], field: &Field, codepage: &CodePage) -> DecodeResult<Scalar> {
    let mut text = codepage.decode(bytes);

    if field.flags.contains(FieldFlags::JUSTIFIED_RIGHT) {
        text.truncate(text.trim_end_matches(' ').len());
    }

    Ok(Scalar::Text(text))
}

/// Zoned decimal: one digit per byte, the sign carried in the last byte's
/// zone nibble when the picture is signed.
///
/// Digit bytes must sit in the `F0..=F9` zone; a signed field additionally
/// accepts `C` (positive) or `D` (negative) as the final zone.
pub(crate) fn decode_zoned(bytes: &[u8], field: &Field) -> DecodeResult<Scalar> {
    let signed = field.signed();
    let last = bytes.len().saturating_sub(1);

    let mut value: i128 = 0;
    let mut negative = false;

    for (i, &byte) in bytes.iter().enumerate() {
        let zone = byte >> 4;
        let digit = byte & 0x0F;

        if digit > 9 {
            return Err(DecodeError::invalid_zoned_byte(function!(), byte));
        }

        match zone {
            0x0F => {}
            0x0C if signed && i == last => {}
            0x0D if signed && i == last => negative = true,
            _ => return Err(DecodeError::invalid_zoned_byte(function!(), byte)),
        }

        value = push_digit(value, digit, bytes.len())?;
    }

    if negative {
        value = -value;
    }

    Ok(scaled(value, field.scale()))
}

/// Separate-sign zoned decimal: the sign occupies its own byte, before or
/// after the digits per SIGN LEADING/TRAILING.
pub(crate) fn decode_sign_separate(bytes: &[u8], field: &Field, codepage: &CodePage) -> DecodeResult<Scalar> {
    let Some((&sign_byte, digits)) = (if field.flags.contains(FieldFlags::SIGN_LEADING) {
        bytes.split_first()
    } else {
        bytes.split_last()
    }) else {
        return Err(DecodeError::not_enough_bytes(function!(), bytes.len(), 2));
    };

    let negative = match codepage.decode_byte(sign_byte) {
        '+' => false,
        '-' => true,
        _ => return Err(DecodeError::invalid_sign_byte(function!(), sign_byte)),
    };

    let mut value: i128 = 0;
    for &byte in digits {
        let digit = byte & 0x0F;
        if byte >> 4 != 0x0F || digit > 9 {
            return Err(DecodeError::invalid_zoned_byte(function!(), byte));
        }
        value = push_digit(value, digit, digits.len())?;
    }

    if negative {
        value = -value;
    }

    Ok(scaled(value, field.scale()))
}

fn push_digit(value: i128, digit: u8, digits: usize) -> DecodeResult<i128> {
    value
        .checked_mul(10)
        .and_then(|v| v.checked_add(i128::from(digit)))
        .ok_or_else(|| DecodeError::value_overflow(function!(), digits))
}
