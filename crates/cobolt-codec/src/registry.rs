use cobolt_copybook::{Field, FieldFlags, Usage};
use cobolt_core::{CodePage, DecodeResult, Scalar};

use crate::{binary, display, float, packed};

/// The decoder selected for a field.
///
/// The usage set is closed, so dispatch is a plain pattern match; the two
/// DISPLAY refinements (separate sign, numeric picture) are resolved here so
/// the decoders themselves stay single-purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// DISPLAY with an alphanumeric picture.
    Text,
    /// DISPLAY with a numeric picture (zoned decimal).
    Zoned,
    /// DISPLAY numeric with a separate sign byte.
    SignSeparate,
    /// COMP / COMP-4 / BINARY, big-endian.
    Binary,
    /// COMP-5, host byte order.
    NativeBinary,
    /// COMP-3 / PACKED-DECIMAL.
    Packed,
    /// COMP-6.
    UnsignedPacked,
    /// COMP-1.
    SingleFloat,
    /// COMP-2.
    DoubleFloat,
}

/// Selects the decoder for an elementary field.
pub fn select_codec(field: &Field) -> Codec {
    match field.usage() {
        Usage::Display => {
            let numeric = field.picture.as_ref().is_some_and(cobolt_copybook::Picture::is_numeric);
            if numeric && field.flags.contains(FieldFlags::SIGN_SEPARATE) {
                Codec::SignSeparate
            } else if numeric {
                Codec::Zoned
            } else {
                Codec::Text
            }
        }
        Usage::Binary => Codec::Binary,
        Usage::NativeBinary => Codec::NativeBinary,
        Usage::PackedDecimal => Codec::Packed,
        Usage::UnsignedPacked => Codec::UnsignedPacked,
        Usage::SingleFloat => Codec::SingleFloat,
        Usage::DoubleFloat => Codec::DoubleFloat,
    }
}

/// Decodes one elementary field slice.
///
/// `bytes` must be exactly the field's resolved extent; every decoder is a
/// pure function of `(bytes, field, codepage)`.
pub fn decode_scalar(codec: Codec, bytes: &[u8], field: &Field, codepage: &CodePage) -> DecodeResult<Scalar> {
    match codec {
        Codec::Text => display::decode_text(bytes, field, codepage),
        Codec::Zoned => display::decode_zoned(bytes, field),
        Codec::SignSeparate => display::decode_sign_separate(bytes, field, codepage),
        Codec::Binary => binary::decode_binary(bytes, field),
        Codec::NativeBinary => binary::decode_native_binary(bytes, field),
        Codec::Packed => packed::decode_packed(bytes, field),
        Codec::UnsignedPacked => packed::decode_unsigned_packed(bytes, field),
        Codec::SingleFloat => float::decode_single(bytes),
        Codec::DoubleFloat => float::decode_double(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobolt_copybook::parse;

    fn field_of(text: &str, name: &str) -> Field {
        let schema = parse(text).unwrap();
        schema.field(schema.find(name).unwrap()).clone()
    }

    #[test]
    fn display_refinements() {
        let f = field_of("01 R. 05 A PIC X(4).", "A");
        assert_eq!(select_codec(&f), Codec::Text);

        let f = field_of("01 R. 05 A PIC S9(4).", "A");
        assert_eq!(select_codec(&f), Codec::Zoned);

        let f = field_of("01 R. 05 A PIC S9(4) SIGN IS TRAILING SEPARATE.", "A");
        assert_eq!(select_codec(&f), Codec::SignSeparate);

        // A separate sign on an alphanumeric picture has nothing to refine.
        let f = field_of("01 R. 05 A PIC X(4) SIGN IS TRAILING SEPARATE.", "A");
        assert_eq!(select_codec(&f), Codec::Text);
    }

    #[test]
    fn usage_dispatch() {
        let f = field_of("01 R. 05 A PIC S9(4) COMP.", "A");
        assert_eq!(select_codec(&f), Codec::Binary);

        let f = field_of("01 R. 05 A PIC S9(4) COMP-5.", "A");
        assert_eq!(select_codec(&f), Codec::NativeBinary);

        let f = field_of("01 R. 05 A PIC S9(4) COMP-3.", "A");
        assert_eq!(select_codec(&f), Codec::Packed);

        let f = field_of("01 R. 05 A PIC 9(4) COMP-6.", "A");
        assert_eq!(select_codec(&f), Codec::UnsignedPacked);

        let f = field_of("01 R. 05 A COMP-1.", "A");
        assert_eq!(select_codec(&f), Codec::SingleFloat);

        let f = field_of("01 R. 05 A COMP-2.", "A");
        assert_eq!(select_codec(&f), Codec::DoubleFloat);
    }
}
