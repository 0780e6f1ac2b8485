//! Decoding of fixed-length EBCDIC records against a resolved copybook
//! layout: the usage-directed codec registry, the per-usage byte decoders,
//! the record walker, and the fixed-length record reader.

mod binary;
mod display;
mod float;
mod packed;
mod reader;
mod registry;
mod walker;

pub use self::reader::{FramingError, FramingErrorKind, FramingResult, RecordReader};
pub use self::registry::{decode_scalar, select_codec, Codec};
pub use self::walker::RecordDecoder;

use cobolt_core::{Decimal, Scalar};

/// Applies the implied decimal point: `k` fractional digits yield a decimal
/// of scale `k`; a scale of zero stays an integer.
pub(crate) fn scaled(value: i128, scale: u8) -> Scalar {
    if scale == 0 {
        Scalar::Integer(value)
    } else {
        Scalar::Decimal(Decimal::new(value, scale))
    }
}
