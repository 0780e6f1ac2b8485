//! Common types shared by the Cobolt crates: the read cursor, the decoded
//! value model, fixed-scale decimals, EBCDIC code pages, and the decode
//! error type.

#[macro_use]
mod macros;

mod cancel;
mod codepage;
mod cursor;
mod decimal;
mod error;
mod hexdump;
mod value;

// Flat API hierarchy of common traits and types

pub use self::cancel::*;
pub use self::codepage::*;
pub use self::cursor::*;
pub use self::decimal::*;
pub use self::error::*;
pub use self::hexdump::*;
pub use self::value::*;
