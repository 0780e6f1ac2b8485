//! Meta crate re-exporting the Cobolt crates for convenience.

#[cfg(feature = "core")]
#[doc(inline)]
pub use cobolt_core as core;

#[cfg(feature = "copybook")]
#[doc(inline)]
pub use cobolt_copybook as copybook;

#[cfg(feature = "codec")]
#[doc(inline)]
pub use cobolt_codec as codec;

#[cfg(feature = "validate")]
#[doc(inline)]
pub use cobolt_validate as validate;
