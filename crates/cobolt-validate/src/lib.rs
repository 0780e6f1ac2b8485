//! Dual-pass validation of decoded record streams: normalization to a
//! canonical comparison form, leaf-by-leaf comparison with ordered
//! best-effort mismatch classification, and report rendering.

mod classify;
mod normalize;
mod report;
mod validator;

pub use self::classify::{classify, MismatchClass};
pub use self::normalize::{normalize, normalize_scalar};
pub use self::report::{render, write_report, ReportError, ReportFormat};
pub use self::validator::{
    DualPassValidator, Mismatch, ValidateError, ValidateErrorKind, ValidateResult, ValidationOutcome,
};
