//! The dual-pass validator: independently re-decodes the input and
//! cross-checks it against the first pass, leaf by leaf.

use core::fmt;
use std::collections::HashMap;
use std::io::Read;

use cobolt_codec::{RecordDecoder, RecordReader};
use cobolt_copybook::Layout;
use cobolt_core::{function, CancelFlag, CodePage, Decimal, Scalar, Value};
use tracing::warn;

use crate::{classify, normalize_scalar, MismatchClass};

pub type ValidateResult<T> = Result<T, ValidateError>;

pub type ValidateError = cobolt_error::Error<ValidateErrorKind>;

/// Enum representing the different kinds of validation run failures.
///
/// Discrepancies between the passes are never failures; they are aggregated
/// in the outcome. These kinds cover the run itself going wrong.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum ValidateErrorKind {
    /// Framing error on the second-pass stream; details in the source.
    Framing,
    /// The second pass failed to decode a record the first pass accepted.
    Decode { record_index: u64 },
    /// The run was cancelled between records.
    Cancelled,
}

impl std::error::Error for ValidateErrorKind {}

impl fmt::Display for ValidateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Framing => write!(f, "framing error while re-reading the input"),
            Self::Decode { record_index } => {
                write!(f, "second pass failed to decode record {record_index}")
            }
            Self::Cancelled => write!(f, "validation cancelled"),
        }
    }
}

/// One classified discrepancy between the two passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// 0-based record index.
    pub record_index: u64,
    /// Dotted field path of the leaf.
    pub field_path: String,
    /// First-pass value literal; `None` when the field was absent.
    pub first: Option<String>,
    /// Second-pass value literal; `None` when the field was absent.
    pub second: Option<String>,
    pub class: MismatchClass,
    pub detail: String,
}

/// Aggregated validation outcome.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub total_records: u64,
    pub total_fields: u64,
    pub mismatches: u64,
    /// Bounded detail list, sorted by (record index, field path).
    pub details: Vec<Mismatch>,
    /// Mismatches beyond the detail bound, counted but not listed.
    pub dropped_details: u64,
}

impl ValidationOutcome {
    /// Mismatches over compared fields; 0 when no field was compared.
    #[must_use]
    pub fn mismatch_rate(&self) -> f64 {
        if self.total_fields == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.mismatches as f64 / self.total_fields as f64
            }
        }
    }
}

/// Re-decodes the original byte stream with a freshly constructed decoder
/// and compares it leaf-by-leaf against the first-pass values.
#[derive(Debug)]
pub struct DualPassValidator<'a> {
    layout: &'a Layout,
    codepage: &'static CodePage,
    tolerance: f64,
    max_details: usize,
}

impl<'a> DualPassValidator<'a> {
    pub const DEFAULT_TOLERANCE: f64 = 0.01;
    pub const DEFAULT_MAX_DETAILS: usize = 1000;

    pub fn new(layout: &'a Layout, codepage: &'static CodePage) -> Self {
        Self {
            layout,
            codepage,
            tolerance: Self::DEFAULT_TOLERANCE,
            max_details: Self::DEFAULT_MAX_DETAILS,
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Bounds the mismatch detail list; mismatches beyond the bound are
    /// still counted.
    #[must_use]
    pub fn with_max_details(mut self, max_details: usize) -> Self {
        self.max_details = max_details;
        self
    }

    /// Runs the second pass over `input` and compares against `first_pass`.
    ///
    /// `first_pass[i]` is the first-pass decoding of record `i`, or `None`
    /// when that record was skipped by the error policy; skipped records are
    /// not compared. Cancellation is checked before each record.
    pub fn validate<R: Read>(
        &self,
        input: R,
        first_pass: &[Option<Value>],
        cancel: &CancelFlag,
    ) -> ValidateResult<ValidationOutcome> {
        // A fresh decoder per validation run guards against carried state.
        let decoder = RecordDecoder::new(self.layout, self.codepage);
        let mut reader = RecordReader::new(input, self.layout.record_len());

        let mut outcome = ValidationOutcome::default();
        let mut index: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ValidateError::new(function!(), ValidateErrorKind::Cancelled));
            }

            let Some(record) = reader
                .read_record()
                .map_err(|e| ValidateError::new(function!(), ValidateErrorKind::Framing).with_source(e))?
            else {
                break;
            };

            let Some(first) = first_pass.get(usize::try_from(index).unwrap_or(usize::MAX)) else {
                warn!(record_index = index, "input stream has more records than the first pass; stopping validation");
                break;
            };

            if let Some(first) = first {
                let second = decoder.decode(record).map_err(|e| {
                    ValidateError::new(function!(), ValidateErrorKind::Decode { record_index: index }).with_source(e)
                })?;

                self.compare_records(first, &second, index, &mut outcome);
            }

            index += 1;
            outcome.total_records = index;
        }

        outcome.details.sort_by(|a, b| {
            (a.record_index, a.field_path.as_str()).cmp(&(b.record_index, b.field_path.as_str()))
        });

        Ok(outcome)
    }

    fn compare_records(&self, first: &Value, second: &Value, index: u64, outcome: &mut ValidationOutcome) {
        let flat_first = first.flatten();
        let flat_second = second.flatten();

        outcome.total_fields += flat_first.len() as u64;

        let mut second_by_path: HashMap<&str, &Scalar> =
            flat_second.iter().map(|(p, s)| (p.as_str(), s)).collect();

        for (path, first_leaf) in &flat_first {
            let Some(second_leaf) = second_by_path.remove(path.as_str()) else {
                self.push(
                    outcome,
                    Mismatch {
                        record_index: index,
                        field_path: path.clone(),
                        first: Some(first_leaf.literal()),
                        second: None,
                        class: MismatchClass::MissingField,
                        detail: "field present in first pass but missing in second pass".to_owned(),
                    },
                );
                continue;
            };

            let a = normalize_scalar(first_leaf);
            let b = normalize_scalar(second_leaf);

            if leaves_equal(&a, &b, self.tolerance) {
                continue;
            }

            let (class, detail) = classify(&a, &b, self.tolerance);
            self.push(
                outcome,
                Mismatch {
                    record_index: index,
                    field_path: path.clone(),
                    first: Some(first_leaf.literal()),
                    second: Some(second_leaf.literal()),
                    class,
                    detail,
                },
            );
        }

        // Anything left over exists only in the second pass.
        for (path, second_leaf) in &flat_second {
            if second_by_path.remove(path.as_str()).is_some() {
                self.push(
                    outcome,
                    Mismatch {
                        record_index: index,
                        field_path: path.clone(),
                        first: None,
                        second: Some(second_leaf.literal()),
                        class: MismatchClass::MissingField,
                        detail: "field present in second pass but missing in first pass".to_owned(),
                    },
                );
            }
        }
    }

    fn push(&self, outcome: &mut ValidationOutcome, mismatch: Mismatch) {
        outcome.mismatches += 1;
        if outcome.details.len() < self.max_details {
            outcome.details.push(mismatch);
        } else {
            outcome.dropped_details += 1;
        }
    }
}

/// Leaf equality on normalized scalars.
///
/// Integer and fixed-scale decimal comparisons are exact; the tolerance
/// applies only when at least one side is a binary float.
fn leaves_equal(a: &Scalar, b: &Scalar, tolerance: f64) -> bool {
    match (a, b) {
        (Scalar::Integer(x), Scalar::Integer(y)) => x == y,
        (Scalar::Decimal(x), Scalar::Decimal(y)) => x.numerically_eq(*y),
        (Scalar::Integer(i), Scalar::Decimal(d)) | (Scalar::Decimal(d), Scalar::Integer(i)) => {
            d.numerically_eq(Decimal::from(*i))
        }
        (Scalar::Float(_), _) | (_, Scalar::Float(_)) => match (a.to_f64(), b.to_f64()) {
            (Some(x), Some(y)) => (x - y).abs() <= tolerance,
            _ => false,
        },
        (Scalar::Text(x), Scalar::Text(y)) => x == y,
        (Scalar::Bytes(x), Scalar::Bytes(y)) => x == y,
        _ => false,
    }
}
