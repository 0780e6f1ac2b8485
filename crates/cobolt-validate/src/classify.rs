//! Best-effort classification of mismatched leaf values.
//!
//! Classification is ordered: the first matching class wins. It operates on
//! normalized scalars and, for numeric classes, on f64 projections — the
//! projection is for classification only, never for equality.

use core::fmt;

use cobolt_core::Scalar;

/// Discrepancy class reported for a mismatched leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MismatchClass {
    MissingField,
    TypeMismatch,
    SignError,
    OffByOne,
    PrecisionLoss,
    ScaleError,
    NumericMismatch,
    WhitespaceError,
    CaseError,
    CharacterEncoding,
    Truncation,
    StringMismatch,
}

impl MismatchClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::TypeMismatch => "type_mismatch",
            Self::SignError => "sign_error",
            Self::OffByOne => "off_by_one",
            Self::PrecisionLoss => "precision_loss",
            Self::ScaleError => "scale_error",
            Self::NumericMismatch => "numeric_mismatch",
            Self::WhitespaceError => "whitespace_error",
            Self::CaseError => "case_error",
            Self::CharacterEncoding => "character_encoding",
            Self::Truncation => "truncation",
            Self::StringMismatch => "string_mismatch",
        }
    }
}

impl fmt::Display for MismatchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a pair of unequal normalized scalars.
#[must_use]
pub fn classify(first: &Scalar, second: &Scalar, tolerance: f64) -> (MismatchClass, String) {
    if first.is_numeric() && second.is_numeric() {
        return classify_numeric(first, second, tolerance);
    }

    match (textual(first), textual(second)) {
        (Some(a), Some(b)) => classify_string(&a, &b),
        _ => (
            MismatchClass::TypeMismatch,
            format!("type mismatch: {} vs {}", type_name(first), type_name(second)),
        ),
    }
}

fn classify_numeric(first: &Scalar, second: &Scalar, tolerance: f64) -> (MismatchClass, String) {
    let a = first.to_f64().unwrap_or(f64::NAN);
    let b = second.to_f64().unwrap_or(f64::NAN);

    if a * b < 0.0 {
        return (MismatchClass::SignError, format!("sign mismatch: {first} vs {second}"));
    }

    if let (Scalar::Integer(x), Scalar::Integer(y)) = (first, second) {
        if x.abs_diff(*y) == 1 {
            return (MismatchClass::OffByOne, format!("off by one: {x} vs {y}"));
        }
    }

    if (a - b).abs() <= tolerance {
        return (
            MismatchClass::PrecisionLoss,
            format!("precision loss within tolerance: {first} vs {second}"),
        );
    }

    for k in 1..=9i32 {
        let factor = 10f64.powi(k);
        if (a * factor - b).abs() <= tolerance || (a - b * factor).abs() <= tolerance {
            return (
                MismatchClass::ScaleError,
                format!("scale error (factor of 10^{k}): {first} vs {second}"),
            );
        }
    }

    (
        MismatchClass::NumericMismatch,
        format!("numeric values do not match: {first} vs {second}"),
    )
}

fn classify_string(a: &str, b: &str) -> (MismatchClass, String) {
    if a.trim() == b.trim() {
        return (MismatchClass::WhitespaceError, "whitespace differences only".to_owned());
    }

    if a.to_lowercase() == b.to_lowercase() {
        return (MismatchClass::CaseError, "case differences only".to_owned());
    }

    let encoding_issue = a
        .chars()
        .zip(b.chars())
        .any(|(c1, c2)| c1 != c2 && (!c1.is_ascii() || !c2.is_ascii()));
    if encoding_issue {
        return (
            MismatchClass::CharacterEncoding,
            "differing non-ASCII code points".to_owned(),
        );
    }

    if a.starts_with(b) || b.starts_with(a) {
        return (MismatchClass::Truncation, "one string is a prefix of the other".to_owned());
    }

    (
        MismatchClass::StringMismatch,
        format!("string values do not match: '{a}' vs '{b}'"),
    )
}

fn textual(scalar: &Scalar) -> Option<String> {
    match scalar {
        Scalar::Text(s) => Some(s.clone()),
        // Bytes compare over their literal form.
        Scalar::Bytes(_) => Some(scalar.literal()),
        Scalar::Integer(_) | Scalar::Decimal(_) | Scalar::Float(_) => None,
    }
}

fn type_name(scalar: &Scalar) -> &'static str {
    match scalar {
        Scalar::Integer(_) => "integer",
        Scalar::Decimal(_) => "decimal",
        Scalar::Text(_) => "text",
        Scalar::Float(_) => "float",
        Scalar::Bytes(_) => "bytes",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobolt_core::Decimal;

    const TOL: f64 = 0.01;

    #[test]
    fn sign_error_wins_first() {
        let (class, _) = classify(&Scalar::Integer(5), &Scalar::Integer(-5), TOL);
        assert_eq!(class, MismatchClass::SignError);
    }

    #[test]
    fn off_by_one_on_integers() {
        let (class, _) = classify(&Scalar::Integer(7), &Scalar::Integer(8), TOL);
        assert_eq!(class, MismatchClass::OffByOne);
    }

    #[test]
    fn precision_loss_within_tolerance() {
        let (class, _) = classify(&Scalar::Float(1.004), &Scalar::Float(1.0), TOL);
        assert_eq!(class, MismatchClass::PrecisionLoss);
    }

    #[test]
    fn scale_error_detects_power_of_ten() {
        let (class, detail) = classify(
            &Scalar::Decimal(Decimal::new(12345, 2)),
            &Scalar::Integer(12345),
            TOL,
        );
        assert_eq!(class, MismatchClass::ScaleError);
        assert!(detail.contains("10^2"), "{detail}");
    }

    #[test]
    fn numeric_default() {
        let (class, _) = classify(&Scalar::Integer(10), &Scalar::Integer(33), TOL);
        assert_eq!(class, MismatchClass::NumericMismatch);
    }

    #[test]
    fn case_error() {
        let (class, _) = classify(
            &Scalar::Text("Hello".to_owned()),
            &Scalar::Text("HELLO".to_owned()),
            TOL,
        );
        assert_eq!(class, MismatchClass::CaseError);
    }

    #[test]
    fn truncation() {
        let (class, _) = classify(
            &Scalar::Text("HELLO WORLD".to_owned()),
            &Scalar::Text("HELLO".to_owned()),
            TOL,
        );
        assert_eq!(class, MismatchClass::Truncation);
    }

    #[test]
    fn encoding_beats_truncation() {
        let (class, _) = classify(
            &Scalar::Text("caf\u{E9}".to_owned()),
            &Scalar::Text("cafe".to_owned()),
            TOL,
        );
        assert_eq!(class, MismatchClass::CharacterEncoding);
    }

    #[test]
    fn string_default() {
        let (class, _) = classify(&Scalar::Text("ABC".to_owned()), &Scalar::Text("XYZ".to_owned()), TOL);
        assert_eq!(class, MismatchClass::StringMismatch);
    }

    #[test]
    fn disjoint_types() {
        let (class, _) = classify(&Scalar::Integer(1), &Scalar::Text("ONE".to_owned()), TOL);
        assert_eq!(class, MismatchClass::TypeMismatch);
    }
}
