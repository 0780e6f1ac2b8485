//! Canonicalization of decoded values for comparison.
//!
//! Normalization is pure and idempotent: integer-valued floats collapse to
//! integers, decimals drop trailing zero fractional digits (and collapse to
//! integers at scale zero), and trimmed strings that read as numeric
//! literals are promoted to their numeric canonical form. Absence and the
//! empty string remain distinct: the empty string normalizes to itself.

use cobolt_core::{Decimal, Scalar, Value};

/// Normalizes a decoded value tree, recursing through groups and sequences.
#[must_use]
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Scalar(s) => Value::Scalar(normalize_scalar(s)),
        Value::Group(entries) => Value::Group(
            entries
                .iter()
                .map(|(name, v)| (name.clone(), normalize(v)))
                .collect(),
        ),
        Value::List(items) => Value::List(items.iter().map(normalize).collect()),
    }
}

/// Normalizes one scalar to its canonical form.
#[must_use]
pub fn normalize_scalar(scalar: &Scalar) -> Scalar {
    match scalar {
        Scalar::Integer(i) => Scalar::Integer(*i),
        Scalar::Decimal(d) => canonical_decimal(d.normalized()),
        Scalar::Float(f) => canonical_float(*f),
        Scalar::Text(s) => canonical_text(s),
        Scalar::Bytes(b) => Scalar::Bytes(b.clone()),
    }
}

fn canonical_decimal(d: Decimal) -> Scalar {
    if d.scale() == 0 {
        Scalar::Integer(d.units())
    } else {
        Scalar::Decimal(d)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn canonical_float(f: f64) -> Scalar {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53

    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT {
        Scalar::Integer(f as i128)
    } else {
        Scalar::Float(f)
    }
}

fn canonical_text(s: &str) -> Scalar {
    let trimmed = s.trim();

    if let Ok(d) = trimmed.parse::<Decimal>() {
        return canonical_decimal(d.normalized());
    }

    Scalar::Text(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_become_integers() {
        assert_eq!(normalize_scalar(&Scalar::Float(42.0)), Scalar::Integer(42));
        assert_eq!(normalize_scalar(&Scalar::Float(-3.0)), Scalar::Integer(-3));
        assert_eq!(normalize_scalar(&Scalar::Float(1.5)), Scalar::Float(1.5));
    }

    #[test]
    fn decimals_drop_trailing_zeros() {
        assert_eq!(
            normalize_scalar(&Scalar::Decimal(Decimal::new(1200, 3))),
            Scalar::Decimal(Decimal::new(12, 1))
        );
        assert_eq!(normalize_scalar(&Scalar::Decimal(Decimal::new(500, 2))), Scalar::Integer(5));
    }

    #[test]
    fn numeric_strings_are_promoted() {
        assert_eq!(normalize_scalar(&Scalar::Text("  42 ".to_owned())), Scalar::Integer(42));
        assert_eq!(
            normalize_scalar(&Scalar::Text("-1.50".to_owned())),
            Scalar::Decimal(Decimal::new(-15, 1))
        );
        assert_eq!(
            normalize_scalar(&Scalar::Text(" HELLO ".to_owned())),
            Scalar::Text("HELLO".to_owned())
        );
    }

    #[test]
    fn empty_string_stays_a_string() {
        assert_eq!(normalize_scalar(&Scalar::Text(String::new())), Scalar::Text(String::new()));
        assert_eq!(normalize_scalar(&Scalar::Text("   ".to_owned())), Scalar::Text(String::new()));
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            Scalar::Float(7.0),
            Scalar::Float(2.25),
            Scalar::Decimal(Decimal::new(1200, 3)),
            Scalar::Text("  00123.450 ".to_owned()),
            Scalar::Text("mixed 12".to_owned()),
            Scalar::Integer(-9),
            Scalar::Bytes(vec![1, 2]),
        ];
        for s in samples {
            let once = normalize_scalar(&s);
            assert_eq!(normalize_scalar(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn recursion_covers_groups_and_lists() {
        let value = Value::Group(vec![(
            "A".to_owned(),
            Value::List(vec![
                Value::Scalar(Scalar::Text(" 7 ".to_owned())),
                Value::Scalar(Scalar::Float(8.0)),
            ]),
        )]);
        let normalized = normalize(&value);
        let list = normalized.get("A").unwrap();
        assert_eq!(list.at(0).unwrap().as_scalar(), Some(&Scalar::Integer(7)));
        assert_eq!(list.at(1).unwrap().as_scalar(), Some(&Scalar::Integer(8)));
    }
}
