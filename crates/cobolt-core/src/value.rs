use core::fmt;

use crate::Decimal;

/// A decoded elementary value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Integer(i128),
    Decimal(Decimal),
    Text(String),
    Float(f64),
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Literal form used by the output writers and the validation report.
    #[must_use]
    pub fn literal(&self) -> String {
        self.to_string()
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Decimal(_) | Self::Float(_))
    }

    /// Lossy projection onto a binary float, for classification purposes.
    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            Self::Decimal(d) => Some(d.to_f64()),
            Self::Float(f) => Some(*f),
            Self::Text(_) | Self::Bytes(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bytes(b) => {
                for byte in b {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
        }
    }
}

/// A decoded record value: a scalar leaf, a group mapping, or an OCCURS
/// sequence.
///
/// Group entries keep declaration order; lookups are linear, which is fine
/// for copybook-sized records.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Group(Vec<(String, Value)>),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Group(_) | Self::List(_) => None,
        }
    }

    /// Looks up a direct child of a group by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Group(entries) => entries.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            Self::Scalar(_) | Self::List(_) => None,
        }
    }

    /// Looks up an OCCURS element by index.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Self::List(items) => items.get(index),
            Self::Scalar(_) | Self::Group(_) => None,
        }
    }

    /// Flattens the value into `(dotted path, scalar)` leaves, in
    /// declaration order. Groups contribute no row of their own; OCCURS
    /// elements are addressed as `NAME[i]`.
    ///
    /// The path is materialized exactly once here; nothing downstream ever
    /// re-parses it.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, Scalar)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, Scalar)>) {
        match self {
            Self::Scalar(s) => out.push((prefix.to_owned(), s.clone())),
            Self::Group(entries) => {
                for (name, value) in entries {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    value.flatten_into(&path, out);
                }
            }
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    item.flatten_into(&format!("{prefix}[{i}]"), out);
                }
            }
        }
    }
}
