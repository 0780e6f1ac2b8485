//! COBOL copybook parsing and record layout resolution.
//!
//! [`parse`] turns copybook text into a [`Schema`] (a field arena rooted at
//! a synthetic level-0 node); [`Schema::resolve`] computes sizes and
//! offsets, resolves REDEFINES targets, and yields an immutable [`Layout`]
//! ready for record decoding.

use core::fmt;

mod field;
mod layout;
mod parser;
mod picture;

pub use self::field::{Condition, Field, FieldFlags, FieldId, Schema, Usage, FILLER};
pub use self::layout::Layout;
pub use self::parser::parse;
pub use self::picture::{Picture, PictureClass};

pub type CopybookResult<T> = Result<T, CopybookError>;

pub type CopybookError = cobolt_error::Error<CopybookErrorKind>;

/// Enum representing the different kinds of copybook schema and layout errors.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum CopybookErrorKind {
    /// A statement that starts like a data description entry but cannot be
    /// parsed as one.
    Statement {
        statement: String,
        reason: &'static str,
    },
    /// A usage keyword outside the supported set.
    UnknownUsage { usage: String },
    /// A `(n)` repeat count with no closing parenthesis or a non-numeric count.
    MalformedRepeat { picture: String },
    /// A picture with no digit or character positions left after expansion.
    EmptyPicture { field: String },
    /// A level-88 entry with no preceding data item to attach to.
    ConditionWithoutParent { name: String },
    /// A REDEFINES naming a sibling that does not exist.
    UnresolvedRedefines { field: String, target: String },
    /// A REDEFINES whose target is not the immediately preceding sibling at
    /// the same level.
    MisplacedRedefines { field: String, target: String },
    /// The resolved record has zero size.
    EmptyRecord,
}

impl std::error::Error for CopybookErrorKind {}

impl fmt::Display for CopybookErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statement { statement, reason } => {
                write!(f, "malformed statement `{statement}`: {reason}")
            }
            Self::UnknownUsage { usage } => {
                write!(f, "unknown usage `{usage}`")
            }
            Self::MalformedRepeat { picture } => {
                write!(f, "malformed repeat count in picture `{picture}`")
            }
            Self::EmptyPicture { field } => {
                write!(f, "picture of `{field}` is empty after normalization")
            }
            Self::ConditionWithoutParent { name } => {
                write!(f, "condition `{name}` has no data item to attach to")
            }
            Self::UnresolvedRedefines { field, target } => {
                write!(f, "`{field}` redefines unknown sibling `{target}`")
            }
            Self::MisplacedRedefines { field, target } => {
                write!(
                    f,
                    "`{field}` redefines `{target}`, which is not the immediately preceding sibling at the same level"
                )
            }
            Self::EmptyRecord => {
                write!(f, "resolved record has zero size")
            }
        }
    }
}
