//! Layered error type shared by all Cobolt crates.
//!
//! Each layer defines a closed `Kind` enum and a `type XError = Error<XErrorKind>`
//! alias. The wrapper carries a static context string (typically the function
//! that failed) and an optional boxed source for chaining.

use core::fmt;

pub trait Source: std::error::Error + Sync + Send + 'static {}

impl<T> Source for T where T: std::error::Error + Sync + Send + 'static {}

#[derive(Debug)]
pub struct Error<Kind> {
    pub context: &'static str,
    pub kind: Kind,
    source: Option<Box<dyn std::error::Error + Sync + Send>>,
}

impl<Kind> Error<Kind> {
    #[cold]
    #[must_use]
    pub fn new(context: &'static str, kind: Kind) -> Self {
        Self {
            context,
            kind,
            source: None,
        }
    }

    #[cold]
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Source,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Display helper walking the full source chain.
    pub fn report(&self) -> ErrorReport<'_, Kind> {
        ErrorReport(self)
    }
}

impl<Kind> fmt::Display for Error<Kind>
where
    Kind: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.context, self.kind)
    }
}

impl<Kind> std::error::Error for Error<Kind>
where
    Kind: std::error::Error,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Some(source) = self.kind.source() {
            Some(source)
        } else if let Some(e) = &self.source {
            Some(e.as_ref())
        } else {
            None
        }
    }
}

impl<Kind> From<Error<Kind>> for std::io::Error
where
    Kind: std::error::Error + Send + Sync + 'static,
{
    fn from(error: Error<Kind>) -> Self {
        Self::other(error)
    }
}

pub struct ErrorReport<'a, Kind>(&'a Error<Kind>);

impl<Kind> fmt::Display for ErrorReport<'_, Kind>
where
    Kind: std::error::Error,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::error::Error as _;

        write!(f, "{}", self.0)?;

        let mut next_source = self.0.source();

        while let Some(e) = next_source {
            write!(f, ", caused by: {e}")?;
            next_source = e.source();
        }

        Ok(())
    }
}
