use cobolt_core::function;

use crate::{CopybookError, CopybookErrorKind, CopybookResult};

/// Character class of a picture, as relevant for decoder dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureClass {
    /// Contains `X` or `A` positions; decoded as text.
    Alphanumeric,
    /// Contains `9` positions and no `X`/`A`; decoded as a number.
    Numeric,
}

/// A parsed picture clause.
///
/// `(n)` repeat counts are expanded at parse time; the editing characters
/// `Z . , / + - $ CR DB` are dropped when counting positions, `S` marks the
/// sign without occupying a position, and `V`/`P` are scale markers only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    source: String,
    class: PictureClass,
    signed: bool,
    digits: usize,
    scale: u8,
}

impl Picture {
    pub fn parse(source: &str) -> CopybookResult<Self> {
        let expanded = expand_repeats(source)?;

        let mut has_alpha = false;
        let mut has_digit = false;
        let mut digits = 0usize;
        let mut scale = 0usize;
        let mut after_point = false;

        for ch in expanded.chars() {
            match ch {
                'A' | 'X' => {
                    has_alpha = true;
                    digits += 1;
                }
                '9' | '0' => {
                    has_digit = true;
                    digits += 1;
                    if after_point {
                        scale += 1;
                    }
                }
                'V' => after_point = true,
                // Sign and scaling markers occupy no byte position.
                'S' | 'P' => {}
                // Editing characters are dropped from the byte count.
                'Z' | '.' | ',' | '/' | '+' | '-' | '$' | 'C' | 'R' | 'D' | 'B' => {}
                other => {
                    tracing::warn!(picture = source, symbol = %other, "ignoring unknown picture character");
                }
            }
        }

        let class = if has_digit && !has_alpha {
            PictureClass::Numeric
        } else {
            PictureClass::Alphanumeric
        };

        #[allow(clippy::cast_possible_truncation)]
        Ok(Self {
            source: source.to_owned(),
            class,
            signed: expanded.starts_with('S'),
            digits,
            scale: scale.min(usize::from(u8::MAX)) as u8,
        })
    }

    /// The picture text as written in the copybook.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn class(&self) -> PictureClass {
        self.class
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.class == PictureClass::Numeric
    }

    /// `true` iff the picture carries a leading `S`.
    #[must_use]
    pub fn signed(&self) -> bool {
        self.signed
    }

    /// Count of digit/character byte positions (`d`).
    #[must_use]
    pub fn digits(&self) -> usize {
        self.digits
    }

    /// Count of implied fractional digit positions after `V`.
    #[must_use]
    pub fn scale(&self) -> u8 {
        self.scale
    }
}

/// Expands `X(10)` to `XXXXXXXXXX`, uppercasing as it goes.
fn expand_repeats(source: &str) -> CopybookResult<String> {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        let ch = ch.to_ascii_uppercase();

        if ch == '(' {
            let Some(last) = out.pop() else {
                return Err(malformed_repeat(source));
            };
            let mut count_text = String::new();
            loop {
                match chars.next() {
                    Some(')') => break,
                    Some(digit) => count_text.push(digit),
                    None => return Err(malformed_repeat(source)),
                }
            }
            let count: usize = count_text.parse().map_err(|_| malformed_repeat(source))?;
            if count == 0 {
                return Err(malformed_repeat(source));
            }
            for _ in 0..count {
                out.push(last);
            }
        } else {
            out.push(ch);
        }
    }

    Ok(out)
}

fn malformed_repeat(source: &str) -> CopybookError {
    CopybookError::new(
        function!(),
        CopybookErrorKind::MalformedRepeat {
            picture: source.to_owned(),
        },
    )
}
