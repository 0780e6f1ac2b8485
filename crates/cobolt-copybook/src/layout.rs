use cobolt_core::function;

use crate::{CopybookError, CopybookErrorKind, CopybookResult, Field, FieldFlags, FieldId, Schema, Usage};

/// A schema with resolved sizes, offsets, and REDEFINES targets.
///
/// Immutable once constructed; safe to share by reference across worker
/// threads.
#[derive(Debug, Clone)]
pub struct Layout {
    schema: Schema,
}

impl Schema {
    /// Resolves sizes and offsets, consuming the schema.
    pub fn resolve(mut self) -> CopybookResult<Layout> {
        let root = self.root;
        resolve_size(&mut self, root)?;
        place(&mut self, root, 0)?;

        if self.fields[root].size == 0 {
            return Err(CopybookError::new(function!(), CopybookErrorKind::EmptyRecord));
        }

        Ok(Layout { schema: self })
    }
}

impl Layout {
    /// Record length in bytes; every record in a run has exactly this size.
    #[must_use]
    pub fn record_len(&self) -> usize {
        self.schema.field(self.schema.root()).size
    }

    #[must_use]
    pub fn root(&self) -> FieldId {
        self.schema.root()
    }

    #[must_use]
    pub fn field(&self, id: FieldId) -> &Field {
        self.schema.field(id)
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<FieldId> {
        self.schema.find(name)
    }

    /// Depth-first iteration over all field ids, root first.
    pub fn iter_depth_first(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.schema.iter_depth_first()
    }
}

/// Post-order size computation.
fn resolve_size(schema: &mut Schema, id: FieldId) -> CopybookResult<usize> {
    if schema.field(id).is_group() {
        let children = schema.field(id).children.clone();
        let mut total = 0usize;
        for child in children {
            let child_size = resolve_size(schema, child)?;
            // REDEFINES children overlay existing storage.
            if schema.field(child).redefines.is_none() {
                total += child_size;
            }
        }
        let occurs = schema.field(id).occurs.unwrap_or(1) as usize;
        let size = total * occurs;
        schema.field_mut(id).size = size;
        return Ok(size);
    }

    let field = schema.field(id);
    let size = elementary_size(field)?;
    let occurs = field.occurs.unwrap_or(1) as usize;
    let size = size * occurs;
    schema.field_mut(id).size = size;
    Ok(size)
}

/// Byte size of one instance of an elementary field, from (picture, usage).
fn elementary_size(field: &Field) -> CopybookResult<usize> {
    match field.usage() {
        Usage::SingleFloat => return Ok(4),
        Usage::DoubleFloat => return Ok(8),
        _ => {}
    }

    let Some(picture) = &field.picture else {
        // An elementary item without a picture occupies no storage.
        return Ok(0);
    };

    let digits = picture.digits();
    if digits == 0 {
        return Err(CopybookError::new(
            function!(),
            CopybookErrorKind::EmptyPicture {
                field: field.name.clone(),
            },
        ));
    }

    let size = match field.usage() {
        Usage::Display => {
            if field.flags.contains(FieldFlags::SIGN_SEPARATE) {
                digits + 1
            } else {
                digits
            }
        }
        Usage::Binary | Usage::NativeBinary => match digits {
            0..=4 => 2,
            5..=9 => 4,
            _ => 8,
        },
        // One nibble per digit plus a sign nibble, whole bytes.
        Usage::PackedDecimal => digits / 2 + 1,
        // One nibble per digit, whole bytes, no sign.
        Usage::UnsignedPacked => digits.div_ceil(2),
        Usage::SingleFloat | Usage::DoubleFloat => unreachable!("handled above"),
    };

    Ok(size)
}

/// Offset assignment, walking children in declaration order.
fn place(schema: &mut Schema, id: FieldId, start: usize) -> CopybookResult<()> {
    schema.field_mut(id).offset = start;

    if !schema.field(id).is_group() {
        return Ok(());
    }

    let children = schema.field(id).children.clone();
    let mut cursor = start;

    for (idx, &child) in children.iter().enumerate() {
        let redefines = schema.field(child).redefines.clone();
        match redefines {
            Some(target_name) => {
                let target = find_redefines_target(schema, &children, idx, &target_name)?;
                let target_offset = schema.field(target).offset;
                schema.field_mut(child).redefines_target = Some(target);
                place(schema, child, target_offset)?;
                // The cursor does not advance past an overlay.
            }
            None => {
                place(schema, child, cursor)?;
                cursor += schema.field(child).size;
            }
        }
    }

    Ok(())
}

/// The target must be the immediately preceding sibling at the same level,
/// ignoring intervening siblings that themselves redefine the same target.
fn find_redefines_target(
    schema: &Schema,
    siblings: &[FieldId],
    redefiner_idx: usize,
    target_name: &str,
) -> CopybookResult<FieldId> {
    let redefiner = &schema.field(siblings[redefiner_idx]).name;

    for &sibling in siblings[..redefiner_idx].iter().rev() {
        let sibling_field = schema.field(sibling);
        if sibling_field.name == target_name {
            return Ok(sibling);
        }
        if sibling_field.redefines.as_deref() != Some(target_name) {
            // Some other field sits between the redefiner and its target.
            let kind = if siblings[..redefiner_idx]
                .iter()
                .any(|&s| schema.field(s).name == target_name)
            {
                CopybookErrorKind::MisplacedRedefines {
                    field: redefiner.clone(),
                    target: target_name.to_owned(),
                }
            } else {
                CopybookErrorKind::UnresolvedRedefines {
                    field: redefiner.clone(),
                    target: target_name.to_owned(),
                }
            };
            return Err(CopybookError::new(function!(), kind));
        }
    }

    Err(CopybookError::new(
        function!(),
        CopybookErrorKind::UnresolvedRedefines {
            field: redefiner.clone(),
            target: target_name.to_owned(),
        },
    ))
}
