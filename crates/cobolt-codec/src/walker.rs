//! The record walker: drives the codec registry across the resolved field
//! tree to build a nested decoded value.

use cobolt_copybook::{Field, FieldId, Layout};
use cobolt_core::{ensure_size, function, CodePage, DecodeError, DecodeErrorExt as _, DecodeResult, Value};

use crate::registry::{decode_scalar, select_codec};

/// Decodes records against a resolved layout.
///
/// The decoder holds no mutable state: it is a pure function of the layout,
/// the code page, and the record bytes, and can be shared by reference
/// across worker threads. Decoded values own their data; nothing borrows
/// from the record buffer after `decode` returns.
#[derive(Debug, Clone, Copy)]
pub struct RecordDecoder<'a> {
    layout: &'a Layout,
    codepage: &'static CodePage,
}

impl<'a> RecordDecoder<'a> {
    pub fn new(layout: &'a Layout, codepage: &'static CodePage) -> Self {
        Self { layout, codepage }
    }

    #[must_use]
    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    #[must_use]
    pub fn codepage(&self) -> &'static CodePage {
        self.codepage
    }

    /// Decodes one record into a group value keyed by the root's visible
    /// children.
    ///
    /// FILLER fields consume bytes but produce no entry; REDEFINES children
    /// produce their own entries, so both views of overlaid bytes coexist in
    /// the result.
    pub fn decode(&self, record: &[u8]) -> DecodeResult<Value> {
        ensure_size!(in: record, size: self.layout.record_len());

        self.walk_group(self.layout.root(), record, 0, "")
    }

    /// Decodes a batch of records, preserving input order.
    pub fn decode_batch<B: AsRef<[u8]>>(&self, records: &[B]) -> DecodeResult<Vec<Value>> {
        records.iter().map(|r| self.decode(r.as_ref())).collect()
    }

    fn walk_group(&self, id: FieldId, record: &[u8], shift: usize, path: &str) -> DecodeResult<Value> {
        let group = self.layout.field(id);
        let mut entries = Vec::with_capacity(group.children.len());

        for &child_id in &group.children {
            let child = self.layout.field(child_id);
            if child.is_filler() {
                continue;
            }

            let child_path = join_path(path, &child.name);
            let value = self.walk_field(child_id, record, shift, &child_path)?;
            entries.push((child.name.clone(), value));
        }

        Ok(Value::Group(entries))
    }

    fn walk_field(&self, id: FieldId, record: &[u8], shift: usize, path: &str) -> DecodeResult<Value> {
        let field = self.layout.field(id);

        if let Some(occurs) = field.occurs {
            let stride = field.element_size();
            let mut items = Vec::with_capacity(occurs as usize);
            for i in 0..occurs as usize {
                let element_path = format!("{path}[{i}]");
                let element_shift = shift + i * stride;
                let item = if field.is_group() {
                    self.walk_group(id, record, element_shift, &element_path)?
                } else {
                    self.decode_elementary(field, record, element_shift, stride, &element_path)?
                };
                items.push(item);
            }
            return Ok(Value::List(items));
        }

        if field.is_group() {
            self.walk_group(id, record, shift, path)
        } else {
            self.decode_elementary(field, record, shift, field.size, path)
        }
    }

    fn decode_elementary(
        &self,
        field: &Field,
        record: &[u8],
        shift: usize,
        size: usize,
        path: &str,
    ) -> DecodeResult<Value> {
        let start = field.offset + shift;
        let end = start + size;

        let bytes = record
            .get(start..end)
            .ok_or_else(|| DecodeError::not_enough_bytes(function!(), record.len(), end))?;

        let codec = select_codec(field);
        let scalar = decode_scalar(codec, bytes, field, self.codepage)
            .map_err(|e| DecodeError::field(function!(), path.to_owned(), start, end).with_source(e))?;

        Ok(Value::Scalar(scalar))
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}
