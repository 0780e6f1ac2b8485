//! Output serialization for decoded records: flat concatenated text, CSV
//! rows with a field-path header, or a JSON document of structured records.
//!
//! BLANK WHEN ZERO is applied here, in the textual forms (flat and CSV):
//! the decoded value stays numeric, and a zero renders as spaces of the
//! field's width. The JSON form is structural and keeps the numeric
//! identity.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::Context as _;
use cobolt_copybook::{Field, FieldFlags, FieldId, Layout};
use cobolt_core::{Scalar, Value};

use crate::config::OutputFormat;

/// Writes decoded records to the output file in the configured format.
pub struct OutputWriter<'a> {
    layout: &'a Layout,
    format: OutputFormat,
    out: BufWriter<File>,
    csv_header_written: bool,
    json_records_written: u64,
}

impl<'a> OutputWriter<'a> {
    pub fn create(path: &Path, format: OutputFormat, layout: &'a Layout) -> anyhow::Result<Self> {
        let file = File::create(path).with_context(|| format!("couldn't create output file {}", path.display()))?;
        Ok(Self {
            layout,
            format,
            out: BufWriter::new(file),
            csv_header_written: false,
            json_records_written: 0,
        })
    }

    pub fn write_record(&mut self, value: &Value) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Flat => self.write_flat(value),
            OutputFormat::Csv => self.write_csv(value),
            OutputFormat::Json => self.write_json(value),
        }
    }

    /// Finishes the document and flushes the file.
    pub fn finish(mut self) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            if self.json_records_written == 0 {
                self.out.write_all(b"[]\n")?;
            } else {
                self.out.write_all(b"\n]\n")?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn write_flat(&mut self, value: &Value) -> anyhow::Result<()> {
        let mut line = String::new();
        for (_, rendered) in flatten_rendered(self.layout, value) {
            line.push_str(&rendered);
        }
        line.push('\n');
        self.out.write_all(line.as_bytes())?;
        Ok(())
    }

    fn write_csv(&mut self, value: &Value) -> anyhow::Result<()> {
        let leaves = flatten_rendered(self.layout, value);

        if !self.csv_header_written {
            let header: Vec<String> = leaves.iter().map(|(path, _)| csv_escape(path)).collect();
            self.out.write_all(header.join(",").as_bytes())?;
            self.out.write_all(b"\n")?;
            self.csv_header_written = true;
        }

        let row: Vec<String> = leaves.iter().map(|(_, rendered)| csv_escape(rendered)).collect();
        self.out.write_all(row.join(",").as_bytes())?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn write_json(&mut self, value: &Value) -> anyhow::Result<()> {
        if self.json_records_written == 0 {
            self.out.write_all(b"[\n")?;
        } else {
            self.out.write_all(b",\n")?;
        }
        let rendered = serde_json::to_string(&json_value(value))?;
        self.out.write_all(rendered.as_bytes())?;
        self.json_records_written += 1;
        Ok(())
    }
}

/// Flattens a decoded record into `(dotted path, rendered text)` pairs,
/// walking the layout in parallel so field attributes (BLANK WHEN ZERO,
/// widths) can shape the rendering.
pub fn flatten_rendered(layout: &Layout, value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    collect_group(layout, layout.root(), value, "", &mut out);
    out
}

fn collect_group(layout: &Layout, group_id: FieldId, value: &Value, prefix: &str, out: &mut Vec<(String, String)>) {
    let Value::Group(entries) = value else {
        return;
    };

    // Group entries are produced in child declaration order with FILLERs
    // skipped, so a filtered zip recovers each entry's field.
    let mut children = layout
        .field(group_id)
        .children
        .iter()
        .filter(|&&c| !layout.field(c).is_filler());

    for (name, child_value) in entries {
        let Some(&child_id) = children.next() else {
            break;
        };
        debug_assert_eq!(&layout.field(child_id).name, name);

        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        collect_field(layout, child_id, child_value, &path, out);
    }
}

fn collect_field(layout: &Layout, id: FieldId, value: &Value, path: &str, out: &mut Vec<(String, String)>) {
    let field = layout.field(id);

    match value {
        Value::List(items) => {
            for (i, item) in items.iter().enumerate() {
                let element_path = format!("{path}[{i}]");
                if field.is_group() {
                    collect_group(layout, id, item, &element_path, out);
                } else if let Value::Scalar(s) = item {
                    out.push((element_path, render_scalar(field, s, field.element_size())));
                }
            }
        }
        Value::Group(_) => collect_group(layout, id, value, path, out),
        Value::Scalar(s) => out.push((path.to_owned(), render_scalar(field, s, field.size))),
    }
}

fn render_scalar(field: &Field, scalar: &Scalar, width: usize) -> String {
    if field.flags.contains(FieldFlags::BLANK_WHEN_ZERO) && is_zero(scalar) {
        return " ".repeat(width);
    }
    scalar.literal()
}

fn is_zero(scalar: &Scalar) -> bool {
    match scalar {
        Scalar::Integer(i) => *i == 0,
        Scalar::Decimal(d) => d.is_zero(),
        Scalar::Float(f) => *f == 0.0,
        Scalar::Text(_) | Scalar::Bytes(_) => false,
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

/// Structural JSON form of a decoded value. Decimals stay strings to keep
/// them exact; integers that fit a JSON number are numbers.
fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Scalar(s) => json_scalar(s),
        Value::Group(entries) => {
            let map: serde_json::Map<String, serde_json::Value> = entries
                .iter()
                .map(|(name, v)| (name.clone(), json_value(v)))
                .collect();
            serde_json::Value::Object(map)
        }
        Value::List(items) => serde_json::Value::Array(items.iter().map(json_value).collect()),
    }
}

fn json_scalar(scalar: &Scalar) -> serde_json::Value {
    match scalar {
        Scalar::Integer(i) => match i64::try_from(*i) {
            Ok(n) => serde_json::Value::from(n),
            Err(_) => serde_json::Value::from(i.to_string()),
        },
        Scalar::Decimal(d) => serde_json::Value::from(d.to_string()),
        Scalar::Float(f) => serde_json::Number::from_f64(*f)
            .map_or_else(|| serde_json::Value::from(f.to_string()), serde_json::Value::Number),
        Scalar::Text(s) => serde_json::Value::from(s.clone()),
        Scalar::Bytes(_) => serde_json::Value::from(scalar.literal()),
    }
}
