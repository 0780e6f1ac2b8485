//! Validation report rendering: CSV, HTML, JSON, or plain text, chosen by
//! the report path's extension.
//!
//! Reports carry no timestamp so identical runs produce identical bytes;
//! detail rows are already sorted by (record index, field path).

use std::fmt::Write as _;
use std::path::Path;

use crate::{Mismatch, ValidationOutcome};

/// Report format, selected by filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Html,
    Json,
    Text,
}

impl ReportFormat {
    /// `.csv` / `.html` / `.json` select their formats; anything else is
    /// plain text.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Self::Csv,
            Some("html" | "htm") => Self::Html,
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Errors from report serialization or I/O.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write validation report")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize validation report")]
    Json(#[from] serde_json::Error),
}

/// Renders the outcome in the format implied by `path` and writes it there.
pub fn write_report(outcome: &ValidationOutcome, path: &Path) -> Result<(), ReportError> {
    let rendered = render(outcome, ReportFormat::from_path(path))?;
    std::fs::write(path, rendered)?;
    Ok(())
}

/// Renders the outcome to a string in the requested format.
pub fn render(outcome: &ValidationOutcome, format: ReportFormat) -> Result<String, ReportError> {
    match format {
        ReportFormat::Csv => Ok(render_csv(outcome)),
        ReportFormat::Html => Ok(render_html(outcome)),
        ReportFormat::Json => render_json(outcome),
        ReportFormat::Text => Ok(render_text(outcome)),
    }
}

fn percent(outcome: &ValidationOutcome) -> String {
    format!("{:.2}%", outcome.mismatch_rate() * 100.0)
}

fn render_csv(outcome: &ValidationOutcome) -> String {
    let mut out = String::new();

    out.push_str("Summary\n");
    let _ = writeln!(out, "Total Records,{}", outcome.total_records);
    let _ = writeln!(out, "Total Fields,{}", outcome.total_fields);
    let _ = writeln!(out, "Mismatches,{}", outcome.mismatches);
    let _ = writeln!(out, "Mismatch Rate,{}", percent(outcome));
    out.push('\n');

    if !outcome.details.is_empty() {
        out.push_str("Record Index,Field Path,First Pass,Second Pass,Error Type,Error Details\n");
        for m in &outcome.details {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{}",
                m.record_index,
                csv_escape(&m.field_path),
                csv_escape(m.first.as_deref().unwrap_or("")),
                csv_escape(m.second.as_deref().unwrap_or("")),
                m.class,
                csv_escape(&m.detail),
            );
        }
    }

    out
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

fn render_json(outcome: &ValidationOutcome) -> Result<String, ReportError> {
    let details: Vec<serde_json::Value> = outcome.details.iter().map(mismatch_json).collect();

    let report = serde_json::json!({
        "summary": {
            "total_records": outcome.total_records,
            "total_fields": outcome.total_fields,
            "mismatches": outcome.mismatches,
            "mismatch_rate": outcome.mismatch_rate(),
            "dropped_details": outcome.dropped_details,
        },
        "mismatch_details": details,
    });

    Ok(serde_json::to_string_pretty(&report)?)
}

fn mismatch_json(m: &Mismatch) -> serde_json::Value {
    serde_json::json!({
        "record_index": m.record_index,
        "field_path": m.field_path,
        "first_pass": m.first,
        "second_pass": m.second,
        "error_type": m.class.as_str(),
        "error_details": m.detail,
    })
}

fn render_html(outcome: &ValidationOutcome) -> String {
    let mut out = String::new();

    out.push_str(
        "<!DOCTYPE html>\n<html>\n<head>\n    <title>Record Conversion Validation Report</title>\n    <style>\n        \
         body { font-family: Arial, sans-serif; margin: 20px; }\n        \
         h1 { color: #333; }\n        \
         table { border-collapse: collapse; }\n        \
         th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }\n        \
         th { background-color: #f2f2f2; }\n        \
         tr:nth-child(even) { background-color: #f9f9f9; }\n        \
         .error-type { font-weight: bold; }\n    </style>\n</head>\n<body>\n    <h1>Record Conversion Validation Report</h1>\n",
    );

    out.push_str("    <h2>Summary</h2>\n    <table>\n");
    let _ = writeln!(out, "        <tr><th>Total Records</th><td>{}</td></tr>", outcome.total_records);
    let _ = writeln!(out, "        <tr><th>Total Fields</th><td>{}</td></tr>", outcome.total_fields);
    let _ = writeln!(out, "        <tr><th>Mismatches</th><td>{}</td></tr>", outcome.mismatches);
    let _ = writeln!(out, "        <tr><th>Mismatch Rate</th><td>{}</td></tr>", percent(outcome));
    out.push_str("    </table>\n");

    if !outcome.details.is_empty() {
        out.push_str(
            "    <h2>Mismatch Details</h2>\n    <table>\n        <tr>\n            <th>Record</th>\n            \
             <th>Field Path</th>\n            <th>First Pass</th>\n            <th>Second Pass</th>\n            \
             <th>Error Type</th>\n            <th>Error Details</th>\n        </tr>\n",
        );
        for m in &outcome.details {
            let _ = writeln!(
                out,
                "        <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"error-type\">{}</td><td>{}</td></tr>",
                m.record_index,
                html_escape(&m.field_path),
                html_escape(m.first.as_deref().unwrap_or("")),
                html_escape(m.second.as_deref().unwrap_or("")),
                m.class,
                html_escape(&m.detail),
            );
        }
        out.push_str("    </table>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_text(outcome: &ValidationOutcome) -> String {
    let mut out = String::new();

    out.push_str("Record Conversion Validation Report\n");
    out.push_str("===================================\n\n");
    out.push_str("Summary:\n--------\n");
    let _ = writeln!(out, "Total Records: {}", outcome.total_records);
    let _ = writeln!(out, "Total Fields: {}", outcome.total_fields);
    let _ = writeln!(out, "Mismatches: {}", outcome.mismatches);
    let _ = writeln!(out, "Mismatch Rate: {}", percent(outcome));

    if !outcome.details.is_empty() {
        out.push_str("\nMismatch Details:\n-----------------\n");
        for m in &outcome.details {
            let _ = writeln!(out, "\nRecord: {}", m.record_index);
            let _ = writeln!(out, "Field: {}", m.field_path);
            let _ = writeln!(out, "First Pass: {}", m.first.as_deref().unwrap_or("<absent>"));
            let _ = writeln!(out, "Second Pass: {}", m.second.as_deref().unwrap_or("<absent>"));
            let _ = writeln!(out, "Error Type: {}", m.class);
            let _ = writeln!(out, "Error Details: {}", m.detail);
        }
    }

    if outcome.dropped_details > 0 {
        let _ = writeln!(out, "\n({} further mismatches not listed)", outcome.dropped_details);
    }

    out
}
