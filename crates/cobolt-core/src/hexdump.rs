use core::fmt::Write as _;

/// Formats a byte slice as a classic hex dump: offset column, hex bytes,
/// printable-ASCII gutter. Used for diagnostics when a record fails to
/// decode.
#[must_use]
pub fn format_hex_dump(data: &[u8], bytes_per_line: usize) -> String {
    let bytes_per_line = bytes_per_line.max(1);
    let mut out = String::new();

    for (i, chunk) in data.chunks(bytes_per_line).enumerate() {
        let offset = i * bytes_per_line;

        let mut hex = String::with_capacity(bytes_per_line * 3);
        for b in chunk {
            let _ = write!(hex, "{b:02x} ");
        }

        let ascii: String = chunk
            .iter()
            .map(|&b| if (0x20..0x7F).contains(&b) { char::from(b) } else { '.' })
            .collect();

        if !out.is_empty() {
            out.push('\n');
        }
        let width = bytes_per_line * 3;
        let _ = write!(out, "{offset:08x}  {hex:<width$}  {ascii}");
    }

    out
}
