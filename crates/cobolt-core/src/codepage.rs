//! EBCDIC code pages.
//!
//! A code page is an explicit argument to every character decoder, never
//! global state. The built-in registry covers the common single-byte EBCDIC
//! pages; CP500 and CP1140 are expressed as patches over the CP037 base
//! table since they differ in only a handful of positions.

/// A single-byte EBCDIC code page: a 256-entry table mapping each byte to a
/// Unicode scalar.
#[derive(Debug)]
pub struct CodePage {
    name: &'static str,
    aliases: &'static [&'static str],
    table: &'static [char; 256],
}

impl CodePage {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Decodes one byte to its Unicode scalar.
    #[inline]
    #[must_use]
    pub fn decode_byte(&self, byte: u8) -> char {
        self.table[usize::from(byte)]
    }

    /// Decodes a byte slice to a `String`, one character per byte.
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|&b| self.decode_byte(b)).collect()
    }

    fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Resolves a code page by name or alias, case-insensitively.
#[must_use]
pub fn lookup_codepage(name: &str) -> Option<&'static CodePage> {
    CODE_PAGES.iter().copied().find(|cp| cp.matches(name))
}

/// The default code page (CP037, EBCDIC US/Canada).
#[must_use]
pub fn default_codepage() -> &'static CodePage {
    &CP037
}

pub static CP037: CodePage = CodePage {
    name: "cp037",
    aliases: &["ibm037", "037", "ebcdic-cp-us"],
    table: &CP037_TABLE,
};

pub static CP500: CodePage = CodePage {
    name: "cp500",
    aliases: &["ibm500", "500", "ebcdic-international"],
    table: &CP500_TABLE,
};

pub static CP1140: CodePage = CodePage {
    name: "cp1140",
    aliases: &["ibm1140", "1140", "ebcdic-us-euro"],
    table: &CP1140_TABLE,
};

static CODE_PAGES: &[&CodePage] = &[&CP037, &CP500, &CP1140];

const fn patched(mut table: [char; 256], patches: &[(u8, char)]) -> [char; 256] {
    let mut i = 0;
    while i < patches.len() {
        table[patches[i].0 as usize] = patches[i].1;
        i += 1;
    }
    table
}

#[rustfmt::skip]
const CP037_TABLE: [char; 256] = [
    // 0x00
    '\u{00}', '\u{01}', '\u{02}', '\u{03}', '\u{9C}', '\u{09}', '\u{86}', '\u{7F}',
    '\u{97}', '\u{8D}', '\u{8E}', '\u{0B}', '\u{0C}', '\u{0D}', '\u{0E}', '\u{0F}',
    // 0x10
    '\u{10}', '\u{11}', '\u{12}', '\u{13}', '\u{9D}', '\u{85}', '\u{08}', '\u{87}',
    '\u{18}', '\u{19}', '\u{92}', '\u{8F}', '\u{1C}', '\u{1D}', '\u{1E}', '\u{1F}',
    // 0x20
    '\u{80}', '\u{81}', '\u{82}', '\u{83}', '\u{84}', '\u{0A}', '\u{17}', '\u{1B}',
    '\u{88}', '\u{89}', '\u{8A}', '\u{8B}', '\u{8C}', '\u{05}', '\u{06}', '\u{07}',
    // 0x30
    '\u{90}', '\u{91}', '\u{16}', '\u{93}', '\u{94}', '\u{95}', '\u{96}', '\u{04}',
    '\u{98}', '\u{99}', '\u{9A}', '\u{9B}', '\u{14}', '\u{15}', '\u{9E}', '\u{1A}',
    // 0x40
    ' ', '\u{A0}', '\u{E2}', '\u{E4}', '\u{E0}', '\u{E1}', '\u{E3}', '\u{E5}',
    '\u{E7}', '\u{F1}', '\u{A2}', '.', '<', '(', '+', '|',
    // 0x50
    '&', '\u{E9}', '\u{EA}', '\u{EB}', '\u{E8}', '\u{ED}', '\u{EE}', '\u{EF}',
    '\u{EC}', '\u{DF}', '!', '$', '*', ')', ';', '\u{AC}',
    // 0x60
    '-', '/', '\u{C2}', '\u{C4}', '\u{C0}', '\u{C1}', '\u{C3}', '\u{C5}',
    '\u{C7}', '\u{D1}', '\u{A6}', ',', '%', '_', '>', '?',
    // 0x70
    '\u{F8}', '\u{C9}', '\u{CA}', '\u{CB}', '\u{C8}', '\u{CD}', '\u{CE}', '\u{CF}',
    '\u{CC}', '`', ':', '#', '@', '\'', '=', '"',
    // 0x80
    '\u{D8}', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', '\u{AB}', '\u{BB}', '\u{F0}', '\u{FD}', '\u{FE}', '\u{B1}',
    // 0x90
    '\u{B0}', 'j', 'k', 'l', 'm', 'n', 'o', 'p',
    'q', 'r', '\u{AA}', '\u{BA}', '\u{E6}', '\u{B8}', '\u{C6}', '\u{A4}',
    // 0xA0
    '\u{B5}', '~', 's', 't', 'u', 'v', 'w', 'x',
    'y', 'z', '\u{A1}', '\u{BF}', '\u{D0}', '\u{DD}', '\u{DE}', '\u{AE}',
    // 0xB0
    '^', '\u{A3}', '\u{A5}', '\u{B7}', '\u{A9}', '\u{A7}', '\u{B6}', '\u{BC}',
    '\u{BD}', '\u{BE}', '[', ']', '\u{AF}', '\u{A8}', '\u{B4}', '\u{D7}',
    // 0xC0
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', '\u{AD}', '\u{F4}', '\u{F6}', '\u{F2}', '\u{F3}', '\u{F5}',
    // 0xD0
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
    'Q', 'R', '\u{B9}', '\u{FB}', '\u{FC}', '\u{F9}', '\u{FA}', '\u{FF}',
    // 0xE0
    '\\', '\u{F7}', 'S', 'T', 'U', 'V', 'W', 'X',
    'Y', 'Z', '\u{B2}', '\u{D4}', '\u{D6}', '\u{D2}', '\u{D3}', '\u{D5}',
    // 0xF0
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', '\u{B3}', '\u{DB}', '\u{DC}', '\u{D9}', '\u{DA}', '\u{9F}',
];

// CP500 moves the bracket/bang/caret set relative to CP037.
const CP500_TABLE: [char; 256] = patched(
    CP037_TABLE,
    &[
        (0x4A, '['),
        (0x4F, '!'),
        (0x5A, ']'),
        (0x5F, '^'),
        (0xB0, '\u{A2}'),
        (0xBA, '\u{AC}'),
        (0xBB, '|'),
    ],
);

// CP1140 is CP037 with the euro sign replacing the currency sign.
const CP1140_TABLE: [char; 256] = patched(CP037_TABLE, &[(0x9F, '\u{20AC}')]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cp037_basics() {
        assert_eq!(CP037.decode_byte(0x40), ' ');
        assert_eq!(CP037.decode_byte(0xC1), 'A');
        assert_eq!(CP037.decode_byte(0x81), 'a');
        assert_eq!(CP037.decode_byte(0xF0), '0');
        assert_eq!(CP037.decode_byte(0xF9), '9');
        assert_eq!(CP037.decode_byte(0x4E), '+');
        assert_eq!(CP037.decode_byte(0x60), '-');
    }

    #[test]
    fn cp500_bracket_positions() {
        assert_eq!(CP500.decode_byte(0x4A), '[');
        assert_eq!(CP500.decode_byte(0x5A), ']');
        // Unpatched positions fall through to the base table.
        assert_eq!(CP500.decode_byte(0xC1), 'A');
    }

    #[test]
    fn cp1140_euro() {
        assert_eq!(CP1140.decode_byte(0x9F), '\u{20AC}');
        assert_eq!(CP037.decode_byte(0x9F), '\u{A4}');
    }

    #[test]
    fn registry_lookup_is_case_insensitive() {
        assert!(lookup_codepage("CP037").is_some());
        assert!(lookup_codepage("IBM500").is_some());
        assert!(lookup_codepage("ebcdic-us-euro").is_some());
        assert!(lookup_codepage("cp9999").is_none());
    }

    #[test]
    fn decode_string() {
        // "HELLO" in CP037.
        assert_eq!(CP037.decode(&[0xC8, 0xC5, 0xD3, 0xD3, 0xD6]), "HELLO");
    }
}
