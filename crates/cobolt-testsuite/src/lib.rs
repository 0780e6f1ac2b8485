//! Shared helpers for the Cobolt integration tests.

use cobolt_copybook::Layout;
use cobolt_core::{default_codepage, CodePage};

/// A representative record layout exercising most usages at once.
pub const CUSTOMER_COPYBOOK: &str = "
       01  CUSTOMER-RECORD.
           05  CUST-ID            PIC 9(6).
           05  CUST-NAME          PIC X(10).
           05  CUST-BALANCE       PIC S9(5)V99 COMP-3.
           05  CUST-FLAGS.
               10  CUST-STATUS    PIC X.
                   88  ACTIVE     VALUE 'A'.
                   88  CLOSED     VALUE 'C'.
               10  FILLER         PIC X.
           05  CUST-SCORES        OCCURS 3 TIMES PIC 9(2).
           05  CUST-COUNT         PIC S9(9) COMP.
";

/// Parses and resolves a copybook, panicking on any schema error.
pub fn layout(text: &str) -> Layout {
    cobolt_copybook::parse(text)
        .expect("copybook parses")
        .resolve()
        .expect("layout resolves")
}

/// Encodes ASCII-range text to CP037 bytes by reverse lookup, for building
/// test records.
pub fn ebcdic(text: &str) -> Vec<u8> {
    text.chars().map(|c| encode_char(default_codepage(), c)).collect()
}

fn encode_char(codepage: &CodePage, c: char) -> u8 {
    (0u8..=255)
        .find(|&b| codepage.decode_byte(b) == c)
        .unwrap_or_else(|| panic!("character {c:?} has no CP037 encoding"))
}

/// Builds the byte image of one `CUSTOMER_COPYBOOK` record.
#[must_use]
pub fn customer_record(id: &str, name: &str, balance: &[u8], status: char, scores: &str, count: i32) -> Vec<u8> {
    assert_eq!(id.len(), 6);
    assert_eq!(name.len(), 10);
    assert_eq!(balance.len(), 4);
    assert_eq!(scores.len(), 6);

    let mut record = Vec::new();
    record.extend(ebcdic(id));
    record.extend(ebcdic(name));
    record.extend(balance);
    record.extend(ebcdic(&status.to_string()));
    record.push(0x40);
    record.extend(ebcdic(scores));
    record.extend(count.to_be_bytes());
    record
}
