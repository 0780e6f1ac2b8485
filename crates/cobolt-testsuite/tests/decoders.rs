use cobolt_codec::RecordDecoder;
use cobolt_core::{default_codepage, Decimal, Scalar, Value};
use cobolt_testsuite::layout;
use rstest::rstest;

fn decode_field(copybook: &str, record: &[u8]) -> Value {
    let layout = layout(copybook);
    let decoder = RecordDecoder::new(&layout, default_codepage());
    decoder.decode(record).expect("record decodes")
}

fn scalar(copybook: &str, record: &[u8], path: &[&str]) -> Scalar {
    let mut value = decode_field(copybook, record);
    for part in path {
        value = value.get(part).expect("path exists").clone();
    }
    value.as_scalar().expect("leaf is a scalar").clone()
}

#[rstest]
#[case(&[0xF0, 0xF0, 0xF1, 0xF2, 0xC3], Decimal::new(123, 2))]
#[case(&[0xF0, 0xF0, 0xF1, 0xF2, 0xD3], Decimal::new(-123, 2))]
#[case(&[0xF0, 0xF0, 0xF1, 0xF2, 0xF3], Decimal::new(123, 2))]
fn zoned_numeric_with_implied_scale(#[case] bytes: &[u8], #[case] expected: Decimal) {
    let got = scalar("01 R. 05 AMT PIC S9(3)V99.", bytes, &["R", "AMT"]);
    assert_eq!(got, Scalar::Decimal(expected));
}

#[rstest]
#[case(&[0x01, 0x23, 0x4C], 1234)]
#[case(&[0x01, 0x23, 0x4D], -1234)]
fn packed_decimal_signs(#[case] bytes: &[u8], #[case] expected: i128) {
    let got = scalar("01 R. 05 QTY PIC S9(5) COMP-3.", bytes, &["R", "QTY"]);
    assert_eq!(got, Scalar::Integer(expected));
}

#[test]
fn packed_decimal_rejects_non_digit_nibble() {
    let layout = layout("01 R. 05 QTY PIC S9(5) COMP-3.");
    let decoder = RecordDecoder::new(&layout, default_codepage());
    assert!(decoder.decode(&[0x01, 0x2A, 0x4C]).is_err());
}

#[rstest]
#[case(&[0xFF, 0xFF, 0xFF, 0xFE], -2)]
#[case(&[0x00, 0x00, 0x00, 0x02], 2)]
fn big_endian_binary(#[case] bytes: &[u8], #[case] expected: i128) {
    let got = scalar("01 R. 05 CNT PIC S9(9) COMP.", bytes, &["R", "CNT"]);
    assert_eq!(got, Scalar::Integer(expected));
}

#[test]
fn native_binary_matches_host_order() {
    let bytes = 513i32.to_ne_bytes();
    let mut record = Vec::from(bytes);
    record.resize(4, 0);
    let got = scalar("01 R. 05 CNT PIC S9(9) COMP-5.", &record, &["R", "CNT"]);
    assert_eq!(got, Scalar::Integer(513));
}

#[test]
fn unsigned_packed_has_no_sign_nibble() {
    let got = scalar("01 R. 05 N PIC 9(4) COMP-6.", &[0x98, 0x76], &["R", "N"]);
    assert_eq!(got, Scalar::Integer(9876));
}

#[test]
fn floats_are_ieee_big_endian() {
    let mut record = Vec::new();
    record.extend(2.5f32.to_be_bytes());
    record.extend((-0.125f64).to_be_bytes());

    let value = decode_field("01 R. 05 S COMP-1. 05 D COMP-2.", &record);
    let r = value.get("R").unwrap();
    assert_eq!(r.get("S").unwrap().as_scalar(), Some(&Scalar::Float(2.5)));
    assert_eq!(r.get("D").unwrap().as_scalar(), Some(&Scalar::Float(-0.125)));
}

#[rstest]
// '+' is 0x4E and '-' is 0x60 in CP037.
#[case(&[0x4E, 0xF1, 0xF2, 0xF3], 123)]
#[case(&[0x60, 0xF1, 0xF2, 0xF3], -123)]
fn sign_separate_leading(#[case] bytes: &[u8], #[case] expected: i128) {
    let got = scalar(
        "01 R. 05 N PIC S9(3) SIGN IS LEADING SEPARATE CHARACTER.",
        bytes,
        &["R", "N"],
    );
    assert_eq!(got, Scalar::Integer(expected));
}

#[test]
fn justified_right_strips_trailing_spaces() {
    let got = scalar("01 R. 05 T PIC X(4) JUSTIFIED RIGHT.", &[0xC1, 0xC2, 0x40, 0x40], &["R", "T"]);
    assert_eq!(got, Scalar::Text("AB".to_owned()));
}
