use std::fs;
use std::path::PathBuf;

use cobolt_cli::config::{ErrorPolicy, OutputFormat, RunConfig, ValidationConfig};
use cobolt_cli::run::run;
use cobolt_cli::writers::flatten_rendered;
use cobolt_codec::{FramingErrorKind, RecordDecoder, RecordReader};
use cobolt_core::{default_codepage, CancelFlag, Decimal, Scalar};
use cobolt_testsuite::{customer_record, ebcdic, layout, CUSTOMER_COPYBOOK};

#[test]
fn redefines_overlay_produces_both_views() {
    let layout = layout(
        "01 R.
           05 A PIC X(4).
           05 B REDEFINES A PIC 9(4).",
    );
    let decoder = RecordDecoder::new(&layout, default_codepage());

    let value = decoder.decode(&[0xF0, 0xF1, 0xF2, 0xF3]).unwrap();
    let r = value.get("R").unwrap();
    assert_eq!(r.get("A").unwrap().as_scalar(), Some(&Scalar::Text("0123".to_owned())));
    assert_eq!(r.get("B").unwrap().as_scalar(), Some(&Scalar::Integer(123)));
}

#[test]
fn occurs_sequence_in_order() {
    let layout = layout("01 R. 05 ITEM OCCURS 3 TIMES PIC 9(2).");
    let decoder = RecordDecoder::new(&layout, default_codepage());

    let value = decoder.decode(&[0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6]).unwrap();
    let items = value.get("R").unwrap().get("ITEM").unwrap();
    let got: Vec<i128> = (0..3)
        .map(|i| match items.at(i).unwrap().as_scalar().unwrap() {
            Scalar::Integer(n) => *n,
            other => panic!("unexpected scalar {other:?}"),
        })
        .collect();
    assert_eq!(got, [12, 34, 56]);
}

#[test]
fn whole_customer_records_stream_through() {
    let layout = layout(CUSTOMER_COPYBOOK);
    let decoder = RecordDecoder::new(&layout, default_codepage());

    // +123.45 packed as 0012345C over 4 bytes.
    let balance = [0x00, 0x12, 0x34, 0x5C];
    let mut input = customer_record("000001", "ADA LOVELA", &balance, 'A', "010203", 7);
    input.extend(customer_record("000002", "ALAN TURIN", &balance, 'C', "990001", -7));

    let mut reader = RecordReader::new(input.as_slice(), layout.record_len());
    let mut decoded = Vec::new();
    while let Some(record) = reader.read_record().unwrap() {
        // Each decoded record consumes exactly one record's worth of bytes.
        assert_eq!(record.len(), layout.record_len());
        decoded.push(decoder.decode(record).unwrap());
    }

    assert_eq!(decoded.len(), 2);

    let first = decoded[0].get("CUSTOMER-RECORD").unwrap();
    assert_eq!(first.get("CUST-ID").unwrap().as_scalar(), Some(&Scalar::Integer(1)));
    assert_eq!(
        first.get("CUST-BALANCE").unwrap().as_scalar(),
        Some(&Scalar::Decimal(Decimal::new(12345, 2)))
    );
    assert_eq!(
        first.get("CUST-FLAGS").unwrap().get("CUST-STATUS").unwrap().as_scalar(),
        Some(&Scalar::Text("A".to_owned()))
    );

    let second = decoded[1].get("CUSTOMER-RECORD").unwrap();
    assert_eq!(second.get("CUST-COUNT").unwrap().as_scalar(), Some(&Scalar::Integer(-7)));
    let scores = second.get("CUST-SCORES").unwrap();
    assert_eq!(scores.at(0).unwrap().as_scalar(), Some(&Scalar::Integer(99)));
}

#[test]
fn trailing_partial_record_fails_the_stream() {
    let layout = layout(CUSTOMER_COPYBOOK);
    let input = vec![0x40; layout.record_len() + 5];
    let mut reader = RecordReader::new(input.as_slice(), layout.record_len());

    assert!(reader.read_record().unwrap().is_some());
    let err = reader.read_record().unwrap_err();
    assert!(matches!(err.kind(), FramingErrorKind::TrailingPartialRecord { received: 5, .. }));
}

#[test]
fn flat_rendering_concatenates_leaves() {
    let layout = layout("01 R. 05 N PIC 9(3). 05 T PIC X(2).");
    let decoder = RecordDecoder::new(&layout, default_codepage());
    let value = decoder.decode(&ebcdic("042OK")).unwrap();

    let rendered: Vec<String> = flatten_rendered(&layout, &value).into_iter().map(|(_, v)| v).collect();
    assert_eq!(rendered.join(""), "42OK");
}

struct TempRun {
    dir: PathBuf,
}

impl TempRun {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("cobolt-testsuite-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

impl Drop for TempRun {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn base_config(tmp: &TempRun, output: &str) -> RunConfig {
    RunConfig {
        copybook: tmp.path("layout.cpy"),
        input: tmp.path("input.bin"),
        output: tmp.path(output),
        format: OutputFormat::Csv,
        codepage: default_codepage(),
        policy: ErrorPolicy::Abort,
        buffer_size: 4096,
        workers: 1,
        validation: None,
        log_file: None,
        summary_file: None,
    }
}

#[test]
fn end_to_end_run_with_validation() {
    let tmp = TempRun::new("e2e");

    fs::write(tmp.path("layout.cpy"), CUSTOMER_COPYBOOK).unwrap();

    let balance = [0x00, 0x12, 0x34, 0x5C];
    let mut input = customer_record("000001", "ADA LOVELA", &balance, 'A', "010203", 7);
    input.extend(customer_record("000002", "ALAN TURIN", &balance, 'C', "990001", -7));
    fs::write(tmp.path("input.bin"), &input).unwrap();

    let mut config = base_config(&tmp, "out.csv");
    config.validation = Some(ValidationConfig {
        tolerance: 0.01,
        report: Some(tmp.path("report.json")),
        max_details: 100,
        max_mismatches: 0,
    });
    config.summary_file = Some(tmp.path("summary.txt"));

    let summary = run(&config, &CancelFlag::new()).unwrap();
    assert_eq!(summary.records, 2);
    assert_eq!(summary.skipped, 0);

    let outcome = summary.validation.unwrap();
    assert_eq!(outcome.total_records, 2);
    assert_eq!(outcome.mismatches, 0);

    let csv = fs::read_to_string(tmp.path("out.csv")).unwrap();
    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("CUSTOMER-RECORD.CUST-ID,"));
    assert!(header.contains("CUSTOMER-RECORD.CUST-SCORES[2]"));
    assert_eq!(lines.clone().count(), 2);
    assert!(lines.next().unwrap().contains("123.45"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(tmp.path("report.json")).unwrap()).unwrap();
    assert_eq!(report["summary"]["mismatches"], 0);

    let summary_text = fs::read_to_string(tmp.path("summary.txt")).unwrap();
    assert!(summary_text.contains("Records processed: 2"));
}

#[test]
fn skip_policy_continues_past_bad_records() {
    let tmp = TempRun::new("skip");

    fs::write(tmp.path("layout.cpy"), "01 R. 05 QTY PIC S9(3) COMP-3.").unwrap();
    // One good packed record, one with a bad digit nibble, one good.
    fs::write(tmp.path("input.bin"), [0x12, 0x3C, 0xAB, 0x1C, 0x45, 0x6D]).unwrap();

    let mut config = base_config(&tmp, "out.flat");
    config.format = OutputFormat::Flat;
    config.policy = ErrorPolicy::Skip;

    let summary = run(&config, &CancelFlag::new()).unwrap();
    assert_eq!(summary.records, 2);
    assert_eq!(summary.skipped, 1);

    let flat = fs::read_to_string(tmp.path("out.flat")).unwrap();
    assert_eq!(flat, "123\n-456\n");
}

#[test]
fn abort_policy_fails_the_run() {
    let tmp = TempRun::new("abort");

    fs::write(tmp.path("layout.cpy"), "01 R. 05 QTY PIC S9(3) COMP-3.").unwrap();
    fs::write(tmp.path("input.bin"), [0xAB, 0x1C]).unwrap();

    let mut config = base_config(&tmp, "out.flat");
    config.format = OutputFormat::Flat;

    assert!(run(&config, &CancelFlag::new()).is_err());
}

#[test]
fn parallel_workers_preserve_output_order() {
    let tmp = TempRun::new("parallel");

    fs::write(tmp.path("layout.cpy"), "01 R. 05 N PIC 9(4).").unwrap();

    let mut input = Vec::new();
    for i in 0..1000 {
        input.extend(ebcdic(&format!("{i:04}")));
    }
    fs::write(tmp.path("input.bin"), &input).unwrap();

    let mut config = base_config(&tmp, "out.flat");
    config.format = OutputFormat::Flat;
    config.workers = 4;

    let summary = run(&config, &CancelFlag::new()).unwrap();
    assert_eq!(summary.records, 1000);

    let flat = fs::read_to_string(tmp.path("out.flat")).unwrap();
    let expected: String = (0..1000).map(|i| format!("{i}\n")).collect();
    assert_eq!(flat, expected);
}

#[test]
fn json_output_is_a_structured_document() {
    let tmp = TempRun::new("json");

    fs::write(tmp.path("layout.cpy"), "01 R. 05 N PIC 9(2). 05 T PIC X(2).").unwrap();
    fs::write(tmp.path("input.bin"), ebcdic("07AB42CD")).unwrap();

    let mut config = base_config(&tmp, "out.json");
    config.format = OutputFormat::Json;

    run(&config, &CancelFlag::new()).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(tmp.path("out.json")).unwrap()).unwrap();
    assert_eq!(parsed[0]["R"]["N"], serde_json::json!(7));
    assert_eq!(parsed[1]["R"]["T"], serde_json::json!("CD"));
}
