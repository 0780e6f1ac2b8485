//! The conversion run: copybook → layout → streamed decode → output,
//! with optional worker-pool decoding and dual-pass validation.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;
use cobolt_codec::{RecordDecoder, RecordReader};
use cobolt_core::{format_hex_dump, CancelFlag, DecodeError, Value};
use cobolt_validate::{write_report, DualPassValidator, ValidationOutcome};
use tracing::{debug, info, warn};

use crate::config::{ErrorPolicy, RunConfig};
use crate::writers::OutputWriter;

const PROGRESS_INTERVAL: u64 = 10_000;
/// Records pulled per worker before the pool synchronizes.
const BATCH_PER_WORKER: usize = 256;

/// What a finished run did.
#[derive(Debug)]
pub struct RunSummary {
    pub records: u64,
    pub skipped: u64,
    pub validation: Option<ValidationOutcome>,
}

/// Executes the whole run. Returns an error on schema, layout, framing, or
/// abort-policy decode failures, and on a validation threshold breach.
pub fn run(config: &RunConfig, cancel: &CancelFlag) -> anyhow::Result<RunSummary> {
    info!(copybook = %config.copybook.display(), "parsing copybook");
    let copybook_text = std::fs::read_to_string(&config.copybook)
        .with_context(|| format!("couldn't read copybook {}", config.copybook.display()))?;
    let layout = cobolt_copybook::parse(&copybook_text)
        .context("copybook parsing")?
        .resolve()
        .context("record layout resolution")?;
    info!(record_len = layout.record_len(), "record layout resolved");

    let collect_first_pass = config.validation.is_some();
    let mut first_pass: Vec<Option<Value>> = Vec::new();

    let input = File::open(&config.input)
        .with_context(|| format!("couldn't open input file {}", config.input.display()))?;
    let mut reader = RecordReader::new(BufReader::with_capacity(config.buffer_size, input), layout.record_len());

    let mut writer = OutputWriter::create(&config.output, config.format, &layout)?;
    let decoder = RecordDecoder::new(&layout, config.codepage);

    info!(workers = config.workers, "starting conversion");
    let mut records: u64 = 0;
    let mut skipped: u64 = 0;

    if config.workers <= 1 {
        while let Some(record) = next_record(&mut reader, cancel)? {
            let index = records + skipped;
            let decoded = decoder.decode(record);
            handle_decoded(
                config,
                decoded,
                record,
                index,
                &mut writer,
                collect_first_pass.then_some(&mut first_pass),
                &mut records,
                &mut skipped,
            )?;
        }
    } else {
        let batch_size = config.workers * BATCH_PER_WORKER;
        loop {
            let batch = read_batch(&mut reader, batch_size, cancel)?;
            if batch.is_empty() {
                break;
            }

            let decoded = decode_batch_parallel(&decoder, &batch, config.workers);

            for (record, result) in batch.iter().zip(decoded) {
                let index = records + skipped;
                handle_decoded(
                    config,
                    result,
                    record,
                    index,
                    &mut writer,
                    collect_first_pass.then_some(&mut first_pass),
                    &mut records,
                    &mut skipped,
                )?;
            }
        }
    }

    writer.finish()?;
    info!(records, skipped, "conversion finished");

    let validation = match &config.validation {
        Some(validation_config) => {
            info!(tolerance = validation_config.tolerance, "starting dual-pass validation");

            let input = File::open(&config.input)
                .with_context(|| format!("couldn't reopen input file {}", config.input.display()))?;
            let validator = DualPassValidator::new(&layout, config.codepage)
                .with_tolerance(validation_config.tolerance)
                .with_max_details(validation_config.max_details);
            let outcome = validator
                .validate(BufReader::with_capacity(config.buffer_size, input), &first_pass, cancel)
                .context("dual-pass validation")?;

            info!(
                records = outcome.total_records,
                fields = outcome.total_fields,
                mismatches = outcome.mismatches,
                "validation finished"
            );

            if let Some(report_path) = &validation_config.report {
                write_report(&outcome, report_path)
                    .with_context(|| format!("couldn't write report {}", report_path.display()))?;
                info!(report = %report_path.display(), "validation report written");
            }

            Some(outcome)
        }
        None => None,
    };

    let summary = RunSummary {
        records,
        skipped,
        validation,
    };

    log_summary(config, &summary);
    if let Some(path) = &config.summary_file {
        write_summary_file(path, config, &summary)
            .with_context(|| format!("couldn't write summary file {}", path.display()))?;
    }

    if let (Some(validation_config), Some(outcome)) = (&config.validation, &summary.validation) {
        if outcome.mismatches > validation_config.max_mismatches {
            anyhow::bail!(
                "validation found {} mismatches (limit {})",
                outcome.mismatches,
                validation_config.max_mismatches
            );
        }
    }

    Ok(summary)
}

/// Cancellation is checked before every record read.
fn next_record<'r, R: std::io::Read>(
    reader: &'r mut RecordReader<R>,
    cancel: &CancelFlag,
) -> anyhow::Result<Option<&'r [u8]>> {
    if cancel.is_cancelled() {
        anyhow::bail!("run cancelled");
    }
    reader.read_record().context("record framing")
}

fn read_batch<R: std::io::Read>(
    reader: &mut RecordReader<R>,
    batch_size: usize,
    cancel: &CancelFlag,
) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut batch = Vec::with_capacity(batch_size);
    while batch.len() < batch_size {
        match next_record(reader, cancel)? {
            Some(record) => batch.push(record.to_vec()),
            None => break,
        }
    }
    Ok(batch)
}

/// Decodes a batch with scoped worker threads, partitioned by record index.
/// The resolved layout is shared by reference; results come back in input
/// order.
fn decode_batch_parallel(
    decoder: &RecordDecoder<'_>,
    batch: &[Vec<u8>],
    workers: usize,
) -> Vec<Result<Value, DecodeError>> {
    let chunk_size = batch.len().div_ceil(workers);
    let mut results = Vec::with_capacity(batch.len());

    std::thread::scope(|scope| {
        let handles: Vec<_> = batch
            .chunks(chunk_size)
            .map(|chunk| {
                let decoder = *decoder;
                scope.spawn(move || chunk.iter().map(|record| decoder.decode(record)).collect::<Vec<_>>())
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(chunk_results) => results.extend(chunk_results),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    });

    results
}

#[allow(clippy::too_many_arguments)]
fn handle_decoded(
    config: &RunConfig,
    decoded: Result<Value, DecodeError>,
    record: &[u8],
    index: u64,
    writer: &mut OutputWriter<'_>,
    first_pass: Option<&mut Vec<Option<Value>>>,
    records: &mut u64,
    skipped: &mut u64,
) -> anyhow::Result<()> {
    match decoded {
        Ok(value) => {
            writer.write_record(&value)?;
            if let Some(first_pass) = first_pass {
                first_pass.push(Some(value));
            }
            *records += 1;
            if *records % PROGRESS_INTERVAL == 0 {
                info!(records = *records, "progress");
            }
            Ok(())
        }
        Err(e) => {
            debug!(record_index = index, "record bytes:\n{}", format_hex_dump(record, 16));
            match config.policy {
                ErrorPolicy::Abort => {
                    Err(anyhow::Error::new(e).context(format!("failed to decode record {index}")))
                }
                ErrorPolicy::Skip => {
                    warn!(record_index = index, error = %e.report(), "skipping undecodable record");
                    if let Some(first_pass) = first_pass {
                        first_pass.push(None);
                    }
                    *skipped += 1;
                    Ok(())
                }
            }
        }
    }
}

fn log_summary(config: &RunConfig, summary: &RunSummary) {
    info!("conversion summary:");
    info!("  input file: {}", config.input.display());
    info!("  copybook file: {}", config.copybook.display());
    info!("  output file: {}", config.output.display());
    info!("  records processed: {}", summary.records);
    if summary.skipped > 0 {
        info!("  records skipped: {}", summary.skipped);
    }
    if let Some(outcome) = &summary.validation {
        info!("validation summary:");
        info!("  fields compared: {}", outcome.total_fields);
        info!("  mismatches: {}", outcome.mismatches);
        info!("  mismatch rate: {:.2}%", outcome.mismatch_rate() * 100.0);
    }
    info!("performance:");
    info!("  workers: {}", config.workers);
    info!("  buffer size: {}", config.buffer_size);
}

fn write_summary_file(path: &Path, config: &RunConfig, summary: &RunSummary) -> std::io::Result<()> {
    use std::fmt::Write as _;

    let mut text = String::new();
    let _ = writeln!(text, "Record Conversion Summary");
    let _ = writeln!(text, "=========================");
    let _ = writeln!(text);
    let _ = writeln!(text, "Files:");
    let _ = writeln!(text, "  Input file: {}", config.input.display());
    let _ = writeln!(text, "  Copybook file: {}", config.copybook.display());
    let _ = writeln!(text, "  Output file: {}", config.output.display());
    if let Some(validation) = &config.validation {
        if let Some(report) = &validation.report {
            let _ = writeln!(text, "  Validation report: {}", report.display());
        }
    }
    let _ = writeln!(text);
    let _ = writeln!(text, "Processing:");
    let _ = writeln!(text, "  Records processed: {}", summary.records);
    let _ = writeln!(text, "  Records skipped: {}", summary.skipped);
    let _ = writeln!(text, "  Workers: {}", config.workers);
    let _ = writeln!(text, "  Buffer size: {} bytes", config.buffer_size);
    let _ = writeln!(text, "  Code page: {}", config.codepage.name());
    if let (Some(validation), Some(outcome)) = (&config.validation, &summary.validation) {
        let _ = writeln!(text);
        let _ = writeln!(text, "Validation:");
        let _ = writeln!(text, "  Tolerance: {}", validation.tolerance);
        let _ = writeln!(text, "  Records: {}", outcome.total_records);
        let _ = writeln!(text, "  Fields: {}", outcome.total_fields);
        let _ = writeln!(text, "  Mismatches: {}", outcome.mismatches);
        let _ = writeln!(text, "  Mismatch rate: {:.2}%", outcome.mismatch_rate() * 100.0);
    }

    std::fs::write(path, text)
}
