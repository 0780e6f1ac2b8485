//! CLI arguments, optional JSON configuration file, and their merge into a
//! resolved run configuration. Explicit CLI flags override file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::clap_derive::ValueEnum;
use clap::Parser;
use cobolt_core::{lookup_codepage, CodePage};
use serde::Deserialize;

pub const DEFAULT_BUFFER_SIZE: usize = 8192;
pub const DEFAULT_TOLERANCE: f64 = 0.01;
pub const DEFAULT_MAX_REPORT_DETAILS: usize = 1000;

#[derive(Parser, Debug)]
#[command(
    name = "cobolt",
    version,
    about = "Convert fixed-length EBCDIC record files to structured output using a COBOL copybook"
)]
pub struct Cli {
    /// Path to the COBOL copybook describing the record layout.
    #[arg(long)]
    pub copybook: Option<PathBuf>,

    /// Path to the input file of fixed-length EBCDIC records.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Path to the output file.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output format; inferred from the output extension when omitted.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// EBCDIC code page of the input (e.g. cp037, cp500, cp1140).
    #[arg(long)]
    pub codepage: Option<String>,

    /// Path to a JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Re-decode the input and cross-check the conversion.
    #[arg(long)]
    pub validate: bool,

    /// Numeric tolerance for float comparisons during validation.
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Path to the validation report; format chosen by extension
    /// (.csv / .html / .json / anything else is plain text).
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Upper bound on mismatch detail rows kept in the report.
    #[arg(long)]
    pub max_report_details: Option<usize>,

    /// Fail the run when validation finds more than this many mismatches.
    #[arg(long)]
    pub max_mismatches: Option<u64>,

    /// I/O buffer size in bytes.
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Worker threads for record decoding.
    #[arg(long)]
    pub workers: Option<usize>,

    /// What to do when a record fails to decode.
    #[arg(long, value_enum)]
    pub on_decode_error: Option<ErrorPolicy>,

    /// Append logs to this file instead of stderr only.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Write a plain-text run summary to this file.
    #[arg(long)]
    pub summary_file: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Concatenated textual form, one line per record.
    Flat,
    /// Tabular rows with a field-path header.
    Csv,
    /// A JSON array of structured records.
    Json,
}

impl OutputFormat {
    fn infer(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Self::Csv,
            Some("json") => Self::Json,
            _ => Self::Flat,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the run on the first record that fails to decode.
    Abort,
    /// Log, count, and continue with the next record.
    Skip,
}

/// JSON configuration file, mirroring the CLI surface.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    input: InputSection,
    copybook: CopybookSection,
    output: OutputSection,
    validation: ValidationSection,
    performance: PerformanceSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct InputSection {
    file: Option<PathBuf>,
    codepage: Option<String>,
    on_decode_error: Option<ErrorPolicy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CopybookSection {
    file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OutputSection {
    file: Option<PathBuf>,
    format: Option<OutputFormat>,
    log_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ValidationSection {
    enabled: bool,
    tolerance: Option<f64>,
    report_file: Option<PathBuf>,
    max_details: Option<usize>,
    max_mismatches: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PerformanceSection {
    workers: Option<usize>,
    buffer_size: Option<usize>,
}

/// Fully resolved run configuration.
#[derive(Debug)]
pub struct RunConfig {
    pub copybook: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub codepage: &'static CodePage,
    pub policy: ErrorPolicy,
    pub buffer_size: usize,
    pub workers: usize,
    pub validation: Option<ValidationConfig>,
    pub log_file: Option<PathBuf>,
    pub summary_file: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ValidationConfig {
    pub tolerance: f64,
    pub report: Option<PathBuf>,
    pub max_details: usize,
    pub max_mismatches: u64,
}

impl RunConfig {
    /// Merges CLI arguments over the optional configuration file.
    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("couldn't read config file {}", path.display()))?;
                serde_json::from_str::<FileConfig>(&text)
                    .with_context(|| format!("couldn't parse config file {}", path.display()))?
            }
            None => FileConfig::default(),
        };

        let copybook = cli
            .copybook
            .or(file.copybook.file)
            .context("a copybook path is required (--copybook)")?;
        let input = cli
            .input
            .or(file.input.file)
            .context("an input path is required (--input)")?;
        let output = cli
            .output
            .or(file.output.file)
            .context("an output path is required (--output)")?;

        let format = cli
            .format
            .or(file.output.format)
            .unwrap_or_else(|| OutputFormat::infer(&output));

        let codepage_name = cli
            .codepage
            .or(file.input.codepage)
            .unwrap_or_else(|| cobolt_core::default_codepage().name().to_owned());
        let codepage = lookup_codepage(&codepage_name)
            .with_context(|| format!("unknown code page `{codepage_name}`"))?;

        let validation = if cli.validate || file.validation.enabled {
            Some(ValidationConfig {
                tolerance: cli
                    .tolerance
                    .or(file.validation.tolerance)
                    .unwrap_or(DEFAULT_TOLERANCE),
                report: cli.report.or(file.validation.report_file),
                max_details: cli
                    .max_report_details
                    .or(file.validation.max_details)
                    .unwrap_or(DEFAULT_MAX_REPORT_DETAILS),
                max_mismatches: cli.max_mismatches.or(file.validation.max_mismatches).unwrap_or(0),
            })
        } else {
            None
        };

        let workers = cli.workers.or(file.performance.workers).unwrap_or(1).max(1);
        let buffer_size = cli
            .buffer_size
            .or(file.performance.buffer_size)
            .unwrap_or(DEFAULT_BUFFER_SIZE)
            .max(1);

        Ok(Self {
            copybook,
            input,
            output,
            format,
            codepage,
            policy: cli.on_decode_error.or(file.input.on_decode_error).unwrap_or(ErrorPolicy::Abort),
            buffer_size,
            workers,
            validation,
            log_file: cli.log_file.or(file.output.log_file),
            summary_file: cli.summary_file.or(file.output.summary_file),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli::parse_from(["cobolt"])
    }

    #[test]
    fn requires_the_three_paths() {
        assert!(RunConfig::resolve(base_cli()).is_err());
    }

    #[test]
    fn format_inferred_from_extension() {
        let mut cli = base_cli();
        cli.copybook = Some("book.cpy".into());
        cli.input = Some("data.bin".into());
        cli.output = Some("out.json".into());
        let config = RunConfig::resolve(cli).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.codepage.name(), "cp037");
        assert_eq!(config.policy, ErrorPolicy::Abort);
        assert!(config.validation.is_none());
    }

    #[test]
    fn explicit_format_wins_over_extension() {
        let mut cli = base_cli();
        cli.copybook = Some("book.cpy".into());
        cli.input = Some("data.bin".into());
        cli.output = Some("out.json".into());
        cli.format = Some(OutputFormat::Flat);
        let config = RunConfig::resolve(cli).unwrap();
        assert_eq!(config.format, OutputFormat::Flat);
    }

    #[test]
    fn unknown_codepage_is_rejected() {
        let mut cli = base_cli();
        cli.copybook = Some("book.cpy".into());
        cli.input = Some("data.bin".into());
        cli.output = Some("out.txt".into());
        cli.codepage = Some("cp9999".to_owned());
        assert!(RunConfig::resolve(cli).is_err());
    }

    #[test]
    fn validation_defaults() {
        let mut cli = base_cli();
        cli.copybook = Some("book.cpy".into());
        cli.input = Some("data.bin".into());
        cli.output = Some("out.txt".into());
        cli.validate = true;
        let config = RunConfig::resolve(cli).unwrap();
        let validation = config.validation.unwrap();
        assert!((validation.tolerance - DEFAULT_TOLERANCE).abs() < f64::EPSILON);
        assert_eq!(validation.max_mismatches, 0);
        assert_eq!(validation.max_details, DEFAULT_MAX_REPORT_DETAILS);
    }

    #[test]
    fn file_config_parses() {
        let text = r#"{
            "input": {"file": "data.bin", "codepage": "cp500"},
            "copybook": {"file": "book.cpy"},
            "output": {"file": "out.csv"},
            "validation": {"enabled": true, "tolerance": 0.001},
            "performance": {"workers": 4}
        }"#;
        let parsed: FileConfig = serde_json::from_str(text).unwrap();
        assert_eq!(parsed.input.codepage.as_deref(), Some("cp500"));
        assert!(parsed.validation.enabled);
        assert_eq!(parsed.performance.workers, Some(4));
    }
}
