use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use biscuit_core::{Config, MatchReport, PacketId};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use serde::Serialize;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("BISCUIT_BUILD_COMMIT"),
    ", ",
    env!("BISCUIT_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "biscuit")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Schema-less decoder and identity matcher for protobuf-style packets.",
    long_about = None,
    after_help = "Examples:\n  biscuit decode packet.bin --stdout --pretty\n  biscuit decode packet.hex --hex --packet-id 5 -c hints.toml -o decoded.json\n  biscuit match capture.jsonl -c hints.toml -o report.json"
)]
struct Cli {
    /// Log matcher decisions (overrides RUST_LOG default)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a single buffer and print every field it contains.
    Decode {
        /// Path to the buffer (raw bytes unless --hex or --base64)
        input: PathBuf,

        /// Input holds hex text
        #[arg(long, conflicts_with = "base64")]
        hex: bool,

        /// Input holds standard base64 text
        #[arg(long)]
        base64: bool,

        /// Decode with the schema known for this packet ID
        #[arg(long)]
        packet_id: Option<PacketId>,

        /// Matcher configuration (TOML)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run a JSON-lines capture through the matcher and report what was identified.
    #[command(
        after_help = "Capture format, one packet per line:\n  {\"id\": 5, \"header\": \"<base64>\", \"data\": \"<base64>\", \"ts\": 1.5}"
    )]
    Match {
        /// Path to a .jsonl capture
        input: PathBuf,

        /// Matcher configuration (TOML)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Exit with a non-zero code if any packet ID stays unidentified
        #[arg(long)]
        strict: bool,

        /// List unidentified packet IDs after matching
        #[arg(long)]
        list_unidentified: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputEncoding {
    Raw,
    Hex,
    Base64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Decode {
            input,
            hex,
            base64,
            packet_id,
            config,
            output,
        } => {
            let encoding = match (hex, base64) {
                (true, _) => InputEncoding::Hex,
                (_, true) => InputEncoding::Base64,
                _ => InputEncoding::Raw,
            };
            cmd_decode(input, encoding, packet_id, config, output)
        }
        Commands::Match {
            input,
            config,
            strict,
            list_unidentified,
            output,
        } => cmd_match(input, config, strict, list_unidentified, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_decode(
    input: PathBuf,
    encoding: InputEncoding,
    packet_id: Option<PacketId>,
    config: Option<PathBuf>,
    output: OutputArgs,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input, "a packet file")?;
    validate_input_file(&resolved_input, "a packet file")?;
    let report_path = output_target(&output, &resolved_input)?;

    let raw = fs::read(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;
    let bytes = decode_input(&raw, encoding)?;
    let config = load_config(config.as_deref())?;
    let matcher = biscuit_core::matcher_from_config(&config).context("matcher setup failed")?;

    let rep = biscuit_core::decode_to_report(
        &resolved_input.display().to_string(),
        raw.len() as u64,
        &bytes,
        packet_id,
        &matcher,
    )
    .context("decoding failed")?;
    let json = serialize_report(&rep, output.pretty, output.compact)?;
    emit(&json, report_path.as_deref(), output.quiet)
}

fn cmd_match(
    input: PathBuf,
    config: Option<PathBuf>,
    strict: bool,
    list_unidentified: bool,
    output: OutputArgs,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input, "a .jsonl capture")?;
    validate_input_file(&resolved_input, "a .jsonl capture")?;
    let report_path = output_target(&output, &resolved_input)?;
    let config = load_config(config.as_deref())?;

    let rep = biscuit_core::analyze_capture_file(&resolved_input, &config)
        .context("capture analysis failed")?;
    let json = serialize_report(&rep, output.pretty, output.compact)?;
    emit(&json, report_path.as_deref(), output.quiet)?;

    if list_unidentified && !output.quiet {
        print_unidentified(&rep);
    }
    if strict && has_unidentified(&rep) {
        return Err(CliError::new(
            "unidentified packets in capture",
            Some("use --list-unidentified to inspect, or add hints to the config".to_string()),
        ));
    }
    Ok(())
}

fn decode_input(raw: &[u8], encoding: InputEncoding) -> Result<Vec<u8>, CliError> {
    let text = || -> Result<String, CliError> {
        let text = std::str::from_utf8(raw).map_err(|_| {
            CliError::new(
                "input is not text",
                Some("drop --hex/--base64 to decode raw bytes".to_string()),
            )
        })?;
        Ok(text.split_whitespace().collect())
    };
    match encoding {
        InputEncoding::Raw => Ok(raw.to_vec()),
        InputEncoding::Hex => hex::decode(text()?).map_err(|err| {
            CliError::new(
                format!("invalid hex input: {}", err),
                Some("expected pairs of hex digits, whitespace allowed".to_string()),
            )
        }),
        InputEncoding::Base64 => STANDARD.decode(text()?).map_err(|err| {
            CliError::new(
                format!("invalid base64 input: {}", err),
                Some("expected standard padded base64".to_string()),
            )
        }),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, CliError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let path = resolve_input_path(path, "a .toml config")?;
    let config = Config::load(&path).map_err(|err| {
        CliError::new(
            format!("invalid config {}: {}", path.display(), err),
            Some("see `biscuit --help` for the config layout".to_string()),
        )
    })?;
    log::info!(
        "loaded config {} ({} hint(s))",
        path.display(),
        config.hints.len()
    );
    Ok(config)
}

/// Report path to write to, or `None` for stdout.
fn output_target(output: &OutputArgs, input: &Path) -> Result<Option<PathBuf>, CliError> {
    if output.stdout {
        return Ok(None);
    }
    let report_path = output.report.clone().ok_or_else(|| {
        CliError::new(
            "missing output path",
            Some("use -o/--report or --stdout".to_string()),
        )
    })?;

    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let report_dir = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent).ok(),
        _ => fs::canonicalize(".").ok(),
    };
    if let (Some(report_dir), Some(file_name)) = (report_dir, report_path.file_name()) {
        if report_dir.join(file_name) == input_abs {
            return Err(CliError::new(
                format!(
                    "report path must differ from input: {}",
                    report_path.display()
                ),
                Some("choose a different output path".to_string()),
            ));
        }
    }
    Ok(Some(report_path))
}

fn emit(json: &str, report: Option<&Path>, quiet: bool) -> Result<(), CliError> {
    let Some(report) = report else {
        print!("{}", json);
        return Ok(());
    };

    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    if !quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    Ok(())
}

fn serialize_report<T: Serialize>(rep: &T, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn has_unidentified(rep: &MatchReport) -> bool {
    rep.packets.iter().any(|packet| !packet.identified)
}

fn print_unidentified(rep: &MatchReport) {
    eprintln!("Unidentified packets:");
    for packet in rep.packets.iter().filter(|packet| !packet.identified) {
        eprintln!("  {} ({})", packet.id, packet.count);
    }
}

fn validate_input_file(input: &Path, expected: &str) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some(format!("expected {}", expected)),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some(format!("expected {}", expected)),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path, expected: &str) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some(format!("check the path or quote the pattern; expected {}", expected)),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
