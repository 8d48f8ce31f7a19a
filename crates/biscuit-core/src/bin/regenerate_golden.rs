//! Rewrites `expected_report.json` for every golden case under
//! `tests/golden`, or only for the case names given as arguments.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use biscuit_core::{AnalysisError, Config, ConfigError, analyze_capture_file};
use thiserror::Error;

#[derive(Debug, Error)]
enum RegenerateError {
    #[error("cannot list {}: {source}", path.display())]
    List { path: PathBuf, source: std::io::Error },
    #[error("no golden case named '{0}'")]
    UnknownCase(String),
    #[error("case {case}: {source}")]
    Config { case: String, source: ConfigError },
    #[error("case {case}: {source}")]
    Analysis { case: String, source: AnalysisError },
    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
}

fn main() -> ExitCode {
    let only: Vec<String> = std::env::args().skip(1).collect();
    match run(Path::new("tests/golden"), &only) {
        Ok(count) => {
            eprintln!("regenerated {count} golden report(s)");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(root: &Path, only: &[String]) -> Result<usize, RegenerateError> {
    let list_err = |source| RegenerateError::List {
        path: root.to_path_buf(),
        source,
    };
    let mut cases = Vec::new();
    for entry in fs::read_dir(root).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if path.join("input.jsonl").is_file() {
            cases.push(path);
        }
    }
    cases.sort();

    if let Some(missing) = only
        .iter()
        .find(|name| !cases.iter().any(|case| case.ends_with(name.as_str())))
    {
        return Err(RegenerateError::UnknownCase(missing.clone()));
    }

    let mut count = 0;
    for case in cases {
        let name = case
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if only.is_empty() || only.contains(&name) {
            regenerate_case(&case, &name)?;
            count += 1;
        }
    }
    Ok(count)
}

fn regenerate_case(case: &Path, name: &str) -> Result<(), RegenerateError> {
    let config_path = case.join("config.toml");
    let config = if config_path.is_file() {
        Config::load(&config_path).map_err(|source| RegenerateError::Config {
            case: name.to_string(),
            source,
        })?
    } else {
        Config::default()
    };

    let report = analyze_capture_file(&case.join("input.jsonl"), &config).map_err(|source| {
        RegenerateError::Analysis {
            case: name.to_string(),
            source,
        }
    })?;

    let path = case.join("expected_report.json");
    let write_err = |source| RegenerateError::Write {
        path: path.clone(),
        source,
    };
    let mut out = BufWriter::new(File::create(&path).map_err(write_err)?);
    serde_json::to_writer_pretty(&mut out, &report)
        .map_err(|err| write_err(std::io::Error::other(err)))?;
    out.write_all(b"\n").map_err(write_err)?;
    out.flush().map_err(write_err)
}
