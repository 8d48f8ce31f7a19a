use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("biscuit"))
}

fn repo_root() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn golden_dir(name: &str) -> std::path::PathBuf {
    repo_root().join("tests").join("golden").join(name)
}

fn stdout_json(assert: &assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("decode").and(contains("match")));
    cmd().arg("match").arg("--help").assert().success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.bin");

    cmd()
        .arg("decode")
        .arg(missing)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn decode_raw_bytes_to_stdout() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("packet.bin");
    std::fs::write(&input, [0x08, 0x96, 0x01, 0x12, 0x02, b'o', b'k']).expect("write input");

    let assert = cmd()
        .arg("decode")
        .arg(&input)
        .arg("--stdout")
        .assert()
        .success();
    let report = stdout_json(&assert);
    assert_eq!(report["fields"][0]["id"], 1);
    assert_eq!(report["fields"][0]["kind"], "varint");
    assert_eq!(report["fields"][0]["value"], 150);
    assert_eq!(report["fields"][1]["value"], "ok");
}

#[test]
fn decode_hex_with_schema_from_config() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("packet.hex");
    std::fs::write(&input, "0a 02 6f 6b\n").expect("write input");
    let config = temp.path().join("hints.toml");
    std::fs::write(
        &config,
        "[[hints]]\nname = \"Blob\"\nid = 3\nfields = [{ field_name = \"payload\", field_type = \"bytes\", field_id = 1 }]\n",
    )
    .expect("write config");

    let assert = cmd()
        .arg("decode")
        .arg(&input)
        .arg("--hex")
        .arg("--packet-id")
        .arg("3")
        .arg("-c")
        .arg(&config)
        .arg("--stdout")
        .assert()
        .success();
    let report = stdout_json(&assert);
    assert_eq!(report["packet_name"], "Blob");
    assert_eq!(report["input"]["bytes"], 12);
    assert_eq!(report["fields"][0]["kind"], "bytes");
    assert_eq!(report["fields"][0]["value"], "6f6b");
}

#[test]
fn decode_base64_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("packet.b64");
    std::fs::write(&input, "CJYB\n").expect("write input");

    let assert = cmd()
        .arg("decode")
        .arg(&input)
        .arg("--base64")
        .arg("--stdout")
        .assert()
        .success();
    let report = stdout_json(&assert);
    assert_eq!(report["input"]["bytes"], 5);
    assert_eq!(report["fields"][0]["value"], 150);
}

#[test]
fn decode_failure_reports_cause() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("packet.bin");
    std::fs::write(&input, [0x08]).expect("write input");

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("--stdout")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("decoding failed").and(contains("malformed varint")));
}

#[test]
fn invalid_hex_shows_hint() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("packet.hex");
    std::fs::write(&input, "zz").expect("write input");

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("--hex")
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("invalid hex input").and(contains("hint:")));
}

#[test]
fn hex_and_base64_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("packet.hex");
    std::fs::write(&input, "0801").expect("write input");

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("--hex")
        .arg("--base64")
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn match_writes_report() {
    let temp = TempDir::new().expect("tempdir");
    let dir = golden_dir("shape_match");
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("match")
        .arg(dir.join("input.jsonl"))
        .arg("-c")
        .arg(dir.join("config.toml"))
        .arg("-o")
        .arg(&report)
        .assert()
        .success()
        .stderr(contains("OK: report written"));

    let json = std::fs::read_to_string(&report).expect("read report");
    let value: Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["capture_summary"]["packets_total"], 4);
    assert_eq!(value["packets"][2]["name"], "Move");
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let dir = golden_dir("shape_match");
    let report = temp.path().join("report.json");

    cmd()
        .arg("match")
        .arg(dir.join("input.jsonl"))
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let dir = golden_dir("shape_match");
    let report = temp.path().join("report.json");

    cmd()
        .arg("match")
        .arg(dir.join("input.jsonl"))
        .arg("-o")
        .arg(report)
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let dir = golden_dir("oneof_hint");
    let report = temp.path().join("report.json");

    cmd()
        .arg("match")
        .arg(dir.join("input.jsonl"))
        .arg("-c")
        .arg(dir.join("config.toml"))
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(predicates::str::contains("OK:").not());
}

#[test]
fn report_path_must_differ_from_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("packet.bin");
    std::fs::write(&input, [0x08, 0x01]).expect("write input");

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("report path must differ from input"));
}

#[test]
fn glob_input_resolves_single_match() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::write(temp.path().join("only.bin"), [0x08, 0x01]).expect("write input");
    let pattern = temp.path().join("*.bin");

    let assert = cmd()
        .arg("decode")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .success();
    assert_eq!(stdout_json(&assert)["fields"][0]["value"], 1);
}

#[test]
fn glob_input_rejects_multiple_matches() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::write(temp.path().join("a.bin"), [0x08, 0x01]).expect("write input");
    std::fs::write(temp.path().join("b.bin"), [0x08, 0x02]).expect("write input");
    let pattern = temp.path().join("*.bin");

    cmd()
        .arg("decode")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("multiple files match").and(contains("hint:")));
}

#[test]
fn list_unidentified_outputs_ids() {
    let dir = golden_dir("shape_match");

    cmd()
        .arg("match")
        .arg(dir.join("input.jsonl"))
        .arg("-c")
        .arg(dir.join("config.toml"))
        .arg("--stdout")
        .arg("--list-unidentified")
        .assert()
        .success()
        .stderr(contains("Unidentified packets:").and(contains("  7 (1)")));
}

#[test]
fn strict_fails_when_packets_unidentified() {
    let dir = golden_dir("shape_match");

    cmd()
        .arg("match")
        .arg(dir.join("input.jsonl"))
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .failure()
        .stderr(contains("unidentified packets in capture"));
}

#[test]
fn strict_passes_when_everything_identified() {
    let dir = golden_dir("oneof_hint");

    cmd()
        .arg("match")
        .arg(dir.join("input.jsonl"))
        .arg("-c")
        .arg(dir.join("config.toml"))
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .success();
}

#[test]
fn invalid_config_shows_error() {
    let temp = TempDir::new().expect("tempdir");
    let config = temp.path().join("bad.toml");
    std::fs::write(&config, "[matching]\nmin_score = 2.0\n").expect("write config");
    let dir = golden_dir("shape_match");

    cmd()
        .arg("match")
        .arg(dir.join("input.jsonl"))
        .arg("-c")
        .arg(&config)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("invalid config").and(contains("min_score")));
}
