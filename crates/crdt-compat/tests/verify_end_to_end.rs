mod common;

use common::{shell, ENGINE};
use crdt_compat::protocol::{artifact_line, parse_artifacts};
use crdt_compat::scenarios::large_snapshot_doc;
use crdt_compat::{Check, CommandSpec, HarnessError, Verifier, VerifyError};
use crdt_compat_core::{DocumentExt, ExportMode};
use std::time::Duration;

fn compat_export(args: &[&str]) -> CommandSpec {
    let mut argv = vec![env!("CARGO_BIN_EXE_compat-export").to_string()];
    argv.extend(args.iter().map(|a| a.to_string()));
    CommandSpec::from_argv(&argv, Duration::from_secs(60)).expect("argv")
}

#[test]
fn bundled_exporter_passes_exports_check() {
    let verifier = Verifier::new(ENGINE);
    let message = verifier
        .verify_command(Check::Exports, &compat_export(&[]))
        .expect("exports check");
    assert_eq!(message, "compat check ok");
}

#[test]
fn bundled_exporter_passes_large_check() {
    let verifier = Verifier::new(ENGINE);
    let message = verifier
        .verify_command(Check::Large, &compat_export(&["--large"]))
        .expect("large check");
    assert_eq!(message, "sstable compat check ok");
}

#[test]
fn wrong_document_is_a_named_mismatch() {
    let verifier = Verifier::new(ENGINE);
    let mut doc = large_snapshot_doc(&ENGINE).expect("build");
    let output = format!(
        "{}\n{}\n",
        artifact_line("updates", &doc.export(&ExportMode::Update).expect("update")),
        artifact_line("snapshot", &doc.export(&ExportMode::Snapshot).expect("snapshot")),
    );
    let err = verifier
        .verify_output(Check::Exports, &output)
        .expect_err("different document");
    assert!(
        matches!(err, HarnessError::Verify(VerifyError::Mismatch { ref artifact, .. }) if artifact == "updates"),
        "{err}"
    );

    let root = doc.get_map("root");
    doc.map(&root).insert("extra", true).expect("insert");
    let good = verifier.expected_text(Check::Large).expect("expected");
    let changed = verifier
        .import_text("snapshot_large", &doc.export(&ExportMode::Snapshot).expect("snapshot"))
        .expect("import");
    assert_ne!(good, changed);
}

#[test]
fn undecodable_artifact_is_an_import_error() {
    let verifier = Verifier::new(ENGINE);
    let artifacts = parse_artifacts("snapshot_large 00ff00ff\n", Check::Large.artifacts()).expect("parse");
    let err = verifier
        .check_artifacts(Check::Large, &artifacts)
        .expect_err("garbage bytes");
    assert!(
        matches!(err, VerifyError::Import { ref artifact, .. } if artifact == "snapshot_large"),
        "{err}"
    );
}

#[cfg(unix)]
#[test]
fn exit_failure_is_not_parsed() {
    let verifier = Verifier::new(ENGINE);
    let err = verifier
        .verify_command(
            Check::Exports,
            &shell("echo updates 00; echo snapshot 00; exit 1", Duration::from_secs(10)),
        )
        .expect_err("non-zero exit");
    assert!(matches!(err, HarnessError::Process(_)), "{err}");
}

#[cfg(unix)]
#[test]
fn missing_artifact_is_a_protocol_error() {
    let verifier = Verifier::new(ENGINE);
    let err = verifier
        .verify_command(Check::Exports, &shell("echo updates 00", Duration::from_secs(10)))
        .expect_err("snapshot missing");
    assert!(matches!(err, HarnessError::Protocol(_)), "{err}");
    assert!(err.to_string().contains("snapshot"), "{err}");
}

#[test]
fn cli_verify_prints_success_line() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_crdt-compat"))
        .args(["verify", "large", "--timeout-secs", "60", "--command"])
        .arg(env!("CARGO_BIN_EXE_compat-export"))
        .args(["--command", "--large"])
        .output()
        .expect("run crdt-compat");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "sstable compat check ok");
}

#[test]
fn cli_fixtures_writes_requested_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.mbt");
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_crdt-compat"))
        .arg("fixtures")
        .arg("--out")
        .arg(&path)
        .output()
        .expect("run crdt-compat");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let text = std::fs::read_to_string(&path).expect("fixtures written");
    assert!(text.contains("pub let loro_fixture_shallow_snapshot : Bytes = ["));
}
