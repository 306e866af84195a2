#![cfg(unix)]

mod common;

use common::shell;
use crdt_compat::runner::run;
use crdt_compat::{CommandSpec, RunError};
use std::time::{Duration, Instant};

#[test]
fn returns_stdout_of_successful_command() {
    let out = run(&shell("printf 'updates 00\\n'; echo ignored >&2", Duration::from_secs(10)))
        .expect("run");
    assert_eq!(out, "updates 00\n");
}

#[test]
fn non_zero_exit_carries_status_and_stderr() {
    let err = run(&shell("echo updates 00; echo boom >&2; exit 3", Duration::from_secs(10)))
        .expect_err("non-zero exit");
    match err {
        RunError::NonZeroExit { status, stderr, .. } => {
            assert_eq!(status.code(), Some(3));
            assert_eq!(stderr, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn slow_command_is_killed_at_the_deadline() {
    let started = Instant::now();
    let err = run(&shell("exec sleep 30", Duration::from_millis(300))).expect_err("timeout");
    assert!(matches!(err, RunError::Timeout { .. }), "{err}");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn missing_program_is_a_spawn_error() {
    let argv = vec!["definitely-not-a-real-program-7f3a".to_string()];
    let cmd = CommandSpec::from_argv(&argv, Duration::from_secs(5)).expect("argv");
    assert!(matches!(run(&cmd), Err(RunError::Spawn { .. })));
}

#[test]
fn empty_argv_is_rejected() {
    assert!(matches!(
        CommandSpec::from_argv(&[], Duration::from_secs(1)),
        Err(RunError::EmptyCommand)
    ));
}

#[test]
fn working_directory_is_applied() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("marker.txt"), "here").expect("marker");
    let out = run(&shell("cat marker.txt", Duration::from_secs(10)).cwd(dir.path())).expect("run");
    assert_eq!(out, "here");
}

#[test]
fn non_utf8_stdout_is_reported() {
    let err = run(&shell("printf '\\377\\376'", Duration::from_secs(10))).expect_err("binary stdout");
    assert!(matches!(err, RunError::InvalidUtf8 { .. }), "{err}");
}
