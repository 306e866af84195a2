mod common;

use common::{canonical, reimport, ENGINE};
use crdt_compat::fixtures::{
    awareness_fixtures, document_fixtures, render, write_fixtures, FixtureBlob,
};
use crdt_compat::scenarios::merged_fixture_doc;
use crdt_compat_core::{Awareness, Value};

#[test]
fn document_fixtures_reimport_to_merged_projection() {
    let expected = canonical(&merged_fixture_doc(&ENGINE).expect("build"));
    let blobs = document_fixtures(&ENGINE).expect("fixtures");
    let names = blobs.iter().map(|b| b.name.as_str()).collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "loro_fixture_updates",
            "loro_fixture_snapshot",
            "loro_fixture_shallow_snapshot",
        ]
    );
    for blob in &blobs {
        assert_eq!(canonical(&reimport(&blob.bytes)), expected, "{} diverged", blob.name);
    }
    let comment = blobs[2].comment.as_deref().expect("comment");
    assert!(comment.contains("shallow-snapshot"), "{comment}");
}

#[test]
fn rendered_blocks_are_separated_by_blank_line() {
    let blobs = vec![
        FixtureBlob::new("first", "one", vec![0xde, 0xad]),
        FixtureBlob::new("second", "two", vec![0xbe, 0xef]),
    ];
    let text = render(&blobs);
    assert_eq!(
        text,
        "///|\n// one\npub let first : Bytes = [\n  0xde, 0xad\n]\n\
         \n\
         ///|\n// two\npub let second : Bytes = [\n  0xbe, 0xef\n]\n"
    );
}

#[test]
fn write_fixtures_replaces_the_target_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fixtures.mbt");
    std::fs::write(&path, "stale").expect("seed file");

    let blobs = awareness_fixtures().expect("awareness");
    write_fixtures(&path, &blobs).expect("write");
    let written = std::fs::read_to_string(&path).expect("read back");
    assert_eq!(written, render(&blobs));
    assert!(!written.contains("stale"));
    assert_eq!(written.matches("///|").count(), 4);
}

#[test]
fn write_fixtures_reports_the_path_on_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("fixtures.mbt");
    let err = write_fixtures(&path, &[]).expect_err("parent does not exist");
    assert!(err.to_string().contains("fixtures.mbt"), "{err}");
}

#[test]
fn awareness_fixtures_decode_to_scripted_states() {
    let blobs = awareness_fixtures().expect("awareness");
    let by_name = |name: &str| {
        blobs
            .iter()
            .find(|b| b.name == name)
            .unwrap_or_else(|| panic!("{name} missing"))
            .bytes
            .clone()
    };

    let mut simple = Awareness::new(9);
    simple.apply(&by_name("awareness_fixture_simple")).expect("simple");
    let state = &simple.get_all_states()[&1];
    assert_eq!(state.clock, 1);
    let Value::Map(entries) = &state.state else {
        panic!("simple state is a map");
    };
    assert_eq!(entries["bin"], Value::Binary(vec![1, 2, 3]));
    assert_eq!(entries["f"], Value::F64(1.5));
    assert_eq!(entries["n"], Value::Null);

    let mut multi = Awareness::new(9);
    multi.apply(&by_name("awareness_fixture_multi")).expect("multi");
    assert_eq!(multi.get_all_states().keys().copied().collect::<Vec<_>>(), vec![1, 2]);

    let mut peer = Awareness::new(9);
    peer.apply(&by_name("awareness_fixture_peer_v2")).expect("v2");
    peer.apply(&by_name("awareness_fixture_peer_v1")).expect("v1");
    let entry = &peer.get_all_states()[&1];
    assert_eq!(entry.clock, 2);
    assert_eq!(entry.state, Value::map([("v", Value::I64(2))]));
}
