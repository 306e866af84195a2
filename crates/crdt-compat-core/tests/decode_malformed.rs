mod common;

use common::{build_rich, canonical, export, replica};
use crdt_compat_core::{DecodeError, DocumentExt, ExportMode, ReplicaError};
use serde_json::json;

fn decode_error(bytes: &[u8]) -> DecodeError {
    match replica(7).import(bytes) {
        Err(ReplicaError::Decode(e)) => e,
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn rejects_envelope_level_corruption() {
    assert!(matches!(decode_error(&[]), DecodeError::Empty));
    assert!(matches!(decode_error(b"nope!!"), DecodeError::BadMagic));

    let mut bytes = export(&build_rich(1), ExportMode::Update);
    bytes[4] = 2;
    assert!(matches!(decode_error(&bytes), DecodeError::UnsupportedVersion(2)));
}

#[test]
fn rejects_truncation_in_every_mode() {
    let doc = build_rich(1);
    for mode in [
        ExportMode::Update,
        ExportMode::Snapshot,
        ExportMode::ShallowSnapshot(doc.oplog_frontiers()),
    ] {
        let bytes = export(&doc, mode);
        for cut in [bytes.len() - 1, bytes.len() / 2, 7] {
            let err = replica(7).import(&bytes[..cut]);
            assert!(err.is_err(), "truncated at {cut} must fail");
        }
    }
}

#[test]
fn rejects_wrong_section_count() {
    let snapshot = export(&build_rich(1), ExportMode::Snapshot);
    let mut as_update = snapshot.clone();
    as_update[5] = 0;
    assert!(matches!(
        decode_error(&as_update),
        DecodeError::SectionCount { expected: 1, found: 3 }
    ));
}

#[test]
fn failed_import_leaves_replica_untouched() {
    let mut doc = build_rich(1);
    let before = doc.to_json();
    let mut bytes = export(&build_rich(2), ExportMode::Update);
    bytes.truncate(bytes.len() - 3);
    assert!(doc.import(&bytes).is_err());
    assert_eq!(doc.to_json(), before);
}

#[test]
fn causally_incomplete_update_is_rejected_without_side_effects() {
    let mut source = replica(1);
    let list = source.get_list("list");
    source.list(&list).push("first").expect("push");
    let base = source.version().clone();
    let map = source.get_map("m");
    source.map(&map).insert("k", "v").expect("insert");
    source.list(&list).push("second").expect("push after first");
    let delta = export(&source, ExportMode::UpdatesFrom(base));

    let mut fresh = replica(2);
    let err = fresh.import(&delta).expect_err("list insert needs the first element");
    assert!(matches!(err, ReplicaError::MissingReference { .. }), "{err}");
    assert_eq!(fresh.to_json(), json!({}));
    assert_eq!(fresh.op_count(), 0);
    assert!(fresh.version().is_empty());

    let mut existing = build_rich(3);
    let before = existing.to_json();
    let version = existing.version().clone();
    assert!(existing.import(&delta).is_err());
    assert_eq!(existing.to_json(), before);
    assert_eq!(existing.version(), &version);

    fresh
        .import(&export(&source, ExportMode::Update))
        .expect("full update applies after the failed delta");
    assert_eq!(canonical(&fresh), canonical(&source));
}
