#![allow(dead_code)]

use crdt_compat::CommandSpec;
use crdt_compat_core::{canonical_text, Document, Replica, ReplicaEngine};
use std::time::Duration;

pub const ENGINE: ReplicaEngine = ReplicaEngine;

pub fn canonical(doc: &Replica) -> String {
    canonical_text(&Document::to_json(doc))
}

pub fn reimport(bytes: &[u8]) -> Replica {
    let mut fresh = Replica::with_peer(0xfeed).expect("peer id must be valid");
    fresh.import(bytes).expect("import into fresh replica must succeed");
    fresh
}

/// `sh -c <script>` with the given timeout.
pub fn shell(script: &str, timeout: Duration) -> CommandSpec {
    let argv = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
    CommandSpec::from_argv(&argv, timeout).expect("argv is not empty")
}
