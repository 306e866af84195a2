#![allow(dead_code)]

use crdt_compat_core::{
    canonical_text, ContainerKind, DocumentExt, ExpandType, ExportMode, Id, PeerId, Replica,
};

pub fn replica(peer: PeerId) -> Replica {
    Replica::with_peer(peer).expect("peer id must be valid")
}

pub fn canonical(doc: &Replica) -> String {
    canonical_text(&doc.to_json())
}

pub fn export(doc: &Replica, mode: ExportMode) -> Vec<u8> {
    doc.export(&mode)
        .unwrap_or_else(|e| panic!("{} export failed: {e}", mode.name()))
}

/// Imports `bytes` into a fresh replica.
pub fn reimport(bytes: &[u8]) -> Replica {
    let mut fresh = replica(0xfeed);
    fresh.import(bytes).expect("import into fresh replica must succeed");
    fresh
}

/// Sends `from`'s full update to `to`.
pub fn sync(from: &Replica, to: &mut Replica) {
    to.import(&export(from, ExportMode::Update))
        .expect("update import must succeed");
}

/// Alive tree nodes in depth-first order.
pub fn alive_nodes(doc: &Replica, name: &str) -> Vec<Id> {
    let tree = doc.get_tree(name);
    let mut out = Vec::new();
    let mut stack = doc.tree_children(&tree, None);
    stack.reverse();
    while let Some(node) = stack.pop() {
        out.push(node);
        let mut children = doc.tree_children(&tree, Some(node));
        children.reverse();
        stack.extend(children);
    }
    out
}

/// Touches every container kind, including nested containers, marks and
/// tree moves.
pub fn build_rich(peer: PeerId) -> Replica {
    let mut doc = replica(peer);
    doc.config_text_style("bold", ExpandType::After);
    doc.config_text_style("link", ExpandType::None);

    let profile = doc.get_map("profile");
    doc.map(&profile).insert("name", "Alice").expect("map insert");
    doc.map(&profile).insert("age", 30i64).expect("map insert");
    let tags = doc
        .map(&profile)
        .insert_container("tags", ContainerKind::List)
        .expect("nested list");
    doc.list(&tags).push("rust").expect("list push");
    doc.list(&tags).push("crdt").expect("list push");
    doc.map(&profile).delete("age").expect("map delete");

    let items = doc.get_list("items");
    doc.list(&items).insert(0, 1i64).expect("list insert");
    doc.list(&items).insert(1, "two").expect("list insert");
    let nested = doc
        .list(&items)
        .insert_container(1, ContainerKind::Map)
        .expect("nested map");
    doc.map(&nested).insert("ok", true).expect("nested insert");
    doc.list(&items).delete(0, 1).expect("list delete");

    let note = doc.get_text("note");
    doc.text(&note).insert(0, "Hello World!").expect("text insert");
    doc.text(&note).mark(0, 5, "bold", true).expect("mark");
    doc.text(&note).mark(6, 11, "link", "https://example.com").expect("mark");
    doc.text(&note).unmark(2, 4, "bold").expect("unmark");
    doc.text(&note).delete(11, 1).expect("text delete");
    doc.text(&note).insert(11, " 世界").expect("text insert");

    let mlist = doc.get_movable_list("movable");
    for v in ["a", "b", "c"] {
        doc.movable_list(&mlist).push(v).expect("movable push");
    }
    doc.movable_list(&mlist).move_to(2, 0).expect("movable move");
    doc.movable_list(&mlist).set(1, "alpha").expect("movable set");
    doc.movable_list(&mlist).delete(2, 1).expect("movable delete");

    let tree = doc.get_tree("outline");
    let root = doc.tree(&tree).create(None).expect("tree create");
    let a = doc.tree(&tree).create(Some(root)).expect("tree create");
    let b = doc.tree(&tree).create(Some(root)).expect("tree create");
    let meta = doc.tree(&tree).meta(a).expect("tree meta");
    doc.map(&meta).insert("title", "A").expect("meta insert");
    doc.tree(&tree).move_to(b, Some(root), Some(0)).expect("tree move");

    let counter = doc.get_counter("counter");
    doc.counter(&counter).increment(3.0).expect("increment");
    doc.counter(&counter).decrement(1.0).expect("decrement");
    doc
}
