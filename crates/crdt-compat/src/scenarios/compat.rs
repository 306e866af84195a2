use super::{exchange, new_doc};
use crdt_compat_core::{ContainerKind, DocumentExt, Engine, EngineError};

/// The document an implementation's `updates` and `snapshot` artifacts must
/// reproduce.
pub fn compat_expected_doc<E: Engine>(engine: &E) -> Result<E::Doc, EngineError> {
    let mut doc = new_doc(engine, 1)?;

    let root = doc.get_map("root");
    doc.map(&root).insert("title", "Loro")?;
    let items = doc.map(&root).insert_container("items", ContainerKind::List)?;
    doc.list(&items).insert(0, 1i64)?;
    doc.list(&items).insert(1, "two")?;

    let list = doc.get_list("list");
    doc.list(&list).insert(0, "a")?;
    doc.list(&list).insert(1, "b")?;
    let nested = doc.list(&list).insert_container(1, ContainerKind::Map)?;
    doc.map(&nested).insert("nested", true)?;
    doc.list(&list).delete(2, 1)?;
    doc.list(&list).insert(2, "b2")?;
    doc.list(&list).delete(0, 1)?;

    let mlist = doc.get_movable_list("mlist");
    doc.movable_list(&mlist).insert(0, "m1")?;
    doc.movable_list(&mlist).insert(1, "m2")?;
    doc.movable_list(&mlist).move_to(0, 1)?;
    doc.movable_list(&mlist).set(1, "m1x")?;
    doc.movable_list(&mlist).delete(0, 1)?;

    let text = doc.get_text("text");
    doc.text(&text).insert(0, "Hello world")?;
    doc.text(&text).mark(0, 5, "bold", true)?;
    doc.text(&text).delete(5, 1)?;

    let tree = doc.get_tree("tree");
    let root1 = doc.tree(&tree).create(None)?;
    let root2 = doc.tree(&tree).create(None)?;
    let child = doc.tree(&tree).create(Some(root1))?;
    let meta = doc.tree(&tree).meta(child)?;
    doc.map(&meta).insert("name", "child")?;
    doc.tree(&tree).move_to(child, Some(root2), None)?;
    doc.tree(&tree).delete(root1)?;

    let counter = doc.get_counter("counter");
    doc.counter(&counter).increment(2.0)?;
    doc.counter(&counter).increment(3.0)?;
    Ok(doc)
}

/// Two peers each writing a 1500 character value under one root map, then
/// exchanging updates. Returns peer 1's replica.
pub fn large_snapshot_doc<E: Engine>(engine: &E) -> Result<E::Doc, EngineError> {
    let big = "a".repeat(1500);

    let mut doc1 = new_doc(engine, 1)?;
    let root1 = doc1.get_map("root");
    doc1.map(&root1).insert("p1", big.as_str())?;

    let mut doc2 = new_doc(engine, 2)?;
    let root2 = doc2.get_map("root");
    doc2.map(&root2).insert("p2", big)?;

    exchange(&doc1, &mut doc2)?;
    exchange(&doc2, &mut doc1)?;
    Ok(doc1)
}
