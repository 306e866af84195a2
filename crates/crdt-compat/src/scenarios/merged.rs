use super::{configure_text_styles, exchange, new_doc};
use crdt_compat_core::{ContainerKind, Document, DocumentExt, Engine, EngineError};
use tracing::debug;

/// Two replicas touching every container kind, merged both ways. Returns
/// peer 1's replica after it has absorbed peer 2.
pub fn merged_fixture_doc<E: Engine>(engine: &E) -> Result<E::Doc, EngineError> {
    let mut doc1 = new_doc(engine, 1)?;
    configure_text_styles(&mut doc1);

    let profile = doc1.get_map("profile");
    doc1.map(&profile).insert("name", "Ada")?;
    doc1.map(&profile).insert("role", "writer")?;
    doc1.map(&profile).insert("active", true)?;
    let tags = doc1.map(&profile).insert_container("tags", ContainerKind::List)?;
    doc1.list(&tags).insert(0, "crdt")?;
    doc1.list(&tags).insert(1, "moonbit")?;
    let bio = doc1.map(&profile).insert_container("bio", ContainerKind::Text)?;
    doc1.text(&bio).insert(0, "loro")?;

    let items = doc1.get_list("items");
    doc1.list(&items).insert(0, "alpha")?;
    doc1.list(&items).insert(1, "beta")?;
    doc1.list(&items).delete(1, 1)?;
    doc1.list(&items).insert(1, "gamma")?;
    let list_text = doc1.list(&items).insert_container(2, ContainerKind::Text)?;
    doc1.text(&list_text).insert(0, "list text")?;
    let list_map = doc1.list(&items).insert_container(3, ContainerKind::Map)?;
    doc1.map(&list_map).insert("k", "v")?;

    let note = doc1.get_text("note");
    doc1.text(&note).insert(0, "Hello World!")?;
    doc1.text(&note).mark(0, 5, "bold", true)?;
    doc1.text(&note).mark(6, 11, "link", "https://example.com")?;
    doc1.text(&note).unmark(2, 4, "bold")?;
    doc1.text(&note).delete(11, 1)?;
    doc1.text(&note).insert(11, " 世界")?;

    let movable = doc1.get_movable_list("movable");
    doc1.movable_list(&movable).insert(0, "a")?;
    doc1.movable_list(&movable).insert(1, "b")?;
    doc1.movable_list(&movable).insert(2, "c")?;
    let nested = doc1
        .movable_list(&movable)
        .insert_container(3, ContainerKind::List)?;
    doc1.list(&nested).insert(0, "nested")?;
    doc1.movable_list(&movable).move_to(2, 0)?;
    doc1.movable_list(&movable).set(1, "alpha")?;
    doc1.movable_list(&movable).delete(2, 1)?;

    let outline = doc1.get_tree("outline");
    let root = doc1.tree(&outline).create(None)?;
    let root_meta = doc1.tree(&outline).meta(root)?;
    doc1.map(&root_meta).insert("title", "Root")?;
    let child_a = doc1.tree(&outline).create(Some(root))?;
    let a_meta = doc1.tree(&outline).meta(child_a)?;
    doc1.map(&a_meta).insert("title", "A")?;
    let child_b = doc1.tree(&outline).create(Some(root))?;
    let b_meta = doc1.tree(&outline).meta(child_b)?;
    doc1.map(&b_meta).insert("title", "B")?;
    let sub = doc1.tree(&outline).create(Some(child_a))?;
    let sub_meta = doc1.tree(&outline).meta(sub)?;
    doc1.map(&sub_meta).insert("title", "A1")?;
    let tree_tags = doc1.map(&a_meta).insert_container("tags", ContainerKind::List)?;
    doc1.list(&tree_tags).insert(0, "x")?;
    doc1.list(&tree_tags).insert(1, "y")?;
    doc1.tree(&outline).move_to(child_b, Some(root), Some(0))?;

    let counter = doc1.get_counter("counter");
    doc1.counter(&counter).increment(3.0)?;
    doc1.counter(&counter).decrement(1.0)?;

    add_large_data(&mut doc1)?;

    let mut doc2 = new_doc(engine, 2)?;
    configure_text_styles(&mut doc2);
    let peer2_map = doc2.get_map("peer2_map");
    doc2.map(&peer2_map).insert("status", "online")?;
    let peer2_notes = doc2.map(&peer2_map).insert_container("notes", ContainerKind::Text)?;
    doc2.text(&peer2_notes).insert(0, "hi from peer2")?;
    let peer2_list = doc2.get_list("peer2_list");
    doc2.list(&peer2_list).insert(0, "p2")?;
    let peer2_text = doc2.get_text("peer2_text");
    doc2.text(&peer2_text).insert(0, "peer2")?;
    let peer2_counter = doc2.get_counter("peer2_counter");
    doc2.counter(&peer2_counter).increment(4.0)?;

    exchange(&doc1, &mut doc2)?;
    exchange(&doc2, &mut doc1)?;
    debug!(engine = engine.name(), "built merged fixture document");
    Ok(doc1)
}

/// Bulk containers that push every encoding past its small-input paths.
pub fn add_large_data<D: Document + ?Sized>(doc: &mut D) -> Result<(), EngineError> {
    let big_map = doc.get_map("big_map");
    for i in 0..200 {
        doc.map(&big_map).insert(&format!("k{i}"), format!("v{i}"))?;
    }
    let notes = doc.map(&big_map).insert_container("notes", ContainerKind::Text)?;
    doc.text(&notes).insert(0, "big map notes")?;

    let big_list = doc.get_list("big_list");
    for i in 0..200 {
        doc.list(&big_list).insert(i, format!("item-{i}"))?;
    }
    let seed = doc.list(&big_list).insert_container(100, ContainerKind::Map)?;
    doc.map(&seed).insert("seed", "ok")?;
    doc.list(&big_list).delete(120, 5)?;
    doc.list(&big_list).insert(120, "item-120b")?;

    let big_text = doc.get_text("big_text");
    let filler = "x".repeat(40);
    let blocks = (0..200)
        .map(|i| format!("block-{i}: {filler}\n"))
        .collect::<String>();
    doc.text(&big_text).insert(0, &blocks)?;
    doc.text(&big_text).mark(0, 12, "bold", true)?;

    let big_tree = doc.get_tree("big_tree");
    doc.tree(&big_tree).disable_fractional_index()?;
    let big_root = doc.tree(&big_tree).create(None)?;
    let root_meta = doc.tree(&big_tree).meta(big_root)?;
    doc.map(&root_meta).insert("title", "BigRoot")?;
    for i in 0..10 {
        let child = doc.tree(&big_tree).create(Some(big_root))?;
        let meta = doc.tree(&big_tree).meta(child)?;
        doc.map(&meta).insert("title", format!("Node {i}"))?;
        for j in 0..5 {
            let leaf = doc.tree(&big_tree).create(Some(child))?;
            let meta = doc.tree(&big_tree).meta(leaf)?;
            doc.map(&meta).insert("title", format!("Node {i}.{j}"))?;
        }
    }
    Ok(())
}
