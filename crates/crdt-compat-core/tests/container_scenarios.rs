mod common;

use common::{canonical, export, replica, sync};
use crdt_compat_core::{
    ContainerKind, DocumentExt, ExpandType, ExportMode, Operation, ReplicaError, Value,
};
use serde_json::json;

#[test]
fn movable_list_move_set_delete_keeps_identity() {
    let mut doc = replica(1);
    let mlist = doc.get_movable_list("mlist");
    doc.movable_list(&mlist).insert(0, "m1").expect("insert m1");
    doc.movable_list(&mlist).insert(1, "m2").expect("insert m2");
    doc.movable_list(&mlist).move_to(0, 1).expect("move");
    doc.movable_list(&mlist).set(1, "m1x").expect("set");
    doc.movable_list(&mlist).delete(0, 1).expect("delete");
    assert_eq!(doc.to_json()["mlist"], json!(["m1x"]));
}

#[test]
fn tree_move_survives_deleting_former_parent() {
    let mut doc = replica(1);
    let tree = doc.get_tree("tree");
    let r1 = doc.tree(&tree).create(None).expect("create r1");
    let r2 = doc.tree(&tree).create(None).expect("create r2");
    let child = doc.tree(&tree).create(Some(r1)).expect("create child");
    let grandchild = doc.tree(&tree).create(Some(child)).expect("create grandchild");
    doc.tree(&tree).move_to(child, Some(r2), None).expect("move child");
    doc.tree(&tree).delete(r1).expect("delete r1");

    assert_eq!(doc.tree_parent(&tree, child).expect("child alive"), Some(r2));
    assert_eq!(doc.tree_parent(&tree, grandchild).expect("grandchild alive"), Some(child));
    assert!(matches!(doc.tree_parent(&tree, r1), Err(ReplicaError::DeletedNode(_))));

    let json = doc.to_json();
    let roots = json["tree"].as_array().expect("tree projects to array");
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["id"], json!(r2.to_string()));
    assert_eq!(roots[0]["children"][0]["id"], json!(child.to_string()));
    assert_eq!(roots[0]["children"][0]["parent"], json!(r2.to_string()));
}

#[test]
fn text_delete_inside_mark_shrinks_range() {
    let mut doc = replica(1);
    let text = doc.get_text("text");
    doc.text(&text).insert(0, "Hello world").expect("insert");
    doc.text(&text).mark(0, 5, "bold", true).expect("mark");
    doc.text(&text).delete(5, 1).expect("delete");

    assert_eq!(doc.to_json()["text"], json!("Helloworld"));
    let delta = doc.text_delta(&text).expect("delta");
    assert_eq!(delta.len(), 2);
    assert_eq!(delta[0].insert, "Hello");
    assert_eq!(delta[0].attributes.get("bold"), Some(&Value::Bool(true)));
    assert_eq!(delta[1].insert, "world");
    assert!(delta[1].attributes.is_empty());
}

#[test]
fn expand_policy_governs_boundary_inserts() {
    let mut doc = replica(1);
    doc.config_text_style("link", ExpandType::None);
    let text = doc.get_text("text");
    doc.text(&text).insert(0, "Hello world").expect("insert");
    doc.text(&text).mark(0, 5, "bold", true).expect("bold");
    doc.text(&text).mark(6, 11, "link", "x").expect("link");
    // bold expands after, link does not expand at all
    doc.text(&text).insert(5, "!").expect("insert at bold end");
    doc.text(&text).insert(12, "?").expect("insert at link end");
    doc.text(&text).insert(7, "<").expect("insert at link start");

    let delta = doc.text_delta(&text).expect("delta");
    let spans = delta
        .iter()
        .map(|d| (d.insert.as_str(), d.attributes.keys().cloned().collect::<Vec<_>>()))
        .collect::<Vec<_>>();
    assert_eq!(
        spans,
        vec![
            ("Hello!", vec!["bold".to_string()]),
            (" <", vec![]),
            ("world", vec!["link".to_string()]),
            ("?", vec![]),
        ]
    );
}

#[test]
fn counter_sums_local_and_imported_increments() {
    let mut doc = replica(1);
    let counter = doc.get_counter("counter");
    doc.counter(&counter).increment(2.0).expect("increment");
    let first = export(&doc, ExportMode::Update);
    let after_first = doc.version().clone();
    doc.counter(&counter).increment(3.0).expect("increment");
    let second = export(&doc, ExportMode::UpdatesFrom(after_first));
    assert_eq!(doc.counter_value(&counter).expect("counter"), 5.0);

    let mut merged = replica(2);
    merged.import(&second).expect("second delta");
    merged.import(&first).expect("first delta");
    assert_eq!(merged.counter_value(&counter).expect("counter"), 5.0);
    assert_eq!(merged.to_json()["counter"], json!(5));
}

#[test]
fn nested_containers_project_deeply() {
    let mut doc = replica(1);
    let root = doc.get_map("root");
    doc.map(&root).insert("title", "compat").expect("title");
    let items = doc
        .map(&root)
        .insert_container("items", ContainerKind::List)
        .expect("items");
    doc.list(&items).insert(0, 1i64).expect("item");
    doc.list(&items).insert(1, "two").expect("item");
    assert_eq!(doc.to_json(), json!({"root": {"title": "compat", "items": [1, "two"]}}));
}

#[test]
fn overwriting_a_key_hides_the_old_nested_container() {
    let mut doc = replica(1);
    let root = doc.get_map("root");
    let inner = doc
        .map(&root)
        .insert_container("k", ContainerKind::Text)
        .expect("text");
    doc.text(&inner).insert(0, "gone").expect("insert");
    doc.map(&root).insert("k", 7i64).expect("overwrite");
    assert_eq!(doc.to_json(), json!({"root": {"k": 7}}));
}

#[test]
fn invalid_operations_are_rejected_without_side_effects() {
    let mut doc = replica(1);
    let list = doc.get_list("list");
    let err = doc
        .apply(&list, Operation::ListInsert { index: 5, value: Value::I64(1) })
        .expect_err("index past end");
    assert!(matches!(err, ReplicaError::IndexOutOfBounds { index: 5, len: 0 }));

    let err = doc
        .apply(&list, Operation::MapInsert { key: "k".into(), value: Value::Null })
        .expect_err("wrong kind");
    assert!(matches!(err, ReplicaError::KindMismatch { .. }));

    let tree = doc.get_tree("tree");
    let a = doc.tree(&tree).create(None).expect("a");
    let b = doc.tree(&tree).create(Some(a)).expect("b");
    let err = doc
        .apply(&tree, Operation::TreeMove { node: a, parent: Some(b), index: None })
        .expect_err("cycle");
    assert!(matches!(err, ReplicaError::Cycle { .. }));

    doc.tree(&tree).delete(a).expect("delete a");
    let err = doc
        .apply(&tree, Operation::TreeCreate { parent: Some(b), index: None })
        .expect_err("parent deleted with its ancestor");
    assert!(matches!(err, ReplicaError::DeletedNode(id) if id == b));

    let ops = doc.op_count();
    let text = doc.get_text("text");
    assert!(doc
        .apply(&text, Operation::TextDelete { pos: 0, len: 1 })
        .is_err());
    assert_eq!(doc.op_count(), ops);
}

#[test]
fn concurrent_edits_converge_in_either_exchange_order() {
    let mut a = replica(1);
    let mut b = replica(2);
    let text_a = a.get_text("text");
    a.text(&text_a).insert(0, "abc").expect("insert");
    sync(&a, &mut b);

    let text_b = b.get_text("text");
    a.text(&text_a).insert(1, "X").expect("insert a");
    b.text(&text_b).insert(1, "Y").expect("insert b");
    b.text(&text_b).delete(2, 1).expect("delete b");
    let map_a = a.get_map("m");
    let map_b = b.get_map("m");
    a.map(&map_a).insert("k", "from-a").expect("set a");
    b.map(&map_b).insert("k", "from-b").expect("set b");

    let mut a_first = a.clone();
    let mut b_first = b.clone();
    sync(&b, &mut a_first);
    sync(&a_first, &mut b_first);
    sync(&b_first, &mut a_first);

    let mut b_then = b.clone();
    sync(&a, &mut b_then);
    let mut a_then = a.clone();
    sync(&b, &mut a_then);

    assert_eq!(canonical(&a_first), canonical(&b_first));
    assert_eq!(canonical(&a_then), canonical(&b_then));
    assert_eq!(canonical(&a_first), canonical(&a_then));
}
