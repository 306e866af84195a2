use crdt_compat_core::{Awareness, Value};

#[test]
fn merge_keeps_higher_clock_per_peer() {
    let mut old = Awareness::new(1);
    old.set_local_state(Value::map([("v", Value::I64(1))]));
    let v1 = old.encode_all().expect("encode v1");

    let mut new = Awareness::new(1);
    new.set_local_state(Value::map([("v", Value::I64(1))]));
    new.set_local_state(Value::map([("v", Value::I64(2))]));
    let v2 = new.encode_all().expect("encode v2");

    let mut observer = Awareness::new(9);
    let update = observer.apply(&v2).expect("apply v2");
    assert_eq!(update.added, vec![1]);
    let update = observer.apply(&v1).expect("apply stale v1");
    assert!(update.added.is_empty() && update.updated.is_empty());

    let entry = &observer.get_all_states()[&1];
    assert_eq!(entry.clock, 2);
    assert_eq!(entry.state, Value::map([("v", Value::I64(2))]));
}

#[test]
fn multi_peer_states_merge_into_one_store() {
    let mut a = Awareness::new(1);
    a.set_local_state(Value::map([("a", Value::I64(1))]));
    let mut b = Awareness::new(2);
    b.set_local_state(Value::map([("b", Value::I64(2))]));
    a.apply(&b.encode_all().expect("encode b")).expect("apply b");

    let states = a.get_all_states();
    assert_eq!(states.len(), 2);
    assert_eq!(states[&2].state, Value::map([("b", Value::I64(2))]));

    let mut c = Awareness::new(3);
    c.apply(&a.encode_all().expect("encode merged")).expect("apply merged");
    assert_eq!(c.get_all_states().len(), 2);
}

#[test]
fn every_value_kind_survives_encoding() {
    let state = Value::map([
        ("null", Value::Null),
        ("bool", Value::Bool(true)),
        ("int", Value::I64(-42)),
        ("float", Value::F64(1.5)),
        ("string", Value::from("hi")),
        ("binary", Value::Binary(vec![1, 2, 3])),
        ("list", Value::List(vec![Value::I64(1), Value::from("a"), Value::Bool(false)])),
        ("map", Value::map([("k", Value::from("v"))])),
    ]);
    let mut a = Awareness::new(1);
    a.set_local_state(state.clone());
    let mut b = Awareness::new(2);
    b.apply(&a.encode_all().expect("encode")).expect("apply");
    assert_eq!(b.get_all_states()[&1].state, state);
}

#[test]
fn encode_skips_unknown_peers() {
    let mut a = Awareness::new(1);
    a.set_local_state(Value::Null);
    let bytes = a.encode(&[1, 5]).expect("encode");
    let mut b = Awareness::new(2);
    let update = b.apply(&bytes).expect("apply");
    assert_eq!(update.added, vec![1]);
}
