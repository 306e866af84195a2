use crdt_compat_core::{Awareness, AwarenessError, PeerId, Value};

/// A named awareness payload and the comment rendered above it.
#[derive(Debug, Clone, PartialEq)]
pub struct AwarenessScenario {
    pub name: &'static str,
    pub comment: &'static str,
    pub bytes: Vec<u8>,
}

/// Sets each state in turn on a fresh awareness for `peer` and encodes every
/// entry. The resulting clock equals `states.len()`.
pub fn single_peer_awareness(peer: PeerId, states: &[Value]) -> Result<Vec<u8>, AwarenessError> {
    let mut awareness = Awareness::new(peer);
    for state in states {
        awareness.set_local_state(state.clone());
    }
    awareness.encode_all()
}

/// Peer 1 `{a: 1}` merged with peer 2 `{b: 2}`, encoded from peer 1.
pub fn multi_peer_awareness() -> Result<Vec<u8>, AwarenessError> {
    let mut a1 = Awareness::new(1);
    let mut a2 = Awareness::new(2);
    a1.set_local_state(Value::map([("a", Value::I64(1))]));
    a2.set_local_state(Value::map([("b", Value::I64(2))]));
    a1.apply(&a2.encode_all()?)?;
    a1.encode_all()
}

fn mixed_state() -> Value {
    Value::map([
        ("n", Value::Null),
        ("b", Value::Bool(true)),
        ("i", Value::I64(1)),
        ("f", Value::F64(1.5)),
        ("s", Value::from("hi")),
        ("bin", Value::Binary(vec![1, 2, 3])),
        (
            "list",
            Value::List(vec![Value::I64(1), Value::from("a"), Value::Bool(false)]),
        ),
        ("map", Value::map([("k", Value::from("v"))])),
    ])
}

/// The four awareness payloads emitted as fixtures, in output order.
pub fn awareness_scenarios() -> Result<Vec<AwarenessScenario>, AwarenessError> {
    let version = |v: i64| Value::map([("v", Value::I64(v))]);
    Ok(vec![
        AwarenessScenario {
            name: "awareness_fixture_simple",
            comment: "Awareness encoding for mixed value types.",
            bytes: single_peer_awareness(1, &[mixed_state()])?,
        },
        AwarenessScenario {
            name: "awareness_fixture_multi",
            comment: "Awareness encoding with two peers.",
            bytes: multi_peer_awareness()?,
        },
        AwarenessScenario {
            name: "awareness_fixture_peer_v1",
            comment: "Awareness encoding peer=1 clock=1.",
            bytes: single_peer_awareness(1, &[version(1)])?,
        },
        AwarenessScenario {
            name: "awareness_fixture_peer_v2",
            comment: "Awareness encoding peer=1 clock=2.",
            bytes: single_peer_awareness(1, &[version(1), version(2)])?,
        },
    ])
}
