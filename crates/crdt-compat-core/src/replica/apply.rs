use crate::container::ContainerId;
use crate::id::Id;
use crate::op::{Op, OpContent, Slot};

use super::rga::{find_insert_index_list, find_insert_index_movable, find_insert_index_text};
use super::types::{
    Child, ContainerState, ListAtom, MapEntry, MarkRecord, MovableElem, MovableSlot, TextAtom,
    TreeRecord,
};
use super::{Replica, ReplicaError};

fn slot_to_child(slot: &Slot, id: Id) -> Child {
    match slot {
        Slot::Value(v) => Child::Value(v.clone()),
        Slot::Container(kind) => Child::Container(ContainerId::Normal { id, kind: *kind }),
    }
}

fn missing(container: &ContainerId, reference: Id) -> ReplicaError {
    ReplicaError::MissingReference {
        container: container.to_string(),
        reference,
    }
}

impl Replica {
    /// Integrates one operation into container state. A container seen for
    /// the first time is only registered once the operation applies.
    pub(super) fn apply_op(&mut self, op: &Op) -> Result<(), ReplicaError> {
        let cid = &op.container;
        if let Some(state) = self.states.get_mut(cid) {
            return apply_content(op, state);
        }
        let mut state = ContainerState::new(cid.kind());
        apply_content(op, &mut state)?;
        self.states.insert(cid.clone(), state);
        Ok(())
    }
}

/// Every rule here is order-independent for causally ready operations.
fn apply_content(op: &Op, state: &mut ContainerState) -> Result<(), ReplicaError> {
    let cid = &op.container;
    match (&op.content, state) {
        (OpContent::MapSet { key, value }, ContainerState::Map(map)) => {
            let value = value.as_ref().map(|slot| slot_to_child(slot, op.id));
            match map.entries.get_mut(key) {
                Some(entry) if entry.stamp > op.id => {}
                Some(entry) => {
                    entry.value = value;
                    entry.stamp = op.id;
                }
                None => {
                    map.entries.insert(
                        key.clone(),
                        MapEntry {
                            value,
                            stamp: op.id,
                        },
                    );
                }
            }
        }
        (OpContent::ListInsert { reference, value }, ContainerState::List(list)) => {
            let Some(idx) = find_insert_index_list(&list.atoms, *reference, op.id)
                .map_err(|r| missing(cid, r))?
            else {
                return Ok(());
            };
            list.atoms.insert(
                idx,
                ListAtom {
                    slot: op.id,
                    value: Some(slot_to_child(value, op.id)),
                },
            );
        }
        (OpContent::MovableInsert { reference, value }, ContainerState::MovableList(mov)) => {
            let Some(idx) = find_insert_index_movable(&mov.slots, *reference, op.id)
                .map_err(|r| missing(cid, r))?
            else {
                return Ok(());
            };
            mov.slots.insert(
                idx,
                MovableSlot {
                    slot: op.id,
                    elem: op.id,
                },
            );
            mov.elems.insert(
                op.id,
                MovableElem {
                    value: slot_to_child(value, op.id),
                    value_stamp: op.id,
                    pos: op.id,
                    pos_stamp: op.id,
                    deleted: false,
                },
            );
        }
        (OpContent::MovableMove { elem, reference }, ContainerState::MovableList(mov)) => {
            if !mov.elems.contains_key(elem) {
                return Err(missing(cid, *elem));
            }
            let Some(idx) = find_insert_index_movable(&mov.slots, *reference, op.id)
                .map_err(|r| missing(cid, r))?
            else {
                return Ok(());
            };
            mov.slots.insert(
                idx,
                MovableSlot {
                    slot: op.id,
                    elem: *elem,
                },
            );
            if let Some(e) = mov.elems.get_mut(elem) {
                if op.id > e.pos_stamp {
                    e.pos = op.id;
                    e.pos_stamp = op.id;
                }
            }
        }
        (OpContent::MovableSet { elem, value }, ContainerState::MovableList(mov)) => {
            let e = mov.elems.get_mut(elem).ok_or_else(|| missing(cid, *elem))?;
            if op.id > e.value_stamp {
                e.value = slot_to_child(value, op.id);
                e.value_stamp = op.id;
            }
        }
        (OpContent::TextInsert { reference, text }, ContainerState::Text(t)) => {
            let Some(idx) = find_insert_index_text(&t.atoms, *reference, op.id)
                .map_err(|r| missing(cid, r))?
            else {
                return Ok(());
            };
            let inserted = text
                .chars()
                .enumerate()
                .map(|(i, ch)| TextAtom {
                    slot: op.id.offset(i as u64),
                    ch: Some(ch),
                })
                .collect::<Vec<_>>();
            t.atoms.splice(idx..idx, inserted);
        }
        (OpContent::Mark { start, end, key, value }, ContainerState::Text(t)) => {
            if t.marks.iter().any(|m| m.id == op.id) {
                return Ok(());
            }
            let idx = t.marks.partition_point(|m| m.id < op.id);
            t.marks.insert(
                idx,
                MarkRecord {
                    id: op.id,
                    start: *start,
                    end: *end,
                    key: key.clone(),
                    value: value.clone(),
                },
            );
        }
        (OpContent::Delete { targets }, ContainerState::List(list)) => {
            for target in targets {
                if let Some(a) = list.atoms.iter_mut().find(|a| a.slot == *target) {
                    a.value = None;
                }
            }
        }
        (OpContent::Delete { targets }, ContainerState::Text(t)) => {
            for target in targets {
                if let Some(a) = t.atoms.iter_mut().find(|a| a.slot == *target) {
                    a.ch = None;
                }
            }
        }
        (OpContent::Delete { targets }, ContainerState::MovableList(mov)) => {
            for target in targets {
                if let Some(e) = mov.elems.get_mut(target) {
                    e.deleted = true;
                }
            }
        }
        (OpContent::TreeCreate { parent, position }, ContainerState::Tree(tree)) => {
            tree.insert_record(TreeRecord {
                stamp: op.id,
                target: op.id,
                parent: *parent,
                position: position.clone(),
                create: true,
            });
        }
        (
            OpContent::TreeMove {
                target,
                parent,
                position,
            },
            ContainerState::Tree(tree),
        ) => {
            tree.insert_record(TreeRecord {
                stamp: op.id,
                target: *target,
                parent: *parent,
                position: position.clone(),
                create: false,
            });
        }
        (OpContent::CounterAdd { delta }, ContainerState::Counter(counter)) => {
            counter.value += delta;
        }
        (content, _) => {
            return Err(ReplicaError::UnsupportedOp {
                container: cid.to_string(),
                op: content.name(),
            })
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerKind;
    use crate::value::Value;

    #[test]
    fn failed_op_does_not_register_its_container() {
        let mut doc = Replica::with_peer(1).expect("peer");
        let list = ContainerId::root("list", ContainerKind::List);
        let op = Op {
            id: Id::new(1, 4),
            container: list.clone(),
            content: OpContent::ListInsert {
                reference: Some(Id::new(1, 0)),
                value: Slot::Value(Value::I64(1)),
            },
        };
        assert!(matches!(
            doc.apply_op(&op),
            Err(ReplicaError::MissingReference { .. })
        ));
        assert!(doc.state(&list).is_none());

        let head = Op {
            content: OpContent::ListInsert {
                reference: None,
                value: Slot::Value(Value::I64(1)),
            },
            ..op
        };
        doc.apply_op(&head).expect("insert at head");
        assert!(doc.state(&list).is_some());
    }
}
