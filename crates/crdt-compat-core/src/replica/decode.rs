use crate::crdt_binary::Reader;
use crate::container::{ContainerId, ContainerKind};
use crate::export::{read_envelope, DecodeError, MAX_SECTION_SIZE, MODE_UPDATE};
use crate::id::{Id, VersionVector};
use crate::op::{decode_op, read_anchor, read_container, read_position, read_tree_parent, read_value, Op};
use std::collections::BTreeMap;
use tracing::debug;

use super::types::{
    Child, ContainerState, CounterState, ListAtom, ListState, MapEntry, MapState, MarkRecord,
    MovableElem, MovableSlot, MovableState, TextAtom, TextState, TreeRecord, TreeState,
};
use super::{Replica, ReplicaError};

/// Caps preallocation driven by untrusted counts.
const MAX_PREALLOC: usize = 1024;

impl Replica {
    /// Imports bytes produced by `export` in any mode. Returns the number of
    /// operations that were new to this replica. On error the replica is
    /// left exactly as it was.
    pub fn import(&mut self, data: &[u8]) -> Result<usize, ReplicaError> {
        let mut staged = self.clone();
        let applied = staged.import_staged(data)?;
        *self = staged;
        Ok(applied)
    }

    fn import_staged(&mut self, data: &[u8]) -> Result<usize, ReplicaError> {
        let (mode, sections) = read_envelope(data)?;
        if mode == MODE_UPDATE {
            let [ops] = sections.as_slice() else {
                return Err(section_count(1, sections.len()));
            };
            let ops = decode_ops(ops)?;
            let applied = self.integrate_all(ops)?;
            debug!(peer = self.peer, applied, "imported update");
            return Ok(applied);
        }

        let [version, state, ops] = sections.as_slice() else {
            return Err(section_count(3, sections.len()));
        };
        let (vv, shallow_root) = decode_version(version)?;
        let states = decode_state(state)?;
        let ops = decode_ops(ops)?;

        if !self.is_fresh() {
            if let Some(root) = &shallow_root {
                if !self.version.covers(root) {
                    return Err(ReplicaError::HistoryUnavailable);
                }
            }
            let applied = self.integrate_all(ops)?;
            debug!(peer = self.peer, applied, "merged snapshot into existing replica");
            return Ok(applied);
        }

        let (known, pending): (Vec<Op>, Vec<Op>) = ops.into_iter().partition(|op| vv.contains(op.id));
        self.states = states;
        self.next_time = vv.max_time().map_or(0, |t| t + 1);
        self.version = vv;
        self.shallow_root = shallow_root;
        let loaded = known.len();
        self.oplog = known;
        self.oplog.sort_by_key(|op| op.id);
        let applied = self.integrate_all(pending)?;
        debug!(
            peer = self.peer,
            loaded,
            applied,
            shallow = self.shallow_root.is_some(),
            "loaded snapshot"
        );
        Ok(loaded + applied)
    }

    fn is_fresh(&self) -> bool {
        self.oplog.is_empty() && self.states.is_empty() && self.version.is_empty()
    }
}

fn section_count(expected: usize, found: usize) -> ReplicaError {
    DecodeError::SectionCount { expected, found }.into()
}

fn finish(r: &Reader<'_>, section: &'static str) -> Result<(), DecodeError> {
    if r.is_empty() {
        Ok(())
    } else {
        Err(DecodeError::TrailingBytes(section))
    }
}

fn decode_ops(data: &[u8]) -> Result<Vec<Op>, DecodeError> {
    let mut r = Reader::new(data);
    let len = r.usize().ok_or(DecodeError::Truncated("op count"))?;
    let mut ops = Vec::with_capacity(len.min(MAX_PREALLOC));
    for _ in 0..len {
        ops.push(decode_op(&mut r)?);
    }
    finish(&r, "operations")?;
    Ok(ops)
}

fn read_version_vector(r: &mut Reader<'_>) -> Result<VersionVector, DecodeError> {
    let len = r.usize().ok_or(DecodeError::Truncated("version vector"))?;
    let mut vv = VersionVector::new();
    for _ in 0..len {
        let peer = r.vu57().ok_or(DecodeError::Truncated("version vector"))?;
        let start = r.vu57().ok_or(DecodeError::Truncated("version vector"))?;
        let end = r.vu57().ok_or(DecodeError::Truncated("version vector"))?;
        if end < start {
            return Err(DecodeError::Malformed("version range"));
        }
        vv.observe(peer, start, end - start + 1);
    }
    Ok(vv)
}

fn decode_version(data: &[u8]) -> Result<(VersionVector, Option<VersionVector>), DecodeError> {
    let mut r = Reader::new(data);
    let vv = read_version_vector(&mut r)?;
    let root = match r.u8().ok_or(DecodeError::Truncated("shallow root"))? {
        0 => None,
        1 => Some(read_version_vector(&mut r)?),
        other => {
            return Err(DecodeError::InvalidTag {
                what: "shallow root",
                tag: other,
            })
        }
    };
    finish(&r, "version")?;
    Ok((vv, root))
}

fn read_child(r: &mut Reader<'_>) -> Result<Child, DecodeError> {
    match r.u8().ok_or(DecodeError::Truncated("child"))? {
        0 => Ok(Child::Value(read_value(r)?)),
        1 => Ok(Child::Container(read_container(r)?)),
        other => Err(DecodeError::InvalidTag { what: "child", tag: other }),
    }
}

fn read_opt_child(r: &mut Reader<'_>) -> Result<Option<Child>, DecodeError> {
    match r.u8().ok_or(DecodeError::Truncated("child"))? {
        0 => Ok(None),
        1 => Ok(Some(read_child(r)?)),
        other => Err(DecodeError::InvalidTag { what: "child", tag: other }),
    }
}

fn read_id(r: &mut Reader<'_>, what: &'static str) -> Result<Id, DecodeError> {
    r.id().ok_or(DecodeError::Truncated(what))
}

fn read_len(r: &mut Reader<'_>, what: &'static str) -> Result<usize, DecodeError> {
    r.usize().ok_or(DecodeError::Truncated(what))
}

fn read_bool(r: &mut Reader<'_>, what: &'static str) -> Result<bool, DecodeError> {
    r.bool().ok_or(DecodeError::Truncated(what))
}

fn decode_state(data: &[u8]) -> Result<BTreeMap<ContainerId, ContainerState>, DecodeError> {
    let mut r = Reader::new(data);
    let count = read_len(&mut r, "container count")?;
    let mut states = BTreeMap::new();
    for _ in 0..count {
        let cid = read_container(&mut r)?;
        let state = match cid.kind() {
            ContainerKind::Map => {
                let mut map = MapState::default();
                for _ in 0..read_len(&mut r, "map entries")? {
                    let key = r.str().ok_or(DecodeError::Truncated("map key"))?.to_string();
                    let stamp = read_id(&mut r, "map stamp")?;
                    let value = read_opt_child(&mut r)?;
                    map.entries.insert(key, MapEntry { value, stamp });
                }
                ContainerState::Map(map)
            }
            ContainerKind::List => {
                let len = read_len(&mut r, "list atoms")?;
                let mut atoms = Vec::with_capacity(len.min(MAX_PREALLOC));
                for _ in 0..len {
                    let slot = read_id(&mut r, "list atom")?;
                    let value = read_opt_child(&mut r)?;
                    atoms.push(ListAtom { slot, value });
                }
                ContainerState::List(ListState { atoms })
            }
            ContainerKind::MovableList => {
                let mut mov = MovableState::default();
                for _ in 0..read_len(&mut r, "movable slots")? {
                    let slot = read_id(&mut r, "movable slot")?;
                    let elem = read_id(&mut r, "movable slot")?;
                    mov.slots.push(MovableSlot { slot, elem });
                }
                for _ in 0..read_len(&mut r, "movable elements")? {
                    let id = read_id(&mut r, "movable element")?;
                    let value = read_child(&mut r)?;
                    let value_stamp = read_id(&mut r, "movable element")?;
                    let pos = read_id(&mut r, "movable element")?;
                    let pos_stamp = read_id(&mut r, "movable element")?;
                    let deleted = read_bool(&mut r, "movable element")?;
                    mov.elems.insert(
                        id,
                        MovableElem {
                            value,
                            value_stamp,
                            pos,
                            pos_stamp,
                            deleted,
                        },
                    );
                }
                ContainerState::MovableList(mov)
            }
            ContainerKind::Text => {
                let mut text = TextState::default();
                for _ in 0..read_len(&mut r, "text runs")? {
                    let start = read_id(&mut r, "text run")?;
                    let len = read_len(&mut r, "text run")?;
                    if read_bool(&mut r, "text run")? {
                        let chars = r.str().ok_or(DecodeError::Truncated("text run"))?;
                        if chars.chars().count() != len {
                            return Err(DecodeError::Malformed("text run"));
                        }
                        text.atoms.extend(chars.chars().enumerate().map(|(i, ch)| TextAtom {
                            slot: start.offset(i as u64),
                            ch: Some(ch),
                        }));
                    } else {
                        if len > MAX_SECTION_SIZE {
                            return Err(DecodeError::Malformed("text run"));
                        }
                        text.atoms.extend((0..len).map(|i| TextAtom {
                            slot: start.offset(i as u64),
                            ch: None,
                        }));
                    }
                }
                for _ in 0..read_len(&mut r, "text marks")? {
                    let id = read_id(&mut r, "text mark")?;
                    let start = read_anchor(&mut r)?;
                    let end = read_anchor(&mut r)?;
                    let key = r.str().ok_or(DecodeError::Truncated("mark key"))?.to_string();
                    let value = read_value(&mut r)?;
                    text.marks.push(MarkRecord {
                        id,
                        start,
                        end,
                        key,
                        value,
                    });
                }
                text.marks.sort_by_key(|m| m.id);
                ContainerState::Text(text)
            }
            ContainerKind::Tree => {
                let mut tree = TreeState::default();
                for _ in 0..read_len(&mut r, "tree records")? {
                    let stamp = read_id(&mut r, "tree record")?;
                    let target = read_id(&mut r, "tree record")?;
                    let parent = read_tree_parent(&mut r)?;
                    let position = read_position(&mut r)?;
                    let create = read_bool(&mut r, "tree record")?;
                    tree.insert_record(TreeRecord {
                        stamp,
                        target,
                        parent,
                        position,
                        create,
                    });
                }
                ContainerState::Tree(tree)
            }
            ContainerKind::Counter => ContainerState::Counter(CounterState {
                value: r.f64().ok_or(DecodeError::Truncated("counter"))?,
            }),
        };
        states.insert(cid, state);
    }
    finish(&r, "state")?;
    Ok(states)
}
