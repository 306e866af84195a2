//! Identifier-addressed operations and their binary layout.
//!
//! Local positional edits are translated into these operations by the
//! replica; only these operations travel between replicas.

use crate::container::{ContainerId, ContainerKind};
use crate::crdt_binary::{Reader, Writer};
use crate::export::DecodeError;
use crate::id::Id;
use crate::value::{Value, ValueCodecError};

/// What an insert or set writes: a plain value, or a fresh nested container
/// whose id is derived from the operation id.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Value(Value),
    Container(ContainerKind),
}

/// Mark boundary relative to the character sequence, tombstones included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
    Before(Id),
    After(Id),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeParent {
    Root,
    Node(Id),
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpContent {
    MapSet {
        key: String,
        value: Option<Slot>,
    },
    ListInsert {
        reference: Option<Id>,
        value: Slot,
    },
    MovableInsert {
        reference: Option<Id>,
        value: Slot,
    },
    MovableMove {
        elem: Id,
        reference: Option<Id>,
    },
    MovableSet {
        elem: Id,
        value: Slot,
    },
    TextInsert {
        reference: Option<Id>,
        text: String,
    },
    Delete {
        targets: Vec<Id>,
    },
    Mark {
        start: Anchor,
        end: Anchor,
        key: String,
        value: Value,
    },
    TreeCreate {
        parent: TreeParent,
        position: Option<Vec<u8>>,
    },
    TreeMove {
        target: Id,
        parent: TreeParent,
        position: Option<Vec<u8>>,
    },
    CounterAdd {
        delta: f64,
    },
}

impl OpContent {
    pub fn name(&self) -> &'static str {
        match self {
            OpContent::MapSet { .. } => "map_set",
            OpContent::ListInsert { .. } => "list_insert",
            OpContent::MovableInsert { .. } => "movable_insert",
            OpContent::MovableMove { .. } => "movable_move",
            OpContent::MovableSet { .. } => "movable_set",
            OpContent::TextInsert { .. } => "text_insert",
            OpContent::Delete { .. } => "delete",
            OpContent::Mark { .. } => "mark",
            OpContent::TreeCreate { .. } => "tree_create",
            OpContent::TreeMove { .. } => "tree_move",
            OpContent::CounterAdd { .. } => "counter_add",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Op {
    pub id: Id,
    pub container: ContainerId,
    pub content: OpContent,
}

impl Op {
    /// Number of clock ticks the operation occupies.
    pub fn span(&self) -> u64 {
        match &self.content {
            OpContent::TextInsert { text, .. } => text.chars().count().max(1) as u64,
            _ => 1,
        }
    }

    pub fn last_id(&self) -> Id {
        self.id.offset(self.span() - 1)
    }
}

const OP_MAP_SET: u8 = 0;
const OP_LIST_INSERT: u8 = 1;
const OP_MOVABLE_INSERT: u8 = 2;
const OP_MOVABLE_MOVE: u8 = 3;
const OP_MOVABLE_SET: u8 = 4;
const OP_TEXT_INSERT: u8 = 5;
const OP_DELETE: u8 = 6;
const OP_MARK: u8 = 7;
const OP_TREE_CREATE: u8 = 8;
const OP_TREE_MOVE: u8 = 9;
const OP_COUNTER_ADD: u8 = 10;

pub(crate) fn write_container(w: &mut Writer, cid: &ContainerId) {
    match cid {
        ContainerId::Root { name, kind } => {
            w.u8(0);
            w.str(name);
            w.u8(kind.code());
        }
        ContainerId::Normal { id, kind } => {
            w.u8(1);
            w.id(*id);
            w.u8(kind.code());
        }
    }
}

pub(crate) fn read_container(r: &mut Reader<'_>) -> Result<ContainerId, DecodeError> {
    let tag = r.u8().ok_or(DecodeError::Truncated("container id"))?;
    match tag {
        0 => {
            let name = r.str().ok_or(DecodeError::Truncated("container name"))?;
            let kind = read_kind(r)?;
            Ok(ContainerId::root(name, kind))
        }
        1 => {
            let id = r.id().ok_or(DecodeError::Truncated("container id"))?;
            let kind = read_kind(r)?;
            Ok(ContainerId::Normal { id, kind })
        }
        other => Err(DecodeError::InvalidTag {
            what: "container id",
            tag: other,
        }),
    }
}

pub(crate) fn read_kind(r: &mut Reader<'_>) -> Result<ContainerKind, DecodeError> {
    let code = r.u8().ok_or(DecodeError::Truncated("container kind"))?;
    ContainerKind::from_code(code).ok_or(DecodeError::InvalidTag {
        what: "container kind",
        tag: code,
    })
}

pub(crate) fn write_value(w: &mut Writer, value: &Value) -> Result<(), ValueCodecError> {
    w.bytes(&value.encode_cbor()?);
    Ok(())
}

pub(crate) fn read_value(r: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let raw = r.bytes().ok_or(DecodeError::Truncated("value"))?;
    Ok(Value::decode_cbor(raw)?)
}

fn write_slot(w: &mut Writer, slot: &Slot) -> Result<(), ValueCodecError> {
    match slot {
        Slot::Value(v) => {
            w.u8(0);
            write_value(w, v)?;
        }
        Slot::Container(kind) => {
            w.u8(1);
            w.u8(kind.code());
        }
    }
    Ok(())
}

fn read_slot(r: &mut Reader<'_>) -> Result<Slot, DecodeError> {
    match r.u8().ok_or(DecodeError::Truncated("slot"))? {
        0 => Ok(Slot::Value(read_value(r)?)),
        1 => Ok(Slot::Container(read_kind(r)?)),
        other => Err(DecodeError::InvalidTag { what: "slot", tag: other }),
    }
}

pub(crate) fn write_anchor(w: &mut Writer, anchor: Anchor) {
    match anchor {
        Anchor::Start => w.u8(0),
        Anchor::End => w.u8(1),
        Anchor::Before(id) => {
            w.u8(2);
            w.id(id);
        }
        Anchor::After(id) => {
            w.u8(3);
            w.id(id);
        }
    }
}

pub(crate) fn read_anchor(r: &mut Reader<'_>) -> Result<Anchor, DecodeError> {
    let tag = r.u8().ok_or(DecodeError::Truncated("anchor"))?;
    Ok(match tag {
        0 => Anchor::Start,
        1 => Anchor::End,
        2 => Anchor::Before(r.id().ok_or(DecodeError::Truncated("anchor"))?),
        3 => Anchor::After(r.id().ok_or(DecodeError::Truncated("anchor"))?),
        other => return Err(DecodeError::InvalidTag { what: "anchor", tag: other }),
    })
}

pub(crate) fn write_tree_parent(w: &mut Writer, parent: TreeParent) {
    match parent {
        TreeParent::Root => w.u8(0),
        TreeParent::Node(id) => {
            w.u8(1);
            w.id(id);
        }
        TreeParent::Deleted => w.u8(2),
    }
}

pub(crate) fn read_tree_parent(r: &mut Reader<'_>) -> Result<TreeParent, DecodeError> {
    let tag = r.u8().ok_or(DecodeError::Truncated("tree parent"))?;
    Ok(match tag {
        0 => TreeParent::Root,
        1 => TreeParent::Node(r.id().ok_or(DecodeError::Truncated("tree parent"))?),
        2 => TreeParent::Deleted,
        other => {
            return Err(DecodeError::InvalidTag {
                what: "tree parent",
                tag: other,
            })
        }
    })
}

pub(crate) fn write_position(w: &mut Writer, position: Option<&[u8]>) {
    match position {
        Some(p) => {
            w.u8(1);
            w.bytes(p);
        }
        None => w.u8(0),
    }
}

pub(crate) fn read_position(r: &mut Reader<'_>) -> Result<Option<Vec<u8>>, DecodeError> {
    match r.u8().ok_or(DecodeError::Truncated("position"))? {
        0 => Ok(None),
        1 => Ok(Some(
            r.bytes()
                .ok_or(DecodeError::Truncated("position"))?
                .to_vec(),
        )),
        other => Err(DecodeError::InvalidTag {
            what: "position",
            tag: other,
        }),
    }
}

pub(crate) fn encode_op(w: &mut Writer, op: &Op) -> Result<(), ValueCodecError> {
    w.id(op.id);
    write_container(w, &op.container);
    match &op.content {
        OpContent::MapSet { key, value } => {
            w.u8(OP_MAP_SET);
            w.str(key);
            match value {
                Some(slot) => {
                    w.u8(1);
                    write_slot(w, slot)?;
                }
                None => w.u8(0),
            }
        }
        OpContent::ListInsert { reference, value } => {
            w.u8(OP_LIST_INSERT);
            w.opt_id(*reference);
            write_slot(w, value)?;
        }
        OpContent::MovableInsert { reference, value } => {
            w.u8(OP_MOVABLE_INSERT);
            w.opt_id(*reference);
            write_slot(w, value)?;
        }
        OpContent::MovableMove { elem, reference } => {
            w.u8(OP_MOVABLE_MOVE);
            w.id(*elem);
            w.opt_id(*reference);
        }
        OpContent::MovableSet { elem, value } => {
            w.u8(OP_MOVABLE_SET);
            w.id(*elem);
            write_slot(w, value)?;
        }
        OpContent::TextInsert { reference, text } => {
            w.u8(OP_TEXT_INSERT);
            w.opt_id(*reference);
            w.str(text);
        }
        OpContent::Delete { targets } => {
            w.u8(OP_DELETE);
            w.usize(targets.len());
            for t in targets {
                w.id(*t);
            }
        }
        OpContent::Mark {
            start,
            end,
            key,
            value,
        } => {
            w.u8(OP_MARK);
            write_anchor(w, *start);
            write_anchor(w, *end);
            w.str(key);
            write_value(w, value)?;
        }
        OpContent::TreeCreate { parent, position } => {
            w.u8(OP_TREE_CREATE);
            write_tree_parent(w, *parent);
            write_position(w, position.as_deref());
        }
        OpContent::TreeMove {
            target,
            parent,
            position,
        } => {
            w.u8(OP_TREE_MOVE);
            w.id(*target);
            write_tree_parent(w, *parent);
            write_position(w, position.as_deref());
        }
        OpContent::CounterAdd { delta } => {
            w.u8(OP_COUNTER_ADD);
            w.f64(*delta);
        }
    }
    Ok(())
}

pub(crate) fn decode_op(r: &mut Reader<'_>) -> Result<Op, DecodeError> {
    let id = r.id().ok_or(DecodeError::Truncated("op id"))?;
    let container = read_container(r)?;
    let code = r.u8().ok_or(DecodeError::Truncated("op code"))?;
    let content = match code {
        OP_MAP_SET => {
            let key = r.str().ok_or(DecodeError::Truncated("map key"))?.to_string();
            let value = match r.u8().ok_or(DecodeError::Truncated("map value"))? {
                0 => None,
                1 => Some(read_slot(r)?),
                other => {
                    return Err(DecodeError::InvalidTag {
                        what: "map value",
                        tag: other,
                    })
                }
            };
            OpContent::MapSet { key, value }
        }
        OP_LIST_INSERT => OpContent::ListInsert {
            reference: r.opt_id().ok_or(DecodeError::Truncated("reference"))?,
            value: read_slot(r)?,
        },
        OP_MOVABLE_INSERT => OpContent::MovableInsert {
            reference: r.opt_id().ok_or(DecodeError::Truncated("reference"))?,
            value: read_slot(r)?,
        },
        OP_MOVABLE_MOVE => OpContent::MovableMove {
            elem: r.id().ok_or(DecodeError::Truncated("element id"))?,
            reference: r.opt_id().ok_or(DecodeError::Truncated("reference"))?,
        },
        OP_MOVABLE_SET => OpContent::MovableSet {
            elem: r.id().ok_or(DecodeError::Truncated("element id"))?,
            value: read_slot(r)?,
        },
        OP_TEXT_INSERT => OpContent::TextInsert {
            reference: r.opt_id().ok_or(DecodeError::Truncated("reference"))?,
            text: r.str().ok_or(DecodeError::Truncated("text"))?.to_string(),
        },
        OP_DELETE => {
            let len = r.usize().ok_or(DecodeError::Truncated("delete targets"))?;
            let mut targets = Vec::with_capacity(len.min(1024));
            for _ in 0..len {
                targets.push(r.id().ok_or(DecodeError::Truncated("delete targets"))?);
            }
            OpContent::Delete { targets }
        }
        OP_MARK => OpContent::Mark {
            start: read_anchor(r)?,
            end: read_anchor(r)?,
            key: r.str().ok_or(DecodeError::Truncated("mark key"))?.to_string(),
            value: read_value(r)?,
        },
        OP_TREE_CREATE => OpContent::TreeCreate {
            parent: read_tree_parent(r)?,
            position: read_position(r)?,
        },
        OP_TREE_MOVE => OpContent::TreeMove {
            target: r.id().ok_or(DecodeError::Truncated("tree target"))?,
            parent: read_tree_parent(r)?,
            position: read_position(r)?,
        },
        OP_COUNTER_ADD => OpContent::CounterAdd {
            delta: r.f64().ok_or(DecodeError::Truncated("counter delta"))?,
        },
        other => return Err(DecodeError::InvalidTag { what: "op code", tag: other }),
    };
    Ok(Op {
        id,
        container,
        content,
    })
}
