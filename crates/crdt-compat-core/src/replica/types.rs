use crate::container::{ContainerId, ContainerKind};
use crate::id::Id;
use crate::op::{Anchor, TreeParent};
use crate::value::Value;
use std::collections::BTreeMap;

/// Content of a map entry or sequence element.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Child {
    Value(Value),
    Container(ContainerId),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MapEntry {
    /// `None` once the key was deleted.
    pub(crate) value: Option<Child>,
    pub(crate) stamp: Id,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MapState {
    pub(crate) entries: BTreeMap<String, MapEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListAtom {
    pub(crate) slot: Id,
    pub(crate) value: Option<Child>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ListState {
    pub(crate) atoms: Vec<ListAtom>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TextAtom {
    pub(crate) slot: Id,
    pub(crate) ch: Option<char>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MarkRecord {
    pub(crate) id: Id,
    pub(crate) start: Anchor,
    pub(crate) end: Anchor,
    pub(crate) key: String,
    /// `Value::Null` removes the style.
    pub(crate) value: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TextState {
    pub(crate) atoms: Vec<TextAtom>,
    /// Sorted by id.
    pub(crate) marks: Vec<MarkRecord>,
}

/// A position in a movable list. Only the slot an element currently points
/// at is visible; slots left behind by moves stay as placeholders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MovableSlot {
    pub(crate) slot: Id,
    pub(crate) elem: Id,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MovableElem {
    pub(crate) value: Child,
    pub(crate) value_stamp: Id,
    pub(crate) pos: Id,
    pub(crate) pos_stamp: Id,
    pub(crate) deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MovableState {
    pub(crate) slots: Vec<MovableSlot>,
    pub(crate) elems: BTreeMap<Id, MovableElem>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TreeRecord {
    pub(crate) stamp: Id,
    pub(crate) target: Id,
    pub(crate) parent: TreeParent,
    pub(crate) position: Option<Vec<u8>>,
    pub(crate) create: bool,
}

/// Tree structure is the replay of its move log in stamp order, so replicas
/// holding the same records resolve to the same forest.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TreeState {
    /// Sorted by stamp.
    pub(crate) records: Vec<TreeRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CounterState {
    pub(crate) value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ContainerState {
    Map(MapState),
    List(ListState),
    MovableList(MovableState),
    Text(TextState),
    Tree(TreeState),
    Counter(CounterState),
}

impl ContainerState {
    pub(crate) fn new(kind: ContainerKind) -> Self {
        match kind {
            ContainerKind::Map => ContainerState::Map(MapState::default()),
            ContainerKind::List => ContainerState::List(ListState::default()),
            ContainerKind::MovableList => ContainerState::MovableList(MovableState::default()),
            ContainerKind::Text => ContainerState::Text(TextState::default()),
            ContainerKind::Tree => ContainerState::Tree(TreeState::default()),
            ContainerKind::Counter => ContainerState::Counter(CounterState::default()),
        }
    }

    pub(crate) fn kind(&self) -> ContainerKind {
        match self {
            ContainerState::Map(_) => ContainerKind::Map,
            ContainerState::List(_) => ContainerKind::List,
            ContainerState::MovableList(_) => ContainerKind::MovableList,
            ContainerState::Text(_) => ContainerKind::Text,
            ContainerState::Tree(_) => ContainerKind::Tree,
            ContainerState::Counter(_) => ContainerKind::Counter,
        }
    }
}

impl MovableState {
    /// Slots that currently host a live element, in list order.
    pub(crate) fn visible(&self) -> impl Iterator<Item = &MovableSlot> + '_ {
        self.slots.iter().filter(|s| {
            self.elems
                .get(&s.elem)
                .is_some_and(|e| !e.deleted && e.pos == s.slot)
        })
    }
}
