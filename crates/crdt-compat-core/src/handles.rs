//! Typed container handles over any `Document`.
//!
//! ```ignore
//! let profile = doc.get_map("profile");
//! doc.map(&profile).insert("name", "Alice")?;
//! let tags = doc.map(&profile).insert_container("tags", ContainerKind::List)?;
//! doc.list(&tags).push("rust")?;
//! ```

use crate::container::{ContainerId, ContainerKind};
use crate::engine::{Applied, Document, EngineError, Operation};
use crate::id::Id;
use crate::value::Value;

fn container(op: &'static str, applied: Applied) -> Result<ContainerId, EngineError> {
    match applied {
        Applied::Container(cid) => Ok(cid),
        got => Err(EngineError::UnexpectedResult { op, got }),
    }
}

fn node(op: &'static str, applied: Applied) -> Result<Id, EngineError> {
    match applied {
        Applied::Node(id) => Ok(id),
        got => Err(EngineError::UnexpectedResult { op, got }),
    }
}

pub trait DocumentExt: Document {
    fn get_map(&self, name: &str) -> ContainerId {
        self.root_container(ContainerKind::Map, name)
    }

    fn get_list(&self, name: &str) -> ContainerId {
        self.root_container(ContainerKind::List, name)
    }

    fn get_movable_list(&self, name: &str) -> ContainerId {
        self.root_container(ContainerKind::MovableList, name)
    }

    fn get_text(&self, name: &str) -> ContainerId {
        self.root_container(ContainerKind::Text, name)
    }

    fn get_tree(&self, name: &str) -> ContainerId {
        self.root_container(ContainerKind::Tree, name)
    }

    fn get_counter(&self, name: &str) -> ContainerId {
        self.root_container(ContainerKind::Counter, name)
    }

    fn map<'a>(&'a mut self, id: &ContainerId) -> MapHandle<'a, Self> {
        MapHandle { doc: self, id: id.clone() }
    }

    fn list<'a>(&'a mut self, id: &ContainerId) -> ListHandle<'a, Self> {
        ListHandle { doc: self, id: id.clone() }
    }

    fn movable_list<'a>(&'a mut self, id: &ContainerId) -> MovableListHandle<'a, Self> {
        MovableListHandle { doc: self, id: id.clone() }
    }

    fn text<'a>(&'a mut self, id: &ContainerId) -> TextHandle<'a, Self> {
        TextHandle { doc: self, id: id.clone() }
    }

    fn tree<'a>(&'a mut self, id: &ContainerId) -> TreeHandle<'a, Self> {
        TreeHandle { doc: self, id: id.clone() }
    }

    fn counter<'a>(&'a mut self, id: &ContainerId) -> CounterHandle<'a, Self> {
        CounterHandle { doc: self, id: id.clone() }
    }
}

impl<D: Document + ?Sized> DocumentExt for D {}

pub struct MapHandle<'a, D: ?Sized> {
    doc: &'a mut D,
    id: ContainerId,
}

impl<D: Document + ?Sized> MapHandle<'_, D> {
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Result<(), EngineError> {
        let op = Operation::MapInsert {
            key: key.to_string(),
            value: value.into(),
        };
        self.doc.apply(&self.id, op).map(drop)
    }

    pub fn insert_container(&mut self, key: &str, kind: ContainerKind) -> Result<ContainerId, EngineError> {
        let op = Operation::MapInsertContainer {
            key: key.to_string(),
            kind,
        };
        container("map.insert_container", self.doc.apply(&self.id, op)?)
    }

    pub fn delete(&mut self, key: &str) -> Result<(), EngineError> {
        let op = Operation::MapDelete { key: key.to_string() };
        self.doc.apply(&self.id, op).map(drop)
    }
}

pub struct ListHandle<'a, D: ?Sized> {
    doc: &'a mut D,
    id: ContainerId,
}

impl<D: Document + ?Sized> ListHandle<'_, D> {
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<(), EngineError> {
        let op = Operation::ListInsert {
            index,
            value: value.into(),
        };
        self.doc.apply(&self.id, op).map(drop)
    }

    /// Appends at the current end of the list.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<(), EngineError> {
        let index = self.len();
        self.insert(index, value)
    }

    pub fn insert_container(&mut self, index: usize, kind: ContainerKind) -> Result<ContainerId, EngineError> {
        let op = Operation::ListInsertContainer { index, kind };
        container("list.insert_container", self.doc.apply(&self.id, op)?)
    }

    pub fn delete(&mut self, index: usize, len: usize) -> Result<(), EngineError> {
        self.doc
            .apply(&self.id, Operation::ListDelete { index, len })
            .map(drop)
    }

    pub fn len(&self) -> usize {
        self.doc.container_len(&self.id)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct MovableListHandle<'a, D: ?Sized> {
    doc: &'a mut D,
    id: ContainerId,
}

impl<D: Document + ?Sized> MovableListHandle<'_, D> {
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<(), EngineError> {
        let op = Operation::MovableInsert {
            index,
            value: value.into(),
        };
        self.doc.apply(&self.id, op).map(drop)
    }

    pub fn push(&mut self, value: impl Into<Value>) -> Result<(), EngineError> {
        let index = self.doc.container_len(&self.id);
        self.insert(index, value)
    }

    pub fn insert_container(&mut self, index: usize, kind: ContainerKind) -> Result<ContainerId, EngineError> {
        let op = Operation::MovableInsertContainer { index, kind };
        container("movable_list.insert_container", self.doc.apply(&self.id, op)?)
    }

    pub fn move_to(&mut self, from: usize, to: usize) -> Result<(), EngineError> {
        self.doc
            .apply(&self.id, Operation::MovableMove { from, to })
            .map(drop)
    }

    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<(), EngineError> {
        let op = Operation::MovableSet {
            index,
            value: value.into(),
        };
        self.doc.apply(&self.id, op).map(drop)
    }

    pub fn delete(&mut self, index: usize, len: usize) -> Result<(), EngineError> {
        self.doc
            .apply(&self.id, Operation::MovableDelete { index, len })
            .map(drop)
    }
}

pub struct TextHandle<'a, D: ?Sized> {
    doc: &'a mut D,
    id: ContainerId,
}

impl<D: Document + ?Sized> TextHandle<'_, D> {
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn insert(&mut self, pos: usize, text: &str) -> Result<(), EngineError> {
        let op = Operation::TextInsert {
            pos,
            text: text.to_string(),
        };
        self.doc.apply(&self.id, op).map(drop)
    }

    pub fn delete(&mut self, pos: usize, len: usize) -> Result<(), EngineError> {
        self.doc
            .apply(&self.id, Operation::TextDelete { pos, len })
            .map(drop)
    }

    pub fn len(&self) -> usize {
        self.doc.container_len(&self.id)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mark(&mut self, start: usize, end: usize, key: &str, value: impl Into<Value>) -> Result<(), EngineError> {
        let op = Operation::TextMark {
            start,
            end,
            key: key.to_string(),
            value: value.into(),
        };
        self.doc.apply(&self.id, op).map(drop)
    }

    pub fn unmark(&mut self, start: usize, end: usize, key: &str) -> Result<(), EngineError> {
        let op = Operation::TextUnmark {
            start,
            end,
            key: key.to_string(),
        };
        self.doc.apply(&self.id, op).map(drop)
    }
}

pub struct TreeHandle<'a, D: ?Sized> {
    doc: &'a mut D,
    id: ContainerId,
}

impl<D: Document + ?Sized> TreeHandle<'_, D> {
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Appends a node under `parent`, or as a root node.
    pub fn create(&mut self, parent: Option<Id>) -> Result<Id, EngineError> {
        let op = Operation::TreeCreate { parent, index: None };
        node("tree.create", self.doc.apply(&self.id, op)?)
    }

    pub fn create_at(&mut self, parent: Option<Id>, index: usize) -> Result<Id, EngineError> {
        let op = Operation::TreeCreate {
            parent,
            index: Some(index),
        };
        node("tree.create", self.doc.apply(&self.id, op)?)
    }

    pub fn move_to(&mut self, target: Id, parent: Option<Id>, index: Option<usize>) -> Result<(), EngineError> {
        let op = Operation::TreeMove {
            node: target,
            parent,
            index,
        };
        self.doc.apply(&self.id, op).map(drop)
    }

    pub fn delete(&mut self, target: Id) -> Result<(), EngineError> {
        self.doc
            .apply(&self.id, Operation::TreeDelete { node: target })
            .map(drop)
    }

    /// Metadata map attached to `target`.
    pub fn meta(&mut self, target: Id) -> Result<ContainerId, EngineError> {
        container(
            "tree.meta",
            self.doc.apply(&self.id, Operation::TreeMeta { node: target })?,
        )
    }

    pub fn enable_fractional_index(&mut self) -> Result<(), EngineError> {
        self.doc.set_fractional_index(&self.id, true)
    }

    pub fn disable_fractional_index(&mut self) -> Result<(), EngineError> {
        self.doc.set_fractional_index(&self.id, false)
    }
}

pub struct CounterHandle<'a, D: ?Sized> {
    doc: &'a mut D,
    id: ContainerId,
}

impl<D: Document + ?Sized> CounterHandle<'_, D> {
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn increment(&mut self, delta: f64) -> Result<(), EngineError> {
        self.doc
            .apply(&self.id, Operation::CounterIncrement { delta })
            .map(drop)
    }

    pub fn decrement(&mut self, delta: f64) -> Result<(), EngineError> {
        self.increment(-delta)
    }
}
