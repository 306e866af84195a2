//! Oracle interface.
//!
//! The harness only talks to an engine through `Engine` and `Document`:
//! create a document, address root containers, apply positional operations,
//! export and import bytes, and project to JSON. `ReplicaEngine` plugs the
//! bundled replica in.

use crate::container::{ContainerId, ContainerKind};
use crate::export::ExportMode;
use crate::id::{Frontiers, Id, PeerId};
use crate::replica::{ExpandType, Replica};
use crate::value::Value;
use serde_json::Value as JsonValue;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A positional edit against one container.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    MapInsert { key: String, value: Value },
    MapInsertContainer { key: String, kind: ContainerKind },
    MapDelete { key: String },
    ListInsert { index: usize, value: Value },
    ListInsertContainer { index: usize, kind: ContainerKind },
    ListDelete { index: usize, len: usize },
    MovableInsert { index: usize, value: Value },
    MovableInsertContainer { index: usize, kind: ContainerKind },
    MovableMove { from: usize, to: usize },
    MovableSet { index: usize, value: Value },
    MovableDelete { index: usize, len: usize },
    TextInsert { pos: usize, text: String },
    TextDelete { pos: usize, len: usize },
    TextMark {
        start: usize,
        end: usize,
        key: String,
        value: Value,
    },
    TextUnmark {
        start: usize,
        end: usize,
        key: String,
    },
    /// `parent: None` creates a root node; `index: None` appends.
    TreeCreate {
        parent: Option<Id>,
        index: Option<usize>,
    },
    TreeMove {
        node: Id,
        parent: Option<Id>,
        index: Option<usize>,
    },
    TreeDelete { node: Id },
    /// Resolves the metadata map attached to a node.
    TreeMeta { node: Id },
    CounterIncrement { delta: f64 },
}

impl Operation {
    pub fn target_kind(&self) -> ContainerKind {
        match self {
            Operation::MapInsert { .. }
            | Operation::MapInsertContainer { .. }
            | Operation::MapDelete { .. } => ContainerKind::Map,
            Operation::ListInsert { .. }
            | Operation::ListInsertContainer { .. }
            | Operation::ListDelete { .. } => ContainerKind::List,
            Operation::MovableInsert { .. }
            | Operation::MovableInsertContainer { .. }
            | Operation::MovableMove { .. }
            | Operation::MovableSet { .. }
            | Operation::MovableDelete { .. } => ContainerKind::MovableList,
            Operation::TextInsert { .. }
            | Operation::TextDelete { .. }
            | Operation::TextMark { .. }
            | Operation::TextUnmark { .. } => ContainerKind::Text,
            Operation::TreeCreate { .. }
            | Operation::TreeMove { .. }
            | Operation::TreeDelete { .. }
            | Operation::TreeMeta { .. } => ContainerKind::Tree,
            Operation::CounterIncrement { .. } => ContainerKind::Counter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::MapInsert { .. } => "map.insert",
            Operation::MapInsertContainer { .. } => "map.insert_container",
            Operation::MapDelete { .. } => "map.delete",
            Operation::ListInsert { .. } => "list.insert",
            Operation::ListInsertContainer { .. } => "list.insert_container",
            Operation::ListDelete { .. } => "list.delete",
            Operation::MovableInsert { .. } => "movable_list.insert",
            Operation::MovableInsertContainer { .. } => "movable_list.insert_container",
            Operation::MovableMove { .. } => "movable_list.move",
            Operation::MovableSet { .. } => "movable_list.set",
            Operation::MovableDelete { .. } => "movable_list.delete",
            Operation::TextInsert { .. } => "text.insert",
            Operation::TextDelete { .. } => "text.delete",
            Operation::TextMark { .. } => "text.mark",
            Operation::TextUnmark { .. } => "text.unmark",
            Operation::TreeCreate { .. } => "tree.create",
            Operation::TreeMove { .. } => "tree.move",
            Operation::TreeDelete { .. } => "tree.delete",
            Operation::TreeMeta { .. } => "tree.meta",
            Operation::CounterIncrement { .. } => "counter.increment",
        }
    }
}

/// Outcome of `Document::apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Done,
    /// A nested container was created or resolved.
    Container(ContainerId),
    /// A tree node was created.
    Node(Id),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to create document: {0}")]
    Create(#[source] BoxError),
    #[error("{op} on {target} failed: {source}")]
    Build {
        op: &'static str,
        target: String,
        source: BoxError,
    },
    #[error("{mode} export failed: {source}")]
    Export { mode: &'static str, source: BoxError },
    #[error("import failed: {source}")]
    Import { source: BoxError },
    #[error("unexpected result from {op}: {got:?}")]
    UnexpectedResult { op: &'static str, got: Applied },
}

pub trait Document {
    fn peer(&self) -> PeerId;

    fn root_container(&self, kind: ContainerKind, name: &str) -> ContainerId {
        ContainerId::root(name, kind)
    }

    fn apply(&mut self, target: &ContainerId, op: Operation) -> Result<Applied, EngineError>;

    fn config_text_style(&mut self, key: &str, expand: ExpandType);

    fn set_fractional_index(&mut self, tree: &ContainerId, enabled: bool) -> Result<(), EngineError>;

    fn export(&self, mode: &ExportMode) -> Result<Vec<u8>, EngineError>;

    fn import(&mut self, bytes: &[u8]) -> Result<(), EngineError>;

    fn oplog_frontiers(&self) -> Frontiers;

    fn to_json(&self) -> JsonValue;

    /// Deep value of a single container.
    fn container_json(&self, cid: &ContainerId) -> JsonValue;

    /// Visible element count of a sequence, entry count of a map.
    fn container_len(&self, cid: &ContainerId) -> usize;
}

pub trait Engine {
    type Doc: Document;

    fn name(&self) -> &'static str;

    /// Creates an empty document. `None` lets the engine pick a peer.
    fn create_document(&self, peer: Option<PeerId>) -> Result<Self::Doc, EngineError>;
}

/// The bundled replica engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplicaEngine;

impl Engine for ReplicaEngine {
    type Doc = Replica;

    fn name(&self) -> &'static str {
        "replica"
    }

    fn create_document(&self, peer: Option<PeerId>) -> Result<Replica, EngineError> {
        match peer {
            Some(peer) => Replica::with_peer(peer).map_err(|e| EngineError::Create(Box::new(e))),
            None => Ok(Replica::new()),
        }
    }
}

impl Document for Replica {
    fn peer(&self) -> PeerId {
        Replica::peer(self)
    }

    fn apply(&mut self, target: &ContainerId, op: Operation) -> Result<Applied, EngineError> {
        let name = op.name();
        Replica::apply(self, target, op).map_err(|e| EngineError::Build {
            op: name,
            target: target.to_string(),
            source: Box::new(e),
        })
    }

    fn config_text_style(&mut self, key: &str, expand: ExpandType) {
        Replica::config_text_style(self, key, expand);
    }

    fn set_fractional_index(&mut self, tree: &ContainerId, enabled: bool) -> Result<(), EngineError> {
        Replica::set_fractional_index(self, tree, enabled).map_err(|e| EngineError::Build {
            op: "tree.set_fractional_index",
            target: tree.to_string(),
            source: Box::new(e),
        })
    }

    fn export(&self, mode: &ExportMode) -> Result<Vec<u8>, EngineError> {
        Replica::export(self, mode).map_err(|e| EngineError::Export {
            mode: mode.name(),
            source: Box::new(e),
        })
    }

    fn import(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        Replica::import(self, bytes)
            .map(|_| ())
            .map_err(|e| EngineError::Import { source: Box::new(e) })
    }

    fn oplog_frontiers(&self) -> Frontiers {
        Replica::oplog_frontiers(self)
    }

    fn to_json(&self) -> JsonValue {
        Replica::to_json(self)
    }

    fn container_json(&self, cid: &ContainerId) -> JsonValue {
        Replica::container_json(self, cid)
    }

    fn container_len(&self, cid: &ContainerId) -> usize {
        Replica::len(self, cid)
    }
}
