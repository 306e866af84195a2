use crate::id::Id;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerKind {
    Map,
    List,
    MovableList,
    Text,
    Tree,
    Counter,
}

impl ContainerKind {
    pub(crate) fn code(self) -> u8 {
        match self {
            ContainerKind::Map => 0,
            ContainerKind::List => 1,
            ContainerKind::MovableList => 2,
            ContainerKind::Text => 3,
            ContainerKind::Tree => 4,
            ContainerKind::Counter => 5,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => ContainerKind::Map,
            1 => ContainerKind::List,
            2 => ContainerKind::MovableList,
            3 => ContainerKind::Text,
            4 => ContainerKind::Tree,
            5 => ContainerKind::Counter,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Map => "Map",
            ContainerKind::List => "List",
            ContainerKind::MovableList => "MovableList",
            ContainerKind::Text => "Text",
            ContainerKind::Tree => "Tree",
            ContainerKind::Counter => "Counter",
        }
    }
}

/// Container identity. Root containers are addressed by name; nested
/// containers by the id of the operation that created them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerId {
    Root { name: String, kind: ContainerKind },
    Normal { id: Id, kind: ContainerKind },
}

impl ContainerId {
    pub fn root(name: impl Into<String>, kind: ContainerKind) -> Self {
        ContainerId::Root {
            name: name.into(),
            kind,
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            ContainerId::Root { kind, .. } | ContainerId::Normal { kind, .. } => *kind,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, ContainerId::Root { .. })
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerId::Root { name, kind } => write!(f, "cid:root-{}:{}", name, kind.name()),
            ContainerId::Normal { id, kind } => write!(f, "cid:{}:{}", id, kind.name()),
        }
    }
}
