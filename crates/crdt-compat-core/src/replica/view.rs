//! JSON projection and read accessors.

use crate::container::{ContainerId, ContainerKind};
use crate::id::Id;
use crate::op::TreeParent;
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::text::DeltaSpan;
use super::tree::ResolvedTree;
use super::types::{Child, ContainerState};
use super::{Replica, ReplicaError};

fn number_json(value: f64) -> JsonValue {
    if value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
        JsonValue::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

impl Replica {
    /// Deep value of every root container that has state, keyed by name.
    pub fn to_json(&self) -> JsonValue {
        let mut out = JsonMap::new();
        for cid in self.states.keys() {
            if let ContainerId::Root { name, .. } = cid {
                out.insert(name.clone(), self.container_json(cid));
            }
        }
        JsonValue::Object(out)
    }

    /// Deep value of one container. Containers without state project as
    /// empty.
    pub fn container_json(&self, cid: &ContainerId) -> JsonValue {
        let Some(state) = self.state(cid) else {
            return match cid.kind() {
                ContainerKind::Map => JsonValue::Object(JsonMap::new()),
                ContainerKind::List | ContainerKind::MovableList | ContainerKind::Tree => {
                    JsonValue::Array(Vec::new())
                }
                ContainerKind::Text => JsonValue::String(String::new()),
                ContainerKind::Counter => JsonValue::from(0),
            };
        };
        match state {
            ContainerState::Map(map) => JsonValue::Object(
                map.entries
                    .iter()
                    .filter_map(|(k, e)| e.value.as_ref().map(|v| (k.clone(), self.child_json(v))))
                    .collect(),
            ),
            ContainerState::List(list) => JsonValue::Array(
                list.atoms
                    .iter()
                    .filter_map(|a| a.value.as_ref())
                    .map(|v| self.child_json(v))
                    .collect(),
            ),
            ContainerState::MovableList(mov) => JsonValue::Array(
                mov.visible()
                    .filter_map(|s| mov.elems.get(&s.elem))
                    .map(|e| self.child_json(&e.value))
                    .collect(),
            ),
            ContainerState::Text(text) => JsonValue::String(text.to_plain()),
            ContainerState::Tree(tree) => {
                let resolved = tree.resolve();
                JsonValue::Array(
                    resolved
                        .children(TreeParent::Root)
                        .into_iter()
                        .enumerate()
                        .map(|(i, node)| self.tree_node_json(&resolved, node, None, i))
                        .collect(),
                )
            }
            ContainerState::Counter(counter) => number_json(counter.value),
        }
    }

    fn child_json(&self, child: &Child) -> JsonValue {
        match child {
            Child::Value(v) => v.to_json(),
            Child::Container(cid) => self.container_json(cid),
        }
    }

    fn tree_node_json(
        &self,
        resolved: &ResolvedTree,
        node: Id,
        parent: Option<Id>,
        index: usize,
    ) -> JsonValue {
        let meta = ContainerId::Normal {
            id: node,
            kind: ContainerKind::Map,
        };
        let children = resolved
            .children(TreeParent::Node(node))
            .into_iter()
            .enumerate()
            .map(|(i, child)| self.tree_node_json(resolved, child, Some(node), i))
            .collect();
        let mut out = JsonMap::new();
        out.insert("id".into(), JsonValue::String(node.to_string()));
        out.insert(
            "parent".into(),
            parent.map_or(JsonValue::Null, |p| JsonValue::String(p.to_string())),
        );
        out.insert("meta".into(), self.container_json(&meta));
        out.insert("index".into(), JsonValue::from(index));
        out.insert(
            "fractional_index".into(),
            resolved
                .position(node)
                .map_or(JsonValue::Null, |p| JsonValue::String(hex::encode_upper(p))),
        );
        out.insert("children".into(), JsonValue::Array(children));
        JsonValue::Object(out)
    }

    /// Rich-text delta of a text container.
    pub fn text_delta(&self, cid: &ContainerId) -> Result<Vec<DeltaSpan>, ReplicaError> {
        match self.state(cid) {
            Some(ContainerState::Text(text)) => Ok(text.to_delta()),
            None if cid.kind() == ContainerKind::Text => Ok(Vec::new()),
            _ => Err(kind_mismatch(cid, ContainerKind::Text)),
        }
    }

    pub fn counter_value(&self, cid: &ContainerId) -> Result<f64, ReplicaError> {
        match self.state(cid) {
            Some(ContainerState::Counter(counter)) => Ok(counter.value),
            None if cid.kind() == ContainerKind::Counter => Ok(0.0),
            _ => Err(kind_mismatch(cid, ContainerKind::Counter)),
        }
    }

    /// Parent of a live tree node; `None` for roots.
    pub fn tree_parent(&self, cid: &ContainerId, node: Id) -> Result<Option<Id>, ReplicaError> {
        let resolved = self.resolved_tree(cid);
        match resolved.parent_of(node) {
            None => Err(ReplicaError::UnknownNode(node)),
            Some(_) if !resolved.is_alive(node) => Err(ReplicaError::DeletedNode(node)),
            Some(TreeParent::Node(p)) => Ok(Some(p)),
            Some(_) => Ok(None),
        }
    }

    pub fn tree_children(&self, cid: &ContainerId, parent: Option<Id>) -> Vec<Id> {
        let parent = parent.map_or(TreeParent::Root, TreeParent::Node);
        self.resolved_tree(cid).children(parent)
    }

    pub fn tree_contains_alive(&self, cid: &ContainerId, node: Id) -> bool {
        self.resolved_tree(cid).is_alive(node)
    }

    /// Number of visible elements of a sequence container.
    pub fn len(&self, cid: &ContainerId) -> usize {
        match cid.kind() {
            ContainerKind::List => self.list_visible(cid).len(),
            ContainerKind::MovableList => self.movable_visible(cid).len(),
            ContainerKind::Text => self.text_visible(cid).len(),
            ContainerKind::Map => match self.state(cid) {
                Some(ContainerState::Map(map)) => {
                    map.entries.values().filter(|e| e.value.is_some()).count()
                }
                _ => 0,
            },
            ContainerKind::Tree => {
                let resolved = self.resolved_tree(cid);
                resolved.nodes.keys().filter(|n| resolved.is_alive(**n)).count()
            }
            ContainerKind::Counter => 0,
        }
    }

    pub fn is_empty(&self, cid: &ContainerId) -> bool {
        self.len(cid) == 0
    }
}

fn kind_mismatch(cid: &ContainerId, expected: ContainerKind) -> ReplicaError {
    ReplicaError::KindMismatch {
        container: cid.to_string(),
        expected: expected.name(),
        actual: cid.kind().name(),
    }
}
