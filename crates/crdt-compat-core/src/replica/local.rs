//! Positional edits.
//!
//! Indices are resolved against the current visible state and turned into
//! identifier-addressed operations before they are committed.

use crate::container::{ContainerId, ContainerKind};
use crate::engine::{Applied, Operation};
use crate::fractional_index;
use crate::id::Id;
use crate::op::{OpContent, Slot, TreeParent};
use crate::value::Value;

use super::tree::ResolvedTree;
use super::types::{ContainerState, MovableSlot, TextState};
use super::{Replica, ReplicaError};

fn check_index(index: usize, len: usize) -> Result<(), ReplicaError> {
    if index > len {
        return Err(ReplicaError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

fn check_range(start: usize, end: usize, len: usize) -> Result<(), ReplicaError> {
    if start > end || end > len {
        return Err(ReplicaError::InvalidRange { start, end, len });
    }
    Ok(())
}

fn tree_parent(parent: Option<Id>) -> TreeParent {
    parent.map_or(TreeParent::Root, TreeParent::Node)
}

impl Replica {
    /// Applies one positional operation to `target`.
    pub fn apply(&mut self, target: &ContainerId, op: Operation) -> Result<Applied, ReplicaError> {
        let expected = op.target_kind();
        if target.kind() != expected {
            return Err(ReplicaError::KindMismatch {
                container: target.to_string(),
                expected: expected.name(),
                actual: target.kind().name(),
            });
        }
        let cid = target.clone();

        match op {
            Operation::MapInsert { key, value } => {
                self.commit(cid, OpContent::MapSet { key, value: Some(Slot::Value(value)) })?;
                Ok(Applied::Done)
            }
            Operation::MapInsertContainer { key, kind } => {
                let id = self.commit(
                    cid,
                    OpContent::MapSet {
                        key,
                        value: Some(Slot::Container(kind)),
                    },
                )?;
                Ok(Applied::Container(ContainerId::Normal { id, kind }))
            }
            Operation::MapDelete { key } => {
                self.commit(cid, OpContent::MapSet { key, value: None })?;
                Ok(Applied::Done)
            }
            Operation::ListInsert { index, value } => {
                self.list_insert(cid, index, Slot::Value(value))?;
                Ok(Applied::Done)
            }
            Operation::ListInsertContainer { index, kind } => {
                let id = self.list_insert(cid, index, Slot::Container(kind))?;
                Ok(Applied::Container(ContainerId::Normal { id, kind }))
            }
            Operation::ListDelete { index, len } => {
                let visible = self.list_visible(&cid);
                check_range(index, index.saturating_add(len), visible.len())?;
                if len > 0 {
                    let targets = visible[index..index + len].to_vec();
                    self.commit(cid, OpContent::Delete { targets })?;
                }
                Ok(Applied::Done)
            }
            Operation::MovableInsert { index, value } => {
                self.movable_insert(cid, index, Slot::Value(value))?;
                Ok(Applied::Done)
            }
            Operation::MovableInsertContainer { index, kind } => {
                let id = self.movable_insert(cid, index, Slot::Container(kind))?;
                Ok(Applied::Container(ContainerId::Normal { id, kind }))
            }
            Operation::MovableMove { from, to } => {
                let visible = self.movable_visible(&cid);
                let len = visible.len();
                if from >= len {
                    return Err(ReplicaError::IndexOutOfBounds { index: from, len });
                }
                if to >= len {
                    return Err(ReplicaError::IndexOutOfBounds { index: to, len });
                }
                if from == to {
                    return Ok(Applied::Done);
                }
                let elem = visible[from].elem;
                let rest = visible
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != from)
                    .map(|(_, s)| s.slot)
                    .collect::<Vec<_>>();
                let reference = to.checked_sub(1).map(|i| rest[i]);
                self.commit(cid, OpContent::MovableMove { elem, reference })?;
                Ok(Applied::Done)
            }
            Operation::MovableSet { index, value } => {
                let elem = self.movable_elem_at(&cid, index)?;
                self.commit(
                    cid,
                    OpContent::MovableSet {
                        elem,
                        value: Slot::Value(value),
                    },
                )?;
                Ok(Applied::Done)
            }
            Operation::MovableDelete { index, len } => {
                let visible = self.movable_visible(&cid);
                check_range(index, index.saturating_add(len), visible.len())?;
                if len > 0 {
                    let targets = visible[index..index + len].iter().map(|s| s.elem).collect();
                    self.commit(cid, OpContent::Delete { targets })?;
                }
                Ok(Applied::Done)
            }
            Operation::TextInsert { pos, text } => {
                let visible = self.text_visible(&cid);
                check_index(pos, visible.len())?;
                if !text.is_empty() {
                    let reference = pos.checked_sub(1).map(|i| visible[i]);
                    self.commit(cid, OpContent::TextInsert { reference, text })?;
                }
                Ok(Applied::Done)
            }
            Operation::TextDelete { pos, len } => {
                let visible = self.text_visible(&cid);
                check_range(pos, pos.saturating_add(len), visible.len())?;
                if len > 0 {
                    let targets = visible[pos..pos + len].to_vec();
                    self.commit(cid, OpContent::Delete { targets })?;
                }
                Ok(Applied::Done)
            }
            Operation::TextMark {
                start,
                end,
                key,
                value,
            } => {
                self.mark(cid, start, end, key, value)?;
                Ok(Applied::Done)
            }
            Operation::TextUnmark { start, end, key } => {
                self.mark(cid, start, end, key, Value::Null)?;
                Ok(Applied::Done)
            }
            Operation::TreeCreate { parent, index } => {
                let resolved = self.resolved_tree(&cid);
                if let Some(p) = parent {
                    self.check_alive(&resolved, p)?;
                }
                let parent = tree_parent(parent);
                let position = self.tree_position(&cid, &resolved, parent, index, None)?;
                let id = self.commit(cid, OpContent::TreeCreate { parent, position })?;
                Ok(Applied::Node(id))
            }
            Operation::TreeMove {
                node,
                parent,
                index,
            } => {
                let resolved = self.resolved_tree(&cid);
                self.check_alive(&resolved, node)?;
                if let Some(p) = parent {
                    self.check_alive(&resolved, p)?;
                    if resolved.is_ancestor_or_self(node, p) {
                        return Err(ReplicaError::Cycle { node, parent: p });
                    }
                }
                let parent = tree_parent(parent);
                let position = self.tree_position(&cid, &resolved, parent, index, Some(node))?;
                self.commit(
                    cid,
                    OpContent::TreeMove {
                        target: node,
                        parent,
                        position,
                    },
                )?;
                Ok(Applied::Done)
            }
            Operation::TreeDelete { node } => {
                let resolved = self.resolved_tree(&cid);
                self.check_alive(&resolved, node)?;
                self.commit(
                    cid,
                    OpContent::TreeMove {
                        target: node,
                        parent: TreeParent::Deleted,
                        position: None,
                    },
                )?;
                Ok(Applied::Done)
            }
            Operation::TreeMeta { node } => {
                if !self.resolved_tree(&cid).contains(node) {
                    return Err(ReplicaError::UnknownNode(node));
                }
                Ok(Applied::Container(ContainerId::Normal {
                    id: node,
                    kind: ContainerKind::Map,
                }))
            }
            Operation::CounterIncrement { delta } => {
                self.commit(cid, OpContent::CounterAdd { delta })?;
                Ok(Applied::Done)
            }
        }
    }

    fn list_insert(&mut self, cid: ContainerId, index: usize, value: Slot) -> Result<Id, ReplicaError> {
        let visible = self.list_visible(&cid);
        check_index(index, visible.len())?;
        let reference = index.checked_sub(1).map(|i| visible[i]);
        self.commit(cid, OpContent::ListInsert { reference, value })
    }

    fn movable_insert(&mut self, cid: ContainerId, index: usize, value: Slot) -> Result<Id, ReplicaError> {
        let visible = self.movable_visible(&cid);
        check_index(index, visible.len())?;
        let reference = index.checked_sub(1).map(|i| visible[i].slot);
        self.commit(cid, OpContent::MovableInsert { reference, value })
    }

    fn movable_elem_at(&self, cid: &ContainerId, index: usize) -> Result<Id, ReplicaError> {
        let visible = self.movable_visible(cid);
        visible
            .get(index)
            .map(|s| s.elem)
            .ok_or(ReplicaError::IndexOutOfBounds {
                index,
                len: visible.len(),
            })
    }

    fn mark(
        &mut self,
        cid: ContainerId,
        start: usize,
        end: usize,
        key: String,
        value: Value,
    ) -> Result<(), ReplicaError> {
        let expand = self.text_style(&key);
        let (start_anchor, end_anchor) = match self.state(&cid) {
            Some(ContainerState::Text(text)) => {
                check_mark_range(text, start, end)?;
                text.anchors_for(start, end, expand)
            }
            _ => return Err(ReplicaError::InvalidRange { start, end, len: 0 }),
        };
        self.commit(
            cid,
            OpContent::Mark {
                start: start_anchor,
                end: end_anchor,
                key,
                value,
            },
        )?;
        Ok(())
    }

    pub(crate) fn list_visible(&self, cid: &ContainerId) -> Vec<Id> {
        match self.state(cid) {
            Some(ContainerState::List(list)) => list
                .atoms
                .iter()
                .filter(|a| a.value.is_some())
                .map(|a| a.slot)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn movable_visible(&self, cid: &ContainerId) -> Vec<MovableSlot> {
        match self.state(cid) {
            Some(ContainerState::MovableList(mov)) => mov.visible().copied().collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn text_visible(&self, cid: &ContainerId) -> Vec<Id> {
        match self.state(cid) {
            Some(ContainerState::Text(text)) => text.visible_ids(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn resolved_tree(&self, cid: &ContainerId) -> ResolvedTree {
        match self.state(cid) {
            Some(ContainerState::Tree(tree)) => tree.resolve(),
            _ => ResolvedTree::default(),
        }
    }

    fn check_alive(&self, resolved: &ResolvedTree, node: Id) -> Result<(), ReplicaError> {
        if !resolved.contains(node) {
            return Err(ReplicaError::UnknownNode(node));
        }
        if !resolved.is_alive(node) {
            return Err(ReplicaError::DeletedNode(node));
        }
        Ok(())
    }

    /// Sibling key for placing a node at `index` under `parent`. `moving` is
    /// left out of the sibling list so a node can be moved among its own
    /// siblings.
    fn tree_position(
        &self,
        tree: &ContainerId,
        resolved: &ResolvedTree,
        parent: TreeParent,
        index: Option<usize>,
        moving: Option<Id>,
    ) -> Result<Option<Vec<u8>>, ReplicaError> {
        let siblings = resolved
            .children(parent)
            .into_iter()
            .filter(|c| Some(*c) != moving)
            .collect::<Vec<_>>();
        let index = index.unwrap_or(siblings.len());
        check_index(index, siblings.len())?;
        if !self.fractional_index_enabled(tree) {
            return Ok(None);
        }
        let left = index
            .checked_sub(1)
            .and_then(|i| resolved.position(siblings[i]));
        let right = siblings.get(index).and_then(|s| resolved.position(*s));
        Ok(Some(fractional_index::between(left, right)))
    }
}

fn check_mark_range(text: &TextState, start: usize, end: usize) -> Result<(), ReplicaError> {
    let len = text.len();
    if start >= end || end > len {
        return Err(ReplicaError::InvalidRange { start, end, len });
    }
    Ok(())
}
