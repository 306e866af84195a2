use crate::id::Id;
use crate::op::TreeParent;
use std::collections::BTreeMap;

use super::types::{TreeRecord, TreeState};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedNode {
    pub(crate) parent: TreeParent,
    pub(crate) position: Option<Vec<u8>>,
    pub(crate) stamp: Id,
}

/// Node placement after replaying the move log.
#[derive(Debug, Default)]
pub(crate) struct ResolvedTree {
    pub(crate) nodes: BTreeMap<Id, ResolvedNode>,
}

impl TreeState {
    pub(crate) fn insert_record(&mut self, record: TreeRecord) {
        if self.records.iter().any(|r| r.stamp == record.stamp) {
            return;
        }
        let idx = self.records.partition_point(|r| r.stamp < record.stamp);
        self.records.insert(idx, record);
    }

    /// Replays every record in stamp order. A move is skipped when its
    /// target is unknown or when it would put a node under itself.
    pub(crate) fn resolve(&self) -> ResolvedTree {
        let mut tree = ResolvedTree::default();
        for record in &self.records {
            if !record.create && !tree.nodes.contains_key(&record.target) {
                continue;
            }
            if let TreeParent::Node(parent) = record.parent {
                if tree.is_ancestor_or_self(record.target, parent) {
                    continue;
                }
            }
            tree.nodes.insert(
                record.target,
                ResolvedNode {
                    parent: record.parent,
                    position: record.position.clone(),
                    stamp: record.stamp,
                },
            );
        }
        tree
    }
}

impl ResolvedTree {
    pub(crate) fn contains(&self, node: Id) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Walks up from `node`; true when `ancestor` is on the path.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: Id, node: Id) -> bool {
        let mut current = node;
        let mut steps = 0usize;
        loop {
            if current == ancestor {
                return true;
            }
            match self.nodes.get(&current).map(|n| n.parent) {
                Some(TreeParent::Node(parent)) if steps <= self.nodes.len() => {
                    current = parent;
                    steps += 1;
                }
                _ => return false,
            }
        }
    }

    /// A node is alive when its parent chain reaches the root without
    /// passing through a deleted node.
    pub(crate) fn is_alive(&self, node: Id) -> bool {
        let mut current = node;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(&current).map(|n| n.parent) {
                Some(TreeParent::Root) => return true,
                Some(TreeParent::Node(parent)) => current = parent,
                Some(TreeParent::Deleted) | None => return false,
            }
        }
        false
    }

    pub(crate) fn parent_of(&self, node: Id) -> Option<TreeParent> {
        self.nodes.get(&node).map(|n| n.parent)
    }

    /// Children of `parent` in sibling order: fractional index first, then
    /// the stamp of the record that placed them.
    pub(crate) fn children(&self, parent: TreeParent) -> Vec<Id> {
        let mut out = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent == parent)
            .map(|(id, n)| (n.position.clone(), n.stamp, *id))
            .collect::<Vec<_>>();
        out.sort();
        out.into_iter().map(|(_, _, id)| id).collect()
    }

    pub(crate) fn position(&self, node: Id) -> Option<&[u8]> {
        self.nodes.get(&node).and_then(|n| n.position.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stamp: Id, target: Id, parent: TreeParent, create: bool) -> TreeRecord {
        TreeRecord {
            stamp,
            target,
            parent,
            position: None,
            create,
        }
    }

    #[test]
    fn cyclic_move_is_skipped_on_replay() {
        let a = Id::new(1, 0);
        let b = Id::new(1, 1);
        let mut state = TreeState::default();
        state.insert_record(record(a, a, TreeParent::Root, true));
        state.insert_record(record(b, b, TreeParent::Node(a), true));
        state.insert_record(record(Id::new(2, 2), a, TreeParent::Node(b), false));
        let tree = state.resolve();
        assert_eq!(tree.parent_of(a), Some(TreeParent::Root));
        assert_eq!(tree.parent_of(b), Some(TreeParent::Node(a)));
    }

    #[test]
    fn deleting_parent_hides_descendants() {
        let a = Id::new(1, 0);
        let b = Id::new(1, 1);
        let mut state = TreeState::default();
        state.insert_record(record(a, a, TreeParent::Root, true));
        state.insert_record(record(b, b, TreeParent::Node(a), true));
        state.insert_record(record(Id::new(1, 2), a, TreeParent::Deleted, false));
        let tree = state.resolve();
        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(b));
        assert!(tree.contains(b));
    }
}
