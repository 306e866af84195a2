//! In-process reference engine.
//!
//! A `Replica` owns the containers of one peer-local document. Local edits
//! are positional; they are translated into identifier-addressed operations
//! (`crate::op`), integrated into container state and appended to the
//! operation log. Remote operations arrive through `import` and go through
//! the same integration path, deduplicated by the version vector.

use crate::container::{ContainerId, ContainerKind};
use crate::export::{DecodeError, ExportError};
use crate::id::{Frontiers, Id, PeerId, VersionVector};
use crate::op::{Op, OpContent};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

mod apply;
mod decode;
mod encode;
mod local;
mod rga;
mod text;
mod tree;
pub(crate) mod types;
mod view;

pub use text::{DeltaSpan, ExpandType};
use types::ContainerState;

/// Largest peer id a replica accepts. Ids are written as `vu57`, so
/// anything wider would not survive an export.
pub const MAX_PEER_ID: PeerId = (1 << 57) - 1;

#[derive(Debug, Error)]
pub enum ReplicaError {
    #[error("invalid peer id: {0}")]
    InvalidPeerId(PeerId),
    #[error("container {container} is a {actual}, operation needs a {expected}")]
    KindMismatch {
        container: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("operation {op} does not apply to {container}")]
    UnsupportedOp {
        container: String,
        op: &'static str,
    },
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("invalid range {start}..{end} for length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("tree node {0} does not exist")]
    UnknownNode(Id),
    #[error("tree node {0} is deleted")]
    DeletedNode(Id),
    #[error("moving {node} under {parent} would create a cycle")]
    Cycle { node: Id, parent: Id },
    #[error("operation references missing element {reference} in {container}")]
    MissingReference { container: String, reference: Id },
    #[error("history before the shallow root is not available")]
    HistoryUnavailable,
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Generates a random peer id.
pub fn generate_peer_id() -> PeerId {
    let mut rng = rand::thread_rng();
    rng.gen_range(1..=MAX_PEER_ID)
}

#[derive(Debug, Clone)]
pub struct Replica {
    pub(crate) peer: PeerId,
    /// Lamport clock for the next local operation.
    pub(crate) next_time: u64,
    pub(crate) version: VersionVector,
    /// Retained operations sorted by id.
    pub(crate) oplog: Vec<Op>,
    /// Version covered by the baseline state when loaded from a shallow
    /// snapshot. Operations inside it are not in `oplog`.
    pub(crate) shallow_root: Option<VersionVector>,
    pub(crate) states: BTreeMap<ContainerId, ContainerState>,
    text_styles: HashMap<String, ExpandType>,
    fixed_order_trees: BTreeSet<ContainerId>,
}

impl Default for Replica {
    fn default() -> Self {
        Self::new()
    }
}

impl Replica {
    /// Creates an empty replica with a random peer id.
    pub fn new() -> Self {
        Self::empty(generate_peer_id())
    }

    pub fn with_peer(peer: PeerId) -> Result<Self, ReplicaError> {
        if peer > MAX_PEER_ID {
            return Err(ReplicaError::InvalidPeerId(peer));
        }
        Ok(Self::empty(peer))
    }

    fn empty(peer: PeerId) -> Self {
        Self {
            peer,
            next_time: 0,
            version: VersionVector::new(),
            oplog: Vec::new(),
            shallow_root: None,
            states: BTreeMap::new(),
            text_styles: HashMap::new(),
            fixed_order_trees: BTreeSet::new(),
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn version(&self) -> &VersionVector {
        &self.version
    }

    /// Latest operation id per peer known to this replica.
    pub fn oplog_frontiers(&self) -> Frontiers {
        self.version.frontiers()
    }

    pub fn shallow_root(&self) -> Option<&VersionVector> {
        self.shallow_root.as_ref()
    }

    pub fn op_count(&self) -> usize {
        self.oplog.len()
    }

    pub fn root_container(&self, kind: ContainerKind, name: &str) -> ContainerId {
        ContainerId::root(name, kind)
    }

    /// Sets the expand policy used by later `mark`/`unmark` calls on `key`.
    /// Keys without a configured policy expand after.
    pub fn config_text_style(&mut self, key: impl Into<String>, expand: ExpandType) {
        self.text_styles.insert(key.into(), expand);
    }

    pub(crate) fn text_style(&self, key: &str) -> ExpandType {
        self.text_styles.get(key).copied().unwrap_or_default()
    }

    /// Toggles fractional-index generation for nodes created or moved in
    /// `tree`. Without it siblings keep creation order.
    pub fn set_fractional_index(
        &mut self,
        tree: &ContainerId,
        enabled: bool,
    ) -> Result<(), ReplicaError> {
        if tree.kind() != ContainerKind::Tree {
            return Err(ReplicaError::KindMismatch {
                container: tree.to_string(),
                expected: ContainerKind::Tree.name(),
                actual: tree.kind().name(),
            });
        }
        if enabled {
            self.fixed_order_trees.remove(tree);
        } else {
            self.fixed_order_trees.insert(tree.clone());
        }
        Ok(())
    }

    pub(crate) fn fractional_index_enabled(&self, tree: &ContainerId) -> bool {
        !self.fixed_order_trees.contains(tree)
    }

    /// Issues a local operation at the current clock and integrates it.
    pub(crate) fn commit(
        &mut self,
        container: ContainerId,
        content: OpContent,
    ) -> Result<Id, ReplicaError> {
        let op = Op {
            id: Id::new(self.peer, self.next_time),
            container,
            content,
        };
        let id = op.id;
        self.integrate(op)?;
        Ok(id)
    }

    /// Applies `op` unless it is already known. Returns whether it was new.
    pub(crate) fn integrate(&mut self, op: Op) -> Result<bool, ReplicaError> {
        if self.version.contains(op.id) {
            return Ok(false);
        }
        self.apply_op(&op)?;
        self.version.observe(op.id.peer, op.id.time, op.span());
        self.next_time = self.next_time.max(op.last_id().time + 1);
        let idx = self.oplog.partition_point(|o| o.id < op.id);
        self.oplog.insert(idx, op);
        Ok(true)
    }

    /// Integrates a batch of remote operations in causal (`(time, peer)`)
    /// order. Returns the number of operations that were new.
    pub(crate) fn integrate_all(&mut self, mut ops: Vec<Op>) -> Result<usize, ReplicaError> {
        ops.sort_by_key(|o| o.id);
        let mut applied = 0;
        for op in ops {
            if self.integrate(op)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Rebuilds the replica state as of `frontiers` by replaying the
    /// operations inside them.
    pub(crate) fn checkout(&self, frontiers: &Frontiers) -> Result<Replica, ReplicaError> {
        if self.shallow_root.is_some() {
            return Err(ReplicaError::HistoryUnavailable);
        }
        let mut out = Replica::empty(self.peer);
        out.text_styles = self.text_styles.clone();
        out.fixed_order_trees = self.fixed_order_trees.clone();
        let ops = self
            .oplog
            .iter()
            .filter(|op| frontiers.includes(op.id))
            .cloned()
            .collect();
        out.integrate_all(ops)?;
        Ok(out)
    }

    pub(crate) fn state(&self, cid: &ContainerId) -> Option<&ContainerState> {
        self.states.get(cid)
    }
}
