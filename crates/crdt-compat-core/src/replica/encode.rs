use crate::crdt_binary::Writer;
use crate::export::{write_envelope, ExportError, ExportMode, MODE_SHALLOW_SNAPSHOT, MODE_SNAPSHOT, MODE_UPDATE};
use crate::id::{Frontiers, VersionVector};
use crate::op::{encode_op, write_anchor, write_container, write_position, write_tree_parent, write_value, Op};
use crate::value::ValueCodecError;
use tracing::debug;

use super::types::{Child, ContainerState, TextAtom};
use super::{Replica, ReplicaError};

impl Replica {
    /// Encodes the replica in `mode` and wraps it in the export envelope.
    pub fn export(&self, mode: &ExportMode) -> Result<Vec<u8>, ReplicaError> {
        let out = match mode {
            ExportMode::Update => {
                write_envelope(MODE_UPDATE, &[encode_ops(self.oplog.iter())?])
            }
            ExportMode::UpdatesFrom(from) => write_envelope(
                MODE_UPDATE,
                &[encode_ops(self.oplog.iter().filter(|op| !from.contains(op.id)))?],
            ),
            ExportMode::Snapshot => write_envelope(
                MODE_SNAPSHOT,
                &[
                    encode_version(&self.version, self.shallow_root.as_ref()),
                    encode_state(self)?,
                    encode_ops(self.oplog.iter())?,
                ],
            ),
            ExportMode::ShallowSnapshot(frontiers) => self.export_shallow(frontiers)?,
        };
        debug!(
            peer = self.peer,
            mode = mode.name(),
            ops = self.oplog.len(),
            bytes = out.len(),
            "exported replica"
        );
        Ok(out)
    }

    fn export_shallow(&self, frontiers: &Frontiers) -> Result<Vec<u8>, ReplicaError> {
        for id in frontiers.ids() {
            if !self.version.contains(*id) {
                return Err(ExportError::UnknownFrontier(*id).into());
            }
        }
        let sections = if *frontiers == self.oplog_frontiers() {
            vec![
                encode_version(&self.version, Some(&self.version)),
                encode_state(self)?,
                encode_ops(std::iter::empty())?,
            ]
        } else {
            let base = self.checkout(frontiers)?;
            vec![
                encode_version(&base.version, Some(&base.version)),
                encode_state(&base)?,
                encode_ops(self.oplog.iter().filter(|op| !frontiers.includes(op.id)))?,
            ]
        };
        Ok(write_envelope(MODE_SHALLOW_SNAPSHOT, &sections))
    }
}

fn encode_ops<'a>(ops: impl Iterator<Item = &'a Op>) -> Result<Vec<u8>, ExportError> {
    let ops = ops.collect::<Vec<_>>();
    let mut w = Writer::new();
    w.usize(ops.len());
    for op in ops {
        encode_op(&mut w, op)?;
    }
    Ok(w.finish())
}

fn write_version_vector(w: &mut Writer, vv: &VersionVector) {
    let ranges = vv.ranges().collect::<Vec<_>>();
    w.usize(ranges.len());
    for (peer, start, end) in ranges {
        w.vu57(peer);
        w.vu57(start);
        w.vu57(end);
    }
}

fn encode_version(vv: &VersionVector, shallow_root: Option<&VersionVector>) -> Vec<u8> {
    let mut w = Writer::new();
    write_version_vector(&mut w, vv);
    match shallow_root {
        Some(root) => {
            w.u8(1);
            write_version_vector(&mut w, root);
        }
        None => w.u8(0),
    }
    w.finish()
}

fn write_child(w: &mut Writer, child: &Child) -> Result<(), ValueCodecError> {
    match child {
        Child::Value(v) => {
            w.u8(0);
            write_value(w, v)?;
        }
        Child::Container(cid) => {
            w.u8(1);
            write_container(w, cid);
        }
    }
    Ok(())
}

fn write_opt_child(w: &mut Writer, child: Option<&Child>) -> Result<(), ValueCodecError> {
    match child {
        Some(c) => {
            w.u8(1);
            write_child(w, c)
        }
        None => {
            w.u8(0);
            Ok(())
        }
    }
}

/// Splits text atoms into runs of consecutive ids with the same deletion
/// status.
fn text_runs(atoms: &[TextAtom]) -> Vec<&[TextAtom]> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=atoms.len() {
        let split = i == atoms.len() || {
            let prev = atoms[i - 1];
            let cur = atoms[i];
            cur.slot != prev.slot.offset(1) || cur.ch.is_some() != prev.ch.is_some()
        };
        if split {
            runs.push(&atoms[start..i]);
            start = i;
        }
    }
    runs
}

fn encode_state(replica: &Replica) -> Result<Vec<u8>, ExportError> {
    let mut w = Writer::new();
    w.usize(replica.states.len());
    for (cid, state) in &replica.states {
        write_container(&mut w, cid);
        match state {
            ContainerState::Map(map) => {
                w.usize(map.entries.len());
                for (key, entry) in &map.entries {
                    w.str(key);
                    w.id(entry.stamp);
                    write_opt_child(&mut w, entry.value.as_ref())?;
                }
            }
            ContainerState::List(list) => {
                w.usize(list.atoms.len());
                for atom in &list.atoms {
                    w.id(atom.slot);
                    write_opt_child(&mut w, atom.value.as_ref())?;
                }
            }
            ContainerState::MovableList(mov) => {
                w.usize(mov.slots.len());
                for slot in &mov.slots {
                    w.id(slot.slot);
                    w.id(slot.elem);
                }
                w.usize(mov.elems.len());
                for (id, elem) in &mov.elems {
                    w.id(*id);
                    write_child(&mut w, &elem.value)?;
                    w.id(elem.value_stamp);
                    w.id(elem.pos);
                    w.id(elem.pos_stamp);
                    w.bool(elem.deleted);
                }
            }
            ContainerState::Text(text) => {
                let runs = text_runs(&text.atoms);
                w.usize(runs.len());
                for run in runs {
                    w.id(run[0].slot);
                    w.usize(run.len());
                    let live = run.iter().filter_map(|a| a.ch).collect::<String>();
                    if live.is_empty() {
                        w.bool(false);
                    } else {
                        w.bool(true);
                        w.str(&live);
                    }
                }
                w.usize(text.marks.len());
                for mark in &text.marks {
                    w.id(mark.id);
                    write_anchor(&mut w, mark.start);
                    write_anchor(&mut w, mark.end);
                    w.str(&mark.key);
                    write_value(&mut w, &mark.value)?;
                }
            }
            ContainerState::Tree(tree) => {
                w.usize(tree.records.len());
                for record in &tree.records {
                    w.id(record.stamp);
                    w.id(record.target);
                    write_tree_parent(&mut w, record.parent);
                    write_position(&mut w, record.position.as_deref());
                    w.bool(record.create);
                }
            }
            ContainerState::Counter(counter) => w.f64(counter.value),
        }
    }
    Ok(w.finish())
}
