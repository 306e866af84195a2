//! Ephemeral per-peer presence state.
//!
//! Every peer owns one entry; an entry is replaced only by an entry with a
//! higher clock, so applying the same payload twice or out of order is safe.

use crate::crdt_binary::{Reader, Writer};
use crate::id::PeerId;
use crate::value::{Value, ValueCodecError};
use std::collections::BTreeMap;
use thiserror::Error;

pub const AWARENESS_VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum AwarenessError {
    #[error("empty awareness payload")]
    Empty,
    #[error("unsupported awareness version: {0}")]
    UnsupportedVersion(u8),
    #[error("truncated awareness {0}")]
    Truncated(&'static str),
    #[error("trailing bytes after awareness entries")]
    TrailingBytes,
    #[error("awareness value: {0}")]
    Value(#[from] ValueCodecError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeerState {
    pub state: Value,
    pub clock: u64,
}

/// Peers whose entries changed while applying a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwarenessUpdate {
    pub added: Vec<PeerId>,
    pub updated: Vec<PeerId>,
}

#[derive(Debug, Clone)]
pub struct Awareness {
    peer: PeerId,
    states: BTreeMap<PeerId, PeerState>,
}

impl Awareness {
    pub fn new(peer: PeerId) -> Self {
        Self {
            peer,
            states: BTreeMap::new(),
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Replaces the local entry and bumps its clock.
    pub fn set_local_state(&mut self, state: impl Into<Value>) {
        let clock = self.states.get(&self.peer).map_or(0, |s| s.clock) + 1;
        self.states.insert(
            self.peer,
            PeerState {
                state: state.into(),
                clock,
            },
        );
    }

    pub fn local_state(&self) -> Option<&Value> {
        self.states.get(&self.peer).map(|s| &s.state)
    }

    pub fn get_all_states(&self) -> &BTreeMap<PeerId, PeerState> {
        &self.states
    }

    /// Encodes the entries of `peers` that are known.
    pub fn encode(&self, peers: &[PeerId]) -> Result<Vec<u8>, AwarenessError> {
        let entries = peers
            .iter()
            .filter_map(|p| self.states.get(p).map(|s| (*p, s)))
            .collect::<Vec<_>>();
        let mut w = Writer::new();
        w.u8(AWARENESS_VERSION);
        w.usize(entries.len());
        for (peer, entry) in entries {
            w.vu57(peer);
            w.vu57(entry.clock);
            w.bytes(&entry.state.encode_cbor()?);
        }
        Ok(w.finish())
    }

    pub fn encode_all(&self) -> Result<Vec<u8>, AwarenessError> {
        let peers = self.states.keys().copied().collect::<Vec<_>>();
        self.encode(&peers)
    }

    /// Merges an encoded payload, keeping the higher clock per peer.
    pub fn apply(&mut self, data: &[u8]) -> Result<AwarenessUpdate, AwarenessError> {
        let mut r = Reader::new(data);
        let version = r.u8().ok_or(AwarenessError::Empty)?;
        if version != AWARENESS_VERSION {
            return Err(AwarenessError::UnsupportedVersion(version));
        }
        let len = r.usize().ok_or(AwarenessError::Truncated("entry count"))?;
        let mut decoded = Vec::with_capacity(len.min(256));
        for _ in 0..len {
            let peer = r.vu57().ok_or(AwarenessError::Truncated("peer"))?;
            let clock = r.vu57().ok_or(AwarenessError::Truncated("clock"))?;
            let raw = r.bytes().ok_or(AwarenessError::Truncated("state"))?;
            decoded.push((peer, clock, Value::decode_cbor(raw)?));
        }
        if !r.is_empty() {
            return Err(AwarenessError::TrailingBytes);
        }

        let mut update = AwarenessUpdate::default();
        for (peer, clock, state) in decoded {
            match self.states.get(&peer) {
                Some(existing) if existing.clock >= clock => {}
                Some(_) => {
                    self.states.insert(peer, PeerState { state, clock });
                    update.updated.push(peer);
                }
                None => {
                    self.states.insert(peer, PeerState { state, clock });
                    update.added.push(peer);
                }
            }
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_clock_counts_updates() {
        let mut a = Awareness::new(1);
        a.set_local_state(Value::map([("v", Value::I64(1))]));
        a.set_local_state(Value::map([("v", Value::I64(2))]));
        assert_eq!(a.get_all_states()[&1].clock, 2);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut a = Awareness::new(1);
        assert!(matches!(a.apply(&[9, 0]), Err(AwarenessError::UnsupportedVersion(9))));
        assert!(matches!(a.apply(&[]), Err(AwarenessError::Empty)));
    }
}
