//! Logical identifiers: operation ids, frontiers and version vectors.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

pub type PeerId = u64;

/// Operation id. `time` is the Lamport clock of the replica that issued the
/// operation, so ids are totally ordered by `(time, peer)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id {
    pub peer: PeerId,
    pub time: u64,
}

impl Id {
    pub const fn new(peer: PeerId, time: u64) -> Self {
        Self { peer, time }
    }

    pub fn offset(self, by: u64) -> Self {
        Self {
            peer: self.peer,
            time: self.time + by,
        }
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => self.peer.cmp(&other.peer),
            ord => ord,
        }
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.time, self.peer)
    }
}

/// Latest operation id per peer, sorted by peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontiers(Vec<Id>);

impl Frontiers {
    pub fn new(mut ids: Vec<Id>) -> Self {
        ids.sort_by(|a, b| a.peer.cmp(&b.peer).then(b.time.cmp(&a.time)));
        ids.dedup_by_key(|id| id.peer);
        Self(ids)
    }

    pub fn ids(&self) -> &[Id] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the frontier time for `peer`, if any operation of that peer is
    /// included.
    pub fn time_of(&self, peer: PeerId) -> Option<u64> {
        self.0.iter().find(|id| id.peer == peer).map(|id| id.time)
    }

    /// An operation is inside the frontier when its peer appears in it and
    /// the operation is not newer than the peer's frontier time.
    pub fn includes(&self, id: Id) -> bool {
        self.time_of(id.peer).is_some_and(|t| id.time <= t)
    }
}

/// Observed time ranges per peer. Ranges are inclusive and kept merged.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VersionVector {
    pub(crate) observed: BTreeMap<PeerId, Vec<(u64, u64)>>,
}

impl VersionVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, peer: PeerId, start: u64, span: u64) {
        let end = start + span.saturating_sub(1);
        let ranges = self.observed.entry(peer).or_default();
        ranges.push((start, end));
        ranges.sort_by_key(|(a, _)| *a);
        let mut merged: Vec<(u64, u64)> = Vec::with_capacity(ranges.len());
        for (a, b) in ranges.iter().copied() {
            if let Some(last) = merged.last_mut() {
                if a <= last.1.saturating_add(1) {
                    last.1 = last.1.max(b);
                } else {
                    merged.push((a, b));
                }
            } else {
                merged.push((a, b));
            }
        }
        *ranges = merged;
    }

    pub fn contains(&self, id: Id) -> bool {
        self.observed
            .get(&id.peer)
            .is_some_and(|ranges| ranges.iter().any(|(a, b)| *a <= id.time && id.time <= *b))
    }

    /// Highest observed time across all peers.
    pub fn max_time(&self) -> Option<u64> {
        self.observed
            .values()
            .filter_map(|ranges| ranges.last().map(|(_, b)| *b))
            .max()
    }

    /// Latest observed id of every peer.
    pub fn frontiers(&self) -> Frontiers {
        Frontiers::new(
            self.observed
                .iter()
                .filter_map(|(peer, ranges)| ranges.last().map(|(_, b)| Id::new(*peer, *b)))
                .collect(),
        )
    }

    /// True when every range observed by `other` is observed here too.
    pub fn covers(&self, other: &VersionVector) -> bool {
        other.ranges().all(|(peer, a, b)| {
            self.observed
                .get(&peer)
                .is_some_and(|ranges| ranges.iter().any(|(c, d)| *c <= a && b <= *d))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    pub fn merge(&mut self, other: &VersionVector) {
        for (peer, ranges) in &other.observed {
            for (a, b) in ranges {
                self.observe(*peer, *a, b - a + 1);
            }
        }
    }

    pub fn ranges(&self) -> impl Iterator<Item = (PeerId, u64, u64)> + '_ {
        self.observed
            .iter()
            .flat_map(|(peer, ranges)| ranges.iter().map(move |(a, b)| (*peer, *a, *b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_vector_merges_adjacent_ranges() {
        let mut vv = VersionVector::new();
        vv.observe(1, 1, 3);
        vv.observe(1, 4, 2);
        vv.observe(1, 10, 1);
        assert_eq!(vv.observed[&1], vec![(1, 5), (10, 10)]);
        assert!(vv.contains(Id::new(1, 5)));
        assert!(!vv.contains(Id::new(1, 7)));
        assert_eq!(vv.frontiers().ids(), &[Id::new(1, 10)]);

        let mut partial = VersionVector::new();
        partial.observe(1, 2, 2);
        assert!(vv.covers(&partial));
        partial.observe(2, 0, 1);
        assert!(!vv.covers(&partial));
    }

    #[test]
    fn ids_order_by_time_then_peer() {
        assert!(Id::new(9, 1) < Id::new(1, 2));
        assert!(Id::new(1, 2) < Id::new(2, 2));
    }
}
