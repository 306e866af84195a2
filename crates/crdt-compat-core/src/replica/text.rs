//! Rich-text marks.
//!
//! A mark is stored as a pair of anchors into the character sequence
//! (tombstones included). Anchors are chosen at mark time from the style's
//! expand policy, so inserts at a boundary fall inside or outside the range
//! without further bookkeeping, and deleting characters only shrinks it.

use crate::id::Id;
use crate::op::Anchor;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};

use super::types::TextState;

/// How a styled range grows when text is inserted at one of its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpandType {
    /// Inserts at the end edge join the range.
    #[default]
    After,
    /// Inserts at the start edge join the range.
    Before,
    None,
    Both,
}

impl ExpandType {
    fn expands_before(self) -> bool {
        matches!(self, ExpandType::Before | ExpandType::Both)
    }

    fn expands_after(self) -> bool {
        matches!(self, ExpandType::After | ExpandType::Both)
    }
}

/// A run of characters sharing the same attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaSpan {
    pub insert: String,
    pub attributes: BTreeMap<String, Value>,
}

impl TextState {
    pub(crate) fn visible_ids(&self) -> Vec<Id> {
        self.atoms
            .iter()
            .filter(|a| a.ch.is_some())
            .map(|a| a.slot)
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.atoms.iter().filter(|a| a.ch.is_some()).count()
    }

    pub(crate) fn to_plain(&self) -> String {
        self.atoms.iter().filter_map(|a| a.ch).collect()
    }

    /// Anchors for styling visible range `[start, end)` with `expand`.
    /// Callers validate `start < end <= len`.
    pub(crate) fn anchors_for(&self, start: usize, end: usize, expand: ExpandType) -> (Anchor, Anchor) {
        let visible = self.visible_ids();
        let start_anchor = if expand.expands_before() {
            match start.checked_sub(1) {
                Some(prev) => Anchor::After(visible[prev]),
                None => Anchor::Start,
            }
        } else {
            Anchor::Before(visible[start])
        };
        let end_anchor = if expand.expands_after() {
            match visible.get(end) {
                Some(next) => Anchor::Before(*next),
                None => Anchor::End,
            }
        } else {
            Anchor::After(visible[end - 1])
        };
        (start_anchor, end_anchor)
    }

    /// Resolved attributes of each visible character.
    pub(crate) fn attributes(&self) -> Vec<BTreeMap<String, Value>> {
        let index: HashMap<Id, usize> = self
            .atoms
            .iter()
            .enumerate()
            .map(|(i, a)| (a.slot, i))
            .collect();
        // Characters sit at even keys, anchor gaps at odd ones.
        let key_of = |anchor: Anchor| -> Option<i64> {
            match anchor {
                Anchor::Start => Some(-1),
                Anchor::End => Some(i64::MAX),
                Anchor::Before(id) => index.get(&id).map(|i| 2 * *i as i64),
                Anchor::After(id) => index.get(&id).map(|i| 2 * *i as i64 + 1),
            }
        };
        let ranges = self
            .marks
            .iter()
            .filter_map(|m| Some((key_of(m.start)?, key_of(m.end)?, m)))
            .collect::<Vec<_>>();

        let mut out = Vec::new();
        for (i, atom) in self.atoms.iter().enumerate() {
            if atom.ch.is_none() {
                continue;
            }
            let k = 2 * i as i64;
            let mut attrs = BTreeMap::new();
            // Marks are sorted by id, so the newest mark per key wins.
            for (start, end, mark) in &ranges {
                if *start <= k && k < *end {
                    attrs.insert(mark.key.clone(), mark.value.clone());
                }
            }
            attrs.retain(|_, v| !v.is_null());
            out.push(attrs);
        }
        out
    }

    pub(crate) fn to_delta(&self) -> Vec<DeltaSpan> {
        let attrs = self.attributes();
        let mut out: Vec<DeltaSpan> = Vec::new();
        for (ch, attributes) in self.atoms.iter().filter_map(|a| a.ch).zip(attrs) {
            match out.last_mut() {
                Some(last) if last.attributes == attributes => last.insert.push(ch),
                _ => out.push(DeltaSpan {
                    insert: ch.to_string(),
                    attributes,
                }),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::types::{MarkRecord, TextAtom};

    fn text(s: &str) -> TextState {
        TextState {
            atoms: s
                .chars()
                .enumerate()
                .map(|(i, ch)| TextAtom {
                    slot: Id::new(1, i as u64),
                    ch: Some(ch),
                })
                .collect(),
            marks: Vec::new(),
        }
    }

    #[test]
    fn anchors_follow_expand_policy() {
        let t = text("abcd");
        assert_eq!(
            t.anchors_for(1, 3, ExpandType::None),
            (Anchor::Before(Id::new(1, 1)), Anchor::After(Id::new(1, 2)))
        );
        assert_eq!(
            t.anchors_for(0, 4, ExpandType::Both),
            (Anchor::Start, Anchor::End)
        );
        assert_eq!(
            t.anchors_for(1, 3, ExpandType::After),
            (Anchor::Before(Id::new(1, 1)), Anchor::Before(Id::new(1, 3)))
        );
    }

    #[test]
    fn null_mark_removes_style_inside_range() {
        let mut t = text("abcd");
        let (s, e) = t.anchors_for(0, 4, ExpandType::After);
        t.marks.push(MarkRecord {
            id: Id::new(1, 10),
            start: s,
            end: e,
            key: "bold".into(),
            value: Value::Bool(true),
        });
        let (s, e) = t.anchors_for(1, 3, ExpandType::After);
        t.marks.push(MarkRecord {
            id: Id::new(1, 11),
            start: s,
            end: e,
            key: "bold".into(),
            value: Value::Null,
        });
        let delta = t.to_delta();
        let inserts = delta.iter().map(|d| d.insert.as_str()).collect::<Vec<_>>();
        assert_eq!(inserts, vec!["a", "bc", "d"]);
        assert!(delta[1].attributes.is_empty());
        assert_eq!(delta[2].attributes.get("bold"), Some(&Value::Bool(true)));
    }
}
