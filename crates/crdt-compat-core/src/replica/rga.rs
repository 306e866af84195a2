use crate::id::Id;

use super::types::{ListAtom, MovableSlot, TextAtom};

/// RGA integration: place `id` right after `reference` (or at the head),
/// skipping over neighbours with greater ids so concurrent inserts at the
/// same spot order the same way on every replica. Returns `None` when `id`
/// is already present.
fn find_insert_index_rga(slots: &[Id], reference: Option<Id>, id: Id) -> Result<Option<usize>, Id> {
    if slots.contains(&id) {
        return Ok(None);
    }
    let mut idx = match reference {
        None => 0,
        Some(r) => slots.iter().position(|slot| *slot == r).ok_or(r)? + 1,
    };
    while idx < slots.len() {
        if slots[idx] < id {
            break;
        }
        idx += 1;
    }
    Ok(Some(idx))
}

pub(crate) fn find_insert_index_list(
    atoms: &[ListAtom],
    reference: Option<Id>,
    id: Id,
) -> Result<Option<usize>, Id> {
    let slots = atoms.iter().map(|a| a.slot).collect::<Vec<_>>();
    find_insert_index_rga(&slots, reference, id)
}

pub(crate) fn find_insert_index_text(
    atoms: &[TextAtom],
    reference: Option<Id>,
    id: Id,
) -> Result<Option<usize>, Id> {
    let slots = atoms.iter().map(|a| a.slot).collect::<Vec<_>>();
    find_insert_index_rga(&slots, reference, id)
}

pub(crate) fn find_insert_index_movable(
    slots: &[MovableSlot],
    reference: Option<Id>,
    id: Id,
) -> Result<Option<usize>, Id> {
    let slots = slots.iter().map(|s| s.slot).collect::<Vec<_>>();
    find_insert_index_rga(&slots, reference, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_inserts_after_same_reference_order_by_id() {
        let base = Id::new(1, 0);
        let a = Id::new(1, 1);
        let b = Id::new(2, 1);
        let mut slots = vec![base];
        let idx = find_insert_index_rga(&slots, Some(base), a).unwrap().unwrap();
        slots.insert(idx, a);
        let idx = find_insert_index_rga(&slots, Some(base), b).unwrap().unwrap();
        slots.insert(idx, b);
        assert_eq!(slots, vec![base, b, a]);

        let mut other = vec![base];
        let idx = find_insert_index_rga(&other, Some(base), b).unwrap().unwrap();
        other.insert(idx, b);
        let idx = find_insert_index_rga(&other, Some(base), a).unwrap().unwrap();
        other.insert(idx, a);
        assert_eq!(other, slots);
    }

    #[test]
    fn missing_reference_is_reported() {
        let slots = vec![Id::new(1, 0)];
        assert_eq!(
            find_insert_index_rga(&slots, Some(Id::new(3, 3)), Id::new(1, 5)),
            Err(Id::new(3, 3))
        );
        assert_eq!(find_insert_index_rga(&slots, None, Id::new(1, 0)), Ok(None));
    }
}
