//! Byte-string fractional indexes for ordering tree siblings.
//!
//! Keys compare lexicographically and never end in a zero byte, so a key
//! strictly below any generated key always exists.

const MID: u8 = 128;

/// Returns a key strictly between `left` and `right` (either bound may be
/// open). When the bounds are out of order the key is placed after `left`.
pub fn between(left: Option<&[u8]>, right: Option<&[u8]>) -> Vec<u8> {
    match (left, right) {
        (None, None) => vec![MID],
        (Some(l), None) => after(l),
        (None, Some(r)) => before(r),
        (Some(l), Some(r)) if l >= r => after(l),
        (Some(l), Some(r)) => {
            let common = l.iter().zip(r.iter()).take_while(|(a, b)| a == b).count();
            let mut out = r[..common].to_vec();
            match l.get(common) {
                None => out.extend(before(&r[common..])),
                Some(&a) => {
                    let b = r[common];
                    if b - a > 1 {
                        out.push(a + (b - a) / 2);
                    } else {
                        out.push(a);
                        let rest = &l[common + 1..];
                        if rest.is_empty() {
                            out.push(MID);
                        } else {
                            out.extend(after(rest));
                        }
                    }
                }
            }
            out
        }
    }
}

fn after(l: &[u8]) -> Vec<u8> {
    match l.first() {
        Some(&first) if first < u8::MAX => vec![first + 1],
        _ => {
            let mut out = l.to_vec();
            out.push(MID);
            out
        }
    }
}

fn before(r: &[u8]) -> Vec<u8> {
    match r {
        [] => vec![MID],
        [first, ..] if *first > 1 => vec![first / 2],
        [first] if *first == 1 => vec![0, MID],
        [first, rest @ ..] if !rest.is_empty() => {
            let mut out = vec![*first];
            out.extend(before(rest));
            out
        }
        _ => r.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_strictly_ordered() {
        let first = between(None, None);
        let second = between(Some(&first), None);
        let mid = between(Some(&first), Some(&second));
        let head = between(None, Some(&first));
        assert!(head < first);
        assert!(first < mid && mid < second, "{first:?} {mid:?} {second:?}");
    }

    #[test]
    fn repeated_prepend_never_collides() {
        let mut keys = vec![between(None, None)];
        for _ in 0..64 {
            let next = between(None, Some(&keys[0]));
            assert!(next < keys[0], "{next:?} !< {:?}", keys[0]);
            assert_ne!(next.last(), Some(&0));
            keys.insert(0, next);
        }
    }

    #[test]
    fn repeated_bisect_stays_between() {
        let left = between(None, None);
        let mut right = between(Some(&left), None);
        for _ in 0..64 {
            let mid = between(Some(&left), Some(&right));
            assert!(left < mid && mid < right);
            right = mid;
        }
    }
}
