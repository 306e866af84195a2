//! Shared binary primitives used by the operation log, the replica state
//! codec and the awareness codec.
//!
//! Integers use the `vu57` variable-length layout: seven 7-bit groups with a
//! continuation bit, then one final full byte, so any `u64` below 2^57 fits in
//! at most eight bytes.

use crate::id::Id;

pub fn write_vu57(out: &mut Vec<u8>, mut value: u64) {
    for _ in 0..7 {
        let mut b = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(b);
            return;
        }
        b |= 0x80;
        out.push(b);
    }
    out.push((value & 0xff) as u8);
}

pub fn read_vu57(data: &[u8], pos: &mut usize) -> Option<u64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    for i in 0..8 {
        let b = *data.get(*pos)?;
        *pos += 1;
        if i < 7 {
            let part = (b & 0x7f) as u64;
            result |= part.checked_shl(shift)?;
            if (b & 0x80) == 0 {
                return Some(result);
            }
            shift += 7;
        } else {
            result |= (b as u64).checked_shl(49)?;
            return Some(result);
        }
    }
    None
}

/// Append-only byte writer for the replica wire layout.
#[derive(Debug, Default)]
pub struct Writer {
    out: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, b: u8) {
        self.out.push(b);
    }

    pub fn vu57(&mut self, value: u64) {
        write_vu57(&mut self.out, value);
    }

    pub fn usize(&mut self, value: usize) {
        write_vu57(&mut self.out, value as u64);
    }

    pub fn bool(&mut self, value: bool) {
        self.out.push(u8::from(value));
    }

    pub fn f64(&mut self, value: f64) {
        self.out.extend_from_slice(&value.to_be_bytes());
    }

    pub fn bytes(&mut self, data: &[u8]) {
        self.usize(data.len());
        self.out.extend_from_slice(data);
    }

    pub fn str(&mut self, s: &str) {
        self.bytes(s.as_bytes());
    }

    pub fn id(&mut self, id: Id) {
        self.vu57(id.peer);
        self.vu57(id.time);
    }

    /// Writes an optional id as a presence flag followed by the id.
    pub fn opt_id(&mut self, id: Option<Id>) {
        match id {
            Some(id) => {
                self.u8(1);
                self.id(id);
            }
            None => self.u8(0),
        }
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

/// Cursor over an encoded buffer. Every read returns `None` on truncation.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    pub fn vu57(&mut self) -> Option<u64> {
        read_vu57(self.data, &mut self.pos)
    }

    pub fn usize(&mut self) -> Option<usize> {
        usize::try_from(self.vu57()?).ok()
    }

    pub fn bool(&mut self) -> Option<bool> {
        match self.u8()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    pub fn f64(&mut self) -> Option<f64> {
        let raw = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Some(f64::from_be_bytes(buf))
    }

    pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    pub fn bytes(&mut self) -> Option<&'a [u8]> {
        let len = self.usize()?;
        self.take(len)
    }

    pub fn str(&mut self) -> Option<&'a str> {
        std::str::from_utf8(self.bytes()?).ok()
    }

    pub fn id(&mut self) -> Option<Id> {
        let peer = self.vu57()?;
        let time = self.vu57()?;
        Some(Id { peer, time })
    }

    pub fn opt_id(&mut self) -> Option<Option<Id>> {
        match self.u8()? {
            0 => Some(None),
            1 => Some(Some(self.id()?)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vu57_boundaries() {
        for value in [0u64, 1, 127, 128, 16_383, 16_384, (1 << 49) - 1, 1 << 56, u64::MAX >> 7] {
            let mut out = Vec::new();
            write_vu57(&mut out, value);
            assert!(out.len() <= 8, "vu57 of {value} used {} bytes", out.len());
            let mut pos = 0;
            assert_eq!(read_vu57(&out, &mut pos), Some(value));
            assert_eq!(pos, out.len());
        }
    }

    #[test]
    fn reader_rejects_truncated_input() {
        let mut w = Writer::new();
        w.str("hello");
        let bytes = w.finish();
        let mut r = Reader::new(&bytes[..3]);
        assert_eq!(r.str(), None);
        assert_eq!(Reader::new(&[0x80]).vu57(), None);
        assert_eq!(Reader::new(&[2]).bool(), None);
    }
}
