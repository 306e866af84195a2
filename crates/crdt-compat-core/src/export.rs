//! Export modes and the framed envelope every replica export is wrapped in.
//!
//! Layout: 4-byte magic, format version, mode byte, then length-prefixed
//! sections (`u32` big-endian length followed by the section bytes).

use crate::id::{Frontiers, Id, VersionVector};
use crate::value::ValueCodecError;
use thiserror::Error;

pub const MAGIC: [u8; 4] = *b"crdx";
pub const FORMAT_VERSION: u8 = 1;
pub const MAX_SECTION_SIZE: usize = 64 * 1024 * 1024;

pub(crate) const MODE_UPDATE: u8 = 0;
pub(crate) const MODE_SNAPSHOT: u8 = 1;
pub(crate) const MODE_SHALLOW_SNAPSHOT: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportMode {
    /// Every operation needed to rebuild the document from empty.
    Update,
    /// Operations not covered by the given version vector.
    UpdatesFrom(VersionVector),
    /// Full structural state plus the whole operation history.
    Snapshot,
    /// Structural state at the given frontiers; history before them dropped.
    ShallowSnapshot(Frontiers),
}

impl ExportMode {
    pub fn name(&self) -> &'static str {
        match self {
            ExportMode::Update | ExportMode::UpdatesFrom(_) => "update",
            ExportMode::Snapshot => "snapshot",
            ExportMode::ShallowSnapshot(_) => "shallow-snapshot",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("frontier {0} is not part of the operation log")]
    UnknownFrontier(Id),
    #[error("value encode failed: {0}")]
    Value(#[from] ValueCodecError),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty input")]
    Empty,
    #[error("bad magic header")]
    BadMagic,
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),
    #[error("unknown export mode: {0}")]
    UnknownMode(u8),
    #[error("truncated {0}")]
    Truncated(&'static str),
    #[error("section size {0} exceeds max")]
    SectionTooLarge(usize),
    #[error("expected {expected} sections, found {found}")]
    SectionCount { expected: usize, found: usize },
    #[error("invalid {what} tag: {tag}")]
    InvalidTag { what: &'static str, tag: u8 },
    #[error("trailing bytes after {0}")]
    TrailingBytes(&'static str),
    #[error("malformed {0}")]
    Malformed(&'static str),
    #[error("value decode failed: {0}")]
    Value(#[from] ValueCodecError),
}

pub(crate) fn write_envelope(mode: u8, sections: &[Vec<u8>]) -> Vec<u8> {
    let total_len = MAGIC.len() + 2 + sections.iter().map(|s| 4 + s.len()).sum::<usize>();
    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.push(mode);
    for section in sections {
        out.extend_from_slice(&(section.len() as u32).to_be_bytes());
        out.extend_from_slice(section);
    }
    out
}

pub(crate) fn read_envelope(data: &[u8]) -> Result<(u8, Vec<&[u8]>), DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::Empty);
    }
    if data.len() < MAGIC.len() + 2 || data[..MAGIC.len()] != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    let version = data[MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    let mode = data[MAGIC.len() + 1];
    if mode > MODE_SHALLOW_SNAPSHOT {
        return Err(DecodeError::UnknownMode(mode));
    }

    let mut sections = Vec::new();
    let mut offset = MAGIC.len() + 2;
    while offset < data.len() {
        if offset + 4 > data.len() {
            return Err(DecodeError::Truncated("section length header"));
        }
        let len = u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]) as usize;
        offset += 4;

        if len > MAX_SECTION_SIZE {
            return Err(DecodeError::SectionTooLarge(len));
        }
        if len > data.len().saturating_sub(offset) {
            return Err(DecodeError::Truncated("section data"));
        }
        sections.push(&data[offset..offset + len]);
        offset += len;
    }
    Ok((mode, sections))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_roundtrip_keeps_section_boundaries() {
        let bytes = write_envelope(MODE_SNAPSHOT, &[vec![1, 2, 3], vec![], vec![4]]);
        let (mode, sections) = read_envelope(&bytes).expect("envelope should decode");
        assert_eq!(mode, MODE_SNAPSHOT);
        assert_eq!(sections, vec![&[1u8, 2, 3][..], &[][..], &[4u8][..]]);
    }

    #[test]
    fn envelope_rejects_truncated_section() {
        let mut bytes = write_envelope(MODE_UPDATE, &[vec![1, 2, 3]]);
        bytes.pop();
        assert!(matches!(
            read_envelope(&bytes),
            Err(DecodeError::Truncated("section data"))
        ));
    }

    #[test]
    fn envelope_rejects_unknown_version_and_mode() {
        let mut bytes = write_envelope(MODE_UPDATE, &[]);
        bytes[4] = 9;
        assert!(matches!(read_envelope(&bytes), Err(DecodeError::UnsupportedVersion(9))));
        let mut bytes = write_envelope(MODE_UPDATE, &[]);
        bytes[5] = 7;
        assert!(matches!(read_envelope(&bytes), Err(DecodeError::UnknownMode(7))));
    }
}
