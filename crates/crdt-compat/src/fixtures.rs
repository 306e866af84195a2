//! Fixture emission.
//!
//! Each blob renders as a `Bytes` constant with sixteen hex literals per
//! row; blocks are separated by a blank line.

use crate::scenarios::{awareness_scenarios, merged_fixture_doc};
use crdt_compat_core::{AwarenessError, Document, Engine, EngineError, ExportMode};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DOCUMENT_FIXTURES_FILE: &str = "loro_fixtures.mbt";
pub const AWARENESS_FIXTURES_FILE: &str = "awareness_fixtures.mbt";

const ROW_WIDTH: usize = 16;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to build fixture document: {0}")]
    Build(#[from] EngineError),
    #[error("failed to encode awareness fixture: {0}")]
    Awareness(#[from] AwarenessError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureBlob {
    pub name: String,
    pub comment: Option<String>,
    pub bytes: Vec<u8>,
}

impl FixtureBlob {
    pub fn new(name: impl Into<String>, comment: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            comment: Some(comment.into()),
            bytes,
        }
    }
}

fn hex_rows(bytes: &[u8]) -> String {
    let rows = bytes
        .chunks(ROW_WIDTH)
        .map(|row| {
            let items = row
                .iter()
                .map(|b| format!("0x{b:02x}"))
                .collect::<Vec<_>>();
            format!("  {}", items.join(", "))
        })
        .collect::<Vec<_>>();
    format!("[\n{}\n]", rows.join(",\n"))
}

pub fn render_blob(blob: &FixtureBlob) -> String {
    let mut out = String::from("///|\n");
    if let Some(comment) = &blob.comment {
        let _ = writeln!(out, "// {comment}");
    }
    let _ = writeln!(out, "pub let {} : Bytes = {}", blob.name, hex_rows(&blob.bytes));
    out
}

pub fn render(blobs: &[FixtureBlob]) -> String {
    blobs.iter().map(render_blob).collect::<Vec<_>>().join("\n")
}

/// Renders `blobs` and writes them to `path`, replacing any previous file.
pub fn write_fixtures(path: &Path, blobs: &[FixtureBlob]) -> Result<(), FixtureError> {
    std::fs::write(path, render(blobs)).map_err(|source| FixtureError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), blobs = blobs.len(), "wrote fixtures");
    Ok(())
}

/// `update`, `snapshot` and `shallow-snapshot` exports of the merged
/// fixture document. The shallow snapshot is cut at the latest frontiers.
pub fn document_fixtures<E: Engine>(engine: &E) -> Result<Vec<FixtureBlob>, FixtureError> {
    let doc = merged_fixture_doc(engine)?;
    let modes = [
        ("loro_fixture_updates", ExportMode::Update),
        ("loro_fixture_snapshot", ExportMode::Snapshot),
        (
            "loro_fixture_shallow_snapshot",
            ExportMode::ShallowSnapshot(doc.oplog_frontiers()),
        ),
    ];
    let mut blobs = Vec::with_capacity(modes.len());
    for (name, mode) in modes {
        let bytes = doc.export(&mode)?;
        let comment = format!(
            "Generated via {} export({{ mode: \"{}\" }}).",
            engine.name(),
            mode.name()
        );
        blobs.push(FixtureBlob::new(name, comment, bytes));
    }
    Ok(blobs)
}

pub fn awareness_fixtures() -> Result<Vec<FixtureBlob>, FixtureError> {
    Ok(awareness_scenarios()?
        .into_iter()
        .map(|s| FixtureBlob::new(s.name, s.comment, s.bytes))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_wrap_at_sixteen_bytes() {
        let bytes = (0u8..18).collect::<Vec<_>>();
        let text = hex_rows(&bytes);
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("  0x00, 0x01"));
        assert!(lines[1].ends_with("0x0f,"));
        assert_eq!(lines[2], "  0x10, 0x11");
        assert_eq!(lines[3], "]");
    }

    #[test]
    fn empty_blob_renders_blank_body() {
        let blob = FixtureBlob {
            name: "empty".into(),
            comment: None,
            bytes: Vec::new(),
        };
        assert_eq!(render_blob(&blob), "///|\npub let empty : Bytes = [\n\n]\n");
    }
}
