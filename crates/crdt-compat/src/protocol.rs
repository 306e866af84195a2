//! Line protocol spoken by an implementation under test.
//!
//! Each artifact is one line `<name> <hex>`. Lines are trimmed, blank lines
//! and lines for other names are ignored, and the last line for a name wins.
//! A bare hex payload cannot carry a mode or a length, so an artifact that
//! happens to be truncated mid-line still parses as long as the digit count
//! is even.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("missing {} output", .0.join(", "))]
    MissingArtifact(Vec<String>),
    #[error("invalid hex for {artifact}: {source}")]
    InvalidHex {
        artifact: String,
        source: hex::FromHexError,
    },
}

/// Decoded artifacts keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts(BTreeMap<String, Vec<u8>>);

impl Artifacts {
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Extracts and decodes every artifact in `wanted`. Missing artifacts are
/// reported together; invalid hex is reported for the first bad artifact.
pub fn parse_artifacts(output: &str, wanted: &[&str]) -> Result<Artifacts, ProtocolError> {
    let mut found = BTreeMap::<&str, &str>::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        for name in wanted {
            if let Some(payload) = line
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix(' '))
            {
                found.insert(*name, payload);
            }
        }
    }

    let missing = wanted
        .iter()
        .filter(|name| !found.contains_key(*name))
        .map(|name| name.to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(ProtocolError::MissingArtifact(missing));
    }

    let mut artifacts = BTreeMap::new();
    for (name, payload) in wanted.iter().filter_map(|n| found.get_key_value(n)) {
        let bytes = hex::decode(*payload).map_err(|source| ProtocolError::InvalidHex {
            artifact: name.to_string(),
            source,
        })?;
        artifacts.insert(name.to_string(), bytes);
    }
    Ok(Artifacts(artifacts))
}

/// Formats one protocol line.
pub fn artifact_line(name: &str, bytes: &[u8]) -> String {
    format!("{name} {}", hex::encode(bytes))
}
