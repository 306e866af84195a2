//! Compatibility verification.
//!
//! An artifact passes when importing it into a fresh oracle document yields
//! the same canonical JSON as the expected document built locally.

use crate::error::HarnessError;
use crate::protocol::{parse_artifacts, Artifacts};
use crate::runner::{run, CommandSpec};
use crate::scenarios::{compat_expected_doc, large_snapshot_doc};
use crdt_compat_core::{canonical_text, Document, Engine, EngineError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Check {
    /// `updates` and `snapshot` of the expected document.
    Exports,
    /// `snapshot_large` of the two-peer large-value document.
    Large,
}

impl Check {
    pub fn artifacts(self) -> &'static [&'static str] {
        match self {
            Check::Exports => &["updates", "snapshot"],
            Check::Large => &["snapshot_large"],
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Check::Exports => "compat check ok",
            Check::Large => "sstable compat check ok",
        }
    }

    pub fn expected_doc<E: Engine>(self, engine: &E) -> Result<E::Doc, EngineError> {
        match self {
            Check::Exports => compat_expected_doc(engine),
            Check::Large => large_snapshot_doc(engine),
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("failed to build expected document: {0}")]
    Expected(#[source] EngineError),
    #[error("failed to create oracle document: {0}")]
    Oracle(#[source] EngineError),
    #[error("missing {0} artifact")]
    MissingArtifact(String),
    #[error("{artifact} import failed: {source}")]
    Import {
        artifact: String,
        source: EngineError,
    },
    #[error("{artifact} mismatch")]
    Mismatch {
        artifact: String,
        expected: String,
        actual: String,
    },
}

pub struct Verifier<E: Engine> {
    engine: E,
}

impl<E: Engine> Verifier<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Canonical text of the document `check` expects.
    pub fn expected_text(&self, check: Check) -> Result<String, VerifyError> {
        let doc = check
            .expected_doc(&self.engine)
            .map_err(VerifyError::Expected)?;
        Ok(canonical_text(&doc.to_json()))
    }

    /// Imports `bytes` into a fresh oracle document and returns its canonical
    /// text.
    pub fn import_text(&self, artifact: &str, bytes: &[u8]) -> Result<String, VerifyError> {
        let mut doc = self
            .engine
            .create_document(None)
            .map_err(VerifyError::Oracle)?;
        doc.import(bytes).map_err(|source| VerifyError::Import {
            artifact: artifact.to_string(),
            source,
        })?;
        Ok(canonical_text(&doc.to_json()))
    }

    pub fn check_artifacts(&self, check: Check, artifacts: &Artifacts) -> Result<(), VerifyError> {
        let expected = self.expected_text(check)?;
        for name in check.artifacts() {
            let bytes = artifacts
                .get(name)
                .ok_or_else(|| VerifyError::MissingArtifact(name.to_string()))?;
            let actual = self.import_text(name, bytes)?;
            if actual != expected {
                debug!(artifact = name, %expected, %actual, "projection differs");
                return Err(VerifyError::Mismatch {
                    artifact: name.to_string(),
                    expected,
                    actual,
                });
            }
            info!(artifact = name, bytes = bytes.len(), "artifact matches");
        }
        Ok(())
    }

    /// Parses protocol lines from `output` and checks every required artifact.
    pub fn verify_output(&self, check: Check, output: &str) -> Result<&'static str, HarnessError> {
        let artifacts = parse_artifacts(output, check.artifacts())?;
        self.check_artifacts(check, &artifacts)?;
        Ok(check.success_message())
    }

    /// Runs the implementation under test and verifies what it prints.
    pub fn verify_command(&self, check: Check, cmd: &CommandSpec) -> Result<&'static str, HarnessError> {
        info!(check = ?check, command = %cmd.display(), engine = self.engine.name(), "verifying");
        let output = run(cmd)?;
        self.verify_output(check, &output)
    }
}
