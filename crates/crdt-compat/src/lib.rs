//! Compatibility harness for multi-container CRDT encodings.
//!
//! Builds deterministic documents through an [`Engine`], emits their exports
//! as byte fixtures, and verifies the hex artifacts an implementation under
//! test prints by importing them into a fresh oracle document.
//!
//! [`Engine`]: crdt_compat_core::Engine

pub mod config;
pub mod error;
pub mod fixtures;
pub mod protocol;
pub mod runner;
pub mod scenarios;
pub mod verify;

pub use config::{ConfigError, HarnessConfig};
pub use error::HarnessError;
pub use fixtures::{FixtureBlob, FixtureError};
pub use protocol::{Artifacts, ProtocolError};
pub use runner::{CommandSpec, RunError};
pub use verify::{Check, Verifier, VerifyError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
