//! Deterministic document scripts.
//!
//! Every script is generic over an [`Engine`], uses fixed peers and literal
//! values, and never reads a clock or a random source, so the same engine
//! always produces the same bytes.

mod awareness;
mod compat;
mod merged;

pub use awareness::{
    awareness_scenarios, multi_peer_awareness, single_peer_awareness, AwarenessScenario,
};
pub use compat::{compat_expected_doc, large_snapshot_doc};
pub use merged::{add_large_data, merged_fixture_doc};

use crdt_compat_core::{Document, Engine, EngineError, ExpandType, ExportMode, PeerId};

pub(crate) fn configure_text_styles<D: Document + ?Sized>(doc: &mut D) {
    doc.config_text_style("bold", ExpandType::After);
    doc.config_text_style("link", ExpandType::None);
}

pub(crate) fn new_doc<E: Engine>(engine: &E, peer: PeerId) -> Result<E::Doc, EngineError> {
    engine.create_document(Some(peer))
}

/// Sends `from`'s full update into `to`.
pub(crate) fn exchange<D: Document>(from: &D, to: &mut D) -> Result<(), EngineError> {
    let update = from.export(&ExportMode::Update)?;
    to.import(&update)
}
