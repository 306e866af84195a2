//! Reference multi-container CRDT engine and oracle interface.

pub mod awareness;
pub mod canonical;
pub mod container;
pub mod crdt_binary;
pub mod engine;
pub mod export;
pub mod fractional_index;
pub mod handles;
pub mod id;
pub mod op;
pub mod replica;
pub mod value;

pub use awareness::{Awareness, AwarenessError, PeerState};
pub use canonical::{canonical_text, canonicalize};
pub use container::{ContainerId, ContainerKind};
pub use engine::{Applied, Document, Engine, EngineError, Operation, ReplicaEngine};
pub use export::{DecodeError, ExportError, ExportMode};
pub use handles::DocumentExt;
pub use id::{Frontiers, Id, PeerId, VersionVector};
pub use replica::{DeltaSpan, ExpandType, Replica, ReplicaError};
pub use value::Value;

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
