pub mod armature;
pub mod chain;
pub mod error;
pub mod mesh;
pub mod neighbor;
pub mod rig;
pub mod roll;
pub mod settings;
pub mod terminal;
/// The `skirt_core` crate synthesizes bone chains from the topology of tube- or grid-like
/// meshes (skirts, tentacles, hair strips) without manual bone placement.
///
/// Key components:
/// - **Traits**: `MeshGraph` (read-only mesh view) and the host stores
///   (`WeightGroupStore`, `SkeletonStore`, `IkConstraintStore`).
/// - **Mesh**: `SkirtMesh`, an adjacency-backed `MeshGraph` built from polygons or edges.
/// - **Neighbor search / terminals**: extremal-neighbor lookup and chain-seed classification.
/// - **Chain**: the breadth-level traversal emitting bones, parents, rolls and tail indices.
/// - **Rig**: the request plan handed to a host, plus the `setup_skirt` pipeline.
pub mod traits;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{SkirtError, SkirtResult};
pub use rig::{setup_skirt, RigPlan, SetupOutcome};
pub use settings::{Axis, Direction, NameScheme, SetupSettings};
