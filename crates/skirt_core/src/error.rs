//! Error types for skirt bone synthesis.

use thiserror::Error;

/// Result type for topology and traversal operations.
pub type SkirtResult<T> = Result<T, SkirtError>;

/// Errors raised by the mesh adapter, the traversal and the in-memory host.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SkirtError {
    /// Neighbor search was asked about a vertex without incident edges.
    #[error("vertex {vertex} has no incident edges")]
    DegenerateTopology { vertex: usize },

    /// The traversal reached a vertex that an earlier level already turned into a bone.
    #[error("traversal revisited vertex {vertex} at level {level}; the mesh has a cycle along the traversal axis")]
    DivergentTopology { vertex: usize, level: usize },

    #[error("invalid vertex index {index} (mesh has {vertex_count} vertices)")]
    InvalidVertexIndex { index: usize, vertex_count: usize },

    /// Per-vertex attribute arrays disagree in length.
    #[error("{attribute} has {actual} entries, expected {expected}")]
    MeshShapeMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("bone handle {0} does not refer to a live bone")]
    UnknownBone(usize),

    #[error("weight group handle {0} does not exist")]
    UnknownGroup(usize),
}
