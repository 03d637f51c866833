//! Browser bridge for the skirt bone synthesis core.
//!
//! `WasmSkirtMesh` holds a mesh built from flat host buffers and runs the pipeline in
//! one call; `WasmSkirtRunner` drives the traversal a batch of levels at a time.

mod convert;
mod mesh;
mod runner;

pub use mesh::WasmSkirtMesh;
pub use runner::WasmSkirtRunner;
