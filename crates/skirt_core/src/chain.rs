//! Breadth-level chain synthesis.
//!
//! Starting from the terminal heads, every level turns each frontier vertex into a
//! bone that points at its extremal neighbor along the traversal direction. Neighbors
//! that are themselves junctions (valence above three) become the next frontier.
//! Insertion order is preserved within a level so generated bones are reproducible.

use crate::error::{SkirtError, SkirtResult};
use crate::neighbor::{search_neighbor, NeighborPair};
use crate::roll::{bone_z_axis, compute_roll};
use crate::settings::{NameScheme, SetupSettings};
use crate::terminal::{TerminalSet, TERMINAL_VALENCE};
use crate::traits::MeshGraph;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// A bone derived from one traversed vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    /// Vertex the bone starts at.
    pub source_vertex: usize,
    /// Vertex the bone points at.
    pub tail_vertex: usize,
    pub head: Vector3<f64>,
    pub tail: Vector3<f64>,
    pub roll: f64,
    /// Index of the parent bone in `ChainSet::bones`.
    pub parent: Option<usize>,
    pub connected: bool,
    /// Breadth level the bone was emitted at (heads are level 0).
    pub level: usize,
}

/// Maps each vertex to the vertex its bone points at.
///
/// Vertices that did not produce a bone have no entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailIndexTable {
    entries: Vec<Option<usize>>,
}

impl TailIndexTable {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            entries: vec![None; vertex_count],
        }
    }

    pub fn get(&self, vertex: usize) -> Option<usize> {
        self.entries.get(vertex).copied().flatten()
    }

    fn set(&mut self, vertex: usize, tail: usize) {
        self.entries[vertex] = Some(tail);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flat view with `-1` for vertices without a mapping.
    pub fn to_sentinel_vec(&self) -> Vec<i64> {
        self.entries
            .iter()
            .map(|entry| entry.map_or(-1, |tail| tail as i64))
            .collect()
    }
}

/// Result of a complete traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSet {
    pub bones: Vec<Bone>,
    pub tail_index_table: TailIndexTable,
    pub terminals: TerminalSet,
    /// Number of breadth levels processed before the frontier drained.
    pub levels: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalState {
    Active,
    Drained,
}

/// Level-by-level traversal state.
///
/// The synthesizer owns its frontier and output; the mesh is borrowed per step so a
/// caller can hold both side by side and drive the traversal incrementally.
#[derive(Debug, Clone)]
pub struct ChainSynthesizer {
    settings: SetupSettings,
    names: NameScheme,
    terminals: TerminalSet,
    frontier: Vec<usize>,
    level: usize,
    bones: Vec<Bone>,
    bone_of: Vec<Option<usize>>,
    claimed_at: Vec<Option<usize>>,
    tail_index_table: TailIndexTable,
}

impl ChainSynthesizer {
    /// Fails with `InvalidVertexIndex` when a terminal lies outside `0..vertex_count`,
    /// i.e. the terminals were classified on a larger mesh.
    pub fn new(
        vertex_count: usize,
        terminals: TerminalSet,
        settings: SetupSettings,
        names: NameScheme,
    ) -> SkirtResult<Self> {
        if let Some(&index) = terminals
            .members()
            .iter()
            .chain(terminals.heads())
            .find(|&&v| v >= vertex_count)
        {
            return Err(SkirtError::InvalidVertexIndex {
                index,
                vertex_count,
            });
        }

        let frontier = terminals.heads().to_vec();
        let mut claimed_at = vec![None; vertex_count];
        for &v in &frontier {
            claimed_at[v] = Some(0);
        }
        Ok(Self {
            settings,
            names,
            terminals,
            frontier,
            level: 0,
            bones: Vec::new(),
            bone_of: vec![None; vertex_count],
            claimed_at,
            tail_index_table: TailIndexTable::new(vertex_count),
        })
    }

    pub fn state(&self) -> TraversalState {
        if self.frontier.is_empty() {
            TraversalState::Drained
        } else {
            TraversalState::Active
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn frontier(&self) -> &[usize] {
        &self.frontier
    }

    /// Processes one breadth level and installs the next frontier.
    pub fn step_level<M: MeshGraph + ?Sized>(&mut self, mesh: &M) -> SkirtResult<TraversalState> {
        if mesh.vertex_count() != self.bone_of.len() {
            return Err(SkirtError::MeshShapeMismatch {
                attribute: "mesh vertices",
                expected: self.bone_of.len(),
                actual: mesh.vertex_count(),
            });
        }

        let heads = std::mem::take(&mut self.frontier);
        let next_level = self.level + 1;
        let mut tails = Vec::new();
        for v in heads {
            let NeighborPair { top, bottom } =
                search_neighbor(mesh, v, self.settings.axis, self.settings.direction)?;

            // Leaving the selection ends the branch.
            if self.settings.select_only && !mesh.is_selected(bottom) {
                trace!(vertex = v, bottom, "bottom outside selection, bone discarded");
                continue;
            }

            if mesh.link_edge_count(bottom) > TERMINAL_VALENCE {
                match self.claimed_at[bottom] {
                    None => {
                        self.claimed_at[bottom] = Some(next_level);
                        tails.push(bottom);
                    }
                    Some(level) if level == next_level => {
                        warn!(vertex = bottom, level, "chains converge on one vertex");
                    }
                    Some(_) => {
                        return Err(SkirtError::DivergentTopology {
                            vertex: bottom,
                            level: next_level,
                        });
                    }
                }
            }

            let head = mesh.position(v);
            let tail = mesh.position(bottom);
            let roll = compute_roll(
                &mesh.normal(v),
                &bone_z_axis(&head, &tail),
                self.settings.axis,
                self.settings.direction,
            );
            self.tail_index_table.set(v, bottom);

            let parent = if self.terminals.contains(v) {
                None
            } else {
                self.bone_of[top]
            };
            let bone = Bone {
                name: self.names.bone_name(v),
                source_vertex: v,
                tail_vertex: bottom,
                head,
                tail,
                roll,
                parent,
                connected: parent.is_some(),
                level: self.level,
            };
            trace!(name = %bone.name, tail = bottom, roll, parent = ?parent, "emitted bone");
            self.bone_of[v] = Some(self.bones.len());
            self.bones.push(bone);
        }

        self.frontier = tails;
        self.level = next_level;
        Ok(self.state())
    }

    pub fn finish(self) -> ChainSet {
        ChainSet {
            bones: self.bones,
            tail_index_table: self.tail_index_table,
            terminals: self.terminals,
            levels: self.level,
        }
    }
}

/// Runs the traversal until the frontier drains.
pub fn synthesize_chains<M: MeshGraph + ?Sized>(
    mesh: &M,
    terminals: TerminalSet,
    settings: &SetupSettings,
    names: NameScheme,
) -> SkirtResult<ChainSet> {
    let mut synthesizer =
        ChainSynthesizer::new(mesh.vertex_count(), terminals, *settings, names)?;
    while synthesizer.state() == TraversalState::Active {
        synthesizer.step_level(mesh)?;
    }
    let chains = synthesizer.finish();
    debug!(
        bones = chains.bones.len(),
        levels = chains.levels,
        "chain traversal drained"
    );
    Ok(chains)
}
