use crate::error::SkirtResult;
use crate::neighbor::search_neighbor;
use crate::settings::{Axis, Direction, SetupSettings};
use crate::traits::MeshGraph;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Valence of an open-edge vertex on a quad-grid skirt.
pub const TERMINAL_VALENCE: usize = 3;

/// Vertices chosen as chain roots for one run.
///
/// `members` holds every classified terminal in index order; `heads` is the subset
/// the traversal starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalSet {
    members: Vec<usize>,
    heads: Vec<usize>,
    is_member: Vec<bool>,
}

impl TerminalSet {
    fn new(vertex_count: usize, members: Vec<usize>, heads: Vec<usize>) -> Self {
        let mut is_member = vec![false; vertex_count];
        for &v in &members {
            is_member[v] = true;
        }
        Self {
            members,
            heads,
            is_member,
        }
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn heads(&self) -> &[usize] {
        &self.heads
    }

    pub fn contains(&self, vertex: usize) -> bool {
        self.is_member.get(vertex).copied().unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

/// Classifies chain seeds with the policy selected by `settings.select_only`.
pub fn classify_terminals<M: MeshGraph + ?Sized>(
    mesh: &M,
    settings: &SetupSettings,
) -> SkirtResult<TerminalSet> {
    let terminals = if settings.select_only {
        selected_terminals(mesh, settings.axis, settings.direction)?
    } else {
        topological_terminals(mesh, settings.axis, settings.direction)
    };
    debug!(
        members = terminals.len(),
        heads = terminals.heads().len(),
        select_only = settings.select_only,
        "classified terminal vertices"
    );
    Ok(terminals)
}

/// Valence-3 vertices, split around their mean coordinate so that chains start from
/// the ring lying furthest back along the traversal direction.
pub fn topological_terminals<M: MeshGraph + ?Sized>(
    mesh: &M,
    axis: Axis,
    direction: Direction,
) -> TerminalSet {
    let n = mesh.vertex_count();
    let members: Vec<usize> = (0..n)
        .filter(|&v| mesh.link_edge_count(v) == TERMINAL_VALENCE)
        .collect();
    if members.is_empty() {
        return TerminalSet::new(n, members, Vec::new());
    }

    let weight = 1.0 / members.len() as f64;
    let mean = members
        .iter()
        .map(|&v| axis.component(&mesh.position(v)) * weight)
        .sum::<f64>();
    let heads = members
        .iter()
        .copied()
        .filter(|&v| {
            let coord = axis.component(&mesh.position(v));
            match direction {
                Direction::Plus => coord < mean,
                Direction::Minus => coord > mean,
            }
        })
        .collect();
    TerminalSet::new(n, members, heads)
}

/// Selected vertices on the boundary of the selection; all of them are heads.
pub fn selected_terminals<M: MeshGraph + ?Sized>(
    mesh: &M,
    axis: Axis,
    direction: Direction,
) -> SkirtResult<TerminalSet> {
    let n = mesh.vertex_count();
    let mut members = Vec::new();
    for v in 0..n {
        if is_selected_terminal(mesh, v, axis, direction)? {
            members.push(v);
        }
    }
    Ok(TerminalSet::new(n, members.clone(), members))
}

/// More incident edges than faces: the vertex sits on an open boundary.
pub fn is_non_manifold<M: MeshGraph + ?Sized>(mesh: &M, vertex: usize) -> bool {
    mesh.link_edge_count(vertex) > mesh.link_face_count(vertex)
}

/// No selected edge-neighbor.
pub fn is_isolation_point<M: MeshGraph + ?Sized>(mesh: &M, vertex: usize) -> bool {
    !mesh
        .link_neighbors(vertex)
        .iter()
        .any(|&other| mesh.is_selected(other))
}

pub fn is_selected_terminal<M: MeshGraph + ?Sized>(
    mesh: &M,
    vertex: usize,
    axis: Axis,
    direction: Direction,
) -> SkirtResult<bool> {
    if !mesh.is_selected(vertex) {
        return Ok(false);
    }
    if is_non_manifold(mesh, vertex) {
        return Ok(true);
    }
    if is_isolation_point(mesh, vertex) {
        return Ok(false);
    }
    let pair = search_neighbor(mesh, vertex, axis, direction)?;
    Ok(!mesh.is_selected(pair.top))
}
