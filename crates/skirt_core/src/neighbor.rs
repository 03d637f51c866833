use crate::error::{SkirtError, SkirtResult};
use crate::settings::{Axis, Direction};
use crate::traits::MeshGraph;

/// Extremal edge-neighbors of a vertex along an axis.
///
/// `bottom` is always the neighbor further along the traversal direction and `top`
/// the one pointing back toward the chain root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborPair {
    pub top: usize,
    pub bottom: usize,
}

/// Finds the neighbors of `vertex` with the largest and smallest `axis` coordinate.
///
/// Comparisons are strict, so ties keep the neighbor that comes first in link order.
/// For `Direction::Plus` the pair is swapped.
pub fn search_neighbor<M: MeshGraph + ?Sized>(
    mesh: &M,
    vertex: usize,
    axis: Axis,
    direction: Direction,
) -> SkirtResult<NeighborPair> {
    let neighbors = mesh.link_neighbors(vertex);
    let (&first, rest) = neighbors
        .split_first()
        .ok_or(SkirtError::DegenerateTopology { vertex })?;

    let coord = |v: usize| axis.component(&mesh.position(v));
    let mut top = first;
    let mut bottom = first;
    for &other in rest {
        let value = coord(other);
        if value < coord(bottom) {
            bottom = other;
        } else if value > coord(top) {
            top = other;
        }
    }

    if direction.is_plus() {
        std::mem::swap(&mut top, &mut bottom);
    }
    Ok(NeighborPair { top, bottom })
}
