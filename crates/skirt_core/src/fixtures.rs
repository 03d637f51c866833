//! Small meshes shared by the unit tests.

use crate::mesh::{MeshVertex, SkirtMesh};
use nalgebra::Vector3;
use std::f64::consts::TAU;

pub fn vertex_at(x: f64, y: f64, z: f64) -> MeshVertex {
    MeshVertex::new(Vector3::new(x, y, z), Vector3::x())
}

/// `count` vertices stacked downward along Z, each joined to the next.
pub fn line_mesh(count: usize) -> SkirtMesh {
    let vertices = (0..count)
        .map(|i| vertex_at(0.0, 0.0, -(i as f64)))
        .collect();
    let edges: Vec<[usize; 2]> = (1..count).map(|i| [i - 1, i]).collect();
    SkirtMesh::new(vertices, &edges).expect("line mesh")
}

/// Open tube of `rows` rings with `ring` vertices each, hanging from z = 0 down to
/// z = -(rows - 1). Vertex `row * ring + k` sits at angle `k / ring` of a turn.
pub fn cylinder(ring: usize, rows: usize) -> SkirtMesh {
    let mut positions = Vec::with_capacity(ring * rows);
    for row in 0..rows {
        for k in 0..ring {
            let angle = TAU * k as f64 / ring as f64;
            positions.push(Vector3::new(angle.cos(), angle.sin(), -(row as f64)));
        }
    }
    let mut polygons = Vec::new();
    for row in 0..rows.saturating_sub(1) {
        for k in 0..ring {
            let next = (k + 1) % ring;
            polygons.push(vec![
                row * ring + k,
                (row + 1) * ring + k,
                (row + 1) * ring + next,
                row * ring + next,
            ]);
        }
    }
    SkirtMesh::from_polygons(positions, &polygons).expect("cylinder mesh")
}

/// Two valence-3 roots (0, 1) whose chains both hang from root 0:
///
/// ```text
///  6 - 0     1 - 7,8        z =  0
///      | \   |
///      2 - - 3              z = -1
///      | \   |
///  9 - 4 --- 5              z = -2
/// ```
///
/// Vertex 3 lists 0 before 1, so its upward neighbor is 0.
pub fn branching_mesh() -> SkirtMesh {
    let vertices = vec![
        vertex_at(0.0, 0.0, 0.0),
        vertex_at(1.0, 0.0, 0.0),
        vertex_at(0.0, 0.0, -1.0),
        vertex_at(1.0, 0.0, -1.0),
        vertex_at(0.0, 0.0, -2.0),
        vertex_at(1.0, 0.0, -2.0),
        vertex_at(-1.0, 0.0, 0.0),
        vertex_at(2.0, 0.0, 0.0),
        vertex_at(2.0, 1.0, 0.0),
        vertex_at(0.0, 1.0, -2.0),
    ];
    let edges = [
        [0, 2],
        [0, 3],
        [0, 6],
        [1, 3],
        [1, 7],
        [1, 8],
        [2, 3],
        [2, 4],
        [2, 5],
        [3, 5],
        [4, 5],
        [4, 9],
    ];
    SkirtMesh::new(vertices, &edges).expect("branching mesh")
}

/// A chain whose third vertex is a local minimum, so its lowest neighbor leads back
/// up to the vertex emitted one level earlier.
///
/// Vertex 10 is a detached valence-3 terminal far below; it pulls the terminal mean
/// under vertex 0 so that 0 is the only head.
pub fn cyclic_mesh() -> SkirtMesh {
    let vertices = vec![
        vertex_at(0.0, 0.0, 1.0),
        vertex_at(0.0, 0.0, 0.0),
        vertex_at(0.0, 0.0, -1.0),
        vertex_at(1.0, 0.0, 2.0),
        vertex_at(-1.0, 0.0, 2.0),
        vertex_at(1.0, 0.0, 0.5),
        vertex_at(-1.0, 0.0, 0.5),
        vertex_at(1.0, 1.0, 0.5),
        vertex_at(-1.0, 1.0, 0.5),
        vertex_at(0.0, 1.0, 0.5),
        vertex_at(5.0, 0.0, -5.0),
        vertex_at(5.0, 0.0, -6.0),
        vertex_at(6.0, 0.0, -5.0),
        vertex_at(4.0, 0.0, -5.0),
    ];
    let edges = [
        [0, 1],
        [0, 3],
        [0, 4],
        [1, 2],
        [1, 5],
        [1, 6],
        [2, 7],
        [2, 8],
        [2, 9],
        [10, 11],
        [10, 12],
        [10, 13],
    ];
    SkirtMesh::new(vertices, &edges).expect("cyclic mesh")
}
