//! Adjacency-backed mesh graph.
//!
//! `SkirtMesh` is the read-only view the traversal runs on. It can be built from
//! explicit edges (wire graphs, test fixtures) or from polygons, in which case the
//! edge set, link-edge order and per-vertex face counts are derived the way the
//! authoring host does it: edges appear in the order their first polygon lists them.

use crate::error::{SkirtError, SkirtResult};
use crate::traits::MeshGraph;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Per-vertex attributes supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub position: Vector3<f64>,
    pub normal: Vector3<f64>,
    pub selected: bool,
}

impl MeshVertex {
    pub fn new(position: Vector3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal,
            selected: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkirtMesh {
    vertices: Vec<MeshVertex>,
    edges: Vec<[usize; 2]>,
    link_neighbors: Vec<Vec<usize>>,
    link_faces: Vec<usize>,
}

/// Canonical key for an undirected edge.
fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl SkirtMesh {
    /// Builds a face-less graph from explicit edges.
    ///
    /// Duplicate edges and self-loops are dropped; the first occurrence fixes the
    /// link order at both endpoints.
    pub fn new(vertices: Vec<MeshVertex>, edges: &[[usize; 2]]) -> SkirtResult<Self> {
        let mut mesh = Self {
            link_neighbors: vec![Vec::new(); vertices.len()],
            link_faces: vec![0; vertices.len()],
            vertices,
            edges: Vec::with_capacity(edges.len()),
        };
        let mut seen = HashSet::new();
        for &[a, b] in edges {
            mesh.check_index(a)?;
            mesh.check_index(b)?;
            mesh.insert_edge(a, b, &mut seen);
        }
        Ok(mesh)
    }

    /// Builds a mesh from n-gon polygons, deriving edges, face counts and smooth
    /// area-weighted normals.
    pub fn from_polygons(
        positions: Vec<Vector3<f64>>,
        polygons: &[Vec<usize>],
    ) -> SkirtResult<Self> {
        let vertices = positions
            .into_iter()
            .map(|p| MeshVertex::new(p, Vector3::zeros()))
            .collect::<Vec<_>>();
        let n_verts = vertices.len();
        let mut mesh = Self {
            vertices,
            edges: Vec::new(),
            link_neighbors: vec![Vec::new(); n_verts],
            link_faces: vec![0; n_verts],
        };

        let mut seen = HashSet::new();
        let mut normal_accum = vec![Vector3::zeros(); n_verts];
        for polygon in polygons {
            for &vi in polygon {
                mesh.check_index(vi)?;
            }
            let n = polygon.len();
            if n < 3 {
                continue;
            }
            let mut counted = HashSet::with_capacity(n);
            for (i, &vi) in polygon.iter().enumerate() {
                if counted.insert(vi) {
                    mesh.link_faces[vi] += 1;
                }
                mesh.insert_edge(vi, polygon[(i + 1) % n], &mut seen);
            }

            // Fan cross products sum to twice the polygon's area-weighted normal;
            // every corner receives the whole polygon.
            let a = mesh.vertices[polygon[0]].position;
            let mut face_normal = Vector3::zeros();
            for i in 1..(n - 1) {
                let b = mesh.vertices[polygon[i]].position;
                let c = mesh.vertices[polygon[i + 1]].position;
                face_normal += (b - a).cross(&(c - a));
            }
            for &vi in polygon {
                normal_accum[vi] += face_normal;
            }
        }

        for (vertex, accum) in mesh.vertices.iter_mut().zip(normal_accum) {
            vertex.normal = accum.try_normalize(0.0).unwrap_or_else(Vector3::zeros);
        }
        Ok(mesh)
    }

    /// Replaces the derived normals with host-supplied ones.
    pub fn with_normals(mut self, normals: &[Vector3<f64>]) -> SkirtResult<Self> {
        if normals.len() != self.vertices.len() {
            return Err(SkirtError::MeshShapeMismatch {
                attribute: "normals",
                expected: self.vertices.len(),
                actual: normals.len(),
            });
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = *normal;
        }
        Ok(self)
    }

    /// Marks exactly the listed vertices as selected.
    pub fn with_selection(mut self, selected: &[usize]) -> SkirtResult<Self> {
        for vertex in &mut self.vertices {
            vertex.selected = false;
        }
        for &index in selected {
            self.check_index(index)?;
            self.vertices[index].selected = true;
        }
        Ok(self)
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    fn check_index(&self, index: usize) -> SkirtResult<()> {
        if index >= self.vertices.len() {
            return Err(SkirtError::InvalidVertexIndex {
                index,
                vertex_count: self.vertices.len(),
            });
        }
        Ok(())
    }

    fn insert_edge(&mut self, a: usize, b: usize, seen: &mut HashSet<(usize, usize)>) {
        if a == b || !seen.insert(edge_key(a, b)) {
            return;
        }
        self.edges.push([a, b]);
        self.link_neighbors[a].push(b);
        self.link_neighbors[b].push(a);
    }
}

impl MeshGraph for SkirtMesh {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn position(&self, vertex: usize) -> Vector3<f64> {
        self.vertices[vertex].position
    }

    fn normal(&self, vertex: usize) -> Vector3<f64> {
        self.vertices[vertex].normal
    }

    fn is_selected(&self, vertex: usize) -> bool {
        self.vertices[vertex].selected
    }

    fn link_neighbors(&self, vertex: usize) -> &[usize] {
        &self.link_neighbors[vertex]
    }

    fn link_face_count(&self, vertex: usize) -> usize {
        self.link_faces[vertex]
    }
}
