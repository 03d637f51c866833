//! Mesh wrapper and one-shot setup entry points.

use crate::convert::{parse_settings, polygons_from_flat, vectors_from_flat};
use nalgebra::Vector3;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use skirt_core::armature::{Armature, ArmatureSnapshot, VertexGroups};
use skirt_core::mesh::SkirtMesh;
use skirt_core::rig::plan_skirt;
use skirt_core::traits::MeshGraph;
use skirt_core::{setup_skirt, SetupOutcome, SetupSettings};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSkirtMesh {
    pub(crate) mesh: SkirtMesh,
}

/// Everything a host needs to mirror a finished run.
#[derive(Serialize)]
struct SetupPayload {
    outcome: SetupOutcome,
    armature: Option<ArmatureSnapshot>,
    groups: VertexGroups,
}

#[wasm_bindgen]
impl WasmSkirtMesh {
    /// Builds the mesh from flat positions and polygons given as a flat index list
    /// plus per-polygon corner counts.
    #[wasm_bindgen(constructor)]
    pub fn new(
        positions: Vec<f64>,
        polygon_indices: Vec<u32>,
        polygon_sizes: Vec<u32>,
    ) -> Result<WasmSkirtMesh, JsValue> {
        console_error_panic_hook::set_once();

        let positions = vectors_from_flat(&positions, "positions")
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let polygons = polygons_from_flat(&polygon_indices, &polygon_sizes)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let mesh = SkirtMesh::from_polygons(positions, &polygons)
            .map_err(|e| JsValue::from_str(&format!("Invalid mesh: {}", e)))?;
        Ok(WasmSkirtMesh { mesh })
    }

    /// Replaces the derived normals with the host's vertex normals.
    pub fn set_normals(&mut self, normals: Vec<f64>) -> Result<(), JsValue> {
        let normals =
            vectors_from_flat(&normals, "normals").map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.mesh = self
            .mesh
            .clone()
            .with_normals(&normals)
            .map_err(|e| JsValue::from_str(&format!("Invalid normals: {}", e)))?;
        Ok(())
    }

    pub fn set_selection(&mut self, selected: Vec<u32>) -> Result<(), JsValue> {
        let selected: Vec<usize> = selected.into_iter().map(|i| i as usize).collect();
        self.mesh = self
            .mesh
            .clone()
            .with_selection(&selected)
            .map_err(|e| JsValue::from_str(&format!("Invalid selection: {}", e)))?;
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn edge_count(&self) -> usize {
        self.mesh.edges().len()
    }

    /// Returns the request list the host has to perform, or `null` when there is
    /// nothing to build.
    pub fn plan(
        &self,
        mesh_object: &str,
        axis: &str,
        direction: &str,
        select_only: bool,
        create_rig: bool,
    ) -> Result<JsValue, JsValue> {
        let settings = parse_settings(axis, direction, select_only, create_rig)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let plan = plan_skirt(&self.mesh, mesh_object, &settings)
            .map_err(|e| JsValue::from_str(&format!("Skirt setup failed: {}", e)))?
            .map(|(plan, _)| plan);
        to_value(&plan).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Runs the full pipeline against an in-memory armature placed at `location`.
    pub fn setup(
        &self,
        mesh_object: &str,
        location: Vec<f64>,
        axis: &str,
        direction: &str,
        select_only: bool,
        create_rig: bool,
    ) -> Result<JsValue, JsValue> {
        let settings = parse_settings(axis, direction, select_only, create_rig)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let location = match location.as_slice() {
            [x, y, z] => Vector3::new(*x, *y, *z),
            _ => return Err(JsValue::from_str("Location must have three components.")),
        };
        let payload = run_setup(&self.mesh, mesh_object, location, &settings)
            .map_err(|e| JsValue::from_str(&format!("Skirt setup failed: {}", e)))?;
        to_value(&payload).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

fn run_setup(
    mesh: &SkirtMesh,
    mesh_object: &str,
    location: Vector3<f64>,
    settings: &SetupSettings,
) -> anyhow::Result<SetupPayload> {
    let mut groups = VertexGroups::default();
    let mut armature = Armature::new(location);
    let outcome = setup_skirt(mesh, mesh_object, &mut groups, &mut armature, settings)?;
    let armature = match outcome {
        SetupOutcome::Built(_) => Some(armature.snapshot()),
        SetupOutcome::EmptyChainSet => None,
    };
    Ok(SetupPayload {
        outcome,
        armature,
        groups,
    })
}
