//! Level-at-a-time traversal so a host can keep its UI responsive on large meshes.

use crate::convert::parse_settings;
use crate::mesh::WasmSkirtMesh;
use anyhow::{bail, Result};
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use skirt_core::chain::{ChainSynthesizer, TraversalState};
use skirt_core::mesh::SkirtMesh;
use skirt_core::rig::RigPlan;
use skirt_core::settings::NameScheme;
use skirt_core::terminal::classify_terminals;
use skirt_core::traits::MeshGraph;
use skirt_core::SetupSettings;
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct TraversalProgress {
    done: bool,
    level: usize,
    bones: usize,
}

struct SkirtRunnerState {
    mesh: SkirtMesh,
    mesh_object: String,
    settings: SetupSettings,
    names: NameScheme,
    synthesizer: ChainSynthesizer,
    seeded: bool,
    done: bool,
    /// Set once a level fails; the partial traversal is never turned into a plan.
    failure: Option<String>,
}

impl SkirtRunnerState {
    fn new(mesh: SkirtMesh, mesh_object: &str, settings: SetupSettings) -> Result<Self> {
        let names = NameScheme::for_vertex_count(mesh.vertex_count());
        let terminals = classify_terminals(&mesh, &settings)?;
        let seeded = !terminals.heads().is_empty();
        let synthesizer = ChainSynthesizer::new(mesh.vertex_count(), terminals, settings, names)?;
        let done = synthesizer.state() == TraversalState::Drained;
        Ok(Self {
            mesh,
            mesh_object: mesh_object.to_string(),
            settings,
            names,
            synthesizer,
            seeded,
            done,
            failure: None,
        })
    }

    fn advance(&mut self, batch_size: usize) -> Result<TraversalProgress> {
        if let Some(failure) = &self.failure {
            bail!("{}", failure);
        }
        for _ in 0..batch_size {
            if self.done {
                break;
            }
            match self.synthesizer.step_level(&self.mesh) {
                Ok(TraversalState::Active) => {}
                Ok(TraversalState::Drained) => self.done = true,
                Err(err) => {
                    self.done = true;
                    self.failure = Some(err.to_string());
                    return Err(err.into());
                }
            }
        }
        Ok(self.progress())
    }

    fn progress(&self) -> TraversalProgress {
        TraversalProgress {
            done: self.done,
            level: self.synthesizer.level(),
            bones: self.synthesizer.bone_count(),
        }
    }

    /// `None` when classification found no chain seeds; an error after a failed level.
    fn plan(&self) -> Result<Option<RigPlan>> {
        if let Some(failure) = &self.failure {
            bail!("{}", failure);
        }
        if !self.seeded {
            return Ok(None);
        }
        let chains = self.synthesizer.clone().finish();
        Ok(Some(RigPlan::from_chains(
            &chains,
            &self.mesh_object,
            &self.settings,
            &self.names,
        )))
    }
}

#[wasm_bindgen]
pub struct WasmSkirtRunner {
    state: Option<SkirtRunnerState>,
}

#[wasm_bindgen]
impl WasmSkirtRunner {
    #[wasm_bindgen(constructor)]
    pub fn new(
        mesh: &WasmSkirtMesh,
        mesh_object: &str,
        axis: &str,
        direction: &str,
        select_only: bool,
        create_rig: bool,
    ) -> Result<WasmSkirtRunner, JsValue> {
        console_error_panic_hook::set_once();

        let settings = parse_settings(axis, direction, select_only, create_rig)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let state = SkirtRunnerState::new(mesh.mesh.clone(), mesh_object, settings)
            .map_err(|e| JsValue::from_str(&format!("Terminal classification failed: {}", e)))?;
        Ok(WasmSkirtRunner { state: Some(state) })
    }

    pub fn is_done(&self) -> bool {
        self.state.as_ref().map_or(true, |state| state.done)
    }

    pub fn run_levels(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;
        let progress = state
            .advance(batch_size as usize)
            .map_err(|e| JsValue::from_str(&format!("Chain synthesis failed: {}", e)))?;
        to_value(&progress).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn get_progress(&self) -> Result<JsValue, JsValue> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;
        to_value(&state.progress())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// The request list once traversal has drained; `null` when nothing was built.
    pub fn get_result(&self) -> Result<JsValue, JsValue> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;
        if !state.done {
            return Err(JsValue::from_str("Traversal has not finished"));
        }
        let plan = state
            .plan()
            .map_err(|e| JsValue::from_str(&format!("Chain synthesis failed: {}", e)))?;
        to_value(&plan).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
