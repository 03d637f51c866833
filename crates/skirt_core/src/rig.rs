//! Rig emission: turns a traversal result into host requests.
//!
//! `RigPlan` is a side-effect-free description of everything the host has to do.
//! `RigPlan::apply` performs it against the host stores; `setup_skirt` runs the
//! whole pipeline from mesh to committed rig.

use crate::chain::{synthesize_chains, ChainSet};
use crate::settings::{NameScheme, SetupSettings, ARMATURE_NAME};
use crate::terminal::classify_terminals;
use crate::traits::{IkConstraintStore, MeshGraph, WeightGroupStore};
use anyhow::{Context, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// IK reach of every generated constraint.
pub const IK_CHAIN_LENGTH: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightGroupRequest {
    pub name: String,
    pub vertex: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneRequest {
    pub name: String,
    pub source_vertex: usize,
    pub head: Vector3<f64>,
    pub tail: Vector3<f64>,
    pub roll: f64,
    /// Index into `RigPlan::bones`; always refers to an earlier entry.
    pub parent: Option<usize>,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IkRequest {
    /// Index into `RigPlan::bones`.
    pub bone: usize,
    pub target_object: String,
    pub target_group: String,
    pub chain_length: u32,
    pub stretch: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigPlan {
    pub armature_name: String,
    pub groups: Vec<WeightGroupRequest>,
    pub bones: Vec<BoneRequest>,
    pub constraints: Vec<IkRequest>,
    /// Breadth levels the traversal took to drain.
    pub levels: usize,
}

/// Counts of what a committed plan created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigSummary {
    pub groups: usize,
    pub bones: usize,
    pub constraints: usize,
    pub levels: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SetupOutcome {
    Built(RigSummary),
    /// Terminal classification found no chain seeds.
    EmptyChainSet,
}

impl RigPlan {
    /// Builds the request list for a traversal result.
    ///
    /// Every mesh vertex gets a full-weight group regardless of whether a bone uses it;
    /// IK constraints are only requested when `settings.create_rig` is set.
    pub fn from_chains(
        chains: &ChainSet,
        mesh_object: &str,
        settings: &SetupSettings,
        names: &NameScheme,
    ) -> Self {
        let groups = (0..chains.tail_index_table.len())
            .map(|vertex| WeightGroupRequest {
                name: names.group_name(vertex),
                vertex,
                weight: 1.0,
            })
            .collect();

        let bones = chains
            .bones
            .iter()
            .map(|bone| BoneRequest {
                name: bone.name.clone(),
                source_vertex: bone.source_vertex,
                head: bone.head,
                tail: bone.tail,
                roll: bone.roll,
                parent: bone.parent,
                connected: bone.connected,
            })
            .collect();

        let constraints = if settings.create_rig {
            chains
                .bones
                .iter()
                .enumerate()
                .map(|(index, bone)| {
                    let tail = chains
                        .tail_index_table
                        .get(bone.source_vertex)
                        .unwrap_or(bone.tail_vertex);
                    IkRequest {
                        bone: index,
                        target_object: mesh_object.to_string(),
                        target_group: names.group_name(tail),
                        chain_length: IK_CHAIN_LENGTH,
                        stretch: true,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            armature_name: ARMATURE_NAME.to_string(),
            groups,
            bones,
            constraints,
            levels: chains.levels,
        }
    }

    /// Commits the plan: weight groups first, then bones, then IK constraints.
    ///
    /// If any bone or constraint request fails, every bone created by this call is
    /// removed again (taking its constraints with it) and the host error is returned
    /// as is. Weight groups are kept; their replace semantics make a retry idempotent.
    pub fn apply<G, S>(&self, groups: &mut G, skeleton: &mut S) -> Result<RigSummary>
    where
        G: WeightGroupStore,
        S: IkConstraintStore,
    {
        for request in &self.groups {
            let group = groups.create_or_get_group(&request.name)?;
            groups.set_membership(group, request.vertex, request.weight)?;
        }

        let mut handles = Vec::with_capacity(self.bones.len());
        let committed = self
            .create_bones(skeleton, &mut handles)
            .and_then(|()| self.add_constraints(skeleton, &handles));
        if let Err(err) = committed {
            warn!(error = %err, created = handles.len(), "rolling back rig bones");
            for &handle in handles.iter().rev() {
                if let Err(cleanup) = skeleton.remove_bone(handle) {
                    warn!(error = %cleanup, "failed to remove bone during rollback");
                }
            }
            return Err(err);
        }

        debug!(
            groups = self.groups.len(),
            bones = self.bones.len(),
            constraints = self.constraints.len(),
            "applied rig plan"
        );
        Ok(RigSummary {
            groups: self.groups.len(),
            bones: self.bones.len(),
            constraints: self.constraints.len(),
            levels: self.levels,
        })
    }

    fn create_bones<S: IkConstraintStore>(
        &self,
        skeleton: &mut S,
        handles: &mut Vec<S::Bone>,
    ) -> Result<()> {
        for request in &self.bones {
            let bone = skeleton.create_bone(&request.name)?;
            handles.push(bone);
            skeleton.set_head(bone, request.head)?;
            skeleton.set_tail(bone, request.tail)?;
            skeleton.set_roll(bone, request.roll)?;
            if let Some(parent) = request.parent {
                let parent = *handles
                    .get(parent)
                    .with_context(|| format!("Bone '{}' has no earlier parent.", request.name))?;
                skeleton.set_parent(bone, parent, request.connected)?;
            }
        }
        Ok(())
    }

    fn add_constraints<S: IkConstraintStore>(
        &self,
        skeleton: &mut S,
        handles: &[S::Bone],
    ) -> Result<()> {
        for request in &self.constraints {
            let bone = *handles
                .get(request.bone)
                .with_context(|| format!("IK request refers to missing bone {}.", request.bone))?;
            skeleton.add_ik(
                bone,
                &request.target_object,
                &request.target_group,
                request.chain_length,
                request.stretch,
            )?;
            skeleton.set_ik_stretch(bone, request.stretch)?;
        }
        Ok(())
    }
}

/// Classifies terminals and synthesizes chains, returning `None` when there is
/// nothing to build.
pub fn plan_skirt<M: MeshGraph + ?Sized>(
    mesh: &M,
    mesh_object: &str,
    settings: &SetupSettings,
) -> Result<Option<(RigPlan, ChainSet)>> {
    let names = NameScheme::for_vertex_count(mesh.vertex_count());
    let terminals = classify_terminals(mesh, settings)?;
    if terminals.heads().is_empty() {
        debug!(terminals = terminals.len(), "no chain seeds found");
        return Ok(None);
    }
    let chains = synthesize_chains(mesh, terminals, settings, names)?;
    let plan = RigPlan::from_chains(&chains, mesh_object, settings, &names);
    Ok(Some((plan, chains)))
}

/// Runs the full pipeline and commits the result to the host stores.
pub fn setup_skirt<M, G, S>(
    mesh: &M,
    mesh_object: &str,
    groups: &mut G,
    skeleton: &mut S,
    settings: &SetupSettings,
) -> Result<SetupOutcome>
where
    M: MeshGraph + ?Sized,
    G: WeightGroupStore,
    S: IkConstraintStore,
{
    let Some((plan, _)) = plan_skirt(mesh, mesh_object, settings)? else {
        return Ok(SetupOutcome::EmptyChainSet);
    };
    Ok(SetupOutcome::Built(plan.apply(groups, skeleton)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armature::{Armature, BoneHandle, VertexGroups};
    use crate::error::SkirtError;
    use crate::fixtures::{cyclic_mesh, cylinder, line_mesh, vertex_at};
    use crate::mesh::SkirtMesh;
    use crate::traits::SkeletonStore;
    use anyhow::bail;

    /// Armature that refuses further bones or constraints past a fixed count.
    struct LimitedArmature {
        inner: Armature,
        bone_limit: usize,
        ik_limit: usize,
        constraints: usize,
    }

    impl LimitedArmature {
        fn new(bone_limit: usize, ik_limit: usize) -> Self {
            Self {
                inner: Armature::new(Vector3::zeros()),
                bone_limit,
                ik_limit,
                constraints: 0,
            }
        }
    }

    impl SkeletonStore for LimitedArmature {
        type Bone = BoneHandle;

        fn create_bone(&mut self, name: &str) -> Result<BoneHandle> {
            if self.inner.bone_count() >= self.bone_limit {
                bail!("Armature is limited to {} bones.", self.bone_limit);
            }
            self.inner.create_bone(name)
        }

        fn set_head(&mut self, bone: BoneHandle, position: Vector3<f64>) -> Result<()> {
            self.inner.set_head(bone, position)
        }

        fn set_tail(&mut self, bone: BoneHandle, position: Vector3<f64>) -> Result<()> {
            self.inner.set_tail(bone, position)
        }

        fn set_roll(&mut self, bone: BoneHandle, radians: f64) -> Result<()> {
            self.inner.set_roll(bone, radians)
        }

        fn set_parent(&mut self, bone: BoneHandle, parent: BoneHandle, connected: bool) -> Result<()> {
            self.inner.set_parent(bone, parent, connected)
        }

        fn remove_bone(&mut self, bone: BoneHandle) -> Result<()> {
            self.inner.remove_bone(bone)
        }

        fn set_ik_stretch(&mut self, bone: BoneHandle, stretch: bool) -> Result<()> {
            self.inner.set_ik_stretch(bone, stretch)
        }
    }

    impl IkConstraintStore for LimitedArmature {
        fn add_ik(
            &mut self,
            bone: BoneHandle,
            target_object: &str,
            target_group: &str,
            chain_length: u32,
            stretch: bool,
        ) -> Result<()> {
            if self.constraints >= self.ik_limit {
                bail!("Constraint stack is full after {} entries.", self.ik_limit);
            }
            self.constraints += 1;
            self.inner
                .add_ik(bone, target_object, target_group, chain_length, stretch)
        }
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn plan_requests_a_group_for_every_vertex() {
        let mesh = cylinder(4, 3);
        let (plan, _) = plan_skirt(&mesh, "Skirt", &SetupSettings::default())
            .expect("plan")
            .expect("seeds");
        assert_eq!(plan.groups.len(), 12);
        assert_eq!(plan.groups[7].name, "skirt_t.007");
        assert!(plan.groups.iter().all(|g| g.weight == 1.0));
        assert_eq!(plan.armature_name, "Auto_Setuped_Skirt");
    }

    #[test]
    fn ik_targets_the_group_of_the_tail_vertex() {
        let mesh = cylinder(4, 3);
        let (plan, chains) = plan_skirt(&mesh, "Skirt", &SetupSettings::default())
            .expect("plan")
            .expect("seeds");
        assert_eq!(plan.constraints.len(), plan.bones.len());
        for ik in &plan.constraints {
            let bone = &chains.bones[ik.bone];
            assert_eq!(ik.target_group, format!("skirt_t.{:03}", bone.tail_vertex));
            assert_eq!(ik.target_object, "Skirt");
            assert_eq!(ik.chain_length, 1);
            assert!(ik.stretch);
        }
    }

    #[test]
    fn no_constraints_without_rig() {
        let mesh = cylinder(4, 3);
        let settings = SetupSettings {
            create_rig: false,
            ..SetupSettings::default()
        };
        let (plan, _) = plan_skirt(&mesh, "Skirt", &settings)
            .expect("plan")
            .expect("seeds");
        assert!(plan.constraints.is_empty());
        assert_eq!(plan.groups.len(), 12);
        assert_eq!(plan.bones.len(), 8);
    }

    #[test]
    fn straight_line_builds_nothing() {
        let mesh = line_mesh(4);
        let mut groups = VertexGroups::default();
        let mut armature = Armature::new(Vector3::zeros());
        let outcome = setup_skirt(&mesh, "Line", &mut groups, &mut armature, &SetupSettings::default())
            .expect("setup");
        assert_eq!(outcome, SetupOutcome::EmptyChainSet);
        assert!(groups.is_empty());
        assert_eq!(armature.bone_count(), 0);
    }

    #[test]
    fn setup_commits_bones_groups_and_constraints() {
        let mesh = cylinder(8, 5);
        let mut groups = VertexGroups::default();
        let mut armature = Armature::new(Vector3::zeros());
        let outcome = setup_skirt(&mesh, "Skirt", &mut groups, &mut armature, &SetupSettings::default())
            .expect("setup");
        assert_eq!(
            outcome,
            SetupOutcome::Built(RigSummary {
                groups: 40,
                bones: 32,
                constraints: 32,
                levels: 4,
            })
        );

        let child = armature.bone_by_name("skirt.013").expect("bone");
        let parent = armature.bone_by_name("skirt.005").expect("parent");
        assert_eq!(child.parent.as_deref(), Some("skirt.005"));
        assert!(child.connected);
        assert!(child.ik_stretch);
        assert_eq!(child.constraints.len(), 1);
        assert_eq!(child.constraints[0].subtarget, "skirt_t.021");
        assert_eq!(parent.constraints[0].subtarget, "skirt_t.013");
    }

    #[test]
    fn rerunning_reuses_weight_groups() {
        let mesh = cylinder(8, 5);
        let mut groups = VertexGroups::default();
        let mut first = Armature::new(Vector3::zeros());
        let mut second = Armature::new(Vector3::zeros());
        setup_skirt(&mesh, "Skirt", &mut groups, &mut first, &SetupSettings::default())
            .expect("first run");
        setup_skirt(&mesh, "Skirt", &mut groups, &mut second, &SetupSettings::default())
            .expect("second run");

        assert_eq!(groups.len(), 40);
        assert_eq!(groups.weight("skirt_t.012", 12), Some(1.0));
        assert_eq!(first.bones().collect::<Vec<_>>(), second.bones().collect::<Vec<_>>());
    }

    #[test]
    fn divergent_topology_commits_nothing() {
        let mesh = cyclic_mesh();
        let mut groups = VertexGroups::default();
        let mut armature = Armature::new(Vector3::zeros());
        let result = setup_skirt(&mesh, "Loop", &mut groups, &mut armature, &SetupSettings::default());

        let err = result.expect_err("cycle");
        assert_eq!(
            err.downcast_ref::<SkirtError>(),
            Some(&SkirtError::DivergentTopology { vertex: 1, level: 3 })
        );
        assert!(groups.is_empty());
        assert_eq!(armature.bone_count(), 0);
    }

    #[test]
    fn failed_bone_creation_rolls_back() {
        let mesh = cylinder(4, 3);
        let mut groups = VertexGroups::default();
        let mut armature = LimitedArmature::new(5, usize::MAX);
        let err = setup_skirt(&mesh, "Skirt", &mut groups, &mut armature, &SetupSettings::default())
            .expect_err("sixth bone is refused");
        assert_eq!(format!("{err:#}"), "Armature is limited to 5 bones.");
        assert_eq!(armature.inner.bone_count(), 0);
        assert_eq!(groups.len(), 12);
    }

    #[test]
    fn failed_constraint_rolls_back_bones() {
        let mesh = cylinder(4, 3);
        let mut groups = VertexGroups::default();
        let mut armature = LimitedArmature::new(usize::MAX, 3);
        assert_err_contains(
            setup_skirt(&mesh, "Skirt", &mut groups, &mut armature, &SetupSettings::default()),
            "Constraint stack is full after 3 entries.",
        );
        assert_eq!(armature.inner.bone_count(), 0);
        assert!(armature.inner.bones().all(|b| b.constraints.is_empty()));
    }

    #[test]
    fn plan_reports_traversal_levels() {
        let mesh = cylinder(8, 5);
        let (plan, chains) = plan_skirt(&mesh, "Skirt", &SetupSettings::default())
            .expect("plan")
            .expect("seeds");
        assert_eq!(plan.levels, chains.levels);

        let mut groups = VertexGroups::default();
        let mut armature = Armature::new(Vector3::zeros());
        let summary = plan.apply(&mut groups, &mut armature).expect("apply");
        assert_eq!(summary.levels, 4);
    }

    #[test]
    fn single_terminal_builds_nothing() {
        let vertices = vec![
            vertex_at(0.0, 0.0, 0.0),
            vertex_at(1.0, 0.0, -1.0),
            vertex_at(-1.0, 0.0, -1.0),
            vertex_at(0.0, 1.0, -1.0),
        ];
        let mesh = SkirtMesh::new(vertices, &[[0, 1], [0, 2], [0, 3]]).expect("mesh");
        let mut groups = VertexGroups::default();
        let mut armature = Armature::new(Vector3::zeros());
        let outcome = setup_skirt(&mesh, "Star", &mut groups, &mut armature, &SetupSettings::default())
            .expect("setup");
        assert_eq!(outcome, SetupOutcome::EmptyChainSet);
        assert_eq!(armature.bone_count(), 0);
    }

    #[test]
    fn single_selected_row_builds_groups_but_no_bones() {
        let mesh = cylinder(8, 5)
            .with_selection(&[8, 9, 10, 11, 12, 13])
            .expect("selection");
        let settings = SetupSettings {
            select_only: true,
            ..SetupSettings::default()
        };
        let mut groups = VertexGroups::default();
        let mut armature = Armature::new(Vector3::zeros());
        let outcome =
            setup_skirt(&mesh, "Skirt", &mut groups, &mut armature, &settings).expect("setup");
        assert_eq!(
            outcome,
            SetupOutcome::Built(RigSummary {
                groups: 40,
                bones: 0,
                constraints: 0,
                levels: 1,
            })
        );
        assert_eq!(armature.bone_count(), 0);
    }
}
