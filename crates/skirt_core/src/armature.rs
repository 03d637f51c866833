//! In-memory host stores.
//!
//! `Armature` and `VertexGroups` implement the host traits without an authoring
//! application behind them. They follow the host's observable rules: bone names are
//! made unique with a numeric suffix, groups are reused by name, and removing a bone
//! detaches its children.

use crate::error::SkirtError;
use crate::settings::ARMATURE_NAME;
use crate::traits::{IkConstraintStore, SkeletonStore, WeightGroupStore};
use anyhow::Result;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IkConstraint {
    pub target_object: String,
    pub subtarget: String,
    pub chain_count: u32,
    pub use_stretch: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmatureBone {
    pub name: String,
    pub head: Vector3<f64>,
    pub tail: Vector3<f64>,
    pub roll: f64,
    pub parent: Option<String>,
    pub connected: bool,
    pub ik_stretch: bool,
    pub constraints: Vec<IkConstraint>,
}

impl ArmatureBone {
    fn new(name: String) -> Self {
        Self {
            name,
            head: Vector3::zeros(),
            tail: Vector3::zeros(),
            roll: 0.0,
            parent: None,
            connected: false,
            ik_stretch: false,
            constraints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoneHandle(usize);

/// Serializable view of the live bones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmatureSnapshot {
    pub name: String,
    pub location: Vector3<f64>,
    pub bones: Vec<ArmatureBone>,
}

#[derive(Debug, Clone)]
pub struct Armature {
    name: String,
    location: Vector3<f64>,
    slots: Vec<Option<ArmatureBone>>,
}

impl Armature {
    /// Creates an empty armature at the mesh object's location.
    pub fn new(location: Vector3<f64>) -> Self {
        Self {
            name: ARMATURE_NAME.to_string(),
            location,
            slots: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bones(&self) -> impl Iterator<Item = &ArmatureBone> + '_ {
        self.slots.iter().flatten()
    }

    pub fn bone_count(&self) -> usize {
        self.bones().count()
    }

    pub fn bone_by_name(&self, name: &str) -> Option<&ArmatureBone> {
        self.bones().find(|bone| bone.name == name)
    }

    pub fn snapshot(&self) -> ArmatureSnapshot {
        ArmatureSnapshot {
            name: self.name.clone(),
            location: self.location,
            bones: self.bones().cloned().collect(),
        }
    }

    fn bone_mut(&mut self, handle: BoneHandle) -> Result<&mut ArmatureBone, SkirtError> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(SkirtError::UnknownBone(handle.0))
    }

    fn unique_name(&self, name: &str) -> String {
        if self.bone_by_name(name).is_none() {
            return name.to_string();
        }
        (1..)
            .map(|suffix| format!("{name}.{suffix:03}"))
            .find(|candidate| self.bone_by_name(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }
}

impl SkeletonStore for Armature {
    type Bone = BoneHandle;

    fn create_bone(&mut self, name: &str) -> Result<BoneHandle> {
        let name = self.unique_name(name);
        self.slots.push(Some(ArmatureBone::new(name)));
        Ok(BoneHandle(self.slots.len() - 1))
    }

    fn set_head(&mut self, bone: BoneHandle, position: Vector3<f64>) -> Result<()> {
        self.bone_mut(bone)?.head = position;
        Ok(())
    }

    fn set_tail(&mut self, bone: BoneHandle, position: Vector3<f64>) -> Result<()> {
        self.bone_mut(bone)?.tail = position;
        Ok(())
    }

    fn set_roll(&mut self, bone: BoneHandle, radians: f64) -> Result<()> {
        self.bone_mut(bone)?.roll = radians;
        Ok(())
    }

    fn set_parent(&mut self, bone: BoneHandle, parent: BoneHandle, connected: bool) -> Result<()> {
        let parent_bone = self.bone_mut(parent)?;
        let parent_name = parent_bone.name.clone();
        let parent_tail = parent_bone.tail;
        let child = self.bone_mut(bone)?;
        child.parent = Some(parent_name);
        child.connected = connected;
        // A connected child's head snaps to the parent's tail.
        if connected {
            child.head = parent_tail;
        }
        Ok(())
    }

    fn remove_bone(&mut self, bone: BoneHandle) -> Result<()> {
        let removed = self
            .slots
            .get_mut(bone.0)
            .and_then(Option::take)
            .ok_or(SkirtError::UnknownBone(bone.0))?;
        for child in self.slots.iter_mut().flatten() {
            if child.parent.as_deref() == Some(removed.name.as_str()) {
                child.parent = None;
                child.connected = false;
            }
        }
        Ok(())
    }

    fn set_ik_stretch(&mut self, bone: BoneHandle, stretch: bool) -> Result<()> {
        self.bone_mut(bone)?.ik_stretch = stretch;
        Ok(())
    }
}

impl IkConstraintStore for Armature {
    fn add_ik(
        &mut self,
        bone: BoneHandle,
        target_object: &str,
        target_group: &str,
        chain_length: u32,
        stretch: bool,
    ) -> Result<()> {
        self.bone_mut(bone)?.constraints.push(IkConstraint {
            target_object: target_object.to_string(),
            subtarget: target_group.to_string(),
            chain_count: chain_length,
            use_stretch: stretch,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightGroup {
    pub name: String,
    pub weights: BTreeMap<usize, f64>,
}

/// Vertex groups of one mesh object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexGroups {
    groups: Vec<WeightGroup>,
}

impl VertexGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[WeightGroup] {
        &self.groups
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|group| group.name == name)
    }

    pub fn weight(&self, name: &str, vertex: usize) -> Option<f64> {
        let index = self.find(name)?;
        self.groups[index].weights.get(&vertex).copied()
    }
}

impl WeightGroupStore for VertexGroups {
    type Group = usize;

    fn create_or_get_group(&mut self, name: &str) -> Result<usize> {
        if let Some(index) = self.find(name) {
            return Ok(index);
        }
        self.groups.push(WeightGroup {
            name: name.to_string(),
            weights: BTreeMap::new(),
        });
        Ok(self.groups.len() - 1)
    }

    fn set_membership(&mut self, group: usize, vertex: usize, weight: f64) -> Result<()> {
        let group = self
            .groups
            .get_mut(group)
            .ok_or(SkirtError::UnknownGroup(group))?;
        group.weights.insert(vertex, weight);
        Ok(())
    }
}
