use anyhow::{bail, Error};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// World axis along which chains are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index into a position or normal.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn component(self, v: &Vector3<f64>) -> f64 {
        v[self.index()]
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "X" | "x" => Ok(Axis::X),
            "Y" | "y" => Ok(Axis::Y),
            "Z" | "z" => Ok(Axis::Z),
            other => bail!("Unknown axis '{}'. Expected X, Y or Z.", other),
        }
    }
}

/// Signed orientation of the traversal along the chosen axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Plus,
    Minus,
}

impl Direction {
    pub fn is_plus(self) -> bool {
        matches!(self, Direction::Plus)
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "+" | "plus" => Ok(Direction::Plus),
            "-" | "minus" => Ok(Direction::Minus),
            other => bail!("Unknown direction '{}'. Expected + or -.", other),
        }
    }
}

/// Parameters of a single setup run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetupSettings {
    pub axis: Axis,
    pub direction: Direction,
    /// Seed chains from the selected boundary instead of vertex valence.
    pub select_only: bool,
    /// Emit an IK constraint per bone.
    pub create_rig: bool,
}

impl Default for SetupSettings {
    fn default() -> Self {
        Self {
            axis: Axis::Z,
            direction: Direction::Minus,
            select_only: false,
            create_rig: true,
        }
    }
}

pub const BONE_PREFIX: &str = "skirt.";
pub const GROUP_PREFIX: &str = "skirt_t.";
pub const ARMATURE_NAME: &str = "Auto_Setuped_Skirt";
const MIN_INDEX_WIDTH: usize = 3;

/// Deterministic bone and weight-group names for one run.
///
/// Indices are zero-padded to three digits, or wider when the mesh has at least
/// a thousand vertices, so that every name produced in a run has the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameScheme {
    pub width: usize,
}

impl NameScheme {
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        let largest = vertex_count.saturating_sub(1);
        let digits = largest.to_string().len();
        Self {
            width: digits.max(MIN_INDEX_WIDTH),
        }
    }

    pub fn bone_name(&self, vertex: usize) -> String {
        format!("{BONE_PREFIX}{vertex:0width$}", width = self.width)
    }

    pub fn group_name(&self, vertex: usize) -> String {
        format!("{GROUP_PREFIX}{vertex:0width$}", width = self.width)
    }
}

impl Default for NameScheme {
    fn default() -> Self {
        Self {
            width: MIN_INDEX_WIDTH,
        }
    }
}
