use anyhow::Result;
use nalgebra::Vector3;

/// Read-only view over a mesh's vertex/edge graph.
///
/// Vertex indices are stable for the lifetime of the view. `link_neighbors` must
/// return the other endpoint of every incident edge in the host's link-edge order,
/// since neighbor search breaks ties by that order.
pub trait MeshGraph {
    /// Number of vertices; valid indices are `0..vertex_count()`.
    fn vertex_count(&self) -> usize;

    fn position(&self, vertex: usize) -> Vector3<f64>;

    /// Unit-length vertex normal.
    fn normal(&self, vertex: usize) -> Vector3<f64>;

    fn is_selected(&self, vertex: usize) -> bool;

    /// Other endpoints of the edges incident to `vertex`.
    fn link_neighbors(&self, vertex: usize) -> &[usize];

    /// Number of faces incident to `vertex`.
    fn link_face_count(&self, vertex: usize) -> usize;

    /// Number of edges incident to `vertex`.
    fn link_edge_count(&self, vertex: usize) -> usize {
        self.link_neighbors(vertex).len()
    }
}

/// Skin-weight group storage owned by the host mesh object.
pub trait WeightGroupStore {
    type Group: Copy;

    /// Returns the group called `name`, creating it if it does not exist yet.
    fn create_or_get_group(&mut self, name: &str) -> Result<Self::Group>;

    /// Sets the membership weight of `vertex`, replacing any previous weight.
    fn set_membership(&mut self, group: Self::Group, vertex: usize, weight: f64) -> Result<()>;
}

/// Edit-mode skeleton storage owned by the host armature.
///
/// Handles stay valid until `remove_bone` is called on them; callers must not
/// assume anything else about their representation.
pub trait SkeletonStore {
    type Bone: Copy;

    fn create_bone(&mut self, name: &str) -> Result<Self::Bone>;
    fn set_head(&mut self, bone: Self::Bone, position: Vector3<f64>) -> Result<()>;
    fn set_tail(&mut self, bone: Self::Bone, position: Vector3<f64>) -> Result<()>;
    fn set_roll(&mut self, bone: Self::Bone, radians: f64) -> Result<()>;
    fn set_parent(&mut self, bone: Self::Bone, parent: Self::Bone, connected: bool) -> Result<()>;
    fn remove_bone(&mut self, bone: Self::Bone) -> Result<()>;

    /// Enables IK stretch on the pose bone backing `bone`.
    fn set_ik_stretch(&mut self, bone: Self::Bone, stretch: bool) -> Result<()>;
}

/// Pose-mode constraint storage owned by the host armature.
pub trait IkConstraintStore: SkeletonStore {
    fn add_ik(
        &mut self,
        bone: Self::Bone,
        target_object: &str,
        target_group: &str,
        chain_length: u32,
        stretch: bool,
    ) -> Result<()>;
}
