//! Common ECS components

use glam::{Mat4, Quat, Vec3};

use crate::math::{compose, euler_degrees_from_quat, quat_from_euler_degrees};

/// Which world-space fields were written directly on a [`Transform`] and
/// still need their local counterpart re-derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingWorld {
    /// World position awaits reconciliation
    pub position: bool,
    /// World rotation awaits reconciliation
    pub rotation: bool,
    /// World scale awaits reconciliation
    pub scale: bool,
}

impl PendingWorld {
    /// Nothing pending
    pub const NONE: Self = Self {
        position: false,
        rotation: false,
        scale: false,
    };

    /// Check whether any field awaits reconciliation
    #[must_use]
    pub const fn any(&self) -> bool {
        self.position || self.rotation || self.scale
    }
}

/// Dirty state of a transform, derived from its two flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    /// World values agree with local values and the parent
    Clean,
    /// Own fields written since the last sync
    SelfDirty,
    /// An ancestor changed since the last sync
    ParentDirty,
    /// Both of the above; the parent's state wins on the next pass
    Both,
}

/// Local and world transform of one entity.
///
/// The local values are relative to the parent entity (or to the world for
/// roots). The world values and `world_matrix` are derived by the transform
/// systems; reading them on a dirty transform may return last tick's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    local_position: Vec3,
    local_scale: Vec3,
    local_rotation: Quat,
    /// Kept in sync with `local_rotation` for editing and display
    local_euler_degrees: Vec3,

    world_position: Vec3,
    world_scale: Vec3,
    world_rotation: Quat,
    world_matrix: Mat4,
    parent_world_matrix: Mat4,

    self_dirty: bool,
    parent_dirty: bool,
    pending_world: PendingWorld,
}

impl Transform {
    /// Create an identity transform that still needs its first sync
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a local position
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self::from_parts(position, Quat::IDENTITY, Vec3::ONE)
    }

    /// Create a transform with local position and rotation
    #[must_use]
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self::from_parts(position, rotation, Vec3::ONE)
    }

    /// Create a transform from local position, rotation and scale
    #[must_use]
    pub fn from_parts(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut transform = Self::default();
        transform.local_position = position;
        transform.local_scale = scale;
        transform.set_local_rotation(rotation);
        transform
    }

    // -------------------------------------------------------------------------
    // Local getters
    // -------------------------------------------------------------------------

    /// Position relative to the parent
    #[must_use]
    #[inline]
    pub fn local_position(&self) -> Vec3 {
        self.local_position
    }

    /// Scale relative to the parent
    #[must_use]
    #[inline]
    pub fn local_scale(&self) -> Vec3 {
        self.local_scale
    }

    /// Rotation relative to the parent
    #[must_use]
    #[inline]
    pub fn local_rotation(&self) -> Quat {
        self.local_rotation
    }

    /// Cached XYZ Euler angles of the local rotation, in degrees
    #[must_use]
    #[inline]
    pub fn local_euler_degrees(&self) -> Vec3 {
        self.local_euler_degrees
    }

    /// Local TRS matrix
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        compose(self.local_position, self.local_rotation, self.local_scale)
    }

    // -------------------------------------------------------------------------
    // World getters
    // -------------------------------------------------------------------------

    /// Absolute position as of the last sync (or direct write)
    #[must_use]
    #[inline]
    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    /// Absolute scale as of the last sync (or direct write)
    #[must_use]
    #[inline]
    pub fn world_scale(&self) -> Vec3 {
        self.world_scale
    }

    /// Absolute rotation as of the last sync (or direct write).
    ///
    /// Not renormalized after chained multiplication.
    #[must_use]
    #[inline]
    pub fn world_rotation(&self) -> Quat {
        self.world_rotation
    }

    /// Cached `compose(world_position, world_rotation, world_scale)`
    #[must_use]
    #[inline]
    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix
    }

    /// Parent's world matrix at the last sync; identity for roots
    #[must_use]
    #[inline]
    pub fn parent_world_matrix(&self) -> Mat4 {
        self.parent_world_matrix
    }

    /// Get the forward direction (negative Z) in world space
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.world_rotation * Vec3::NEG_Z
    }

    /// Get the right direction (positive X) in world space
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.world_rotation * Vec3::X
    }

    /// Get the up direction (positive Y) in world space
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.world_rotation * Vec3::Y
    }

    // -------------------------------------------------------------------------
    // Local setters (mark self dirty)
    // -------------------------------------------------------------------------

    /// Set the position relative to the parent
    pub fn set_local_position(&mut self, position: Vec3) {
        self.local_position = position;
        self.pending_world.position = false;
        self.self_dirty = true;
    }

    /// Set the scale relative to the parent
    pub fn set_local_scale(&mut self, scale: Vec3) {
        self.local_scale = scale;
        self.pending_world.scale = false;
        self.self_dirty = true;
    }

    /// Set the rotation relative to the parent, refreshing the Euler cache
    pub fn set_local_rotation(&mut self, rotation: Quat) {
        self.local_rotation = rotation;
        self.local_euler_degrees = euler_degrees_from_quat(rotation);
        self.pending_world.rotation = false;
        self.self_dirty = true;
    }

    /// Set the rotation relative to the parent from XYZ Euler degrees
    pub fn set_local_rotation_from_euler(&mut self, degrees: Vec3) {
        self.local_rotation = quat_from_euler_degrees(degrees);
        self.local_euler_degrees = degrees;
        self.pending_world.rotation = false;
        self.self_dirty = true;
    }

    /// Translate the local position by a delta
    pub fn translate(&mut self, delta: Vec3) {
        self.set_local_position(self.local_position + delta);
    }

    // -------------------------------------------------------------------------
    // World setters (deferred reconciliation)
    // -------------------------------------------------------------------------

    /// Write the world position directly.
    ///
    /// The local position is re-derived by the next World→Local pass, or when
    /// the Local→World pass reaches this entity.
    pub fn set_world_position(&mut self, position: Vec3) {
        self.world_position = position;
        self.pending_world.position = true;
        self.self_dirty = true;
    }

    /// Write the world scale directly; see [`Transform::set_world_position`]
    pub fn set_world_scale(&mut self, scale: Vec3) {
        self.world_scale = scale;
        self.pending_world.scale = true;
        self.self_dirty = true;
    }

    /// Write the world rotation directly; see [`Transform::set_world_position`]
    pub fn set_world_rotation(&mut self, rotation: Quat) {
        self.world_rotation = rotation;
        self.pending_world.rotation = true;
        self.self_dirty = true;
    }

    // -------------------------------------------------------------------------
    // Dirty state
    // -------------------------------------------------------------------------

    /// Own fields were written since the last sync
    #[must_use]
    #[inline]
    pub fn is_self_dirty(&self) -> bool {
        self.self_dirty
    }

    /// An ancestor changed since the last sync
    #[must_use]
    #[inline]
    pub fn is_parent_dirty(&self) -> bool {
        self.parent_dirty
    }

    /// World fields awaiting World→Local reconciliation
    #[must_use]
    #[inline]
    pub fn pending_world(&self) -> PendingWorld {
        self.pending_world
    }

    /// World values may be behind local values or the parent
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.self_dirty || self.parent_dirty || self.pending_world.any()
    }

    /// Combined view of the two dirty flags
    #[must_use]
    pub fn dirty_state(&self) -> DirtyState {
        match (self.self_dirty, self.parent_dirty) {
            (false, false) => DirtyState::Clean,
            (true, false) => DirtyState::SelfDirty,
            (false, true) => DirtyState::ParentDirty,
            (true, true) => DirtyState::Both,
        }
    }

    /// Flag that an ancestor changed
    pub fn mark_parent_dirty(&mut self) {
        self.parent_dirty = true;
    }

    // -------------------------------------------------------------------------
    // Sync (used by the propagation systems)
    // -------------------------------------------------------------------------

    /// Derive world values from local values and the parent's world state,
    /// then clear both dirty flags.
    pub(crate) fn apply_local_to_world(
        &mut self,
        parent: Option<&ParentPose>,
        renormalize_rotation: bool,
    ) {
        match parent {
            None => {
                self.world_position = self.local_position;
                self.world_scale = self.local_scale;
                self.world_rotation = self.local_rotation;
                self.parent_world_matrix = Mat4::IDENTITY;
            }
            Some(parent) => {
                self.world_position = parent.matrix.transform_point3(self.local_position);
                self.world_scale = parent.scale * self.local_scale;
                self.world_rotation = parent.rotation * self.local_rotation;
                if renormalize_rotation {
                    self.world_rotation = crate::math::sanitize_rotation(self.world_rotation);
                }
                self.parent_world_matrix = parent.matrix;
            }
        }
        self.rebuild_world_matrix();
        self.self_dirty = false;
        self.parent_dirty = false;
    }

    /// Overwrite the given local fields with recomputed values
    pub(crate) fn apply_local_pose(
        &mut self,
        position: Option<Vec3>,
        rotation: Option<Quat>,
        scale: Option<Vec3>,
    ) {
        if let Some(position) = position {
            self.local_position = position;
        }
        if let Some(rotation) = rotation {
            self.local_rotation = rotation;
            self.local_euler_degrees = euler_degrees_from_quat(rotation);
        }
        if let Some(scale) = scale {
            self.local_scale = scale;
        }
    }

    pub(crate) fn write_world_position(&mut self, position: Vec3) {
        self.world_position = position;
    }

    pub(crate) fn write_world_rotation(&mut self, rotation: Quat) {
        self.world_rotation = rotation;
    }

    pub(crate) fn write_world_scale(&mut self, scale: Vec3) {
        self.world_scale = scale;
    }

    pub(crate) fn set_parent_world_matrix(&mut self, matrix: Mat4) {
        self.parent_world_matrix = matrix;
    }

    pub(crate) fn clear_pending_world(&mut self) {
        self.pending_world = PendingWorld::NONE;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.self_dirty = false;
        self.parent_dirty = false;
        self.pending_world = PendingWorld::NONE;
    }

    /// Recompute `world_matrix` from the world fields
    pub(crate) fn rebuild_world_matrix(&mut self) {
        self.world_matrix = compose(self.world_position, self.world_rotation, self.world_scale);
    }

    /// World state handed to children during propagation
    #[must_use]
    pub fn pose(&self) -> ParentPose {
        ParentPose {
            matrix: self.world_matrix,
            rotation: self.world_rotation,
            scale: self.world_scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            local_position: Vec3::ZERO,
            local_scale: Vec3::ONE,
            local_rotation: Quat::IDENTITY,
            local_euler_degrees: Vec3::ZERO,
            world_position: Vec3::ZERO,
            world_scale: Vec3::ONE,
            world_rotation: Quat::IDENTITY,
            world_matrix: Mat4::IDENTITY,
            parent_world_matrix: Mat4::IDENTITY,
            self_dirty: true,
            parent_dirty: true,
            pending_world: PendingWorld::NONE,
        }
    }
}

/// A parent's world state, as seen by its children
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParentPose {
    /// Parent world matrix
    pub matrix: Mat4,
    /// Parent world rotation
    pub rotation: Quat,
    /// Parent world scale
    pub scale: Vec3,
}

/// Name component, used to label entities in logs and errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    /// Create a name component
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
