//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement to
//! work with the locomotion controller, and the force accumulator the
//! controller writes into. This allows easy swapping between physics
//! engines (Rapier3D, custom, etc.).

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// The backend integrates the rigid body and answers scene queries. Its
/// plugin is responsible for:
/// - running the fixed tick in [`LocomotionSet::Tick`](crate::LocomotionSet)
///   with a [`SpatialQuery`](crate::detection::SpatialQuery) over its scene
///   (see [`drive_agents`](crate::systems::drive_agents));
/// - writing [`LocomotionContact`](crate::contact::LocomotionContact)
///   messages for contacts involving agents.
///
/// For an example implementation, see the `rapier` module's
/// `Rapier3dBackend`.
pub trait LocomotionBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Add a force to an entity. Forces persist until changed, so callers
    /// pass the difference from what they applied last step.
    fn add_force(world: &mut World, entity: Entity, force: Vec3);

    /// Apply an impulse to an entity.
    ///
    /// Impulse is an instantaneous change in momentum.
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3);

    /// Radius of the entity's collision volume, used for the probe spheres.
    /// `None` if it has no collision volume.
    fn collider_radius(world: &World, entity: Entity) -> Option<f32>;

    /// Whether the entity is integrated as a rigid body.
    fn has_rigid_body(world: &World, entity: Entity) -> bool;
}

/// Force and impulse sink for the controller.
pub trait RigidBodyDriver {
    /// Add a force for the current step.
    fn add_force(&mut self, force: Vec3);
    /// Add an instantaneous impulse.
    fn add_impulse(&mut self, impulse: Vec3);
}

/// Per-agent force accumulator.
///
/// The controller accumulates into this during a tick. At the end of the
/// fixed step the plugin hands the backend only the change relative to the
/// previous step, so forces added to the body by other code are preserved.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct LocomotionForces {
    /// Force accumulated this step.
    pending_force: Vec3,
    /// Impulse accumulated this step.
    pending_impulse: Vec3,
    /// Force handed to the backend last step.
    applied_force: Vec3,
}

impl LocomotionForces {
    /// Force accumulated so far this step.
    pub fn pending_force(&self) -> Vec3 {
        self.pending_force
    }

    /// Impulse accumulated so far this step.
    pub fn pending_impulse(&self) -> Vec3 {
        self.pending_impulse
    }

    /// Force currently contributed to the body.
    pub fn applied_force(&self) -> Vec3 {
        self.applied_force
    }

    /// Clear the accumulators for a new step.
    pub(crate) fn prepare_new_step(&mut self) {
        self.pending_force = Vec3::ZERO;
        self.pending_impulse = Vec3::ZERO;
    }

    /// Close the step.
    ///
    /// Returns the force delta to add to the body and the impulse to apply.
    pub(crate) fn finalize_step(&mut self) -> (Vec3, Vec3) {
        let delta = self.pending_force - self.applied_force;
        self.applied_force = self.pending_force;
        let impulse = self.pending_impulse;
        self.pending_impulse = Vec3::ZERO;
        (delta, impulse)
    }
}

impl RigidBodyDriver for LocomotionForces {
    fn add_force(&mut self, force: Vec3) {
        self.pending_force += force;
    }

    fn add_impulse(&mut self, impulse: Vec3) {
        self.pending_impulse += impulse;
    }
}
