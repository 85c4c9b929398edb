//! Core controller systems.
//!
//! These systems connect [`SurfaceAligningLocomotion`] to the ECS. They are
//! generic over the physics backend where they touch the rigid body. The
//! tick itself is driven by the backend through [`drive_agents`], since only
//! the backend can provide a [`SpatialQuery`] over its scene.

use bevy::prelude::*;

use crate::animation::{AnimationSignals, NoAnimation};
use crate::backend::{LocomotionBackend, LocomotionForces};
use crate::contact::{AttachmentChange, LocomotionContact};
use crate::controller::SurfaceAligningLocomotion;
use crate::detection::SpatialQuery;
use crate::error::LocomotionError;
use crate::intent::LocomotionIntent;
use crate::state::{Airborne, Grounded};

/// Query data for an agent driven by [`drive_agents`].
pub type AgentData = (
    Entity,
    &'static mut Transform,
    Option<&'static ChildOf>,
    &'static mut SurfaceAligningLocomotion,
    &'static LocomotionIntent,
    &'static mut LocomotionForces,
    Option<&'static mut AnimationSignals>,
);

/// Check the collaborators of newly added controllers.
///
/// A missing rigid body or collision volume is fatal: it is logged and the
/// host panics. A missing animation component only disables animation
/// output for that agent, and adding one later does not enable it.
pub fn verify_attachment<B: LocomotionBackend>(world: &mut World) {
    let pending: Vec<(Entity, Option<f32>, bool)> = world
        .query::<(Entity, &SurfaceAligningLocomotion, Has<AnimationSignals>)>()
        .iter(world)
        .filter(|(_, controller, _)| !controller.collaborators_checked)
        .map(|(e, controller, has_signals)| (e, controller.collider_radius, has_signals))
        .collect();

    for (entity, preset_radius, has_signals) in pending {
        if !B::has_rigid_body(world, entity) {
            report_attachment(LocomotionError::MissingCapability {
                entity,
                capability: "rigid body",
            });
            continue;
        }

        let Some(radius) = preset_radius.or_else(|| B::collider_radius(world, entity)) else {
            report_attachment(LocomotionError::MissingCapability {
                entity,
                capability: "collision volume with a probe radius",
            });
            continue;
        };

        if !has_signals {
            report_attachment(LocomotionError::MissingCollaborator {
                entity,
                collaborator: "AnimationSignals",
            });
        }

        if let Some(mut controller) = world.get_mut::<SurfaceAligningLocomotion>(entity) {
            controller.collider_radius = Some(radius);
            controller.animation_enabled = has_signals;
            controller.collaborators_checked = true;
        }
    }
}

/// Log an attachment problem. Fatal ones panic after logging.
fn report_attachment(error: LocomotionError) {
    if error.is_fatal() {
        error!("{error}");
        panic!("{error}");
    }
    warn!("{error}");
}

/// Clear the force accumulators for a new fixed step.
pub fn prepare_forces(mut q: Query<&mut LocomotionForces>) {
    for mut forces in &mut q {
        forces.prepare_new_step();
    }
}

/// Feed contact messages to their agents and apply platform parenting.
///
/// Messages are handled in the order they were written. Attachment keeps
/// the agent's world pose.
pub fn handle_contacts(
    mut commands: Commands,
    mut contacts: MessageReader<LocomotionContact>,
    mut q_agents: Query<(&mut SurfaceAligningLocomotion, Option<&mut AnimationSignals>)>,
) {
    for contact in contacts.read() {
        let agent = contact.agent();
        let Ok((mut controller, mut signals)) = q_agents.get_mut(agent) else {
            continue;
        };

        if !controller.animation_enabled() {
            signals = None;
        }

        let change = match contact {
            LocomotionContact::Began(began) => match signals.as_deref_mut() {
                Some(sink) => controller.on_contact_begin(began, sink),
                None => controller.on_contact_begin(began, &mut NoAnimation),
            },
            LocomotionContact::Ended(ended) => controller.on_contact_end(ended),
        };

        match change {
            Some(AttachmentChange::Attach(platform)) => {
                info!("agent {agent} attached to platform {platform}");
                commands.entity(agent).set_parent_in_place(platform);
            }
            Some(AttachmentChange::Detach) => {
                info!("agent {agent} detached from its platform");
                commands.entity(agent).remove_parent_in_place();
            }
            None => {}
        }
    }
}

/// Run one fixed tick for every agent.
///
/// Called by the backend's tick system. `scene_for` builds the scene view
/// for one agent (so backends can exclude the agent's own body). Agents
/// parented to a platform are ticked in world space and written back in
/// the platform's frame.
pub fn drive_agents<Q, F>(
    dt: f32,
    agents: &mut Query<AgentData>,
    globals: &Query<&GlobalTransform>,
    mut scene_for: F,
) where
    Q: SpatialQuery,
    F: FnMut(Entity) -> Q,
{
    for (entity, mut transform, parent, mut controller, intent, mut forces, mut signals) in
        agents.iter_mut()
    {
        if !controller.collaborators_checked {
            continue;
        }

        let parent_global = parent.and_then(|p| globals.get(p.parent()).ok()).copied();
        let mut pose = match parent_global {
            Some(parent) => parent.mul_transform(*transform).compute_transform(),
            None => *transform,
        };

        if !controller.animation_enabled() {
            signals = None;
        }

        let scene = scene_for(entity);
        let report = match signals.as_deref_mut() {
            Some(sink) => {
                controller.on_fixed_tick(dt, intent, &mut pose, &scene, &mut *forces, sink)
            }
            None => controller.on_fixed_tick(
                dt,
                intent,
                &mut pose,
                &scene,
                &mut *forces,
                &mut NoAnimation,
            ),
        };
        if report.jumped {
            debug!("agent {entity} jumped");
        }

        *transform = match parent_global {
            Some(parent) => GlobalTransform::from(pose).reparented_to(&parent),
            None => pose,
        };
    }
}

/// Hand each agent's accumulated force change and impulse to the backend.
pub fn flush_locomotion_forces<B: LocomotionBackend>(world: &mut World) {
    let pending: Vec<(Entity, Vec3, Vec3)> = world
        .query::<(Entity, &mut LocomotionForces)>()
        .iter_mut(world)
        .map(|(e, mut forces)| {
            let (delta, impulse) = forces.finalize_step();
            (e, delta, impulse)
        })
        .collect();

    for (entity, delta, impulse) in pending {
        if delta != Vec3::ZERO {
            B::add_force(world, entity, delta);
        }
        if impulse != Vec3::ZERO {
            B::apply_impulse(world, entity, impulse);
        }
    }
}

/// Latch jumps on the rising edge of the held jump input.
///
/// Runs at frame rate so a press shorter than a fixed step is not lost.
pub fn latch_jump_input(
    mut q: Query<(&mut LocomotionIntent, &mut SurfaceAligningLocomotion)>,
) {
    for (mut intent, mut controller) in &mut q {
        let edge = intent.take_jump_edge();
        if edge {
            controller.on_frame_tick(true);
        }
    }
}

/// Mirror each controller's state onto the [`Grounded`]/[`Airborne`] markers.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &SurfaceAligningLocomotion,
        Has<Grounded>,
        Has<Airborne>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne) in &q_controllers {
        if controller.is_grounded() {
            if !has_grounded {
                commands.entity(entity).insert(Grounded);
            }
            if has_airborne {
                commands.entity(entity).remove::<Airborne>();
            }
        } else {
            if !has_airborne {
                commands.entity(entity).insert(Airborne);
            }
            if has_grounded {
                commands.entity(entity).remove::<Grounded>();
            }
        }
    }
}
