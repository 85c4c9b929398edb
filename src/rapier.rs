//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.

use bevy::prelude::*;
use bevy_rapier3d::parry::shape::Ball;
use bevy_rapier3d::prelude::*;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

use crate::backend::LocomotionBackend;
use crate::collision::CollisionData;
use crate::config::LayerMask;
use crate::contact::{ContactBegan, ContactEnded, LocomotionContact, SurfaceKind};
use crate::controller::SurfaceAligningLocomotion;
use crate::detection::SpatialQuery;
use crate::systems::{drive_agents, handle_contacts, AgentData};
use crate::LocomotionSet;

/// Rapier3D physics backend for the locomotion controller.
///
/// Forces go to `ExternalForce` and impulses to `ExternalImpulse`. Probing
/// and contact translation are handled by dedicated Rapier systems that
/// receive `RapierContext` as a system parameter.
pub struct Rapier3dBackend;

impl LocomotionBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn add_force(world: &mut World, entity: Entity, force: Vec3) {
        if let Some(mut ext_force) = world.get_mut::<ExternalForce>(entity) {
            ext_force.force += force;
        } else if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(ExternalForce {
                force,
                ..default()
            });
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
        } else if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            // Fallback: apply as velocity change if no ExternalImpulse component
            vel.linvel += impulse;
        }
    }

    /// `None` when the entity has no collider or its shape has no probe
    /// radius (see [`collider_radius`]).
    fn collider_radius(world: &World, entity: Entity) -> Option<f32> {
        world.get::<Collider>(entity).and_then(collider_radius)
    }

    fn has_rigid_body(world: &World, entity: Entity) -> bool {
        world.get::<RigidBody>(entity).is_some()
    }
}

/// Plugin that sets up Rapier3D-specific systems for the controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            rapier_collect_contacts
                .in_set(LocomotionSet::Contacts)
                .before(handle_contacts),
        );

        app.add_systems(
            FixedUpdate,
            rapier_locomotion_tick.in_set(LocomotionSet::Tick),
        );
    }
}

/// Probe radius for a collider: the capsule, ball or cylinder radius, or
/// half the cuboid's width.
///
/// Other shapes have no radius. Agents using them must set one with
/// [`SurfaceAligningLocomotion::with_collider_radius`].
pub fn collider_radius(collider: &Collider) -> Option<f32> {
    if let Some(capsule) = collider.as_capsule() {
        Some(capsule.radius())
    } else if let Some(ball) = collider.as_ball() {
        Some(ball.radius())
    } else if let Some(cylinder) = collider.as_cylinder() {
        Some(cylinder.radius())
    } else {
        collider.as_cuboid().map(|cuboid| cuboid.half_extents().x)
    }
}

/// [`SpatialQuery`] over a Rapier context, excluding one agent's own body.
pub struct RapierScene<'a> {
    context: &'a RapierContext<'a>,
    exclude: Entity,
}

impl<'a> RapierScene<'a> {
    pub fn new(context: &'a RapierContext<'a>, exclude: Entity) -> Self {
        Self { context, exclude }
    }
}

impl SpatialQuery for RapierScene<'_> {
    fn probe(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<CollisionData> {
        let shape = Ball::new(radius);

        let filter = QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .exclude_sensors()
            .groups(CollisionGroups::new(
                Group::ALL,
                Group::from_bits_truncate(mask.bits()),
            ));

        self.context
            .cast_shape(
                origin,
                Quat::IDENTITY,
                direction,
                &shape,
                ShapeCastOptions {
                    max_time_of_impact: max_distance,
                    stop_at_penetration: false,
                    ..default()
                },
                filter,
            )
            .map(|(hit_entity, hit)| {
                let normal = hit.details.map(|d| d.normal1).unwrap_or(-direction);
                let hit_point = origin + direction * hit.time_of_impact;
                CollisionData::new(hit.time_of_impact, normal, hit_point, Some(hit_entity))
            })
    }
}

/// Run the fixed tick for every agent against the Rapier scene.
fn rapier_locomotion_tick(
    time: Res<Time>,
    rapier_context: ReadRapierContext,
    mut q_agents: Query<AgentData>,
    q_globals: Query<&GlobalTransform>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    drive_agents(time.delta_secs(), &mut q_agents, &q_globals, |entity| {
        RapierScene::new(&context, entity)
    });
}

/// Contact messages for one Rapier collision event.
///
/// One message is produced per agent involved, so two agents touching
/// each other both get one. Sensor contacts are ignored.
pub fn contacts_from_event(
    event: &CollisionEvent,
    is_agent: impl Fn(Entity) -> bool,
    surface_of: impl Fn(Entity) -> (LayerMask, SurfaceKind),
) -> Vec<LocomotionContact> {
    let (e1, e2, flags, started) = match *event {
        CollisionEvent::Started(e1, e2, flags) => (e1, e2, flags, true),
        CollisionEvent::Stopped(e1, e2, flags) => (e1, e2, flags, false),
    };
    if flags.contains(CollisionEventFlags::SENSOR) {
        return Vec::new();
    }

    [(e1, e2), (e2, e1)]
        .into_iter()
        .filter(|(agent, _)| is_agent(*agent))
        .map(|(agent, other)| {
            let (layers, kind) = surface_of(other);
            if started {
                LocomotionContact::Began(ContactBegan {
                    agent,
                    other,
                    layers,
                    kind,
                })
            } else {
                LocomotionContact::Ended(ContactEnded { agent, other, kind })
            }
        })
        .collect()
}

/// Translate Rapier collision events into [`LocomotionContact`] messages.
///
/// The contacted layers are the other collider's `CollisionGroups`
/// memberships (all layers when it has none).
fn rapier_collect_contacts(
    mut collisions: MessageReader<CollisionEvent>,
    mut contacts: MessageWriter<LocomotionContact>,
    q_agents: Query<(), With<SurfaceAligningLocomotion>>,
    q_surfaces: Query<(Option<&CollisionGroups>, Option<&SurfaceKind>)>,
) {
    let surface_of = |entity: Entity| {
        q_surfaces
            .get(entity)
            .map(|(groups, kind)| {
                (
                    groups.map_or(LayerMask::ALL, |g| LayerMask(g.memberships.bits())),
                    kind.copied().unwrap_or_default(),
                )
            })
            .unwrap_or((LayerMask::ALL, SurfaceKind::Static))
    };

    for event in collisions.read() {
        for contact in contacts_from_event(event, |e| q_agents.contains(e), surface_of) {
            contacts.write(contact);
        }
    }
}

/// Bundle for creating a locomotion agent with Rapier3D physics.
///
/// The body is dynamic with rotation locked: orientation belongs to the
/// controller, which writes it through the `Transform`. Rapier's own
/// gravity is disabled since the controller applies gravity along the
/// agent's local down axis.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_surface_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         SurfaceAligningLocomotion::new(LocomotionConfig::player()),
///         AnimationSignals::new(),
///         RapierLocomotionBundle::new(),
///         Collider::capsule_y(0.5, 0.4),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`]
/// - `gravity_scale`: 0.0
/// - `active_events`: [`ActiveEvents::COLLISION_EVENTS`], needed for
///   landing and platform contacts
/// - `damping`: Linear 0.5, Angular 1.0
#[derive(Bundle)]
pub struct RapierLocomotionBundle {
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    /// The controller's gravity lands here.
    pub external_force: ExternalForce,
    /// Jump impulses land here.
    pub external_impulse: ExternalImpulse,
    pub locked_axes: LockedAxes,
    pub gravity_scale: GravityScale,
    pub active_events: ActiveEvents,
    pub damping: Damping,
}

impl Default for RapierLocomotionBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl RapierLocomotionBundle {
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            gravity_scale: GravityScale(0.0),
            active_events: ActiveEvents::COLLISION_EVENTS,
            damping: Damping {
                linear_damping: 0.5,
                angular_damping: 1.0,
            },
        }
    }

    /// Set the rigid body type.
    ///
    /// ```ignore
    /// let bundle = RapierLocomotionBundle::new()
    ///     .with_body(RigidBody::KinematicPositionBased);
    /// ```
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the damping coefficients for velocity reduction.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::transform::TransformPlugin);
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
        app.insert_resource(Time::<Fixed>::from_hz(60.0));
        app
    }

    #[test]
    fn locomotion_bundle_creates_valid_entity() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((
                Transform::default(),
                RapierLocomotionBundle::new(),
                Collider::capsule_y(0.5, 0.4),
            ))
            .id();

        app.update();

        let world = app.world();
        assert!(Rapier3dBackend::has_rigid_body(world, entity));
        assert_eq!(world.get::<GravityScale>(entity).map(|g| g.0), Some(0.0));
        assert_eq!(
            world.get::<LockedAxes>(entity),
            Some(&LockedAxes::ROTATION_LOCKED)
        );
        assert_eq!(Rapier3dBackend::collider_radius(world, entity), Some(0.4));
    }

    #[test]
    fn forces_and_impulses_accumulate() {
        let mut app = create_test_app();
        let entity = app
            .world_mut()
            .spawn((Transform::default(), RapierLocomotionBundle::new()))
            .id();

        let world = app.world_mut();
        Rapier3dBackend::add_force(world, entity, Vec3::NEG_Y * 2.0);
        Rapier3dBackend::add_force(world, entity, Vec3::Y * 0.5);
        Rapier3dBackend::apply_impulse(world, entity, Vec3::Y * 3.0);

        assert_eq!(
            world.get::<ExternalForce>(entity).map(|f| f.force),
            Some(Vec3::NEG_Y * 1.5)
        );
        assert_eq!(
            world.get::<ExternalImpulse>(entity).map(|i| i.impulse),
            Some(Vec3::Y * 3.0)
        );
    }

    #[test]
    fn collider_radius_by_shape() {
        assert_eq!(collider_radius(&Collider::ball(0.75)), Some(0.75));
        assert_eq!(collider_radius(&Collider::capsule_y(1.0, 0.3)), Some(0.3));
        assert_eq!(collider_radius(&Collider::cuboid(0.2, 1.0, 0.4)), Some(0.2));
        assert_eq!(collider_radius(&Collider::cylinder(1.0, 0.6)), Some(0.6));
        assert_eq!(collider_radius(&Collider::cone(1.0, 0.6)), None);
    }

    #[test]
    fn collision_events_become_contacts_for_agents_only() {
        let mut world = World::new();
        let agent = world.spawn_empty().id();
        let platform = world.spawn_empty().id();
        let surface = |_| (LayerMask::layer(2), SurfaceKind::StickyPlatform);

        let started = CollisionEvent::Started(platform, agent, CollisionEventFlags::empty());
        let contacts = contacts_from_event(&started, |e| e == agent, surface);
        assert_eq!(
            contacts,
            vec![LocomotionContact::Began(ContactBegan {
                agent,
                other: platform,
                layers: LayerMask::layer(2),
                kind: SurfaceKind::StickyPlatform,
            })]
        );

        let stopped = CollisionEvent::Stopped(agent, platform, CollisionEventFlags::empty());
        let contacts = contacts_from_event(&stopped, |e| e == agent, surface);
        assert_eq!(
            contacts,
            vec![LocomotionContact::Ended(ContactEnded {
                agent,
                other: platform,
                kind: SurfaceKind::StickyPlatform,
            })]
        );

        // Neither side is an agent
        assert!(contacts_from_event(&started, |_| false, surface).is_empty());
    }

    #[test]
    fn sensor_events_are_ignored() {
        let mut world = World::new();
        let agent = world.spawn_empty().id();
        let trigger = world.spawn_empty().id();

        let event = CollisionEvent::Started(agent, trigger, CollisionEventFlags::SENSOR);
        let contacts =
            contacts_from_event(&event, |_| true, |_| (LayerMask::ALL, SurfaceKind::Static));
        assert!(contacts.is_empty());
    }
}
