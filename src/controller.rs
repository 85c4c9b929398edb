//! The surface-aligning locomotion controller.
//!
//! [`SurfaceAligningLocomotion`] owns all per-tick behavior of an agent:
//! 1. Translation along its forward axis from the vertical input axis
//! 2. Yaw about its local up axis from the horizontal input axis
//! 3. Surface probing and "magnetic" alignment to the nearest surface
//! 4. Gravity along its local down axis
//! 5. The grounded/airborne state machine and jumping
//! 6. Sticky platform attachment
//!
//! The methods here take their collaborators explicitly (pose, scene,
//! rigid body, animation sink), so they run the same inside the ECS systems
//! and in a bare test harness.

use bevy::prelude::*;

use crate::alignment::{alignment_target, blend_position, blend_rotation, AlignmentTarget};
use crate::animation::{AnimationSink, HORIZONTAL_SIGNAL, JUMPING_SIGNAL, VERTICAL_SIGNAL};
use crate::backend::{LocomotionForces, RigidBodyDriver};
use crate::collision::CollisionData;
use crate::config::{JumpLatchPolicy, LocomotionConfig};
use crate::contact::{AttachmentChange, ContactBegan, ContactEnded};
use crate::detection::{probe_surface, SpatialQuery};
use crate::intent::LocomotionIntent;
use crate::state::LocomotionState;

/// What happened during one fixed tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Nearest probe hit this tick. Not kept past the tick.
    pub probe: Option<CollisionData>,
    /// Whether alignment fell back to the degenerate target.
    pub degenerate: bool,
    /// Whether a jump fired.
    pub jumped: bool,
}

/// Surface-aligning locomotion controller component.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_surface_controller::prelude::*;
///
/// let controller = SurfaceAligningLocomotion::new(LocomotionConfig::player());
/// assert!(controller.is_grounded());
/// assert_eq!(
///     controller.alignment_rate(),
///     controller.config().magnetic_rotation_speed_grounded
/// );
/// ```
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(LocomotionIntent, LocomotionForces, Transform)]
pub struct SurfaceAligningLocomotion {
    config: LocomotionConfig,

    // === Runtime State ===
    state: LocomotionState,
    /// Always the configured rate for `state`.
    alignment_rate: f32,
    /// A jump trigger waiting for a grounded tick.
    jump_latched: bool,
    /// Platform the agent is currently parented to.
    attached_platform: Option<Entity>,

    // === Internal ===
    /// Probe sphere radius, read from the collision volume when the
    /// controller is attached. `None` until then.
    pub(crate) collider_radius: Option<f32>,
    /// Whether the collaborators have been checked.
    pub(crate) collaborators_checked: bool,
    /// Whether animation output was available when the collaborators were
    /// checked. Fixed for the component's lifetime.
    pub(crate) animation_enabled: bool,
}

impl Default for SurfaceAligningLocomotion {
    fn default() -> Self {
        Self::new(LocomotionConfig::default())
    }
}

impl SurfaceAligningLocomotion {
    /// Create a grounded controller from a config.
    pub fn new(config: LocomotionConfig) -> Self {
        let state = LocomotionState::Grounded;
        Self {
            config,
            state,
            alignment_rate: config.alignment_rate(state),
            jump_latched: false,
            attached_platform: None,
            collider_radius: None,
            collaborators_checked: false,
            animation_enabled: false,
        }
    }

    /// Builder: set the probe radius instead of reading it from a collider.
    pub fn with_collider_radius(mut self, radius: f32) -> Self {
        self.collider_radius = Some(radius);
        self
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn state(&self) -> LocomotionState {
        self.state
    }

    pub fn is_grounded(&self) -> bool {
        self.state.is_grounded()
    }

    /// Current alignment blend rate.
    pub fn alignment_rate(&self) -> f32 {
        self.alignment_rate
    }

    /// Whether a jump trigger is waiting to be consumed.
    pub fn jump_latched(&self) -> bool {
        self.jump_latched
    }

    /// Platform the agent is parented to, if any.
    pub fn attached_platform(&self) -> Option<Entity> {
        self.attached_platform
    }

    /// Probe sphere radius (zero until attached to a collision volume).
    pub fn collider_radius(&self) -> f32 {
        self.collider_radius.unwrap_or(0.0)
    }

    /// Whether animation signals are written for this agent.
    pub fn animation_enabled(&self) -> bool {
        self.animation_enabled
    }

    fn set_state(&mut self, state: LocomotionState) {
        if self.state != state {
            debug!("locomotion state {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        self.alignment_rate = self.config.alignment_rate(state);
    }

    // ==================== Host entry points ====================

    /// Per-frame hook. Latches a jump when `jump_pressed` is this frame's
    /// rising edge.
    pub fn on_frame_tick(&mut self, jump_pressed: bool) {
        if jump_pressed {
            self.jump_latched = true;
        }
    }

    /// Per-physics-step hook.
    ///
    /// `pose` is the agent's world-space transform. Runs translation, yaw,
    /// probing and alignment, gravity, then the jump check, in that order.
    pub fn on_fixed_tick<Q, R, A>(
        &mut self,
        dt: f32,
        intent: &LocomotionIntent,
        pose: &mut Transform,
        scene: &Q,
        body: &mut R,
        animation: &mut A,
    ) -> TickReport
    where
        Q: SpatialQuery,
        R: RigidBodyDriver,
        A: AnimationSink,
    {
        self.apply_translation(pose, intent.vertical, dt);
        self.apply_yaw(pose, intent.horizontal, dt);
        animation.set_float(VERTICAL_SIGNAL, intent.vertical);
        animation.set_float(HORIZONTAL_SIGNAL, intent.horizontal);

        let probe = self.probe(scene, pose);
        let degenerate = !self.apply_alignment(pose, probe.as_ref(), dt);

        self.apply_gravity(pose, body, dt);
        let jumped = self.try_jump(pose, body, animation);

        TickReport {
            probe,
            degenerate,
            jumped,
        }
    }

    /// Contact-begin hook.
    ///
    /// Walkable contacts ground the agent; sticky platforms request an
    /// attachment regardless of their layers.
    pub fn on_contact_begin<A: AnimationSink>(
        &mut self,
        contact: &ContactBegan,
        animation: &mut A,
    ) -> Option<AttachmentChange> {
        if self.config.walkable_layers.intersects(contact.layers) {
            self.set_state(LocomotionState::Grounded);
            animation.set_bool(JUMPING_SIGNAL, false);
        }

        if contact.kind.is_sticky() {
            self.attached_platform = Some(contact.other);
            return Some(AttachmentChange::Attach(contact.other));
        }
        None
    }

    /// Contact-end hook.
    ///
    /// Any sticky platform contact ending detaches the agent, even if it is
    /// parented to a different platform.
    pub fn on_contact_end(&mut self, contact: &ContactEnded) -> Option<AttachmentChange> {
        if contact.kind.is_sticky() && self.attached_platform.take().is_some() {
            return Some(AttachmentChange::Detach);
        }
        None
    }

    // ==================== Tick steps ====================

    /// Move toward the one-step-ahead point on the forward axis.
    ///
    /// Blends with factor `dt`, so the step is a smoothing toward
    /// `position + forward * vertical * movement_speed`.
    pub fn apply_translation(&self, pose: &mut Transform, vertical: f32, dt: f32) {
        let forward = pose.rotation * Vec3::NEG_Z;
        let target = pose.translation + forward * (vertical * self.config.movement_speed);
        pose.translation = blend_position(pose.translation, target, dt);
    }

    /// Turn toward `horizontal * rotation_speed` degrees about the local up
    /// axis. Positive input turns right.
    pub fn apply_yaw(&self, pose: &mut Transform, horizontal: f32, dt: f32) {
        let degrees = horizontal * self.config.rotation_speed;
        let target = pose.rotation * Quat::from_rotation_y(-degrees.to_radians());
        pose.rotation = blend_rotation(pose.rotation, target, dt);
    }

    /// Cast the three surface probes from the current pose.
    pub fn probe<Q: SpatialQuery>(&self, scene: &Q, pose: &Transform) -> Option<CollisionData> {
        probe_surface(
            scene,
            pose.translation,
            pose.rotation,
            self.collider_radius(),
            self.config.probe_distance,
            self.config.walkable_layers,
        )
    }

    /// Blend orientation toward the surface under `probe`.
    ///
    /// Without a hit the normal is zero and the target is degenerate; the
    /// configured policy decides what happens. Returns false on a
    /// degenerate tick.
    pub fn apply_alignment(
        &self,
        pose: &mut Transform,
        probe: Option<&CollisionData>,
        dt: f32,
    ) -> bool {
        let normal = probe.map_or(Vec3::ZERO, |hit| hit.normal);
        let target = alignment_target(pose.rotation, normal);
        let degenerate = target == AlignmentTarget::Degenerate;
        if degenerate {
            trace!("no alignment basis this tick (normal {normal})");
        }

        if let Some(target) = target.resolve(self.config.degenerate_alignment) {
            pose.rotation = blend_rotation(pose.rotation, target, dt * self.alignment_rate);
        }
        !degenerate
    }

    /// Push along the local down axis. Applies in every state.
    pub fn apply_gravity<R: RigidBodyDriver>(&self, pose: &Transform, body: &mut R, dt: f32) {
        let up = pose.rotation * Vec3::Y;
        body.add_force(-up * (dt * self.config.gravity_speed));
    }

    /// Fire a latched jump if grounded.
    ///
    /// Applies one impulse of `jump_force` along the local up axis and
    /// switches to the airborne state.
    pub fn try_jump<R: RigidBodyDriver, A: AnimationSink>(
        &mut self,
        pose: &Transform,
        body: &mut R,
        animation: &mut A,
    ) -> bool {
        if !self.jump_latched {
            return false;
        }

        if self.state.is_airborne() {
            if self.config.jump_latch == JumpLatchPolicy::DropWhileAirborne {
                self.jump_latched = false;
            }
            return false;
        }

        let up = pose.rotation * Vec3::Y;
        body.add_impulse(up * self.config.jump_force);
        self.set_state(LocomotionState::Airborne);
        animation.set_bool(JUMPING_SIGNAL, true);
        self.jump_latched = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationSignals, NoAnimation};
    use crate::config::{DegenerateAlignment, LayerMask};
    use crate::contact::SurfaceKind;

    /// Answers each probe from a list, in evaluation order.
    struct FixedProbes([Option<CollisionData>; 3]);

    impl SpatialQuery for FixedProbes {
        fn probe(
            &self,
            _origin: Vec3,
            _radius: f32,
            direction: Vec3,
            _max_distance: f32,
            _mask: LayerMask,
        ) -> Option<CollisionData> {
            // forward-down leans to -Z, backward-down to +Z
            let index = if direction.z < -1e-3 {
                0
            } else if direction.z > 1e-3 {
                2
            } else {
                1
            };
            self.0[index]
        }
    }

    const NOTHING: FixedProbes = FixedProbes([None, None, None]);

    #[derive(Default)]
    struct RecordingBody {
        forces: Vec<Vec3>,
        impulses: Vec<Vec3>,
    }

    impl RigidBodyDriver for RecordingBody {
        fn add_force(&mut self, force: Vec3) {
            self.forces.push(force);
        }

        fn add_impulse(&mut self, impulse: Vec3) {
            self.impulses.push(impulse);
        }
    }

    fn ground(distance: f32) -> Option<CollisionData> {
        Some(CollisionData::new(distance, Vec3::Y, Vec3::ZERO, None))
    }

    fn controller() -> SurfaceAligningLocomotion {
        SurfaceAligningLocomotion::new(
            LocomotionConfig::default()
                .with_alignment_rates(2.0, 10.0)
                .with_jump_force(7.0)
                .with_walkable_layers(LayerMask::layer(1)),
        )
        .with_collider_radius(0.5)
    }

    fn contact_in(world: &mut World, layers: LayerMask, kind: SurfaceKind) -> ContactBegan {
        ContactBegan {
            agent: world.spawn_empty().id(),
            other: world.spawn_empty().id(),
            layers,
            kind,
        }
    }

    fn contact(layers: LayerMask, kind: SurfaceKind) -> ContactBegan {
        contact_in(&mut World::new(), layers, kind)
    }

    fn assert_rate_matches_state(controller: &SurfaceAligningLocomotion) {
        assert_eq!(
            controller.alignment_rate(),
            controller.config().alignment_rate(controller.state())
        );
    }

    // ==================== State machine ====================

    #[test]
    fn starts_grounded_with_grounded_rate() {
        let controller = controller();
        assert!(controller.is_grounded());
        assert_eq!(controller.alignment_rate(), 2.0);
        assert!(!controller.jump_latched());
    }

    #[test]
    fn jump_while_grounded_goes_airborne_with_one_impulse() {
        let mut controller = controller();
        let pose = Transform::default();
        let mut body = RecordingBody::default();
        let mut signals = AnimationSignals::new();

        controller.on_frame_tick(true);
        assert!(controller.try_jump(&pose, &mut body, &mut signals));

        assert_eq!(controller.state(), LocomotionState::Airborne);
        assert_eq!(controller.alignment_rate(), 10.0);
        assert_eq!(body.impulses, vec![Vec3::Y * 7.0]);
        assert!(signals.flag(JUMPING_SIGNAL));
        assert!(!controller.jump_latched());

        // The latch was consumed: nothing further fires
        assert!(!controller.try_jump(&pose, &mut body, &mut signals));
        assert_eq!(body.impulses.len(), 1);
    }

    #[test]
    fn jump_impulse_follows_local_up() {
        let mut controller = controller();
        let pose = Transform::from_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2));
        let mut body = RecordingBody::default();

        controller.on_frame_tick(true);
        controller.try_jump(&pose, &mut body, &mut NoAnimation);

        let expected = pose.rotation * Vec3::Y * 7.0;
        assert!((body.impulses[0] - expected).length() < 1e-4);
    }

    #[test]
    fn jump_while_airborne_is_held_until_grounded() {
        let mut controller = controller();
        let pose = Transform::default();
        let mut body = RecordingBody::default();

        controller.on_frame_tick(true);
        controller.try_jump(&pose, &mut body, &mut NoAnimation);

        // Pressed again mid-air
        controller.on_frame_tick(true);
        assert!(!controller.try_jump(&pose, &mut body, &mut NoAnimation));
        assert_eq!(body.impulses.len(), 1);
        assert!(controller.jump_latched());

        let landing = contact(LayerMask::layer(1), SurfaceKind::Static);
        controller.on_contact_begin(&landing, &mut NoAnimation);
        assert!(controller.try_jump(&pose, &mut body, &mut NoAnimation));
        assert_eq!(body.impulses.len(), 2);
    }

    #[test]
    fn drop_policy_discards_airborne_triggers() {
        let mut controller = SurfaceAligningLocomotion::new(
            LocomotionConfig::default().with_jump_latch(JumpLatchPolicy::DropWhileAirborne),
        );
        let pose = Transform::default();
        let mut body = RecordingBody::default();

        controller.on_frame_tick(true);
        controller.try_jump(&pose, &mut body, &mut NoAnimation);

        controller.on_frame_tick(true);
        assert!(!controller.try_jump(&pose, &mut body, &mut NoAnimation));
        assert!(!controller.jump_latched());

        let landing = contact(LayerMask::ALL, SurfaceKind::Static);
        controller.on_contact_begin(&landing, &mut NoAnimation);
        assert!(!controller.try_jump(&pose, &mut body, &mut NoAnimation));
        assert_eq!(body.impulses.len(), 1);
    }

    #[test]
    fn walkable_contact_lands() {
        let mut controller = controller();
        let mut signals = AnimationSignals::new();
        controller.on_frame_tick(true);
        controller.try_jump(&Transform::default(), &mut RecordingBody::default(), &mut signals);
        assert_rate_matches_state(&controller);

        let landing = contact(LayerMask::layer(1), SurfaceKind::Static);
        controller.on_contact_begin(&landing, &mut signals);

        assert!(controller.is_grounded());
        assert_eq!(controller.alignment_rate(), 2.0);
        assert!(!signals.flag(JUMPING_SIGNAL));
        assert_rate_matches_state(&controller);
    }

    #[test]
    fn non_walkable_contact_is_ignored() {
        let mut controller = controller();
        controller.on_frame_tick(true);
        controller.try_jump(&Transform::default(), &mut RecordingBody::default(), &mut NoAnimation);

        let change = controller
            .on_contact_begin(&contact(LayerMask::layer(4), SurfaceKind::Static), &mut NoAnimation);

        assert!(change.is_none());
        assert_eq!(controller.state(), LocomotionState::Airborne);
        assert_eq!(controller.alignment_rate(), 10.0);
    }

    // ==================== Platforms ====================

    #[test]
    fn sticky_platform_attaches_and_detaches() {
        let mut controller = controller();
        // Sticky regardless of walkability
        let began = contact(LayerMask::layer(9), SurfaceKind::StickyPlatform);

        let change = controller.on_contact_begin(&began, &mut NoAnimation);
        assert_eq!(change, Some(AttachmentChange::Attach(began.other)));
        assert_eq!(controller.attached_platform(), Some(began.other));

        let ended = ContactEnded {
            agent: began.agent,
            other: began.other,
            kind: SurfaceKind::StickyPlatform,
        };
        assert_eq!(controller.on_contact_end(&ended), Some(AttachmentChange::Detach));
        assert_eq!(controller.attached_platform(), None);

        // Already detached
        assert_eq!(controller.on_contact_end(&ended), None);
    }

    #[test]
    fn last_sticky_event_wins() {
        let mut controller = controller();
        let mut world = World::new();
        let first = contact_in(&mut world, LayerMask::ALL, SurfaceKind::StickyPlatform);
        let second = contact_in(&mut world, LayerMask::ALL, SurfaceKind::StickyPlatform);
        assert_ne!(first.other, second.other);

        controller.on_contact_begin(&first, &mut NoAnimation);
        controller.on_contact_begin(&second, &mut NoAnimation);
        assert_eq!(controller.attached_platform(), Some(second.other));

        // Ending the first contact still detaches
        let change = controller.on_contact_end(&ContactEnded {
            agent: first.agent,
            other: first.other,
            kind: SurfaceKind::StickyPlatform,
        });
        assert_eq!(change, Some(AttachmentChange::Detach));
    }

    #[test]
    fn static_contact_end_does_nothing() {
        let mut controller = controller();
        let began = contact(LayerMask::ALL, SurfaceKind::StickyPlatform);
        controller.on_contact_begin(&began, &mut NoAnimation);

        let change = controller.on_contact_end(&ContactEnded {
            agent: began.agent,
            other: began.other,
            kind: SurfaceKind::Static,
        });
        assert!(change.is_none());
        assert!(controller.attached_platform().is_some());
    }

    // ==================== Translation & yaw ====================

    #[test]
    fn zero_dt_produces_no_movement() {
        let controller = controller();
        let mut pose = Transform::from_xyz(1.0, 2.0, 3.0);
        let start = pose;

        controller.apply_translation(&mut pose, 1.0, 0.0);
        controller.apply_yaw(&mut pose, 1.0, 0.0);

        assert_eq!(pose.translation, start.translation);
        assert!(pose.rotation.abs_diff_eq(start.rotation, 1e-6));
    }

    #[test]
    fn translation_grows_with_dt() {
        let controller = controller();
        let mut previous = 0.0;
        for dt in [0.01, 0.02, 0.05, 0.1] {
            let mut pose = Transform::default();
            controller.apply_translation(&mut pose, 1.0, dt);
            let travelled = pose.translation.length();
            assert!(travelled > previous);
            previous = travelled;
        }
    }

    #[test]
    fn translation_moves_along_forward() {
        let controller = controller();
        let mut pose = Transform::default();
        controller.apply_translation(&mut pose, 1.0, 0.5);

        let expected = Vec3::NEG_Z * controller.config().movement_speed * 0.5;
        assert!((pose.translation - expected).length() < 1e-4);

        let mut pose = Transform::default();
        controller.apply_translation(&mut pose, -1.0, 0.5);
        assert!(pose.translation.z > 0.0);
    }

    #[test]
    fn yaw_grows_with_dt_and_turns_right() {
        let controller = controller();
        let mut previous = 0.0;
        for dt in [0.01, 0.02, 0.05, 0.1] {
            let mut pose = Transform::default();
            controller.apply_yaw(&mut pose, 1.0, dt);
            let angle = pose.rotation.angle_between(Quat::IDENTITY);
            assert!(angle > previous);
            previous = angle;

            // Up axis is untouched by yaw
            assert!((pose.rotation * Vec3::Y - Vec3::Y).length() < 1e-4);
            // Positive input turns toward +X (the agent's right)
            assert!((pose.rotation * Vec3::NEG_Z).x > 0.0);
        }
    }

    // ==================== Alignment & gravity ====================

    #[test]
    fn alignment_converges_without_overshoot() {
        let controller = controller();
        let tilt = 0.5;
        let mut pose = Transform::from_rotation(Quat::from_rotation_x(tilt));
        let hit = ground(1.0);

        let mut previous = tilt;
        for _ in 0..20 {
            controller.apply_alignment(&mut pose, hit.as_ref(), 0.05);
            let angle = (pose.rotation * Vec3::Y).angle_between(Vec3::Y);
            assert!(angle < previous);
            previous = angle;
        }
        assert!(previous < tilt * 0.5);
    }

    #[test]
    fn alignment_uses_current_state_rate() {
        let grounded = controller();
        let mut airborne = controller();
        airborne.on_frame_tick(true);
        airborne.try_jump(&Transform::default(), &mut RecordingBody::default(), &mut NoAnimation);

        let start = Transform::from_rotation(Quat::from_rotation_x(0.5));
        let mut slow = start;
        let mut fast = start;
        grounded.apply_alignment(&mut slow, ground(1.0).as_ref(), 0.02);
        airborne.apply_alignment(&mut fast, ground(1.0).as_ref(), 0.02);

        let slow_angle = (slow.rotation * Vec3::Y).angle_between(Vec3::Y);
        let fast_angle = (fast.rotation * Vec3::Y).angle_between(Vec3::Y);
        assert!(fast_angle < slow_angle);
    }

    #[test]
    fn no_hit_blends_toward_identity_by_default() {
        let controller = controller();
        let start = Quat::from_rotation_z(0.8);
        let mut pose = Transform::from_rotation(start);

        assert!(!controller.apply_alignment(&mut pose, None, 0.1));
        assert!(pose.rotation.angle_between(Quat::IDENTITY) < start.angle_between(Quat::IDENTITY));
    }

    #[test]
    fn no_hit_with_skip_policy_keeps_orientation() {
        let controller = SurfaceAligningLocomotion::new(
            LocomotionConfig::default().with_degenerate_alignment(DegenerateAlignment::Skip),
        );
        let start = Quat::from_rotation_z(0.8);
        let mut pose = Transform::from_rotation(start);

        assert!(!controller.apply_alignment(&mut pose, None, 0.1));
        assert_eq!(pose.rotation, start);
    }

    #[test]
    fn gravity_pulls_along_local_down_in_every_state() {
        let mut controller = controller();
        let pose = Transform::from_rotation(Quat::from_rotation_z(std::f32::consts::PI));
        let mut body = RecordingBody::default();

        controller.apply_gravity(&pose, &mut body, 0.02);
        controller.on_frame_tick(true);
        controller.try_jump(&pose, &mut body, &mut NoAnimation);
        controller.apply_gravity(&pose, &mut body, 0.02);

        let expected = Vec3::Y * 0.02 * controller.config().gravity_speed;
        assert_eq!(body.forces.len(), 2);
        for force in body.forces {
            assert!((force - expected).length() < 1e-3);
        }
    }

    // ==================== Full tick ====================

    #[test]
    fn tick_selects_nearest_probe() {
        let mut controller = controller();
        let mut pose = Transform::default();
        let near = Some(CollisionData::new(1.0, Vec3::Z, Vec3::ZERO, None));
        let scene = FixedProbes([ground(3.0), near, ground(4.0)]);

        let report = controller.on_fixed_tick(
            0.02,
            &LocomotionIntent::default(),
            &mut pose,
            &scene,
            &mut RecordingBody::default(),
            &mut NoAnimation,
        );

        assert_eq!(report.probe, near);
        assert!(!report.jumped);
    }

    #[test]
    fn tick_forwards_axes_to_animation() {
        let mut controller = controller();
        let mut signals = AnimationSignals::new();
        let mut intent = LocomotionIntent::new();
        intent.set_vertical(0.75);
        intent.set_horizontal(-0.25);

        controller.on_fixed_tick(
            0.02,
            &intent,
            &mut Transform::default(),
            &NOTHING,
            &mut RecordingBody::default(),
            &mut signals,
        );

        assert_eq!(signals.float(VERTICAL_SIGNAL), Some(0.75));
        assert_eq!(signals.float(HORIZONTAL_SIGNAL), Some(-0.25));
    }

    #[test]
    fn tick_without_hits_reports_degenerate() {
        let mut controller = controller();
        let report = controller.on_fixed_tick(
            0.02,
            &LocomotionIntent::default(),
            &mut Transform::default(),
            &NOTHING,
            &mut RecordingBody::default(),
            &mut NoAnimation,
        );

        assert!(report.probe.is_none());
        assert!(report.degenerate);
    }

    #[test]
    fn tick_applies_gravity_then_latched_jump() {
        let mut controller = controller();
        let mut body = RecordingBody::default();
        controller.on_frame_tick(true);

        let report = controller.on_fixed_tick(
            0.02,
            &LocomotionIntent::default(),
            &mut Transform::default(),
            &FixedProbes([None, ground(1.0), None]),
            &mut body,
            &mut NoAnimation,
        );

        assert!(report.jumped);
        assert_eq!(body.forces.len(), 1);
        assert_eq!(body.impulses.len(), 1);
        assert!(body.forces[0].y < 0.0);
        assert!(body.impulses[0].y > 0.0);
    }

    #[test]
    fn flat_ground_scenario_moves_up_toward_normal() {
        // Agent at origin, identity, grounded; probes all report +Y at (3, 1, 4)
        let controller = controller();
        let scene = FixedProbes([ground(3.0), ground(1.0), ground(4.0)]);
        let mut pose = Transform::default();
        let intent = LocomotionIntent::default();

        controller.apply_translation(&mut pose, intent.vertical, 0.0);
        controller.apply_yaw(&mut pose, intent.horizontal, 0.0);
        let hit = controller.probe(&scene, &pose);
        assert_eq!(hit.map(|h| h.distance), Some(1.0));

        controller.apply_alignment(&mut pose, hit.as_ref(), 0.02);
        assert_eq!(pose.translation, Vec3::ZERO);
        assert!((pose.rotation * Vec3::Y - Vec3::Y).length() < 1e-5);

        // Same scene with a tilted start: up moves strictly toward +Y
        let tilt = 0.4;
        let mut tilted = Transform::from_rotation(Quat::from_rotation_x(tilt));
        let hit = controller.probe(&scene, &tilted);
        controller.apply_alignment(&mut tilted, hit.as_ref(), 0.02);

        let angle = (tilted.rotation * Vec3::Y).angle_between(Vec3::Y);
        assert!(angle < tilt);
        assert!(angle > 0.0);
    }
}
