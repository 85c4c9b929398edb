//! Damped follower for cameras and other trailing objects.

use bevy::prelude::*;

/// Follows a target entity at an offset in the target's local frame.
///
/// Position and rotation are blended with exponential damping, so the
/// follower lags behind but never overshoots.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_surface_controller::prelude::*;
///
/// fn spawn_camera(mut commands: Commands, player: Entity) {
///     commands.spawn((Transform::default(), FollowTarget::new(player)));
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct FollowTarget {
    /// Entity to follow. `None` disables the follower on its next update.
    pub target: Option<Entity>,
    /// Offset from the target in its local frame. Default is behind and above.
    pub offset: Vec3,
    /// Position blend rate (per second).
    pub position_damping: f32,
    /// Rotation blend rate (per second).
    pub rotation_damping: f32,
    /// Whether the follower is active.
    pub enabled: bool,
}

impl Default for FollowTarget {
    fn default() -> Self {
        Self {
            target: None,
            offset: Vec3::new(0.0, 2.0, 5.0),
            position_damping: 8.0,
            rotation_damping: 6.0,
            enabled: true,
        }
    }
}

impl FollowTarget {
    pub fn new(target: Entity) -> Self {
        Self {
            target: Some(target),
            ..default()
        }
    }

    /// Builder: set the local-frame offset.
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Builder: set position and rotation damping rates.
    pub fn with_damping(mut self, position: f32, rotation: f32) -> Self {
        self.position_damping = position;
        self.rotation_damping = rotation;
        self
    }
}

/// Frame-rate independent blend factor for a damping rate.
#[inline]
fn damping_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

/// One follower update toward `target`.
pub fn follow_step(
    current: Transform,
    target: &Transform,
    follow: &FollowTarget,
    dt: f32,
) -> Transform {
    let desired = target.translation + target.rotation * follow.offset;
    let translation = current
        .translation
        .lerp(desired, damping_factor(follow.position_damping, dt));
    let rotation = current
        .rotation
        .slerp(target.rotation, damping_factor(follow.rotation_damping, dt))
        .normalize();

    Transform {
        translation,
        rotation,
        scale: current.scale,
    }
}

/// Move every enabled follower toward its target.
///
/// Followers whose target is unset or no longer exists disable themselves.
/// The pose is blended in world space, so a follower may be parented.
pub fn follow_targets(
    time: Res<Time>,
    mut q_followers: Query<(Entity, &mut Transform, Option<&ChildOf>, &mut FollowTarget)>,
    q_targets: Query<&GlobalTransform>,
) {
    let dt = time.delta_secs();
    for (entity, mut transform, parent, mut follow) in &mut q_followers {
        if !follow.enabled {
            continue;
        }

        let Some(target) = follow.target.and_then(|t| q_targets.get(t).ok()) else {
            warn!("follower {entity} has no target; disabling it");
            follow.enabled = false;
            continue;
        };

        let parent_global = parent.and_then(|p| q_targets.get(p.parent()).ok()).copied();
        let current = match parent_global {
            Some(parent) => parent.mul_transform(*transform).compute_transform(),
            None => *transform,
        };

        let next = follow_step(current, &target.compute_transform(), &follow, dt);
        *transform = match parent_global {
            Some(parent) => GlobalTransform::from(next).reparented_to(&parent),
            None => next,
        };
    }
}
