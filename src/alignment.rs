//! Surface alignment math.
//!
//! The target orientation keeps the agent's right axis as a reference and
//! rebuilds forward from it so the new up axis equals the surface normal.

use bevy::prelude::*;

use crate::config::DegenerateAlignment;

/// Rotation whose forward (-Z) axis points along `forward` and whose up axis
/// is as close to `up` as possible.
///
/// Returns `None` when no basis exists: a zero forward vector, or an up
/// vector that is zero or parallel to forward.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let back = (-forward).try_normalize()?;
    let right = up.cross(back).try_normalize()?;
    let up = back.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, back)))
}

/// Result of building an alignment target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignmentTarget {
    /// A real orientation whose up axis is the surface normal.
    Surface(Quat),
    /// No valid basis (no surface normal, or the normal lies along the
    /// agent's right axis).
    Degenerate,
}

impl AlignmentTarget {
    /// Resolve to a concrete rotation under `policy`. `None` means skip.
    pub fn resolve(self, policy: DegenerateAlignment) -> Option<Quat> {
        match (self, policy) {
            (Self::Surface(rotation), _) => Some(rotation),
            (Self::Degenerate, DegenerateAlignment::BlendToIdentity) => Some(Quat::IDENTITY),
            (Self::Degenerate, DegenerateAlignment::Skip) => None,
        }
    }
}

/// Build the orientation the agent should turn toward for a surface normal.
///
/// Forward is `normal × right` (the right-handed counterpart of rebuilding
/// forward from right and up), and the look rotation uses the normal as its
/// up reference.
pub fn alignment_target(rotation: Quat, normal: Vec3) -> AlignmentTarget {
    let right = rotation * Vec3::X;
    let forward = normal.cross(right);
    match look_rotation(forward, normal) {
        Some(target) => AlignmentTarget::Surface(target),
        None => AlignmentTarget::Degenerate,
    }
}

/// Spherically interpolate with the factor clamped to [0, 1].
#[inline]
pub fn blend_rotation(current: Quat, target: Quat, factor: f32) -> Quat {
    current.slerp(target, factor.clamp(0.0, 1.0)).normalize()
}

/// Linearly interpolate with the factor clamped to [0, 1].
#[inline]
pub fn blend_position(current: Vec3, target: Vec3, factor: f32) -> Vec3 {
    current.lerp(target, factor.clamp(0.0, 1.0))
}
