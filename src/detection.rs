//! Surface probing.
//!
//! Three volumetric probes are cast from the agent's position, fanning out
//! below it along its forward axis. The nearest hit defines the surface the
//! agent aligns to.

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::LayerMask;

/// Read-only shape-cast access to the scene.
///
/// Implemented by physics backends. A probe sweeps a sphere of `radius` from
/// `origin` along `direction` (normalized) for at most `max_distance` and
/// reports the nearest surface whose layers intersect `mask`.
pub trait SpatialQuery {
    fn probe(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<CollisionData>;
}

impl<T: SpatialQuery + ?Sized> SpatialQuery for &T {
    fn probe(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<CollisionData> {
        (**self).probe(origin, radius, direction, max_distance, mask)
    }
}

/// The three probe directions, in evaluation order.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeDirection {
    ForwardDown,
    Down,
    BackwardDown,
}

impl ProbeDirection {
    /// Evaluation order. Earlier entries win distance ties.
    pub const ALL: [Self; 3] = [Self::ForwardDown, Self::Down, Self::BackwardDown];

    /// World-space cast vector for an agent with the given local axes.
    ///
    /// The diagonal probes are the unnormalized sums `-up ± forward`.
    pub fn vector(self, up: Vec3, forward: Vec3) -> Vec3 {
        match self {
            Self::ForwardDown => -up + forward,
            Self::Down => -up,
            Self::BackwardDown => -up - forward,
        }
    }
}

/// Pick the nearest hit from probe results given in evaluation order.
///
/// A later hit replaces the current best only when strictly closer, so ties
/// keep the earliest-evaluated probe.
pub fn select_closest<I>(hits: I) -> Option<CollisionData>
where
    I: IntoIterator<Item = Option<CollisionData>>,
{
    hits.into_iter().flatten().fold(None, |best, hit| match best {
        Some(current) if hit.distance >= current.distance => Some(current),
        _ => Some(hit),
    })
}

/// Cast all three probes from `origin` and return the nearest hit.
pub fn probe_surface<Q: SpatialQuery>(
    scene: &Q,
    origin: Vec3,
    rotation: Quat,
    radius: f32,
    max_distance: f32,
    mask: LayerMask,
) -> Option<CollisionData> {
    let up = rotation * Vec3::Y;
    let forward = rotation * Vec3::NEG_Z;

    select_closest(ProbeDirection::ALL.map(|probe| {
        let direction = probe.vector(up, forward).normalize_or_zero();
        scene.probe(origin, radius, direction, max_distance, mask)
    }))
}
