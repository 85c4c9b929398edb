//! Controller configuration.
//!
//! This module defines the author-time tunables of the surface-aligning
//! controller, the walkable layer filter, and the policies that decide how
//! the controller behaves in its two ambiguous situations (no probe hit,
//! jump pressed while airborne).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::LocomotionError;
use crate::state::LocomotionState;

/// Cast distance shared by all three surface probes.
pub const PROBE_DISTANCE: f32 = 2.0;

/// A 32-bit set of collision layers.
///
/// Layer `n` is the bit `1 << n`. Scene geometry whose layers intersect the
/// walkable mask counts as ground, both for probing and for contact
/// classification.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl LayerMask {
    /// Every layer.
    pub const ALL: Self = Self(u32::MAX);
    /// No layer.
    pub const NONE: Self = Self(0);

    /// Mask containing the single layer `index` (0..32).
    ///
    /// Out-of-range indices panic in debug builds and wrap modulo 32 in
    /// release builds.
    pub const fn layer(index: u32) -> Self {
        debug_assert!(index < 32, "layer index must be below 32");
        Self(1 << (index & 31))
    }

    /// Mask containing every layer in `indices`.
    pub fn from_layers(indices: &[u32]) -> Self {
        indices
            .iter()
            .fold(Self::NONE, |mask, &i| mask.with_layer(i))
    }

    /// Builder: add a layer.
    pub const fn with_layer(self, index: u32) -> Self {
        Self(self.0 | Self::layer(index).0)
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether `index` is part of this mask.
    #[inline]
    pub const fn contains_layer(self, index: u32) -> bool {
        self.0 & Self::layer(index).0 != 0
    }

    /// Whether the two masks share at least one layer.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

/// What alignment does on a tick where no probe hit anything.
///
/// With a zero normal the look-rotation construction has no valid basis.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateAlignment {
    /// Blend toward the identity rotation, which is what a look rotation
    /// built from a zero vector evaluates to.
    #[default]
    BlendToIdentity,
    /// Leave orientation untouched for this tick.
    Skip,
}

/// What happens to a jump trigger that arrives while airborne.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JumpLatchPolicy {
    /// Keep the trigger latched and fire it on the first grounded tick.
    #[default]
    HoldUntilGrounded,
    /// Discard triggers that are pending while airborne.
    DropWhileAirborne,
}

/// Configuration parameters for the surface-aligning controller.
///
/// Immutable once the controller has been built from it.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct LocomotionConfig {
    // === Input-driven motion ===
    /// Forward/back translation rate (units per unit of vertical input).
    pub movement_speed: f32,

    /// Yaw rate in degrees per unit of horizontal input.
    pub rotation_speed: f32,

    // === Surface alignment ===
    /// Alignment blend rate while grounded. Slow, so walking over bumps
    /// does not jitter the agent.
    pub magnetic_rotation_speed_grounded: f32,

    /// Alignment blend rate while airborne. Fast, so the agent lands
    /// feet-first on whatever surface is nearest.
    pub magnetic_rotation_speed_fly: f32,

    /// Cast distance for the three surface probes.
    pub probe_distance: f32,

    /// Layers that count as walkable ground.
    pub walkable_layers: LayerMask,

    // === Forces ===
    /// Gravity rate along the agent's local down axis.
    pub gravity_speed: f32,

    /// Impulse magnitude of a jump along the agent's local up axis.
    pub jump_force: f32,

    // === Policies ===
    pub degenerate_alignment: DegenerateAlignment,
    pub jump_latch: JumpLatchPolicy,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            movement_speed: 6.0,
            rotation_speed: 120.0,

            magnetic_rotation_speed_grounded: 5.0,
            magnetic_rotation_speed_fly: 20.0,
            probe_distance: PROBE_DISTANCE,
            walkable_layers: LayerMask::ALL,

            gravity_speed: 900.0,
            jump_force: 6.0,

            degenerate_alignment: DegenerateAlignment::BlendToIdentity,
            jump_latch: JumpLatchPolicy::HoldUntilGrounded,
        }
    }
}

impl LocomotionConfig {
    /// Create a config tuned for a responsive player character.
    pub fn player() -> Self {
        Self {
            movement_speed: 8.0,
            rotation_speed: 180.0,
            magnetic_rotation_speed_fly: 30.0,
            ..default()
        }
    }

    /// Parse a config from a RON document and validate it.
    ///
    /// Missing fields take their default value.
    pub fn from_ron(source: &str) -> Result<Self, LocomotionError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every rate, speed and distance is finite and non-negative.
    pub fn validate(&self) -> Result<(), LocomotionError> {
        let fields = [
            ("movement_speed", self.movement_speed),
            ("rotation_speed", self.rotation_speed),
            (
                "magnetic_rotation_speed_grounded",
                self.magnetic_rotation_speed_grounded,
            ),
            ("magnetic_rotation_speed_fly", self.magnetic_rotation_speed_fly),
            ("probe_distance", self.probe_distance),
            ("gravity_speed", self.gravity_speed),
            ("jump_force", self.jump_force),
        ];

        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(LocomotionError::InvalidConfig { field, value });
            }
        }
        Ok(())
    }

    /// Alignment blend rate for a locomotion state.
    #[inline]
    pub fn alignment_rate(&self, state: LocomotionState) -> f32 {
        match state {
            LocomotionState::Grounded => self.magnetic_rotation_speed_grounded,
            LocomotionState::Airborne => self.magnetic_rotation_speed_fly,
        }
    }

    /// Builder: set translation and yaw rates.
    pub fn with_movement(mut self, movement_speed: f32, rotation_speed: f32) -> Self {
        self.movement_speed = movement_speed;
        self.rotation_speed = rotation_speed;
        self
    }

    /// Builder: set grounded and airborne alignment rates.
    pub fn with_alignment_rates(mut self, grounded: f32, fly: f32) -> Self {
        self.magnetic_rotation_speed_grounded = grounded;
        self.magnetic_rotation_speed_fly = fly;
        self
    }

    /// Builder: set gravity rate.
    pub fn with_gravity_speed(mut self, gravity_speed: f32) -> Self {
        self.gravity_speed = gravity_speed;
        self
    }

    /// Builder: set jump impulse.
    pub fn with_jump_force(mut self, jump_force: f32) -> Self {
        self.jump_force = jump_force;
        self
    }

    /// Builder: set the walkable layers.
    pub fn with_walkable_layers(mut self, layers: LayerMask) -> Self {
        self.walkable_layers = layers;
        self
    }

    /// Builder: set the probe cast distance.
    pub fn with_probe_distance(mut self, distance: f32) -> Self {
        self.probe_distance = distance;
        self
    }

    /// Builder: set the zero-normal alignment policy.
    pub fn with_degenerate_alignment(mut self, policy: DegenerateAlignment) -> Self {
        self.degenerate_alignment = policy;
        self
    }

    /// Builder: set the airborne jump trigger policy.
    pub fn with_jump_latch(mut self, policy: JumpLatchPolicy) -> Self {
        self.jump_latch = policy;
        self
    }
}
