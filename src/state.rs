//! Locomotion state and marker components.
//!
//! The controller keeps exactly one [`LocomotionState`]. The [`Grounded`] and
//! [`Airborne`] markers mirror it onto the entity so other systems can filter
//! with `With<Grounded>` instead of reading the controller.

use bevy::prelude::*;

/// The two locomotion states.
///
/// Grounded is the initial state. It is left through a jump and re-entered
/// when a contact with walkable geometry begins.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocomotionState {
    #[default]
    Grounded,
    Airborne,
}

impl LocomotionState {
    #[inline]
    pub fn is_grounded(self) -> bool {
        self == Self::Grounded
    }

    #[inline]
    pub fn is_airborne(self) -> bool {
        self == Self::Airborne
    }
}

/// Marker component indicating the character is grounded.
///
/// This is a marker component - it has no data, just indicates state.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_surface_controller::prelude::*;
///
/// // Grounded is a marker component - just use it in queries
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;
