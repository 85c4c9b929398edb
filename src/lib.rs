//! # `msg_surface_controller`
//!
//! A 3D surface-aligning locomotion controller with physics backend
//! abstraction.
//!
//! This crate provides a "magnetic" character controller that:
//! - Walks forward/back and turns about its own up axis from two input axes
//! - Probes the surface below with three sphere casts and smoothly rotates
//!   its up axis toward the nearest surface normal
//! - Applies its own gravity along its local down axis, so it can walk on
//!   walls and ceilings
//! - Jumps along its local up axis and lands on walkable layers
//! - Rides sticky moving platforms by parenting itself to them
//! - Abstracts the physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! Each fixed step runs in [`LocomotionSet`] order:
//! 1. Preparation: verify collaborators, clear force accumulators
//! 2. Contacts: contact begin/end updates state and platform attachment
//! 3. Tick: translation, yaw, probing, alignment, gravity, jump
//! 4. Markers: [`Grounded`](state::Grounded)/[`Airborne`](state::Airborne)
//! 5. FinalApplication: accumulated forces are handed to the backend
//!
//! Jump input is latched at frame rate in `Update`.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_surface_controller::prelude::*;
//!
//! let config = LocomotionConfig::player().with_walkable_layers(LayerMask::layer(1));
//! let controller = SurfaceAligningLocomotion::new(config);
//! let signals = AnimationSignals::new();
//!
//! // Spawn these with a physics body and collider
//! ```

use bevy::prelude::*;

pub mod alignment;
pub mod animation;
pub mod backend;
pub mod collision;
pub mod config;
pub mod contact;
pub mod controller;
pub mod detection;
pub mod error;
pub mod follow;
pub mod intent;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::animation::{AnimationSignals, AnimationSink, NoAnimation};
    pub use crate::backend::{LocomotionBackend, LocomotionForces, RigidBodyDriver};
    pub use crate::collision::CollisionData;
    pub use crate::config::{DegenerateAlignment, JumpLatchPolicy, LayerMask, LocomotionConfig};
    pub use crate::contact::{ContactBegan, ContactEnded, LocomotionContact, SurfaceKind};
    pub use crate::controller::{SurfaceAligningLocomotion, TickReport};
    pub use crate::detection::SpatialQuery;
    pub use crate::error::LocomotionError;
    pub use crate::follow::FollowTarget;
    pub use crate::intent::LocomotionIntent;
    pub use crate::state::{Airborne, Grounded, LocomotionState};
    pub use crate::{LocomotionSet, SurfaceLocomotionPlugin};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, RapierLocomotionBundle};
}

/// System sets for the fixed-step pipeline, run in declaration order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    /// Attach checks and force accumulator reset.
    Preparation,
    /// Contact messages are produced and consumed.
    Contacts,
    /// The per-agent fixed tick (added by the backend).
    Tick,
    /// State marker sync.
    Markers,
    /// Accumulated forces go to the physics engine.
    FinalApplication,
}

/// Main plugin for the surface-aligning controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (shape casts, force application, contacts).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_surface_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(SurfaceLocomotionPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct SurfaceLocomotionPlugin<B: backend::LocomotionBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::LocomotionBackend> Default for SurfaceLocomotionPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::LocomotionBackend> Plugin for SurfaceLocomotionPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::SurfaceAligningLocomotion>();
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<config::LayerMask>();
        app.register_type::<intent::LocomotionIntent>();
        app.register_type::<backend::LocomotionForces>();
        app.register_type::<animation::AnimationSignals>();
        app.register_type::<contact::SurfaceKind>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<follow::FollowTarget>();

        app.add_message::<contact::LocomotionContact>();

        app.configure_sets(
            FixedUpdate,
            (
                LocomotionSet::Preparation,
                LocomotionSet::Contacts,
                LocomotionSet::Tick,
                LocomotionSet::Markers,
                LocomotionSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                (systems::verify_attachment::<B>, systems::prepare_forces)
                    .chain()
                    .in_set(LocomotionSet::Preparation),
                systems::handle_contacts.in_set(LocomotionSet::Contacts),
                systems::sync_state_markers.in_set(LocomotionSet::Markers),
                systems::flush_locomotion_forces::<B>.in_set(LocomotionSet::FinalApplication),
            ),
        );

        app.add_systems(Update, (systems::latch_jump_input, follow::follow_targets));
    }
}
