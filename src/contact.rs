//! Contact events and surface classification.
//!
//! Physics backends translate their own collision callbacks into
//! [`LocomotionContact`] messages. Begin and end share one message type so a
//! begin/end pair written in the same step is handled in order.

use bevy::prelude::*;

use crate::config::LayerMask;

/// How a scene object interacts with an agent touching it.
///
/// Attach this to scene objects when building them. Objects without it are
/// treated as [`SurfaceKind::Static`].
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[reflect(Component)]
pub enum SurfaceKind {
    #[default]
    Static,
    /// A moving platform that carries touching agents by parenting them.
    StickyPlatform,
}

impl SurfaceKind {
    #[inline]
    pub fn is_sticky(self) -> bool {
        self == Self::StickyPlatform
    }
}

/// A contact between an agent and another object started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactBegan {
    /// The agent carrying the locomotion controller.
    pub agent: Entity,
    /// The object it touched.
    pub other: Entity,
    /// Collision layers of `other`.
    pub layers: LayerMask,
    pub kind: SurfaceKind,
}

/// A contact between an agent and another object ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEnded {
    pub agent: Entity,
    pub other: Entity,
    pub kind: SurfaceKind,
}

/// Ordered contact stream consumed by the controller.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum LocomotionContact {
    Began(ContactBegan),
    Ended(ContactEnded),
}

impl LocomotionContact {
    /// The agent this contact belongs to.
    pub fn agent(&self) -> Entity {
        match self {
            Self::Began(contact) => contact.agent,
            Self::Ended(contact) => contact.agent,
        }
    }
}

/// Parent change requested by a contact.
///
/// The controller only decides; the caller applies it to the hierarchy so
/// the agent's world pose is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentChange {
    Attach(Entity),
    Detach,
}
