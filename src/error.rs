//! Error types for the locomotion controller.

use bevy::prelude::*;
use thiserror::Error;

/// Errors raised while configuring or attaching a locomotion controller.
///
/// Degenerate geometry (no probe hit) is not an error; it is reported as
/// [`AlignmentTarget::Degenerate`](crate::alignment::AlignmentTarget::Degenerate)
/// and resolved by the configured policy.
#[derive(Debug, Error)]
pub enum LocomotionError {
    /// An optional collaborator is absent. The dependent feature is skipped
    /// for the lifetime of the component.
    #[error("entity {entity} has no {collaborator}; the dependent feature is disabled")]
    MissingCollaborator {
        entity: Entity,
        collaborator: &'static str,
    },

    /// A physical capability the controller cannot run without is absent.
    #[error("entity {entity} is missing required capability: {capability}")]
    MissingCapability {
        entity: Entity,
        capability: &'static str,
    },

    /// A configuration value is out of range.
    #[error("invalid locomotion config: `{field}` = {value}")]
    InvalidConfig { field: &'static str, value: f32 },

    /// A RON configuration document failed to parse.
    #[error("failed to parse locomotion config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}

impl LocomotionError {
    /// Whether the host must treat this error as fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingCapability { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_capability_is_fatal() {
        let entity = World::new().spawn_empty().id();

        let missing_anim = LocomotionError::MissingCollaborator {
            entity,
            collaborator: "AnimationSignals",
        };
        assert!(!missing_anim.is_fatal());

        let missing_body = LocomotionError::MissingCapability {
            entity,
            capability: "rigid body",
        };
        assert!(missing_body.is_fatal());

        let invalid = LocomotionError::InvalidConfig {
            field: "movement_speed",
            value: -1.0,
        };
        assert!(!invalid.is_fatal());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = LocomotionError::InvalidConfig {
            field: "gravity_speed",
            value: f32::NAN,
        };
        assert!(err.to_string().contains("gravity_speed"));
    }
}
