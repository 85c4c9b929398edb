//! Movement intent component.
//!
//! Intents represent the desired movement from player input or AI. The host
//! writes them; the controller reads them once per fixed tick (axes) and
//! once per frame (jump edge). No input device is polled by this crate.

use bevy::prelude::*;

/// Per-agent input snapshot.
///
/// # Example
///
/// ```rust
/// use msg_surface_controller::prelude::*;
///
/// let mut intent = LocomotionIntent::new();
/// intent.set_vertical(1.0);
/// intent.set_horizontal(-0.5);
/// assert!(intent.is_moving());
/// assert!(intent.is_turning());
///
/// intent.clear();
/// assert!(!intent.is_moving());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct LocomotionIntent {
    /// Forward/back axis (-1.0 = back, 1.0 = forward).
    pub vertical: f32,
    /// Turn axis (-1.0 = left, 1.0 = right).
    pub horizontal: f32,
    /// Whether the jump action is currently held.
    ///
    /// Set this every frame; the controller latches a jump on the rising
    /// edge only.
    pub jump_pressed: bool,
    /// Previous frame's `jump_pressed` (for edge detection).
    pub(crate) jump_pressed_prev: bool,
}

impl LocomotionIntent {
    /// Create a new empty intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the forward/back axis, clamped to [-1, 1].
    pub fn set_vertical(&mut self, value: f32) {
        self.vertical = value.clamp(-1.0, 1.0);
    }

    /// Set the turn axis, clamped to [-1, 1].
    pub fn set_horizontal(&mut self, value: f32) {
        self.horizontal = value.clamp(-1.0, 1.0);
    }

    /// Clear both axes. The jump state is left alone.
    pub fn clear(&mut self) {
        self.vertical = 0.0;
        self.horizontal = 0.0;
    }

    /// Set the held state of the jump action.
    ///
    /// ```rust,ignore
    /// intent.set_jump_pressed(keyboard.pressed(KeyCode::Space));
    /// ```
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    pub fn is_moving(&self) -> bool {
        self.vertical.abs() > 0.001
    }

    pub fn is_turning(&self) -> bool {
        self.horizontal.abs() > 0.001
    }

    /// Consume the jump edge for this frame.
    ///
    /// Returns true only on the frame `jump_pressed` went from false to true.
    pub(crate) fn take_jump_edge(&mut self) -> bool {
        let edge = self.jump_pressed && !self.jump_pressed_prev;
        self.jump_pressed_prev = self.jump_pressed;
        edge
    }
}
