//! Animation signal output.
//!
//! The controller never talks to an animation graph directly. It writes
//! named scalar and boolean signals into an [`AnimationSink`]. Entities with
//! no [`AnimationSignals`] component get [`NoAnimation`], which drops every
//! write.

use std::collections::HashMap;

use bevy::prelude::*;

/// Float signal carrying the raw forward/back axis.
pub const VERTICAL_SIGNAL: &str = "vertical";
/// Float signal carrying the raw turn axis.
pub const HORIZONTAL_SIGNAL: &str = "horizontal";
/// Bool signal raised by a jump and cleared on landing.
pub const JUMPING_SIGNAL: &str = "jumping";

/// Write-only destination for animation parameters.
pub trait AnimationSink {
    fn set_float(&mut self, name: &'static str, value: f32);
    fn set_bool(&mut self, name: &'static str, value: bool);
}

/// Null sink used when an agent has no animation collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnimation;

impl AnimationSink for NoAnimation {
    fn set_float(&mut self, _name: &'static str, _value: f32) {}
    fn set_bool(&mut self, _name: &'static str, _value: bool) {}
}

/// Latest animation parameters for an agent.
///
/// Animation systems read this component; the controller writes it.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct AnimationSignals {
    #[reflect(ignore)]
    floats: HashMap<&'static str, f32>,
    #[reflect(ignore)]
    bools: HashMap<&'static str, bool>,
}

impl AnimationSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written to a float signal.
    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    /// Last value written to a bool signal. Unwritten signals read as false.
    pub fn flag(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or(false)
    }
}

impl AnimationSink for AnimationSignals {
    fn set_float(&mut self, name: &'static str, value: f32) {
        self.floats.insert(name, value);
    }

    fn set_bool(&mut self, name: &'static str, value: bool) {
        self.bools.insert(name, value);
    }
}
