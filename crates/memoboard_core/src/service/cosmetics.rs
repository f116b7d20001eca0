//! Cosmetic values chosen once when a note is created.
//!
//! Rotation and sway are presentation-only but persisted, so they are drawn
//! through a small trait that tests can replace with fixed values.

use crate::model::note::{SwaySpeed, MAX_ROTATION_DEGREES};
use rand::seq::SliceRandom;
use rand::Rng;

/// Source of per-note cosmetic values.
pub trait CosmeticGenerator: Send + Sync {
    /// Rotation in degrees within `[-MAX_ROTATION_DEGREES, MAX_ROTATION_DEGREES]`.
    fn rotation(&self) -> f64;
    /// Sway category, independent of note content.
    fn sway_speed(&self) -> SwaySpeed;
}

/// Thread-local RNG backed generator used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCosmetics;

impl CosmeticGenerator for RandomCosmetics {
    fn rotation(&self) -> f64 {
        rand::thread_rng().gen_range(-MAX_ROTATION_DEGREES..=MAX_ROTATION_DEGREES)
    }

    fn sway_speed(&self) -> SwaySpeed {
        *SwaySpeed::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&SwaySpeed::Medium)
    }
}

/// Deterministic generator returning the same values every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedCosmetics {
    pub rotation: f64,
    pub sway_speed: SwaySpeed,
}

impl CosmeticGenerator for FixedCosmetics {
    fn rotation(&self) -> f64 {
        self.rotation.clamp(-MAX_ROTATION_DEGREES, MAX_ROTATION_DEGREES)
    }

    fn sway_speed(&self) -> SwaySpeed {
        self.sway_speed
    }
}
