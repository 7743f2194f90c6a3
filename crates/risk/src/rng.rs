//! Injectable RNG resource for the risk engines.
//!
//! Wraps `ChaCha8Rng` so every stochastic engine (heatmap scatter, predicted
//! concentrations, demo data) draws from one injectable source. Production
//! defaults to system entropy; tests construct a seeded instance with
//! `RiskRng::from_seed_u64` to get reproducible draws.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// RNG resource used by all risk-engine systems.
///
/// Systems that need randomness take `ResMut<RiskRng>` and use `rng.0`
/// (a `ChaCha8Rng` implementing `rand::Rng`) instead of `rand::thread_rng()`.
#[derive(Resource)]
pub struct RiskRng(pub ChaCha8Rng);

impl Default for RiskRng {
    fn default() -> Self {
        Self(ChaCha8Rng::from_entropy())
    }
}

impl RiskRng {
    /// Create a `RiskRng` from a fixed seed, for deterministic tests.
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

pub struct RiskRngPlugin;

impl Plugin for RiskRngPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RiskRng>();
    }
}
