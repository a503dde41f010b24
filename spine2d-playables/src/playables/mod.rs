//! Mixers for host sequencer tracks. Each mixer is driven once per frame with the track's
//! weighted inputs.

mod animation_mixer;
mod flip_mixer;
mod handle;
mod state_mixer;

pub use animation_mixer::*;
pub use flip_mixer::*;
pub use handle::*;
pub use state_mixer::*;

/// Weights below this count as zero.
pub(crate) const WEIGHT_EPSILON: f32 = 1.0e-6;

pub(crate) fn is_zero_weight(weight: f32) -> bool {
    weight.abs() < WEIGHT_EPSILON
}



#[cfg(test)]
mod flip_mixer_tests;
