//! Synthetic applause from band-limited noise with crowd-like swells.

use crate::buffer::{AudioBuffer, NORMALIZE_HEADROOM_DB};
use crate::config::ApplauseIntensity;
use crate::error::Result;
use crate::tone::Synth;

const LOW_PASS_HZ: f32 = 8000.0;
const HIGH_PASS_HZ: f32 = 200.0;

/// Number of independently jittered crowd sections.
pub const CROWD_SECTIONS: usize = 10;
const JITTER_MIN_DB: f32 = -8.0;
const JITTER_MAX_DB: f32 = 3.0;

const MAX_FADE_MS: u64 = 1000;

/// `duration_ms` of applause.
///
/// The jitter comes from `rng`, so two calls with the same seed produce the
/// same samples; different seeds (or a continuing generator) do not.
pub fn create_applause(
    synth: &Synth,
    duration_ms: u64,
    intensity: ApplauseIntensity,
    rng: &mut fastrand::Rng,
) -> Result<AudioBuffer> {
    let noise = synth
        .noise(duration_ms, rng)?
        .low_pass(LOW_PASS_HZ)
        .high_pass(HIGH_PASS_HZ)
        .gain(intensity.volume_db());

    let mut crowd = AudioBuffer::empty(synth.sample_rate());
    for section in noise.split(CROWD_SECTIONS) {
        crowd = crowd.append(&section.gain(jitter_db(rng)));
    }

    let fade = MAX_FADE_MS.min(duration_ms / 4);
    tracing::debug!(
        "applause {}ms intensity={} fade={}ms",
        duration_ms,
        intensity,
        fade
    );
    Ok(crowd
        .fade_in(fade)
        .fade_out(fade)
        .normalize(NORMALIZE_HEADROOM_DB))
}

fn jitter_db(rng: &mut fastrand::Rng) -> f32 {
    JITTER_MIN_DB + rng.f32() * (JITTER_MAX_DB - JITTER_MIN_DB)
}
