use crate::buffer::{AudioBuffer, NORMALIZE_HEADROOM_DB};
use crate::error::{Error, Result};
use crate::tone::{Synth, Triad};

/// C major, A minor, F major, G major.
pub const JINGLE_PROGRESSION: [Triad; 4] = [
    Triad::new(523.0, 659.0, 784.0),
    Triad::new(440.0, 523.0, 659.0),
    Triad::new(349.0, 440.0, 523.0),
    Triad::new(392.0, 494.0, 587.0),
];

const CHORD_TONE_DB: f32 = -20.0;
const SLOT_FADE_MS: u64 = 100;

/// C6 accent.
const SPARKLE_HZ: f32 = 1047.0;
const SPARKLE_MS: u64 = 200;
const SPARKLE_DB: f32 = -25.0;

const COMPRESS_THRESHOLD_DB: f32 = -20.0;
const COMPRESS_RATIO: f32 = 4.0;
const COMPRESS_ATTACK_MS: f32 = 5.0;
const COMPRESS_RELEASE_MS: f32 = 50.0;

/// Build a jingle of (close to) `duration_ms`.
///
/// The duration is split into four equal chord slots, so the result is
/// `duration_ms / 4 * 4` long.
pub fn create_radio_jingle(synth: &Synth, duration_ms: u64) -> Result<AudioBuffer> {
    let slot_ms = duration_ms / JINGLE_PROGRESSION.len() as u64;
    if slot_ms == 0 {
        return Err(Error::InvalidDuration(duration_ms));
    }

    let mut jingle = AudioBuffer::empty(synth.sample_rate());
    for (i, triad) in JINGLE_PROGRESSION.iter().enumerate() {
        tracing::debug!("jingle chord {}/{}", i + 1, JINGLE_PROGRESSION.len());
        let chord = synth
            .triad(triad, slot_ms, CHORD_TONE_DB)?
            .fade_in(SLOT_FADE_MS)
            .fade_out(SLOT_FADE_MS);
        jingle = jingle.append(&chord);
    }

    let total_ms = slot_ms * JINGLE_PROGRESSION.len() as u64;
    let sparkle = synth.sine(SPARKLE_HZ, SPARKLE_MS)?.gain(SPARKLE_DB);
    for position in sparkle_positions(total_ms) {
        jingle = jingle.overlay_clipped(&sparkle, position);
    }

    Ok(jingle
        .normalize(NORMALIZE_HEADROOM_DB)
        .compress(
            COMPRESS_THRESHOLD_DB,
            COMPRESS_RATIO,
            COMPRESS_ATTACK_MS,
            COMPRESS_RELEASE_MS,
        ))
}

/// Sparkles at 1/6, 1/2 and 5/6 of the jingle.
fn sparkle_positions(total_ms: u64) -> [u64; 3] {
    [total_ms / 6, total_ms / 2, total_ms * 5 / 6]
}
