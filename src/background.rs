//! Looped chord bed that sits under the spoken show.

use crate::buffer::{AudioBuffer, NORMALIZE_HEADROOM_DB};
use crate::config::BackgroundStyle;
use crate::error::{Error, Result};
use crate::tone::{Synth, Triad};

const LOOP_MS: u64 = 8000;
const CHORD_TONE_DB: f32 = -30.0;
const CHORD_FADE_MS: u64 = 200;
const MAX_FADE_MS: u64 = 2000;

/// Extra attenuation after normalizing, so the bed stays under speech.
pub const BED_ATTENUATION_DB: f32 = -35.0;

static PROGRESSIONS: [(BackgroundStyle, [Triad; 4]); 3] = [
    (
        BackgroundStyle::Upbeat,
        [
            Triad::new(523.0, 659.0, 784.0),
            Triad::new(440.0, 554.0, 659.0),
            Triad::new(349.0, 440.0, 523.0),
            Triad::new(392.0, 494.0, 587.0),
        ],
    ),
    (
        BackgroundStyle::Chill,
        [
            Triad::new(440.0, 523.0, 659.0),
            Triad::new(349.0, 440.0, 523.0),
            Triad::new(523.0, 659.0, 784.0),
            Triad::new(392.0, 494.0, 587.0),
        ],
    ),
    (
        BackgroundStyle::Emotional,
        [
            Triad::new(440.0, 523.0, 659.0),
            Triad::new(349.0, 415.0, 523.0),
            Triad::new(523.0, 622.0, 784.0),
            Triad::new(392.0, 466.0, 587.0),
        ],
    ),
];

/// The four chords played for `style`.
pub fn progression(style: BackgroundStyle) -> &'static [Triad; 4] {
    PROGRESSIONS
        .iter()
        .find(|(s, _)| *s == style)
        .map(|(_, chords)| chords)
        .unwrap_or(&PROGRESSIONS[0].1)
}

/// One 8 second pass through the progression.
fn build_loop(synth: &Synth, style: BackgroundStyle) -> Result<AudioBuffer> {
    let chords = progression(style);
    let chord_ms = LOOP_MS / chords.len() as u64;
    let mut bed = AudioBuffer::empty(synth.sample_rate());
    for triad in chords {
        let chord = synth
            .triad(triad, chord_ms, CHORD_TONE_DB)?
            .fade_in(CHORD_FADE_MS)
            .fade_out(CHORD_FADE_MS);
        bed = bed.append(&chord);
    }
    Ok(bed)
}

/// Background music of exactly `duration_ms`.
pub fn create_background_music(
    synth: &Synth,
    duration_ms: u64,
    style: BackgroundStyle,
) -> Result<AudioBuffer> {
    if duration_ms == 0 {
        return Err(Error::InvalidDuration(duration_ms));
    }
    let single = build_loop(synth, style)?;
    let loops = (duration_ms / LOOP_MS + 1) as usize;
    let fade = MAX_FADE_MS.min(duration_ms / 10);
    tracing::debug!(
        "background {} {}ms ({} loops, fade {}ms)",
        style,
        duration_ms,
        loops,
        fade
    );

    Ok(single
        .repeat(loops)
        .truncated(duration_ms)
        .fade_in(fade)
        .fade_out(fade)
        .normalize(NORMALIZE_HEADROOM_DB)
        .gain(BED_ATTENUATION_DB))
}
