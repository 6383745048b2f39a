//! Tone synthesis: sine tones, white noise and triads.
//!
//! Tones are generated at full scale; callers attenuate with `gain`.

use crate::buffer::{frames_for_ms, AudioBuffer};
use crate::error::{Error, Result};
use std::f64::consts::TAU;

/// Three simultaneous frequencies (Hz) approximating a chord.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triad(pub [f32; 3]);

impl Triad {
    pub const fn new(root: f32, third: f32, fifth: f32) -> Self {
        Triad([root, third, fifth])
    }

    pub fn frequencies(&self) -> &[f32; 3] {
        &self.0
    }
}

/// Oscillator bank bound to one sample rate.
#[derive(Debug, Clone, Copy)]
pub struct Synth {
    sample_rate: u32,
}

impl Synth {
    pub fn new(sample_rate: u32) -> Self {
        Synth {
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn check_duration(duration_ms: u64) -> Result<()> {
        if duration_ms == 0 {
            return Err(Error::InvalidDuration(duration_ms));
        }
        Ok(())
    }

    /// Full-scale sine tone.
    pub fn sine(&self, frequency_hz: f32, duration_ms: u64) -> Result<AudioBuffer> {
        Self::check_duration(duration_ms)?;
        let frames = frames_for_ms(duration_ms, self.sample_rate);
        let step = TAU * frequency_hz as f64 / self.sample_rate as f64;
        let samples = (0..frames)
            .map(|i| ((i as f64 * step) % TAU).sin() as f32)
            .collect();
        Ok(AudioBuffer::new(samples, self.sample_rate))
    }

    /// Uniform white noise in [-1, 1]. The caller owns the random source.
    pub fn noise(&self, duration_ms: u64, rng: &mut fastrand::Rng) -> Result<AudioBuffer> {
        Self::check_duration(duration_ms)?;
        let frames = frames_for_ms(duration_ms, self.sample_rate);
        let samples = (0..frames).map(|_| rng.f32() * 2.0 - 1.0).collect();
        Ok(AudioBuffer::new(samples, self.sample_rate))
    }

    /// Overlay-sum of the three tones of `triad`, each attenuated by `tone_db`.
    pub fn triad(&self, triad: &Triad, duration_ms: u64, tone_db: f32) -> Result<AudioBuffer> {
        let mut chord = AudioBuffer::empty(self.sample_rate);
        for &freq in triad.frequencies() {
            let tone = self.sine(freq, duration_ms)?.gain(tone_db);
            chord = if chord.is_empty() {
                tone
            } else {
                chord.overlay(&tone, 0)
            };
        }
        Ok(chord)
    }
}
