//! AudioBuffer: immutable mono timeline used by every stage of a production.
//!
//! Every operation returns a new buffer. Durations are in milliseconds and are
//! converted to frames with `frames_for_ms`, so any duration that is a whole
//! number of frames (every multiple of 10ms at 44.1kHz) round-trips exactly.

use std::ops::Add;

/// Sample rate used for synthesis and export unless configured otherwise.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Headroom left by `normalize` (matches a 0.1dB ceiling).
pub const NORMALIZE_HEADROOM_DB: f32 = 0.1;

/// Number of frames covering `ms` milliseconds at `sample_rate`.
pub fn frames_for_ms(ms: u64, sample_rate: u32) -> usize {
    (ms * sample_rate as u64 / 1000) as usize
}

/// Convert a decibel offset to a linear amplitude factor.
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Convert a linear amplitude to decibels relative to full scale.
pub fn gain_to_db(gain: f32) -> f32 {
    if gain <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * gain.log10()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        AudioBuffer {
            samples,
            sample_rate: sample_rate.max(1),
        }
    }

    /// A zero-length buffer, the identity for `append`.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// `ms` milliseconds of digital silence.
    pub fn silent(ms: u64, sample_rate: u32) -> Self {
        Self::new(vec![0.0; frames_for_ms(ms, sample_rate)], sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration rounded to the nearest millisecond.
    pub fn duration_ms(&self) -> u64 {
        let rate = self.sample_rate as u64;
        (self.samples.len() as u64 * 1000 + rate / 2) / rate
    }

    fn frames_at(&self, ms: u64) -> usize {
        frames_for_ms(ms, self.sample_rate)
    }

    fn with_samples(&self, samples: Vec<f32>) -> Self {
        AudioBuffer {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    // ── Timeline ────────────────────────────────────────────────────────────

    /// Concatenate `other` after `self`. `other` is resampled if its rate differs.
    pub fn append(&self, other: &AudioBuffer) -> AudioBuffer {
        let other = other.resampled(self.sample_rate);
        let mut samples = Vec::with_capacity(self.samples.len() + other.samples.len());
        samples.extend_from_slice(&self.samples);
        samples.extend_from_slice(&other.samples);
        self.with_samples(samples)
    }

    /// Sum `other` into `self` starting at `position_ms`.
    ///
    /// The result is `max(len(self), position + len(other))` long; anything
    /// past the end of `self` is laid over silence.
    pub fn overlay(&self, other: &AudioBuffer, position_ms: u64) -> AudioBuffer {
        let other = other.resampled(self.sample_rate);
        let offset = self.frames_at(position_ms);
        let len = self.samples.len().max(offset + other.samples.len());
        let mut samples = self.samples.clone();
        samples.resize(len, 0.0);
        for (i, s) in other.samples.iter().enumerate() {
            samples[offset + i] += s;
        }
        self.with_samples(samples)
    }

    /// Like `overlay`, but the result keeps the length of `self`; whatever of
    /// `other` runs past the end is dropped.
    pub fn overlay_clipped(&self, other: &AudioBuffer, position_ms: u64) -> AudioBuffer {
        let other = other.resampled(self.sample_rate);
        let offset = self.frames_at(position_ms);
        let mut samples = self.samples.clone();
        if let Some(window) = samples.get_mut(offset..) {
            for (s, o) in window.iter_mut().zip(other.samples.iter()) {
                *s += o;
            }
        }
        self.with_samples(samples)
    }

    /// Frames between `start_ms` and `end_ms`, clamped to the buffer.
    pub fn slice(&self, start_ms: u64, end_ms: u64) -> AudioBuffer {
        let len = self.samples.len();
        let start = self.frames_at(start_ms).min(len);
        let end = self.frames_at(end_ms).clamp(start, len);
        self.with_samples(self.samples[start..end].to_vec())
    }

    /// The first `ms` milliseconds (or the whole buffer if shorter).
    pub fn truncated(&self, ms: u64) -> AudioBuffer {
        let end = self.frames_at(ms).min(self.samples.len());
        self.with_samples(self.samples[..end].to_vec())
    }

    /// `times` copies of this buffer back to back.
    pub fn repeat(&self, times: usize) -> AudioBuffer {
        self.with_samples(self.samples.repeat(times))
    }

    /// Tile this buffer and cut it to exactly `frames`. An empty buffer yields silence.
    pub fn looped_to(&self, frames: usize) -> AudioBuffer {
        if self.samples.is_empty() {
            return self.with_samples(vec![0.0; frames]);
        }
        let samples = self.samples.iter().copied().cycle().take(frames).collect();
        self.with_samples(samples)
    }

    /// Split into `parts` consecutive pieces of equal length.
    /// The last piece absorbs any remainder so nothing is dropped.
    pub fn split(&self, parts: usize) -> Vec<AudioBuffer> {
        let parts = parts.max(1);
        let base = self.samples.len() / parts;
        (0..parts)
            .map(|i| {
                let start = i * base;
                let end = if i + 1 == parts {
                    self.samples.len()
                } else {
                    start + base
                };
                self.with_samples(self.samples[start..end].to_vec())
            })
            .collect()
    }

    // ── Level ───────────────────────────────────────────────────────────────

    /// Shift the level by `db` decibels.
    pub fn gain(&self, db: f32) -> AudioBuffer {
        let factor = db_to_gain(db);
        self.with_samples(self.samples.iter().map(|s| s * factor).collect())
    }

    /// Linear ramp from silence over the first `ms` milliseconds.
    pub fn fade_in(&self, ms: u64) -> AudioBuffer {
        let mut samples = self.samples.clone();
        let n = self.frames_at(ms).min(samples.len());
        for (i, s) in samples.iter_mut().take(n).enumerate() {
            *s *= i as f32 / n as f32;
        }
        self.with_samples(samples)
    }

    /// Linear ramp to silence over the last `ms` milliseconds.
    pub fn fade_out(&self, ms: u64) -> AudioBuffer {
        let mut samples = self.samples.clone();
        let len = samples.len();
        let n = self.frames_at(ms).min(len);
        for i in 0..n {
            samples[len - n + i] *= (n - 1 - i) as f32 / n as f32;
        }
        self.with_samples(samples)
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
    }

    /// Root-mean-square level.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
        (sum_sq / self.samples.len() as f64).sqrt() as f32
    }

    /// Scale so the peak sits `headroom_db` below full scale. Silence is returned as-is.
    pub fn normalize(&self, headroom_db: f32) -> AudioBuffer {
        let peak = self.peak();
        if peak <= 0.0 {
            return self.clone();
        }
        let factor = db_to_gain(-headroom_db) / peak;
        self.with_samples(self.samples.iter().map(|s| s * factor).collect())
    }

    /// Feed-forward compressor with an attack/release envelope follower.
    ///
    /// Above `threshold_db` the level is reduced by `(1 - 1/ratio)` of the excess.
    pub fn compress(&self, threshold_db: f32, ratio: f32, attack_ms: f32, release_ms: f32) -> AudioBuffer {
        let rate = self.sample_rate as f32;
        let attack = (-1.0 / (attack_ms.max(0.001) * rate / 1000.0)).exp();
        let release = (-1.0 / (release_ms.max(0.001) * rate / 1000.0)).exp();
        let slope = 1.0 - 1.0 / ratio.max(1.0);

        let mut envelope = 0.0_f32;
        let samples = self
            .samples
            .iter()
            .map(|&s| {
                let level = s.abs();
                let coef = if level > envelope { attack } else { release };
                envelope = coef * envelope + (1.0 - coef) * level;
                let env_db = gain_to_db(envelope);
                if env_db > threshold_db {
                    s * db_to_gain(-(env_db - threshold_db) * slope)
                } else {
                    s
                }
            })
            .collect();
        self.with_samples(samples)
    }

    // ── Filters ─────────────────────────────────────────────────────────────

    /// One-pole RC low-pass.
    pub fn low_pass(&self, cutoff_hz: f32) -> AudioBuffer {
        let rc = 1.0 / (cutoff_hz * 2.0 * std::f32::consts::PI);
        let dt = 1.0 / self.sample_rate as f32;
        let alpha = dt / (rc + dt);

        let mut out = Vec::with_capacity(self.samples.len());
        let mut prev = match self.samples.first() {
            Some(&first) => first,
            None => return self.clone(),
        };
        out.push(prev);
        for &x in &self.samples[1..] {
            prev += alpha * (x - prev);
            out.push(prev);
        }
        self.with_samples(out)
    }

    /// One-pole RC high-pass.
    pub fn high_pass(&self, cutoff_hz: f32) -> AudioBuffer {
        let rc = 1.0 / (cutoff_hz * 2.0 * std::f32::consts::PI);
        let dt = 1.0 / self.sample_rate as f32;
        let alpha = rc / (rc + dt);

        let mut out = Vec::with_capacity(self.samples.len());
        let Some(&first) = self.samples.first() else {
            return self.clone();
        };
        out.push(first);
        let mut prev_out = first;
        for pair in self.samples.windows(2) {
            prev_out = alpha * (prev_out + pair[1] - pair[0]);
            out.push(prev_out);
        }
        self.with_samples(out)
    }

    /// Linear-interpolation resample to `target_rate`.
    pub fn resampled(&self, target_rate: u32) -> AudioBuffer {
        let target_rate = target_rate.max(1);
        if target_rate == self.sample_rate || self.samples.is_empty() {
            return AudioBuffer {
                samples: self.samples.clone(),
                sample_rate: target_rate,
            };
        }
        let ratio = self.sample_rate as f64 / target_rate as f64;
        let out_len = (self.samples.len() as f64 / ratio).round() as usize;
        let last = self.samples.len() - 1;
        let samples = (0..out_len)
            .map(|i| {
                let pos = i as f64 * ratio;
                let idx = (pos as usize).min(last);
                let next = (idx + 1).min(last);
                let frac = (pos - idx as f64) as f32;
                self.samples[idx] * (1.0 - frac) + self.samples[next] * frac
            })
            .collect();
        AudioBuffer {
            samples,
            sample_rate: target_rate,
        }
    }
}

impl Add<&AudioBuffer> for &AudioBuffer {
    type Output = AudioBuffer;

    fn add(self, rhs: &AudioBuffer) -> AudioBuffer {
        self.append(rhs)
    }
}

impl Add for AudioBuffer {
    type Output = AudioBuffer;

    fn add(self, rhs: AudioBuffer) -> AudioBuffer {
        self.append(&rhs)
    }
}
