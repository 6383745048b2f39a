//! Decoding segment files into `AudioBuffer`s and exporting finished audio.
//!
//! The real backend (`RodioEngine`) needs the `engine` feature. A build
//! without it still links, but every call reports `EngineUnavailable` and the
//! show runner switches to the degraded path.

use crate::buffer::AudioBuffer;
use crate::config::{OutputFormat, ShowConfig};
use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;

/// Anything that can turn files into buffers and buffers into files.
pub trait AudioEngine {
    fn decode(&self, path: &Path) -> Result<AudioBuffer>;
    fn export(&self, audio: &AudioBuffer, path: &Path, format: OutputFormat) -> Result<()>;
}

/// rodio for decoding, hound for WAV, ffmpeg for mp3.
#[derive(Debug, Clone)]
pub struct RodioEngine {
    sample_rate: u32,
    mp3_quality: u8,
}

impl RodioEngine {
    #[cfg(feature = "engine")]
    pub fn new(sample_rate: u32, mp3_quality: u8) -> Result<Self> {
        Ok(RodioEngine {
            sample_rate: sample_rate.max(1),
            mp3_quality: mp3_quality.min(9),
        })
    }

    #[cfg(not(feature = "engine"))]
    pub fn new(_sample_rate: u32, _mp3_quality: u8) -> Result<Self> {
        Err(Error::EngineUnavailable(
            "built without the `engine` feature".to_string(),
        ))
    }

    pub fn from_config(config: &ShowConfig) -> Result<Self> {
        Self::new(config.sample_rate, config.mp3_quality)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// ffmpeg `-q:a` value used for mp3 export.
    pub fn mp3_quality(&self) -> u8 {
        self.mp3_quality
    }
}

#[cfg(feature = "engine")]
impl AudioEngine for RodioEngine {
    fn decode(&self, path: &Path) -> Result<AudioBuffer> {
        use rodio::{Decoder, Source};
        use std::fs::File;
        use std::io::BufReader;

        let decode_err = |reason: String| Error::Decode {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path).map_err(|e| decode_err(e.to_string()))?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| decode_err(e.to_string()))?;

        let channels = source.channels() as usize;
        let rate = source.sample_rate();
        let interleaved: Vec<f32> = source.convert_samples::<f32>().collect();

        tracing::debug!(
            "decoded {} ({} ch, {} Hz, {} samples)",
            path.display(),
            channels,
            rate,
            interleaved.len()
        );
        Ok(AudioBuffer::new(downmix(&interleaved, channels), rate).resampled(self.sample_rate))
    }

    fn export(&self, audio: &AudioBuffer, path: &Path, format: OutputFormat) -> Result<()> {
        let audio = audio.resampled(self.sample_rate);
        match format {
            OutputFormat::Wav => write_wav(&audio, path),
            OutputFormat::Mp3 => {
                let tmp = path.with_extension("tmp.wav");
                write_wav(&audio, &tmp)?;
                let args = vec![
                    "-y".to_string(),
                    "-loglevel".to_string(),
                    "error".to_string(),
                    "-i".to_string(),
                    tmp.to_string_lossy().to_string(),
                    "-ac".to_string(),
                    "1".to_string(),
                    "-q:a".to_string(),
                    self.mp3_quality.to_string(),
                    path.to_string_lossy().to_string(),
                ];
                let result = run_ffmpeg(&args);
                if let Err(e) = std::fs::remove_file(&tmp) {
                    tracing::warn!("could not remove {}: {}", tmp.display(), e);
                }
                result.map_err(|e| Error::Export {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(not(feature = "engine"))]
impl AudioEngine for RodioEngine {
    fn decode(&self, _path: &Path) -> Result<AudioBuffer> {
        Err(Error::EngineUnavailable("decoder not compiled in".to_string()))
    }

    fn export(&self, _audio: &AudioBuffer, _path: &Path, _format: OutputFormat) -> Result<()> {
        Err(Error::EngineUnavailable("encoder not compiled in".to_string()))
    }
}

/// 16-bit mono PCM at the buffer's own rate.
#[cfg(feature = "engine")]
pub fn write_wav(audio: &AudioBuffer, path: &Path) -> Result<()> {
    let export_err = |reason: String| Error::Export {
        path: path.to_path_buf(),
        reason,
    };
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| export_err(e.to_string()))?;
    for &s in audio.samples() {
        writer
            .write_sample(to_i16(s))
            .map_err(|e| export_err(e.to_string()))?;
    }
    writer.finalize().map_err(|e| export_err(e.to_string()))
}

/// Run ffmpeg with `args`, failing on a non-zero exit.
pub fn run_ffmpeg(args: &[String]) -> Result<()> {
    let status = Command::new("ffmpeg")
        .args(args)
        .status()
        .map_err(|e| Error::Ffmpeg(format!("failed to launch ffmpeg: {}", e)))?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Ffmpeg(format!(
            "ffmpeg exited with status {}",
            status.code().unwrap_or(-1)
        )))
    }
}

/// Average interleaved frames down to one channel.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Clamp to [-1, 1] and scale to 16-bit.
pub fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_channels() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5, 0.0]);
        assert_eq!(downmix(&stereo, 1), stereo.to_vec());
    }

    #[test]
    fn to_i16_clamps_overs() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(3.0), i16::MAX);
        assert_eq!(to_i16(-3.0), -i16::MAX);
    }

    #[cfg(feature = "engine")]
    #[test]
    fn wav_export_then_decode_keeps_duration() {
        use crate::tone::Synth;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let engine = RodioEngine::new(44100, 2).unwrap();
        let tone = Synth::new(44100).sine(440.0, 1000).unwrap().gain(-6.0);
        engine.export(&tone, &path, OutputFormat::Wav).unwrap();

        let decoded = engine.decode(&path).unwrap();
        assert_eq!(decoded.duration_ms(), 1000);
        assert!((decoded.peak() - tone.peak()).abs() < 0.01);
    }

    #[cfg(feature = "engine")]
    #[test]
    fn quality_is_capped_at_nine() {
        let engine = RodioEngine::new(48000, 12).unwrap();
        assert_eq!(engine.mp3_quality(), 9);
        assert_eq!(engine.sample_rate(), 48000);
    }

    #[cfg(feature = "engine")]
    #[test]
    fn decode_reports_missing_file() {
        let engine = RodioEngine::new(44100, 2).unwrap();
        let err = engine.decode(Path::new("/nonexistent/intro.mp3")).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[cfg(feature = "engine")]
    #[test]
    fn decode_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();
        let engine = RodioEngine::new(44100, 2).unwrap();
        assert!(engine.decode(&path).is_err());
    }

    #[cfg(not(feature = "engine"))]
    #[test]
    fn engine_is_unavailable_without_feature() {
        let err = RodioEngine::new(44100, 2).unwrap_err();
        assert!(err.is_degradable());
    }
}
