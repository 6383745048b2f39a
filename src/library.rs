use crate::applause::create_applause;
use crate::background::create_background_music;
use crate::buffer::AudioBuffer;
use crate::codec::AudioEngine;
use crate::config::{ApplauseIntensity, BackgroundStyle, OutputFormat, ShowConfig};
use crate::error::Result;
use crate::jingle::create_radio_jingle;
use crate::tone::Synth;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Writes generated effects as WAV files under `ShowConfig::sfx_dir`.
pub struct SfxLibrary<'a> {
    config: &'a ShowConfig,
    engine: &'a dyn AudioEngine,
    synth: Synth,
}

impl<'a> SfxLibrary<'a> {
    pub fn new(config: &'a ShowConfig, engine: &'a dyn AudioEngine) -> Self {
        SfxLibrary {
            config,
            engine,
            synth: Synth::new(config.sample_rate),
        }
    }

    /// Export `audio` as `<stem>[_timestamp].wav` and return the path.
    pub fn save(&self, stem: &str, audio: &AudioBuffer) -> Result<PathBuf> {
        let dir = self.config.sfx_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join(self.config.file_name(stem, OutputFormat::Wav.extension()));
        self.engine.export(audio, &path, OutputFormat::Wav)?;
        info!("saved {} ({}ms)", path.display(), audio.duration_ms());
        Ok(path)
    }

    pub fn create_radio_jingle(&self, duration_ms: u64) -> Result<PathBuf> {
        let jingle = create_radio_jingle(&self.synth, duration_ms)?;
        self.save("radio_jingle", &jingle)
    }

    pub fn create_applause_effect(
        &self,
        duration_ms: u64,
        intensity: ApplauseIntensity,
        rng: &mut fastrand::Rng,
    ) -> Result<PathBuf> {
        let applause = create_applause(&self.synth, duration_ms, intensity, rng)?;
        self.save(&format!("applause_{}", intensity), &applause)
    }

    pub fn create_background_music(
        &self,
        duration_ms: u64,
        style: BackgroundStyle,
    ) -> Result<PathBuf> {
        let bed = create_background_music(&self.synth, duration_ms, style)?;
        self.save(&format!("bg_music_{}", style), &bed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::path::Path;

    /// Records exports instead of encoding.
    #[derive(Default)]
    struct RecordingEngine {
        exported: RefCell<Vec<(PathBuf, u64)>>,
    }

    impl AudioEngine for RecordingEngine {
        fn decode(&self, path: &Path) -> Result<AudioBuffer> {
            Err(Error::Decode {
                path: path.to_path_buf(),
                reason: "not used".into(),
            })
        }

        fn export(&self, audio: &AudioBuffer, path: &Path, _: OutputFormat) -> Result<()> {
            self.exported
                .borrow_mut()
                .push((path.to_path_buf(), audio.duration_ms()));
            Ok(())
        }
    }

    #[test]
    fn effects_land_in_sfx_dir_with_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShowConfig::default()
            .with_output_dir(dir.path())
            .with_timestamps(false);
        let engine = RecordingEngine::default();
        let library = SfxLibrary::new(&config, &engine);

        let jingle = library.create_radio_jingle(2000).unwrap();
        let applause = library
            .create_applause_effect(1000, ApplauseIntensity::Heavy, &mut fastrand::Rng::with_seed(1))
            .unwrap();
        let bed = library
            .create_background_music(1500, BackgroundStyle::Chill)
            .unwrap();

        assert_eq!(jingle, dir.path().join("sfx").join("radio_jingle.wav"));
        assert_eq!(applause, dir.path().join("sfx").join("applause_heavy.wav"));
        assert_eq!(bed, dir.path().join("sfx").join("bg_music_chill.wav"));

        let durations: Vec<u64> = engine.exported.borrow().iter().map(|(_, d)| *d).collect();
        assert_eq!(durations, vec![2000, 1000, 1500]);
    }

    #[test]
    fn synthesis_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShowConfig::default().with_output_dir(dir.path());
        let engine = RecordingEngine::default();
        let library = SfxLibrary::new(&config, &engine);
        assert!(library.create_radio_jingle(0).is_err());
        assert!(engine.exported.borrow().is_empty());
    }
}
