//! Headless integration tests for radio_show.
//!
//! Runs whole productions against an in-memory engine, and against the real
//! rodio/hound engine with WAV fixtures when the `engine` feature is on.

use radio_show::assembler::assemble;
use radio_show::buffer::{frames_for_ms, AudioBuffer};
use radio_show::codec::AudioEngine;
use radio_show::config::{EffectSpec, OutputFormat, Preset, ShowConfig};
use radio_show::error::{Error, Result};
use radio_show::fallback::ArtifactKind;
use radio_show::pipeline::{Stage, StageOutcome};
use radio_show::segment::{SegmentFile, SegmentRole, DEFAULT_SHOW_ORDER};
use radio_show::show::{DegradeReason, ShowOutcome, ShowProduction, ShowRunner};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const RATE: u32 = 44100;

/// Decodes by file name from a table of durations; remembers the last export.
struct MemoryEngine {
    durations: HashMap<String, u64>,
    exported: RefCell<Option<AudioBuffer>>,
}

impl MemoryEngine {
    fn new(durations: &[(&str, u64)]) -> Self {
        MemoryEngine {
            durations: durations
                .iter()
                .map(|(name, ms)| (name.to_string(), *ms))
                .collect(),
            exported: RefCell::new(None),
        }
    }

    fn tone(ms: u64) -> AudioBuffer {
        let frames = frames_for_ms(ms, RATE);
        let samples = (0..frames).map(|i| ((i % 100) as f32 / 100.0) - 0.5).collect();
        AudioBuffer::new(samples, RATE)
    }
}

impl AudioEngine for MemoryEngine {
    fn decode(&self, path: &Path) -> Result<AudioBuffer> {
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        match name.and_then(|n| self.durations.get(&n).copied()) {
            Some(ms) => Ok(Self::tone(ms)),
            None => Err(Error::Decode {
                path: path.to_path_buf(),
                reason: "unknown fixture".into(),
            }),
        }
    }

    fn export(&self, audio: &AudioBuffer, path: &Path, _format: OutputFormat) -> Result<()> {
        fs::write(path, b"RIFF")?;
        *self.exported.borrow_mut() = Some(audio.clone());
        Ok(())
    }
}

fn config_in(dir: &Path) -> ShowConfig {
    ShowConfig::default()
        .with_output_dir(dir)
        .with_timestamps(false)
}

fn show_files() -> Vec<SegmentFile> {
    vec![
        SegmentFile::new(SegmentRole::Intro, "intro.mp3"),
        SegmentFile::new(SegmentRole::TopSongs, "top_songs.mp3"),
        SegmentFile::new(SegmentRole::FanMail, "fan_mail.mp3"),
    ]
}

fn scenario_engine() -> MemoryEngine {
    MemoryEngine::new(&[
        ("intro.mp3", 5000),
        ("top_songs.mp3", 20000),
        ("fan_mail.mp3", 4000),
    ])
}

fn expect_produced(outcome: ShowOutcome) -> ShowProduction {
    match outcome {
        ShowOutcome::Produced(show) => show,
        other => panic!("expected a produced show, got {:?}", other),
    }
}

// ── Assembly ──────────────────────────────────────────────────────────────

#[test]
fn three_segment_show_is_thirty_seconds() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path()).without_effects();
    let engine = scenario_engine();

    let show = expect_produced(
        ShowRunner::new(&config)
            .with_engine(&engine)
            .run(&show_files())
            .unwrap(),
    );
    assert_eq!(show.duration_ms, 30000);
    assert_eq!(show.segments, DEFAULT_SHOW_ORDER.to_vec());
    assert!(show.missing.is_empty());
    assert_eq!(
        show.path,
        dir.path().join("audio").join("radio_show_with_sfx.wav")
    );
}

#[test]
fn effects_off_exports_the_assembled_show_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path()).without_effects();
    let engine = scenario_engine();
    ShowRunner::new(&config)
        .with_engine(&engine)
        .run(&show_files())
        .unwrap();

    let mut map = HashMap::new();
    map.insert(SegmentRole::Intro, MemoryEngine::tone(5000));
    map.insert(SegmentRole::TopSongs, MemoryEngine::tone(20000));
    map.insert(SegmentRole::FanMail, MemoryEngine::tone(4000));
    let expected = assemble(&DEFAULT_SHOW_ORDER, &map, true, 500).audio;

    let exported = engine.exported.borrow().clone().unwrap();
    assert_eq!(exported, expected);
}

#[test]
fn partial_input_produces_a_shorter_show() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path()).without_effects();
    // top_songs is not decodable
    let engine = MemoryEngine::new(&[("intro.mp3", 5000), ("fan_mail.mp3", 4000)]);

    let show = expect_produced(
        ShowRunner::new(&config)
            .with_engine(&engine)
            .run(&show_files())
            .unwrap(),
    );
    assert_eq!(show.duration_ms, 9500);
    assert_eq!(show.missing, vec![SegmentRole::TopSongs]);
}

#[test]
fn configured_silence_and_order_are_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path())
        .without_effects()
        .with_silence_ms(1000)
        .with_segment_order(vec![SegmentRole::FanMail, SegmentRole::Intro]);
    let engine = scenario_engine();

    let show = expect_produced(
        ShowRunner::new(&config)
            .with_engine(&engine)
            .run(&show_files())
            .unwrap(),
    );
    // top_songs is not in the running order
    assert_eq!(show.duration_ms, 4000 + 1000 + 5000);
    assert_eq!(show.segments, vec![SegmentRole::FanMail, SegmentRole::Intro]);
}

// ── Effects ───────────────────────────────────────────────────────────────

#[test]
fn full_production_wraps_and_extends_the_show() {
    let dir = tempfile::tempdir().unwrap();
    let base = config_in(dir.path());
    let effects = EffectSpec {
        intro_music_file: Some(PathBuf::from("theme.mp3")),
        ..base.effects.clone()
    };
    let config = Preset::FullProduction.apply(&base.with_effects(effects));
    let engine = MemoryEngine::new(&[
        ("intro.mp3", 5000),
        ("top_songs.mp3", 20000),
        ("fan_mail.mp3", 4000),
        ("theme.mp3", 2000),
    ]);

    let show = expect_produced(
        ShowRunner::new(&config)
            .with_engine(&engine)
            .with_seed(Some(7))
            .run(&show_files())
            .unwrap(),
    );
    // background keeps 30s, jingle (3s) on both ends, applause (5s) at the
    // end, intro music (2s) in front
    assert_eq!(show.duration_ms, 30000 + 2 * 3000 + 5000 + 2000);
    let order: Vec<Stage> = show.stages.iter().map(|s| s.stage).collect();
    assert_eq!(order, Stage::ORDER.to_vec());
    assert!(show.stages.iter().all(|s| s.outcome == StageOutcome::Applied));
}

#[test]
fn broken_effect_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let effects = EffectSpec {
        jingle_file: Some(PathBuf::from("missing_jingle.wav")),
        applause_duration_ms: 2000,
        ..EffectSpec::default()
    };
    let config = config_in(dir.path()).with_effects(effects);
    let engine = scenario_engine();

    let show = expect_produced(
        ShowRunner::new(&config)
            .with_engine(&engine)
            .with_seed(Some(1))
            .run(&show_files())
            .unwrap(),
    );
    assert_eq!(show.duration_ms, 30000 + 2000);
    let jingle = show.stages.iter().find(|s| s.stage == Stage::Jingle).unwrap();
    assert!(matches!(jingle.outcome, StageOutcome::Failed(_)));
}

// ── Degraded path ─────────────────────────────────────────────────────────

#[test]
fn missing_engine_yields_concat_and_two_entry_playlist() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("fan_mail.mp3"), b"FAN").unwrap();
    fs::write(src.join("intro.mp3"), b"INTRO").unwrap();
    // given out of order on purpose
    let files = vec![
        SegmentFile::new(SegmentRole::FanMail, src.join("fan_mail.mp3")),
        SegmentFile::new(SegmentRole::Intro, src.join("intro.mp3")),
    ];

    let (reason, fallback) = match ShowRunner::new(&config).run(&files).unwrap() {
        ShowOutcome::Degraded { reason, fallback } => (reason, fallback),
        other => panic!("expected degraded output, got {:?}", other),
    };
    assert_eq!(reason, DegradeReason::EngineUnavailable);

    let concat = fallback.find(ArtifactKind::Concatenated).unwrap();
    assert_eq!(fs::read(&concat.path).unwrap(), b"INTROFAN");
    assert_eq!(concat.path.extension().unwrap(), "mp3");

    let playlist = fallback.find(ArtifactKind::Playlist).unwrap();
    assert_eq!(playlist.entries, 2);
    let text = fs::read_to_string(&playlist.path).unwrap();
    assert!(text.starts_with("#EXTM3U\n"));
    assert_eq!(text.matches("#EXTINF").count(), 2);
    let intro_at = text.find("Intro Segment").unwrap();
    let fan_at = text.find("Fan Mail Segment").unwrap();
    assert!(intro_at < fan_at);
}

#[test]
fn nothing_decodable_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let engine = MemoryEngine::new(&[]);

    match ShowRunner::new(&config)
        .with_engine(&engine)
        .run(&show_files())
        .unwrap()
    {
        ShowOutcome::Degraded { reason, fallback } => {
            assert_eq!(reason, DegradeReason::EmptyAssembly);
            // the files do not exist, so only the playlist can be written
            assert!(fallback.find(ArtifactKind::Playlist).is_some());
            assert!(fallback.find(ArtifactKind::Concatenated).is_none());
        }
        other => panic!("expected degraded output, got {:?}", other),
    }
    assert!(engine.exported.borrow().is_none());
}

#[test]
fn run_summary_serializes() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path()).without_effects();
    let engine = scenario_engine();
    let outcome = ShowRunner::new(&config)
        .with_engine(&engine)
        .run(&show_files())
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "produced");
    assert_eq!(json["duration_ms"], 30000);
    assert_eq!(json["stages"][0]["status"], "disabled");
}

// ── Real engine ───────────────────────────────────────────────────────────

#[cfg(feature = "engine")]
mod rodio_engine {
    use super::*;
    use radio_show::catalog::{SfxCatalog, SfxCategory};
    use radio_show::codec::RodioEngine;
    use radio_show::library::SfxLibrary;

    fn write_fixture(path: &Path, ms: u32, channels: u16, rate: u32) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let frames = rate * ms / 1000;
        for i in 0..frames {
            let s = ((i as f32 * 0.05).sin() * 8000.0) as i16;
            for _ in 0..channels {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn wav_fixtures_produce_a_mono_show() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path()).without_effects();
        let intro = dir.path().join("intro.wav");
        let fan_mail = dir.path().join("fan_mail.wav");
        write_fixture(&intro, 1000, 1, 44100);
        // stereo at a different rate: downmixed and resampled
        write_fixture(&fan_mail, 2000, 2, 22050);

        let engine = RodioEngine::from_config(&config).unwrap();
        let files = vec![
            SegmentFile::new(SegmentRole::Intro, &intro),
            SegmentFile::new(SegmentRole::FanMail, &fan_mail),
        ];
        let show = expect_produced(
            ShowRunner::new(&config)
                .with_engine(&engine)
                .run(&files)
                .unwrap(),
        );
        assert_eq!(show.duration_ms, 3500);

        let reader = hound::WavReader::open(&show.path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 44100);
        let ms = reader.duration() as u64 * 1000 / 44100;
        assert!((3499..=3500).contains(&ms), "duration {}", ms);
    }

    #[test]
    fn rendered_effects_show_up_in_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let engine = RodioEngine::from_config(&config).unwrap();
        let library = SfxLibrary::new(&config, &engine);
        library.create_radio_jingle(2000).unwrap();
        library
            .create_background_music(3000, radio_show::config::BackgroundStyle::Emotional)
            .unwrap();

        let catalog = SfxCatalog::scan(&config.sfx_dir()).unwrap();
        assert_eq!(catalog.in_category(SfxCategory::Jingle).len(), 1);
        let beds = catalog.in_category(SfxCategory::BackgroundMusic);
        assert_eq!(beds.len(), 1);
        let ms = beds[0].duration_ms.unwrap();
        assert!((2999..=3001).contains(&ms), "duration {}", ms);
    }

    #[test]
    fn saved_effect_files_land_in_sfx_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path()).with_effects(EffectSpec {
            jingle_duration_ms: 1000,
            ..EffectSpec::none().with_toggles(true, false, false)
        });
        config.save_effect_files = true;
        let intro = dir.path().join("intro.wav");
        write_fixture(&intro, 1000, 1, 44100);

        let engine = RodioEngine::from_config(&config).unwrap();
        let files = vec![SegmentFile::new(SegmentRole::Intro, &intro)];
        let show = expect_produced(
            ShowRunner::new(&config)
                .with_engine(&engine)
                .run(&files)
                .unwrap(),
        );
        assert_eq!(show.duration_ms, 3000);
        assert!(config.sfx_dir().join("radio_jingle.wav").exists());
    }
}
