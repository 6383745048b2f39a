//! Effect pipeline applied to an assembled show.
//!
//! Stages run in a fixed order: background music, jingle, applause, then
//! intro music in front of everything. Each one
//! takes the current buffer and returns a new one. A stage that cannot build
//! its effect is recorded as failed and its input flows on untouched.

use crate::applause::create_applause;
use crate::background::create_background_music;
use crate::buffer::AudioBuffer;
use crate::codec::AudioEngine;
use crate::config::{ApplausePosition, JinglePosition, ShowConfig};
use crate::error::{Error, Result};
use crate::jingle::create_radio_jingle;
use crate::library::SfxLibrary;
use crate::tone::Synth;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// The background bed is rendered this much longer than the show, then cut.
const BG_OVERHANG_MS: u64 = 2000;
pub const INTRO_FADE_IN_MS: u64 = 500;
pub const INTRO_FADE_OUT_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    BackgroundMusic,
    Jingle,
    Applause,
    IntroMusic,
}

impl Stage {
    /// Execution order.
    pub const ORDER: [Stage; 4] = [
        Stage::BackgroundMusic,
        Stage::Jingle,
        Stage::Applause,
        Stage::IntroMusic,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::BackgroundMusic => write!(f, "background music"),
            Stage::Jingle => write!(f, "jingle"),
            Stage::Applause => write!(f, "applause"),
            Stage::IntroMusic => write!(f, "intro music"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum StageOutcome {
    Applied,
    Disabled,
    /// Builder failed; the stage passed its input through.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

#[derive(Debug, Clone)]
pub struct ProductionReport {
    pub audio: AudioBuffer,
    pub stages: Vec<StageReport>,
}

impl ProductionReport {
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| &r.outcome)
    }
}

pub struct Production<'a> {
    config: &'a ShowConfig,
    synth: Synth,
    rng: fastrand::Rng,
    engine: Option<&'a dyn AudioEngine>,
}

impl<'a> Production<'a> {
    pub fn new(config: &'a ShowConfig) -> Self {
        Production {
            config,
            synth: Synth::new(config.sample_rate),
            rng: fastrand::Rng::new(),
            engine: None,
        }
    }

    /// Fix the applause jitter so runs are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// Engine used to decode pre-rendered effect files and to save
    /// generated effects when `save_effect_files` is on.
    pub fn with_engine(mut self, engine: &'a dyn AudioEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn run(&mut self, show: &AudioBuffer) -> ProductionReport {
        let mut current = show.clone();
        let mut stages = Vec::with_capacity(Stage::ORDER.len());

        for stage in Stage::ORDER {
            let outcome = if !self.enabled(stage) {
                StageOutcome::Disabled
            } else {
                match self.apply(stage, &current) {
                    Ok(next) => {
                        info!(
                            "{} applied ({}ms -> {}ms)",
                            stage,
                            current.duration_ms(),
                            next.duration_ms()
                        );
                        current = next;
                        StageOutcome::Applied
                    }
                    Err(source) => {
                        let err = Error::EffectBuild {
                            stage,
                            source: Box::new(source),
                        };
                        warn!("{}, continuing without it", err);
                        StageOutcome::Failed(err.to_string())
                    }
                }
            };
            stages.push(StageReport { stage, outcome });
        }

        ProductionReport {
            audio: current,
            stages,
        }
    }

    fn enabled(&self, stage: Stage) -> bool {
        let effects = &self.config.effects;
        match stage {
            Stage::BackgroundMusic => effects.background_music,
            Stage::Jingle => effects.jingle,
            Stage::Applause => effects.applause,
            Stage::IntroMusic => effects.intro_music_file.is_some(),
        }
    }

    fn apply(&mut self, stage: Stage, show: &AudioBuffer) -> Result<AudioBuffer> {
        let config = self.config;
        let effects = &config.effects;
        match stage {
            Stage::BackgroundMusic => {
                let bed = match &effects.bg_file {
                    Some(path) => self.decode_effect(path)?,
                    None => {
                        let bed = create_background_music(
                            &self.synth,
                            show.duration_ms() + BG_OVERHANG_MS,
                            effects.bg_style,
                        )?;
                        self.keep(&format!("bg_music_{}", effects.bg_style), &bed);
                        bed
                    }
                };
                Ok(bed
                    .looped_to(show.frames())
                    .gain(effects.bg_volume_db)
                    .overlay(show, 0))
            }
            Stage::Jingle => {
                let jingle = match &effects.jingle_file {
                    Some(path) => self.decode_effect(path)?,
                    None => {
                        let jingle = create_radio_jingle(&self.synth, effects.jingle_duration_ms)?;
                        self.keep("radio_jingle", &jingle);
                        jingle
                    }
                }
                .gain(effects.jingle_volume_db);
                Ok(match effects.jingle_position {
                    JinglePosition::Start => &jingle + show,
                    JinglePosition::End => show + &jingle,
                    JinglePosition::Both => &(&jingle + show) + &jingle,
                })
            }
            Stage::Applause => {
                let applause = match &effects.applause_file {
                    Some(path) => self.decode_effect(path)?,
                    None => {
                        let applause = create_applause(
                            &self.synth,
                            effects.applause_duration_ms,
                            effects.applause_intensity,
                            &mut self.rng,
                        )?;
                        self.keep(&format!("applause_{}", effects.applause_intensity), &applause);
                        applause
                    }
                }
                .gain(effects.applause_volume_db);
                Ok(match effects.applause_position {
                    ApplausePosition::Start => &applause + show,
                    ApplausePosition::End => show + &applause,
                    ApplausePosition::At(offset_ms) => show.overlay(&applause, offset_ms),
                })
            }
            Stage::IntroMusic => {
                let Some(path) = &effects.intro_music_file else {
                    return Ok(show.clone());
                };
                let intro = self
                    .decode_effect(path)?
                    .fade_in(INTRO_FADE_IN_MS)
                    .fade_out(INTRO_FADE_OUT_MS);
                Ok(&intro + show)
            }
        }
    }

    fn decode_effect(&self, path: &Path) -> Result<AudioBuffer> {
        let engine = self.engine.ok_or_else(|| {
            Error::EngineUnavailable(format!("no decoder for {}", path.display()))
        })?;
        engine.decode(path)
    }

    /// Save a generated effect to the sfx library when configured to.
    fn keep(&self, stem: &str, audio: &AudioBuffer) {
        if !self.config.save_effect_files {
            return;
        }
        if let Some(engine) = self.engine {
            if let Err(e) = SfxLibrary::new(self.config, engine).save(stem, audio) {
                warn!("could not save {} effect: {}", stem, e);
            }
        }
    }
}
