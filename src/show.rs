//! One production run: decode, assemble, apply effects, export.
//!
//! A run ends in one of three ways. `Produced` is a real mix on disk.
//! `Degraded` means the mix could not be made and the fallback artifacts were
//! written instead. An `Err` means nothing usable could be written at all.

use crate::assembler::{assemble, by_role, decode_segments};
use crate::codec::AudioEngine;
use crate::config::{OutputFormat, ShowConfig};
use crate::error::{Error, Result};
use crate::fallback::{degrade, FallbackReport};
use crate::pipeline::{Production, StageReport};
use crate::segment::{in_show_order, SegmentFile, SegmentRole};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// The finished show as written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct ShowProduction {
    pub path: PathBuf,
    pub duration_ms: u64,
    pub size_bytes: u64,
    pub format: OutputFormat,
    pub segments: Vec<SegmentRole>,
    pub missing: Vec<SegmentRole>,
    pub stages: Vec<StageReport>,
}

impl ShowProduction {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    /// No working decoder/encoder for this run.
    EngineUnavailable,
    /// Nothing could be decoded and placed on the timeline.
    EmptyAssembly,
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::EngineUnavailable => write!(f, "audio engine unavailable"),
            DegradeReason::EmptyAssembly => write!(f, "no segments could be assembled"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ShowOutcome {
    Produced(ShowProduction),
    Degraded {
        reason: DegradeReason,
        fallback: FallbackReport,
    },
}

pub struct ShowRunner<'a> {
    config: &'a ShowConfig,
    engine: Option<&'a dyn AudioEngine>,
    seed: Option<u64>,
}

impl<'a> ShowRunner<'a> {
    pub fn new(config: &'a ShowConfig) -> Self {
        ShowRunner {
            config,
            engine: None,
            seed: None,
        }
    }

    /// Without an engine every run takes the degraded path.
    pub fn with_engine(mut self, engine: &'a dyn AudioEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn run(&self, files: &[SegmentFile]) -> Result<ShowOutcome> {
        let config = self.config;
        config.ensure_directories()?;
        let ordered = in_show_order(&config.segment_order, files);
        info!(
            "producing show from {} of {} segment files",
            ordered.len(),
            files.len()
        );

        let Some(engine) = self.engine else {
            return self.degraded(DegradeReason::EngineUnavailable, &ordered);
        };

        let segments = match decode_segments(engine, &ordered) {
            Ok(segments) => segments,
            Err(e) => {
                warn!("{}", e);
                return self.degraded(DegradeReason::EngineUnavailable, &ordered);
            }
        };

        let assembly = assemble(
            &config.segment_order,
            &by_role(&segments),
            config.insert_silence,
            config.silence_between_segments_ms,
        );
        let assembly = match assembly.into_result() {
            Ok(a) => a,
            Err(e) => {
                warn!("{}", e);
                return self.degraded(DegradeReason::EmptyAssembly, &ordered);
            }
        };

        let mut production = Production::new(config).with_engine(engine);
        if let Some(seed) = self.seed {
            production = production.with_seed(seed);
        }
        let report = production.run(&assembly.audio);

        let path = config.final_output_path();
        engine.export(&report.audio, &path, config.output_format)?;
        let size_bytes = fs::metadata(&path)?.len();
        info!(
            "show written to {} ({}ms)",
            path.display(),
            report.audio.duration_ms()
        );

        Ok(ShowOutcome::Produced(ShowProduction {
            path,
            duration_ms: report.audio.duration_ms(),
            size_bytes,
            format: config.output_format,
            segments: assembly.placed,
            missing: assembly.missing,
            stages: report.stages,
        }))
    }

    fn degraded(&self, reason: DegradeReason, files: &[&SegmentFile]) -> Result<ShowOutcome> {
        warn!("{}, falling back to concatenation and playlist", reason);
        let fallback = degrade(self.config, files);
        if fallback.is_empty() {
            return Err(Error::Export {
                path: self.config.audio_dir(),
                reason: format!("no fallback output ({})", fallback.failures.join("; ")),
            });
        }
        Ok(ShowOutcome::Degraded { reason, fallback })
    }
}
