//! Error types for the show engine.
//!
//! Each variant maps to one recovery policy: some are recovered locally
//! (`MissingSegment`, `EffectBuild`), some switch the run onto the degraded
//! path (`EmptyAssembly`, `EngineUnavailable`), and `Export` is terminal.

use crate::pipeline::Stage;
use crate::segment::SegmentRole;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Synthesis was asked for a zero-length signal.
    #[error("Invalid duration: {0}ms (must be > 0)")]
    InvalidDuration(u64),

    /// An expected role had no segment.
    #[error("Segment '{0}' not found")]
    MissingSegment(SegmentRole),

    /// No segment could be placed on the timeline.
    #[error("No audio segments could be combined")]
    EmptyAssembly,

    /// An effect stage could not build its audio.
    #[error("{stage} stage failed: {source}")]
    EffectBuild {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    /// The decoding/encoding backend is not available in this build or host.
    #[error("Audio engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Cannot decode '{}': {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Cannot export '{}': {reason}", path.display())]
    Export { path: PathBuf, reason: String },

    #[error("ffmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that should send the whole run down the degraded path.
    pub fn is_degradable(&self) -> bool {
        matches!(self, Error::EmptyAssembly | Error::EngineUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
