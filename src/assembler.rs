//! Joining decoded segments into one continuous show.

use crate::buffer::{AudioBuffer, DEFAULT_SAMPLE_RATE};
use crate::codec::AudioEngine;
use crate::error::{Error, Result};
use crate::segment::{Segment, SegmentFile, SegmentRole};
use std::collections::HashMap;
use tracing::{info, warn};

/// Result of `assemble`: the joined audio plus which roles made it in.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub audio: AudioBuffer,
    pub placed: Vec<SegmentRole>,
    pub missing: Vec<SegmentRole>,
}

impl Assembly {
    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }

    /// `EmptyAssembly` when nothing was placed, otherwise the assembly itself.
    pub fn into_result(self) -> Result<Self> {
        if self.is_empty() {
            Err(Error::EmptyAssembly)
        } else {
            Ok(self)
        }
    }
}

/// Append the present roles of `order` back to back.
///
/// With `insert_silence`, `silence_ms` of silence goes between two present
/// segments; none is added after the last one. Roles with no buffer are
/// logged and skipped.
pub fn assemble(
    order: &[SegmentRole],
    segments: &HashMap<SegmentRole, AudioBuffer>,
    insert_silence: bool,
    silence_ms: u64,
) -> Assembly {
    let mut placed = Vec::new();
    let mut missing = Vec::new();
    let mut present = Vec::new();
    for role in order {
        match segments.get(role) {
            Some(audio) => {
                placed.push(*role);
                present.push(audio);
            }
            None => {
                warn!("{}, skipping", Error::MissingSegment(*role));
                missing.push(*role);
            }
        }
    }

    let sample_rate = present
        .first()
        .map(|a| a.sample_rate())
        .unwrap_or(DEFAULT_SAMPLE_RATE);
    let gap = AudioBuffer::silent(silence_ms, sample_rate);

    let mut audio = AudioBuffer::empty(sample_rate);
    for (i, segment) in present.iter().enumerate() {
        if i > 0 && insert_silence {
            audio = audio.append(&gap);
        }
        audio = audio.append(segment);
    }

    info!(
        "assembled {} of {} segments ({}ms)",
        placed.len(),
        order.len(),
        audio.duration_ms()
    );
    Assembly {
        audio,
        placed,
        missing,
    }
}

/// Decode every file through `engine`.
///
/// A file that fails to decode is logged and left out, the same as a missing
/// segment. Only a degradable engine error stops the loop.
pub fn decode_segments(engine: &dyn AudioEngine, files: &[&SegmentFile]) -> Result<Vec<Segment>> {
    let mut segments = Vec::with_capacity(files.len());
    for file in files {
        match engine.decode(&file.path) {
            Ok(audio) => segments.push(Segment {
                role: file.role,
                path: file.path.clone(),
                audio,
            }),
            Err(e) if e.is_degradable() => return Err(e),
            Err(e) => warn!("{} segment skipped: {}", file.role, e),
        }
    }
    Ok(segments)
}

/// Role → audio map for `assemble`. The first segment for a role wins.
pub fn by_role(segments: &[Segment]) -> HashMap<SegmentRole, AudioBuffer> {
    let mut map = HashMap::new();
    for segment in segments {
        map.entry(segment.role)
            .or_insert_with(|| segment.audio.clone());
    }
    map
}
