use crate::buffer::AudioBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Logical position of a spoken segment in the show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentRole {
    Intro,
    TopSongs,
    FanMail,
    News,
    Outro,
}

/// Role → (config key, display title).
const ROLE_TABLE: &[(SegmentRole, &str, &str)] = &[
    (SegmentRole::Intro, "intro", "Intro"),
    (SegmentRole::TopSongs, "top_songs", "Top Songs"),
    (SegmentRole::FanMail, "fan_mail", "Fan Mail"),
    (SegmentRole::News, "news", "News"),
    (SegmentRole::Outro, "outro", "Outro"),
];

/// Running order used when nothing else is configured.
pub const DEFAULT_SHOW_ORDER: [SegmentRole; 3] =
    [SegmentRole::Intro, SegmentRole::TopSongs, SegmentRole::FanMail];

impl SegmentRole {
    pub const ALL: [SegmentRole; 5] = [
        SegmentRole::Intro,
        SegmentRole::TopSongs,
        SegmentRole::FanMail,
        SegmentRole::News,
        SegmentRole::Outro,
    ];

    fn entry(&self) -> &'static (SegmentRole, &'static str, &'static str) {
        ROLE_TABLE
            .iter()
            .find(|(role, _, _)| role == self)
            .unwrap_or(&ROLE_TABLE[0])
    }

    /// Snake-case key used in config files and output filenames.
    pub fn key(&self) -> &'static str {
        self.entry().1
    }

    /// Human-readable title, e.g. "Top Songs".
    pub fn title(&self) -> &'static str {
        self.entry().2
    }

    /// Parse a role (case-insensitive, accepts hyphens, spaces or underscores).
    pub fn from_str_loose(s: &str) -> Result<Self, String> {
        let normalized = s.trim().to_lowercase().replace(&['-', ' '][..], "_");
        ROLE_TABLE
            .iter()
            .find(|(_, key, _)| *key == normalized)
            .map(|(role, _, _)| *role)
            .ok_or_else(|| {
                let expected: Vec<&str> = ROLE_TABLE.iter().map(|(_, key, _)| *key).collect();
                format!("Unknown segment '{}'. Expected: {}", s, expected.join(", "))
            })
    }
}

impl fmt::Display for SegmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A segment as delivered by the speech source: a role and the file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentFile {
    pub role: SegmentRole,
    pub path: PathBuf,
}

impl SegmentFile {
    pub fn new(role: SegmentRole, path: impl Into<PathBuf>) -> Self {
        SegmentFile {
            role,
            path: path.into(),
        }
    }
}

/// A decoded segment ready for assembly.
#[derive(Debug, Clone)]
pub struct Segment {
    pub role: SegmentRole,
    pub path: PathBuf,
    pub audio: AudioBuffer,
}

/// Order `files` by `order`, dropping roles that are not in it.
/// The first file given for a role wins.
pub fn in_show_order<'a>(order: &[SegmentRole], files: &'a [SegmentFile]) -> Vec<&'a SegmentFile> {
    order
        .iter()
        .filter_map(|role| files.iter().find(|f| f.role == *role))
        .collect()
}
