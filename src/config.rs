//! Show configuration.
//!
//! A `ShowConfig` is built once (defaults, JSON file, CLI overrides) and then
//! passed by reference into every stage. "Changing" it means building a new
//! value with one of the `with_*` methods or a `Preset`.

use crate::error::{Error, Result};
use crate::segment::{SegmentRole, DEFAULT_SHOW_ORDER};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CONFIG_FILE: &str = "radioshow.json";

// ── Effect enums ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplauseIntensity {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl ApplauseIntensity {
    /// Level offset applied to the raw noise before crowd jitter.
    pub fn volume_db(&self) -> f32 {
        match self {
            ApplauseIntensity::Light => -30.0,
            ApplauseIntensity::Medium => -20.0,
            ApplauseIntensity::Heavy => -10.0,
        }
    }

    pub fn from_str_loose(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "light" => Ok(ApplauseIntensity::Light),
            "medium" => Ok(ApplauseIntensity::Medium),
            "heavy" => Ok(ApplauseIntensity::Heavy),
            _ => Err(format!(
                "Unknown applause intensity '{}'. Expected: light, medium, heavy",
                s
            )),
        }
    }
}

impl fmt::Display for ApplauseIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplauseIntensity::Light => write!(f, "light"),
            ApplauseIntensity::Medium => write!(f, "medium"),
            ApplauseIntensity::Heavy => write!(f, "heavy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundStyle {
    #[default]
    Upbeat,
    Chill,
    Emotional,
}

impl BackgroundStyle {
    pub fn from_str_loose(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "upbeat" => Ok(BackgroundStyle::Upbeat),
            "chill" => Ok(BackgroundStyle::Chill),
            "emotional" => Ok(BackgroundStyle::Emotional),
            _ => Err(format!(
                "Unknown background style '{}'. Expected: upbeat, chill, emotional",
                s
            )),
        }
    }
}

impl fmt::Display for BackgroundStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackgroundStyle::Upbeat => write!(f, "upbeat"),
            BackgroundStyle::Chill => write!(f, "chill"),
            BackgroundStyle::Emotional => write!(f, "emotional"),
        }
    }
}

/// Where the jingle is placed relative to the show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JinglePosition {
    Start,
    End,
    /// Jingle before and after the show (`jingle + show + jingle`).
    #[default]
    Both,
}

impl JinglePosition {
    pub fn from_str_loose(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "start" => Ok(JinglePosition::Start),
            "end" => Ok(JinglePosition::End),
            "both" => Ok(JinglePosition::Both),
            _ => Err(format!(
                "Unknown jingle position '{}'. Expected: start, end, both",
                s
            )),
        }
    }
}

impl fmt::Display for JinglePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JinglePosition::Start => write!(f, "start"),
            JinglePosition::End => write!(f, "end"),
            JinglePosition::Both => write!(f, "both"),
        }
    }
}

/// Where applause goes. `start` and `end` join it to the show; `at` lays it
/// over the show at an offset in ms (JSON: `{"at": 12000}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplausePosition {
    Start,
    #[default]
    End,
    At(u64),
}

impl ApplausePosition {
    /// Accepts `start`, `end`, `at:<ms>` or a bare offset in ms.
    pub fn from_str_loose(s: &str) -> std::result::Result<Self, String> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "start" => return Ok(ApplausePosition::Start),
            "end" => return Ok(ApplausePosition::End),
            _ => {}
        }
        let offset = lower.strip_prefix("at:").unwrap_or(lower.as_str());
        offset.trim().parse::<u64>().map(ApplausePosition::At).map_err(|_| {
            format!(
                "Unknown applause position '{}'. Expected: start, end, at:<ms>",
                s
            )
        })
    }
}

impl fmt::Display for ApplausePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplausePosition::Start => write!(f, "start"),
            ApplausePosition::End => write!(f, "end"),
            ApplausePosition::At(ms) => write!(f, "at:{}", ms),
        }
    }
}

/// Container written for the final show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Wav,
    Mp3,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
        }
    }

    pub fn from_str_loose(s: &str) -> std::result::Result<Self, String> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "wav" => Ok(OutputFormat::Wav),
            "mp3" => Ok(OutputFormat::Mp3),
            _ => Err(format!("Unknown output format '{}'. Expected: wav, mp3", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

// ── EffectSpec ──────────────────────────────────────────────────────────────

/// Which effects to apply, where, and how loud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSpec {
    pub jingle: bool,
    pub jingle_position: JinglePosition,
    /// Offset applied to the jingle when it is joined to the show.
    pub jingle_volume_db: f32,
    pub jingle_duration_ms: u64,
    /// Pre-rendered jingle to use instead of synthesizing one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jingle_file: Option<PathBuf>,

    pub applause: bool,
    pub applause_intensity: ApplauseIntensity,
    pub applause_position: ApplausePosition,
    pub applause_volume_db: f32,
    pub applause_duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applause_file: Option<PathBuf>,

    pub background_music: bool,
    pub bg_style: BackgroundStyle,
    /// Offset applied to the bed before the show is laid over it.
    pub bg_volume_db: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_file: Option<PathBuf>,

    /// Music put in front of the finished show, with a short fade in and out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro_music_file: Option<PathBuf>,
}

impl Default for EffectSpec {
    fn default() -> Self {
        EffectSpec {
            jingle: true,
            jingle_position: JinglePosition::Both,
            jingle_volume_db: -10.0,
            jingle_duration_ms: 3000,
            jingle_file: None,
            applause: true,
            applause_intensity: ApplauseIntensity::Medium,
            applause_position: ApplausePosition::End,
            applause_volume_db: -15.0,
            applause_duration_ms: 5000,
            applause_file: None,
            background_music: false,
            bg_style: BackgroundStyle::Upbeat,
            bg_volume_db: -25.0,
            bg_file: None,
            intro_music_file: None,
        }
    }
}

impl EffectSpec {
    /// Same volumes and styles, every effect switched off.
    pub fn none() -> Self {
        EffectSpec::default().with_toggles(false, false, false)
    }

    pub fn with_toggles(&self, jingle: bool, applause: bool, background_music: bool) -> Self {
        EffectSpec {
            jingle,
            applause,
            background_music,
            ..self.clone()
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.jingle || self.applause || self.background_music || self.intro_music_file.is_some()
    }
}

// ── ShowConfig ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowConfig {
    /// Base directory; audio lands in `audio/`, effects in `sfx/`.
    pub output_dir: PathBuf,
    pub sample_rate: u32,
    pub segment_order: Vec<SegmentRole>,
    pub insert_silence: bool,
    pub silence_between_segments_ms: u64,
    pub output_format: OutputFormat,
    /// ffmpeg VBR quality for mp3: 0 (best) to 9 (worst).
    pub mp3_quality: u8,
    pub timestamp_filenames: bool,
    /// Final show file stem (extension comes from `output_format`).
    pub final_filename: String,
    /// Also write each generated effect into the sfx directory.
    pub save_effect_files: bool,
    pub effects: EffectSpec,
}

impl Default for ShowConfig {
    fn default() -> Self {
        ShowConfig {
            output_dir: PathBuf::from("assets"),
            sample_rate: crate::buffer::DEFAULT_SAMPLE_RATE,
            segment_order: DEFAULT_SHOW_ORDER.to_vec(),
            insert_silence: true,
            silence_between_segments_ms: 500,
            output_format: OutputFormat::Wav,
            mp3_quality: 2,
            timestamp_filenames: true,
            final_filename: "radio_show_with_sfx".to_string(),
            save_effect_files: false,
            effects: EffectSpec::default(),
        }
    }
}

impl ShowConfig {
    /// Load from JSON, falling back to defaults when the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str(&data) {
                    Ok(config) => return config,
                    Err(e) => warn!("corrupt config file {}, using defaults: {}", path.display(), e),
                },
                Err(e) => warn!("could not read config file {}: {}", path.display(), e),
            }
        }
        ShowConfig::default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("serialize error: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.output_dir.join("audio")
    }

    pub fn sfx_dir(&self) -> PathBuf {
        self.output_dir.join("sfx")
    }

    /// Create the output directories if they don't exist.
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(self.audio_dir())?;
        fs::create_dir_all(self.sfx_dir())?;
        Ok(())
    }

    /// `stem[_YYYYmmdd_HHMMSS].ext` honoring `timestamp_filenames`.
    pub fn file_name(&self, stem: &str, extension: &str) -> String {
        if self.timestamp_filenames {
            format!("{}_{}.{}", stem, timestamp(), extension)
        } else {
            format!("{}.{}", stem, extension)
        }
    }

    /// Full path of the final show file.
    pub fn final_output_path(&self) -> PathBuf {
        self.audio_dir().join(self.file_name(
            &self.final_filename,
            self.output_format.extension(),
        ))
    }

    pub fn with_effects(&self, effects: EffectSpec) -> Self {
        ShowConfig {
            effects,
            ..self.clone()
        }
    }

    /// Every effect off, intro music included.
    pub fn without_effects(&self) -> Self {
        self.with_effects(EffectSpec {
            intro_music_file: None,
            ..self.effects.with_toggles(false, false, false)
        })
    }

    pub fn with_output_dir(&self, dir: impl Into<PathBuf>) -> Self {
        ShowConfig {
            output_dir: dir.into(),
            ..self.clone()
        }
    }

    pub fn with_output_format(&self, output_format: OutputFormat) -> Self {
        ShowConfig {
            output_format,
            ..self.clone()
        }
    }

    pub fn with_silence_ms(&self, silence_between_segments_ms: u64) -> Self {
        ShowConfig {
            silence_between_segments_ms,
            ..self.clone()
        }
    }

    pub fn with_segment_order(&self, segment_order: Vec<SegmentRole>) -> Self {
        ShowConfig {
            segment_order,
            ..self.clone()
        }
    }

    pub fn with_final_filename(&self, final_filename: impl Into<String>) -> Self {
        ShowConfig {
            final_filename: final_filename.into(),
            ..self.clone()
        }
    }

    pub fn with_timestamps(&self, timestamp_filenames: bool) -> Self {
        ShowConfig {
            timestamp_filenames,
            ..self.clone()
        }
    }
}

/// `YYYYmmdd_HHMMSS` in local time.
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

// ── Presets ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Jingle, applause and background music.
    FullProduction,
    /// Segments only.
    MinimalProduction,
}

impl Preset {
    pub fn from_str_loose(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "full_production" | "full" => Ok(Preset::FullProduction),
            "minimal_production" | "minimal" => Ok(Preset::MinimalProduction),
            _ => Err(format!(
                "Unknown preset '{}'. Expected: full_production, minimal_production",
                s
            )),
        }
    }

    pub fn apply(&self, config: &ShowConfig) -> ShowConfig {
        let effects = match self {
            Preset::FullProduction => config.effects.with_toggles(true, true, true),
            Preset::MinimalProduction => config.effects.with_toggles(false, false, false),
        };
        config.with_effects(effects)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::FullProduction => write!(f, "full_production"),
            Preset::MinimalProduction => write!(f, "minimal_production"),
        }
    }
}
