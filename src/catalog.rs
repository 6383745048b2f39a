use crate::error::Result;
use lofty::file::AudioFile;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const AUDIO_EXTENSIONS: [&str; 3] = ["wav", "mp3", "m4a"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SfxCategory {
    Jingle,
    Applause,
    BackgroundMusic,
    Other,
}

/// File-stem prefix → category. First match wins.
const CATEGORY_PREFIXES: &[(&str, SfxCategory)] = &[
    ("radio_jingle", SfxCategory::Jingle),
    ("jingle", SfxCategory::Jingle),
    ("applause", SfxCategory::Applause),
    ("bg_music", SfxCategory::BackgroundMusic),
    ("background", SfxCategory::BackgroundMusic),
];

impl SfxCategory {
    pub const ALL: [SfxCategory; 4] = [
        SfxCategory::Jingle,
        SfxCategory::Applause,
        SfxCategory::BackgroundMusic,
        SfxCategory::Other,
    ];

    pub fn classify(path: &Path) -> SfxCategory {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        CATEGORY_PREFIXES
            .iter()
            .find(|(prefix, _)| stem.starts_with(prefix))
            .map(|(_, category)| *category)
            .unwrap_or(SfxCategory::Other)
    }
}

impl fmt::Display for SfxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SfxCategory::Jingle => write!(f, "Jingles"),
            SfxCategory::Applause => write!(f, "Applause"),
            SfxCategory::BackgroundMusic => write!(f, "Background music"),
            SfxCategory::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub path: PathBuf,
    pub category: SfxCategory,
    pub size_bytes: u64,
    /// Unknown when the container could not be probed.
    pub duration_ms: Option<u64>,
}

impl CatalogEntry {
    pub fn from_path(path: &Path) -> Result<Self> {
        let size_bytes = fs::metadata(path)?.len();
        let duration_ms = match lofty::read_from_path(path) {
            Ok(tagged) => Some(tagged.properties().duration().as_millis() as u64),
            Err(e) => {
                debug!("no duration for {}: {}", path.display(), e);
                None
            }
        };
        Ok(CatalogEntry {
            name: path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            category: SfxCategory::classify(path),
            size_bytes,
            duration_ms,
        })
    }

    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }

    /// `M:SS`, or `-:--` when the duration is unknown.
    pub fn duration_display(&self) -> String {
        match self.duration_ms {
            Some(ms) => {
                let secs = ms / 1000;
                format!("{}:{:02}", secs / 60, secs % 60)
            }
            None => "-:--".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SfxCatalog {
    pub dir: PathBuf,
    pub entries: Vec<CatalogEntry>,
}

impl SfxCatalog {
    /// Scan `dir` for audio files. A missing directory is an empty catalog.
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        if dir.is_dir() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.is_file() && is_audio_file(&path) {
                    entries.push(CatalogEntry::from_path(&path)?);
                }
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(SfxCatalog {
            dir: dir.to_path_buf(),
            entries,
        })
    }

    pub fn in_category(&self, category: SfxCategory) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.as_str()))
}
