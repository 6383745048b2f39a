//! Degraded output when the show cannot be mixed.
//!
//! Two independent strategies: raw byte concatenation of the segment files
//! and an M3U playlist listing them. Both are always attempted; whatever
//! succeeds is returned in a `FallbackReport`.

use crate::config::ShowConfig;
use crate::error::{Error, Result};
use crate::segment::SegmentFile;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const PLAYLIST_TITLE: &str = "Radio Show";
const CONCAT_STEM: &str = "simple_concat_show";
const PLAYLIST_STEM: &str = "radio_show_playlist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Segment files glued together byte for byte.
    Concatenated,
    Playlist,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// Segments that made it into the artifact.
    pub entries: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FallbackReport {
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<String>,
}

impl FallbackReport {
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn find(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

/// Append the raw bytes of each file to `out`, in order.
///
/// Files that cannot be read are skipped with a warning. Returns the number
/// of files copied. Copying none, or failing to write, is an error and
/// removes `out`.
pub fn concatenate_raw(files: &[&SegmentFile], out: &Path) -> Result<usize> {
    let result = match write_concat(files, out) {
        Ok(0) => Err(Error::Export {
            path: out.to_path_buf(),
            reason: "no segment files could be read".to_string(),
        }),
        other => other,
    };
    if result.is_err() && out.is_file() {
        if let Err(e) = fs::remove_file(out) {
            warn!("could not remove partial {}: {}", out.display(), e);
        }
    }
    result
}

fn write_concat(files: &[&SegmentFile], out: &Path) -> Result<usize> {
    let export_err = |reason: String| Error::Export {
        path: out.to_path_buf(),
        reason,
    };
    let mut writer = BufWriter::new(File::create(out).map_err(|e| export_err(e.to_string()))?);
    let mut copied = 0;
    for file in files {
        // whole file first, so a read error never leaves half a segment in `out`
        let bytes = match fs::read(&file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("{} segment skipped in concat ({}): {}", file.role, file.path.display(), e);
                continue;
            }
        };
        writer
            .write_all(&bytes)
            .map_err(|e| export_err(e.to_string()))?;
        copied += 1;
    }
    writer.flush().map_err(|e| export_err(e.to_string()))?;
    Ok(copied)
}

/// Write an extended M3U playlist of `files`, in order.
pub fn write_playlist(files: &[&SegmentFile], out: &Path) -> Result<usize> {
    if files.is_empty() {
        return Err(Error::Export {
            path: out.to_path_buf(),
            reason: "no segments to list".to_string(),
        });
    }
    fs::write(out, playlist_text(files, out.parent())).map_err(|e| Error::Export {
        path: out.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(files.len())
}

/// M3U body. Entries next to the playlist are written by file name only.
pub fn playlist_text(files: &[&SegmentFile], playlist_dir: Option<&Path>) -> String {
    let mut text = format!("#EXTM3U\n#PLAYLIST:{}\n\n", PLAYLIST_TITLE);
    for file in files {
        let entry = match (playlist_dir, file.path.parent(), file.path.file_name()) {
            (Some(dir), Some(parent), Some(name)) if dir == parent => {
                name.to_string_lossy().to_string()
            }
            _ => file.path.display().to_string(),
        };
        text.push_str(&format!("#EXTINF:-1,{} Segment\n{}\n\n", file.role.title(), entry));
    }
    text
}

/// Try both strategies into the audio directory of `config`.
pub fn degrade(config: &ShowConfig, files: &[&SegmentFile]) -> FallbackReport {
    let mut report = FallbackReport::default();
    let dir = config.audio_dir();
    if let Err(e) = fs::create_dir_all(&dir) {
        report
            .failures
            .push(format!("cannot create {}: {}", dir.display(), e));
        return report;
    }

    let extension = files
        .first()
        .and_then(|f| f.path.extension())
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp3".to_string());
    let concat_path = dir.join(config.file_name(CONCAT_STEM, &extension));
    match concatenate_raw(files, &concat_path) {
        Ok(entries) => {
            info!("raw concatenation: {} ({} files)", concat_path.display(), entries);
            report.artifacts.push(Artifact {
                kind: ArtifactKind::Concatenated,
                path: concat_path,
                entries,
            });
        }
        Err(e) => {
            warn!("raw concatenation failed: {}", e);
            report.failures.push(e.to_string());
        }
    }

    let playlist_path = dir.join(config.file_name(PLAYLIST_STEM, "m3u"));
    match write_playlist(files, &playlist_path) {
        Ok(entries) => {
            info!("playlist: {} ({} entries)", playlist_path.display(), entries);
            report.artifacts.push(Artifact {
                kind: ArtifactKind::Playlist,
                path: playlist_path,
                entries,
            });
        }
        Err(e) => {
            warn!("playlist failed: {}", e);
            report.failures.push(e.to_string());
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentRole;

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn concat_appends_bytes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            SegmentFile::new(SegmentRole::Intro, write(dir.path(), "a.mp3", b"AAA")),
            SegmentFile::new(SegmentRole::TopSongs, write(dir.path(), "b.mp3", b"BB")),
        ];
        let refs: Vec<&SegmentFile> = files.iter().collect();
        let out = dir.path().join("out.mp3");
        assert_eq!(concatenate_raw(&refs, &out).unwrap(), 2);
        assert_eq!(fs::read(&out).unwrap(), b"AAABB");
    }

    #[test]
    fn concat_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            SegmentFile::new(SegmentRole::Intro, dir.path().join("gone.mp3")),
            SegmentFile::new(SegmentRole::FanMail, write(dir.path(), "c.mp3", b"C")),
        ];
        let refs: Vec<&SegmentFile> = files.iter().collect();
        let out = dir.path().join("out.mp3");
        assert_eq!(concatenate_raw(&refs, &out).unwrap(), 1);
        assert_eq!(fs::read(&out).unwrap(), b"C");
    }

    #[test]
    fn concat_skips_unreadable_entries() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("not_a_file.mp3");
        fs::create_dir(&nested).unwrap();
        let files = vec![
            SegmentFile::new(SegmentRole::Intro, write(dir.path(), "a.mp3", b"AAA")),
            SegmentFile::new(SegmentRole::TopSongs, nested),
            SegmentFile::new(SegmentRole::FanMail, write(dir.path(), "c.mp3", b"C")),
        ];
        let refs: Vec<&SegmentFile> = files.iter().collect();
        let out = dir.path().join("out.mp3");
        assert_eq!(concatenate_raw(&refs, &out).unwrap(), 2);
        assert_eq!(fs::read(&out).unwrap(), b"AAAC");
    }

    #[test]
    fn concat_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![SegmentFile::new(
            SegmentRole::Intro,
            write(dir.path(), "a.mp3", b"AAA"),
        )];
        let refs: Vec<&SegmentFile> = files.iter().collect();
        let out = dir.path().join("missing").join("out.mp3");
        let err = concatenate_raw(&refs, &out).unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn concat_with_nothing_readable_fails_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![SegmentFile::new(SegmentRole::Intro, dir.path().join("gone.mp3"))];
        let refs: Vec<&SegmentFile> = files.iter().collect();
        let out = dir.path().join("out.mp3");
        assert!(concatenate_raw(&refs, &out).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn playlist_format() {
        let files = vec![
            SegmentFile::new(SegmentRole::Intro, "/shows/audio/intro.mp3"),
            SegmentFile::new(SegmentRole::TopSongs, "/elsewhere/top.mp3"),
        ];
        let refs: Vec<&SegmentFile> = files.iter().collect();
        let text = playlist_text(&refs, Some(Path::new("/shows/audio")));
        assert_eq!(
            text,
            "#EXTM3U\n#PLAYLIST:Radio Show\n\n\
             #EXTINF:-1,Intro Segment\nintro.mp3\n\n\
             #EXTINF:-1,Top Songs Segment\n/elsewhere/top.mp3\n\n"
        );
    }

    #[test]
    fn degrade_survives_one_strategy_failing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShowConfig::default()
            .with_output_dir(dir.path())
            .with_timestamps(false);
        // nothing on disk: concat fails, playlist still lists both
        let files = vec![
            SegmentFile::new(SegmentRole::Intro, dir.path().join("intro.mp3")),
            SegmentFile::new(SegmentRole::FanMail, dir.path().join("fan.mp3")),
        ];
        let refs: Vec<&SegmentFile> = files.iter().collect();
        let report = degrade(&config, &refs);
        assert!(report.find(ArtifactKind::Concatenated).is_none());
        assert_eq!(report.find(ArtifactKind::Playlist).unwrap().entries, 2);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn degrade_with_no_files_produces_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShowConfig::default().with_output_dir(dir.path());
        let report = degrade(&config, &[]);
        assert!(report.is_empty());
        assert_eq!(report.failures.len(), 2);
    }
}
