//! Format conversion and trimming through ffmpeg.

use super::process;
use crate::error::{MediabotError, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Formats a file can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Mp3,
    Wav,
    Aac,
    Mp4,
    Avi,
    Mov,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 6] = [
        TargetFormat::Mp3,
        TargetFormat::Wav,
        TargetFormat::Aac,
        TargetFormat::Mp4,
        TargetFormat::Avi,
        TargetFormat::Mov,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "mp3" => Some(TargetFormat::Mp3),
            "wav" => Some(TargetFormat::Wav),
            "aac" => Some(TargetFormat::Aac),
            "mp4" => Some(TargetFormat::Mp4),
            "avi" => Some(TargetFormat::Avi),
            "mov" => Some(TargetFormat::Mov),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Mp3 => "mp3",
            TargetFormat::Wav => "wav",
            TargetFormat::Aac => "aac",
            TargetFormat::Mp4 => "mp4",
            TargetFormat::Avi => "avi",
            TargetFormat::Mov => "mov",
        }
    }

    /// Audio-only targets drop the video stream.
    pub fn is_audio(&self) -> bool {
        matches!(self, TargetFormat::Mp3 | TargetFormat::Wav | TargetFormat::Aac)
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Output path of a conversion: `<output_dir>/<stem>.<ext>`.
pub fn converted_path(source: &Path, output_dir: &Path, target: TargetFormat) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    output_dir.join(format!("{}.{}", stem, target.extension()))
}

/// Output path of a trim: `<output_dir>/trimmed_<basename>`.
pub fn trimmed_path(source: &Path, output_dir: &Path) -> PathBuf {
    let name = source
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("video.mp4");
    output_dir.join(format!("trimmed_{}", name))
}

/// Check a requested trim window against the media duration.
///
/// Returns the effective `(start, length)`; the end is clamped to the duration.
pub fn trim_window(start: f64, end: f64, duration: f64) -> Result<(f64, f64)> {
    if !start.is_finite() || !end.is_finite() || start < 0.0 {
        return Err(MediabotError::InvalidInput(
            "Start and end must be non-negative numbers".to_string(),
        ));
    }
    if end <= start {
        return Err(MediabotError::InvalidInput(format!(
            "End ({end}s) must be after start ({start}s)"
        )));
    }
    if start >= duration {
        return Err(MediabotError::InvalidInput(format!(
            "Start ({start}s) is past the end of the media ({duration:.1}s)"
        )));
    }
    let end = end.min(duration);
    Ok((start, end - start))
}

/// Ensure the input exists and is a regular file.
fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(MediabotError::FileNotFound(path.display().to_string()))
    }
}

/// Remove a partially written output, ignoring a file that never appeared.
fn discard_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove partial output {:?}: {}", path, e);
        }
    }
}

/// Convert `source` into `target`, writing to `output_dir`.
#[instrument(skip(output_dir))]
pub async fn convert(source: &Path, target: TargetFormat, output_dir: &Path) -> Result<PathBuf> {
    require_file(source)?;
    std::fs::create_dir_all(output_dir)?;

    let dest = converted_path(source, output_dir, target);
    if dest == source {
        return Err(MediabotError::InvalidInput(format!(
            "{} is already {}",
            source.display(),
            target
        )));
    }

    info!("Converting {:?} to {}", source, target);

    let mut args = vec![OsStr::new("-y"), OsStr::new("-i"), source.as_os_str()];
    if target.is_audio() {
        args.push(OsStr::new("-vn"));
    }
    args.extend([OsStr::new("-loglevel"), OsStr::new("error"), dest.as_os_str()]);

    match process::run("ffmpeg", args, "Conversion").await {
        Ok(_) => Ok(dest),
        Err(e) => {
            discard_partial(&dest);
            Err(e)
        }
    }
}

/// Cut `source` between `start` and `end` seconds, writing to `output_dir`.
#[instrument(skip(output_dir))]
pub async fn trim(source: &Path, start: f64, end: f64, output_dir: &Path) -> Result<PathBuf> {
    require_file(source)?;
    std::fs::create_dir_all(output_dir)?;

    let duration = process::probe_duration(source).await?;
    let (start, length) = trim_window(start, end, duration)?;
    let dest = trimmed_path(source, output_dir);

    let start_arg = format!("{:.3}", start);
    let length_arg = format!("{:.3}", length);

    // First attempt: stream copy (fast, no quality loss)
    let copy = process::run(
        "ffmpeg",
        [
            OsStr::new("-ss"),
            OsStr::new(&start_arg),
            OsStr::new("-i"),
            source.as_os_str(),
            OsStr::new("-t"),
            OsStr::new(&length_arg),
            OsStr::new("-c"),
            OsStr::new("copy"),
            OsStr::new("-y"),
            OsStr::new("-loglevel"),
            OsStr::new("error"),
            dest.as_os_str(),
        ],
        "Trim",
    )
    .await;

    match copy {
        Ok(_) if dest.exists() => return Ok(dest),
        Err(MediabotError::ToolNotFound(tool)) => return Err(MediabotError::ToolNotFound(tool)),
        _ => {}
    }

    warn!("Stream copy failed, re-encoding segment");

    let encode = process::run(
        "ffmpeg",
        [
            OsStr::new("-ss"),
            OsStr::new(&start_arg),
            OsStr::new("-i"),
            source.as_os_str(),
            OsStr::new("-t"),
            OsStr::new(&length_arg),
            OsStr::new("-y"),
            OsStr::new("-loglevel"),
            OsStr::new("error"),
            dest.as_os_str(),
        ],
        "Trim",
    )
    .await;

    match encode {
        Ok(_) => Ok(dest),
        Err(e) => {
            discard_partial(&dest);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converted_path_uses_stem() {
        let out = converted_path(Path::new("/up/clip.final.mkv"), Path::new("/proc"), TargetFormat::Mp3);
        assert_eq!(out, PathBuf::from("/proc/clip.final.mp3"));
    }

    #[test]
    fn test_trimmed_path() {
        let out = trimmed_path(Path::new("/up/clip.mp4"), Path::new("/proc"));
        assert_eq!(out, PathBuf::from("/proc/trimmed_clip.mp4"));
    }

    #[test]
    fn test_target_format_parse() {
        assert_eq!(TargetFormat::parse("MP3"), Some(TargetFormat::Mp3));
        assert_eq!(TargetFormat::parse(".mov"), Some(TargetFormat::Mov));
        assert_eq!(TargetFormat::parse("flac"), None);
        assert!(TargetFormat::Wav.is_audio());
        assert!(!TargetFormat::Avi.is_audio());
    }

    #[test]
    fn test_trim_window_clamps_end() {
        assert_eq!(trim_window(10.0, 500.0, 60.0).unwrap(), (10.0, 50.0));
        assert_eq!(trim_window(0.0, 5.0, 60.0).unwrap(), (0.0, 5.0));
    }

    #[test]
    fn test_trim_window_rejects_bad_ranges() {
        assert!(trim_window(20.0, 10.0, 60.0).is_err());
        assert!(trim_window(-1.0, 10.0, 60.0).is_err());
        assert!(trim_window(60.0, 70.0, 60.0).is_err());
        assert!(trim_window(f64::NAN, 10.0, 60.0).is_err());
    }

    #[tokio::test]
    async fn test_convert_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert(&dir.path().join("nope.mp4"), TargetFormat::Mp3, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, MediabotError::FileNotFound(_)));
    }
}
