//! Media download and metadata lookup through yt-dlp.

use super::process;
use super::quality::{DownloadPlan, MediaKind};
use crate::error::{MediabotError, Result};
use crate::text::{format_count, format_duration, truncate};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Output template; files are named after the media title.
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Playlist entries listed by `fetch_playlist`.
pub const PLAYLIST_PREVIEW: usize = 10;

/// Result of a finished download.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub quality: String,
}

/// Metadata about a single piece of online media.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub url: String,
    pub title: String,
    pub duration_seconds: u64,
    pub uploader: String,
    pub view_count: u64,
    pub like_count: u64,
    pub upload_date: String,
    pub site: String,
    pub description: String,
    /// Available video heights, highest first.
    pub heights: Vec<u32>,
}

impl MediaInfo {
    /// Build from yt-dlp `--dump-json` output, truncating the description.
    pub fn from_json(json: &serde_json::Value, url: &str, max_description_chars: usize) -> Self {
        let text = |key: &str| {
            json[key]
                .as_str()
                .filter(|s| !s.is_empty())
                .unwrap_or("N/A")
                .to_string()
        };

        let mut heights: Vec<u32> = json["formats"]
            .as_array()
            .map(|formats| {
                formats
                    .iter()
                    .filter_map(|f| f["height"].as_u64())
                    .map(|h| h as u32)
                    .collect()
            })
            .unwrap_or_default();
        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();

        Self {
            url: url.to_string(),
            title: text("title"),
            duration_seconds: json["duration"].as_f64().map(|d| d as u64).unwrap_or(0),
            uploader: json["uploader"]
                .as_str()
                .or_else(|| json["channel"].as_str())
                .unwrap_or("N/A")
                .to_string(),
            view_count: json["view_count"].as_u64().unwrap_or(0),
            like_count: json["like_count"].as_u64().unwrap_or(0),
            upload_date: text("upload_date"),
            site: json["extractor_key"]
                .as_str()
                .or_else(|| json["extractor"].as_str())
                .unwrap_or("unknown")
                .to_string(),
            description: truncate(&text("description"), max_description_chars),
            heights,
        }
    }

    /// Multi-line summary for chat.
    pub fn render(&self) -> String {
        let qualities = if self.heights.is_empty() {
            "N/A".to_string()
        } else {
            self.heights
                .iter()
                .map(|h| format!("{}p", h))
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!(
            "🎬 Media info\n\
             📝 Title: {}\n\
             ⏱️ Duration: {}\n\
             👤 Channel: {}\n\
             👁️ Views: {}\n\
             👍 Likes: {}\n\
             📅 Uploaded: {}\n\
             🌐 Site: {}\n\
             🎯 Qualities: {}\n\
             📄 Description: {}\n\
             🔗 Link: {}",
            self.title,
            format_duration(self.duration_seconds),
            self.uploader,
            format_count(self.view_count),
            format_count(self.like_count),
            self.upload_date,
            self.site,
            qualities,
            self.description,
            self.url
        )
    }
}

/// One entry of a playlist preview.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub title: String,
    pub url: String,
    pub duration_seconds: u64,
}

/// Playlist summary with the first few entries.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistInfo {
    pub title: String,
    pub uploader: String,
    pub count: usize,
    pub entries: Vec<PlaylistEntry>,
}

impl PlaylistInfo {
    /// Build from yt-dlp `--flat-playlist -J` output.
    pub fn from_json(json: &serde_json::Value, limit: usize) -> Result<Self> {
        let entries = json["entries"]
            .as_array()
            .ok_or_else(|| MediabotError::InvalidInput("Link is not a playlist".to_string()))?;

        Ok(Self {
            title: json["title"].as_str().unwrap_or("Playlist").to_string(),
            uploader: json["uploader"].as_str().unwrap_or("unknown").to_string(),
            count: entries.len(),
            entries: entries
                .iter()
                .take(limit)
                .map(|e| PlaylistEntry {
                    title: e["title"].as_str().unwrap_or("N/A").to_string(),
                    url: e["url"].as_str().unwrap_or_default().to_string(),
                    duration_seconds: e["duration"].as_f64().map(|d| d as u64).unwrap_or(0),
                })
                .collect(),
        })
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "📃 Playlist: {}\n👤 By: {}\n🔢 Items: {}\n",
            self.title, self.uploader, self.count
        );
        for (i, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!(
                "\n{}. {} ({}) {}",
                i + 1,
                entry.title,
                format_duration(entry.duration_seconds),
                entry.url
            ));
        }
        out
    }
}

/// Reject anything that is not an http(s) URL before handing it to yt-dlp.
pub fn validate_url(input: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(input.trim())
        .map_err(|e| MediabotError::InvalidInput(format!("Not a valid link '{}': {}", input, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(MediabotError::InvalidInput(format!(
            "Unsupported link scheme: {}",
            other
        ))),
    }
}

/// Build the yt-dlp argument list for a download.
///
/// `--print after_move:filepath` reports the final file name; existing files
/// with the same title are overwritten.
pub fn download_args(plan: &DownloadPlan, output_dir: &Path, url: &str, subtitles: bool) -> Vec<String> {
    let template = output_dir.join(OUTPUT_TEMPLATE);
    let mut args = vec![
        "--format".to_string(),
        plan.format.to_string(),
        "--output".to_string(),
        template.to_string_lossy().into_owned(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--force-overwrites".to_string(),
        "--print".to_string(),
        "after_move:filepath".to_string(),
    ];

    if let Some(audio) = &plan.audio {
        args.extend([
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            audio.codec.to_string(),
            "--audio-quality".to_string(),
            format!("{}K", audio.bitrate_kbps),
        ]);
    } else if subtitles {
        args.extend(["--write-subs".to_string(), "--write-auto-subs".to_string()]);
    }

    args.push(url.to_string());
    args
}

/// yt-dlp front end bound to a download directory.
#[derive(Debug, Clone)]
pub struct Downloader {
    output_dir: PathBuf,
    write_subtitles: bool,
    max_description_chars: usize,
}

impl Downloader {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            write_subtitles: false,
            max_description_chars: 200,
        }
    }

    pub fn with_subtitles(mut self, enabled: bool) -> Self {
        self.write_subtitles = enabled;
        self
    }

    pub fn with_max_description_chars(mut self, max: usize) -> Self {
        self.max_description_chars = max;
        self
    }

    /// Download `url` at the requested quality.
    #[instrument(skip(self))]
    pub async fn download(&self, url: &str, quality: &str, kind: MediaKind) -> Result<DownloadResult> {
        validate_url(url)?;
        std::fs::create_dir_all(&self.output_dir)?;

        let plan = DownloadPlan::resolve(quality, kind);
        info!("Downloading {} with format {}", url, plan.format);

        let args = download_args(&plan, &self.output_dir, url, self.write_subtitles);
        let output = process::run("yt-dlp", &args, "Download").await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| MediabotError::external("Download", "yt-dlp did not report an output file"))?;

        Ok(DownloadResult {
            path,
            kind: plan.kind(),
            quality: quality.to_string(),
        })
    }

    /// Fetch metadata for a single item without downloading it.
    #[instrument(skip(self))]
    pub async fn fetch_info(&self, url: &str) -> Result<MediaInfo> {
        validate_url(url)?;
        let output = process::run(
            "yt-dlp",
            ["--dump-json", "--no-download", "--no-warnings", "--no-playlist", url],
            "Info lookup",
        )
        .await?;

        let json_str = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value = serde_json::from_str(&json_str).map_err(|e| {
            MediabotError::external("Info lookup", format!("Failed to parse yt-dlp output: {}", e))
        })?;

        Ok(MediaInfo::from_json(&json, url, self.max_description_chars))
    }

    /// Fetch the title and first entries of a playlist.
    #[instrument(skip(self))]
    pub async fn fetch_playlist(&self, url: &str) -> Result<PlaylistInfo> {
        validate_url(url)?;
        let output = process::run(
            "yt-dlp",
            ["--flat-playlist", "--dump-single-json", "--no-warnings", url],
            "Playlist lookup",
        )
        .await?;

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            MediabotError::external("Playlist lookup", format!("Failed to parse yt-dlp output: {}", e))
        })?;

        PlaylistInfo::from_json(&json, PLAYLIST_PREVIEW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_media_info_from_json() {
        let json = json!({
            "title": "Rust in 100 Seconds",
            "duration": 125.0,
            "uploader": "Fireship",
            "view_count": 1234567,
            "like_count": 4321,
            "upload_date": "20210901",
            "extractor_key": "Youtube",
            "description": "d".repeat(500),
            "formats": [
                {"height": 720}, {"height": 1080}, {"height": null}, {"height": 720}, {"height": 360}
            ]
        });

        let info = MediaInfo::from_json(&json, "https://youtu.be/5C_HPTJg5ek", 200);
        assert_eq!(info.heights, vec![1080, 720, 360]);
        assert_eq!(info.description.chars().count(), 200);

        let text = info.render();
        assert!(text.contains("Duration: 2:05"));
        assert!(text.contains("Views: 1,234,567"));
        assert!(text.contains("1080p, 720p, 360p"));
    }

    #[test]
    fn test_media_info_missing_fields() {
        let info = MediaInfo::from_json(&json!({}), "https://example.com/v", 200);
        assert_eq!(info.title, "N/A");
        assert_eq!(info.duration_seconds, 0);
        assert!(info.heights.is_empty());
    }

    #[test]
    fn test_playlist_preview_is_limited() {
        let entries: Vec<_> = (0..25)
            .map(|i| json!({"title": format!("Episode {}", i), "url": format!("https://x/{}", i), "duration": 60}))
            .collect();
        let json = json!({"title": "Season", "uploader": "Someone", "entries": entries});

        let playlist = PlaylistInfo::from_json(&json, PLAYLIST_PREVIEW).unwrap();
        assert_eq!(playlist.count, 25);
        assert_eq!(playlist.entries.len(), PLAYLIST_PREVIEW);
        assert!(playlist.render().contains("10. Episode 9"));
    }

    #[test]
    fn test_single_video_is_not_a_playlist() {
        assert!(PlaylistInfo::from_json(&json!({"title": "x"}), 10).is_err());
    }

    #[test]
    fn test_download_args_audio() {
        let plan = DownloadPlan::resolve("audio_high", MediaKind::Audio);
        let args = download_args(&plan, Path::new("/tmp/dl"), "https://youtu.be/x", true);
        assert!(args.windows(2).any(|w| w == ["--format", "bestaudio/best"]));
        assert!(args.windows(2).any(|w| w == ["--audio-quality", "320K"]));
        assert!(!args.contains(&"--write-subs".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtu.be/x");
    }

    #[test]
    fn test_download_args_video_template() {
        let plan = DownloadPlan::resolve("low", MediaKind::Video);
        let args = download_args(&plan, Path::new("/tmp/dl"), "https://youtu.be/x", false);
        assert!(args.windows(2).any(|w| w == ["--format", "best[height<=480]"]));
        assert!(args.contains(&"/tmp/dl/%(title)s.%(ext)s".to_string()));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://youtu.be/abc").is_ok());
        assert!(validate_url("ftp://example.com/file").is_err());
        assert!(validate_url("not a url").is_err());
    }
}
