//! Download quality selectors and their yt-dlp format expressions.

use serde::{Deserialize, Serialize};

/// Quality choices offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Ultra,
    High,
    Medium,
    Low,
    AudioHigh,
    AudioNormal,
}

/// Selector used when the requested quality is not recognised.
pub const FALLBACK_FORMAT: &str = "best";

impl Quality {
    pub const ALL: [Quality; 6] = [
        Quality::Ultra,
        Quality::High,
        Quality::Medium,
        Quality::Low,
        Quality::AudioHigh,
        Quality::AudioNormal,
    ];

    /// Parse a selector name. Unknown names return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ultra" => Some(Quality::Ultra),
            "high" => Some(Quality::High),
            "medium" => Some(Quality::Medium),
            "low" => Some(Quality::Low),
            "audio_high" => Some(Quality::AudioHigh),
            "audio_normal" => Some(Quality::AudioNormal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Ultra => "ultra",
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Low => "low",
            Quality::AudioHigh => "audio_high",
            Quality::AudioNormal => "audio_normal",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Quality::AudioHigh | Quality::AudioNormal)
    }

    /// yt-dlp `--format` expression for this quality.
    pub fn format_selector(&self) -> &'static str {
        match self {
            Quality::Ultra => "best[height<=2160]",
            Quality::High => "best[height<=1080]",
            Quality::Medium => "best[height<=720]",
            Quality::Low => "best[height<=480]",
            Quality::AudioHigh | Quality::AudioNormal => "bestaudio/best",
        }
    }

    /// Human label shown on buttons and progress messages.
    pub fn label(&self) -> &'static str {
        match self {
            Quality::Ultra => "4K Ultra",
            Quality::High => "HD 1080p",
            Quality::Medium => "HD 720p",
            Quality::Low => "SD 480p",
            Quality::AudioHigh => "high quality audio",
            Quality::AudioNormal => "normal audio",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map any selector string to a yt-dlp format expression, falling back to `best`.
pub fn format_selector_for(quality: &str) -> &'static str {
    Quality::parse(quality)
        .map(|q| q.format_selector())
        .unwrap_or(FALLBACK_FORMAT)
}

/// Whether the caller wants the video or only its audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Video,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// Audio extraction step appended to a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    pub codec: &'static str,
    pub bitrate_kbps: u32,
}

/// Everything yt-dlp needs to know about one download, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub format: &'static str,
    pub audio: Option<AudioExtraction>,
}

impl DownloadPlan {
    /// Resolve a requested quality string and media kind.
    ///
    /// An `audio_*` quality implies audio regardless of `kind`. Audio requests
    /// at ultra/high or audio_high extract at 320 kbps, all others at 192.
    pub fn resolve(quality: &str, kind: MediaKind) -> Self {
        let parsed = Quality::parse(quality);
        let wants_audio = kind == MediaKind::Audio || parsed.is_some_and(|q| q.is_audio());

        if wants_audio {
            let bitrate_kbps = match parsed {
                Some(Quality::AudioHigh | Quality::Ultra | Quality::High) => 320,
                _ => 192,
            };
            return Self {
                format: Quality::AudioHigh.format_selector(),
                audio: Some(AudioExtraction {
                    codec: "mp3",
                    bitrate_kbps,
                }),
            };
        }

        Self {
            format: format_selector_for(quality),
            audio: None,
        }
    }

    pub fn kind(&self) -> MediaKind {
        if self.audio.is_some() {
            MediaKind::Audio
        } else {
            MediaKind::Video
        }
    }
}
