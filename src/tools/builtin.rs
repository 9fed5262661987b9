//! The media tools the agent can call.

use super::outcome::{FailureKind, ToolOutcome};
use super::registry::{ToolHandler, ToolRegistry};
use super::schema::{ParamKind, ParamSpec, ToolSpec};
use crate::config::Settings;
use crate::error::{MediabotError, Result};
use crate::media::{
    archive, images, transcode, ArchiveOperation, Downloader, ImageOperation, ImageOptions,
    MediaKind, TargetFormat,
};
use crate::text::SUCCESS_MARKER;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

pub const DOWNLOAD_MEDIA: &str = "download_media";
pub const MEDIA_INFO: &str = "media_info";
pub const PLAYLIST_INFO: &str = "playlist_info";
pub const CONVERT_FILE: &str = "convert_file";
pub const PROCESS_IMAGE: &str = "process_image";
pub const MANAGE_ARCHIVE: &str = "manage_archive";
pub const TRIM_VIDEO: &str = "trim_video";

const QUALITIES: &[&str] = &["ultra", "high", "medium", "low", "audio_high", "audio_normal"];

#[derive(Debug, Deserialize)]
struct DownloadArgs {
    url: String,
    #[serde(default = "default_quality")]
    quality: String,
    #[serde(default)]
    format_type: MediaKind,
}

fn default_quality() -> String {
    "high".to_string()
}

#[derive(Debug, Deserialize)]
struct UrlArgs {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ConvertArgs {
    file_path: PathBuf,
    target_format: TargetFormat,
}

#[derive(Debug, Deserialize)]
struct ImageArgs {
    image_path: PathBuf,
    operation: String,
    #[serde(flatten)]
    options: ImageOptions,
}

#[derive(Debug, Deserialize)]
struct ArchiveArgs {
    operation: ArchiveOperation,
    files: Vec<PathBuf>,
    output_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TrimArgs {
    video_path: PathBuf,
    start_seconds: f64,
    end_seconds: f64,
}

/// Which built-in tool a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTool {
    DownloadMedia,
    MediaInfo,
    PlaylistInfo,
    ConvertFile,
    ProcessImage,
    ManageArchive,
    TrimVideo,
}

impl BuiltinTool {
    pub const ALL: [BuiltinTool; 7] = [
        BuiltinTool::DownloadMedia,
        BuiltinTool::MediaInfo,
        BuiltinTool::PlaylistInfo,
        BuiltinTool::ConvertFile,
        BuiltinTool::ProcessImage,
        BuiltinTool::ManageArchive,
        BuiltinTool::TrimVideo,
    ];

    pub fn spec(&self) -> ToolSpec {
        match self {
            BuiltinTool::DownloadMedia => ToolSpec::new(
                DOWNLOAD_MEDIA,
                "Download a video or its audio from YouTube, TikTok, Instagram, X and most other sites.",
            )
            .param(ParamSpec::required("url", ParamKind::String, "Link to the media"))
            .param(
                ParamSpec::optional(
                    "quality",
                    ParamKind::String,
                    "One of ultra (4K), high (1080p), medium (720p), low (480p), audio_high, audio_normal",
                )
                .with_default(json!("high")),
            )
            .param(
                ParamSpec::optional("format_type", ParamKind::Enum(&["video", "audio"]), "video or audio only")
                    .with_default(json!("video")),
            ),

            BuiltinTool::MediaInfo => ToolSpec::new(
                MEDIA_INFO,
                "Look up title, duration, channel, views and available qualities of a link without downloading it.",
            )
            .param(ParamSpec::required("url", ParamKind::String, "Link to the media")),

            BuiltinTool::PlaylistInfo => ToolSpec::new(
                PLAYLIST_INFO,
                "List the title, size and first entries of a playlist link.",
            )
            .param(ParamSpec::required("url", ParamKind::String, "Link to the playlist")),

            BuiltinTool::ConvertFile => ToolSpec::new(
                CONVERT_FILE,
                "Convert a local video or audio file to another format.",
            )
            .param(ParamSpec::required("file_path", ParamKind::String, "Path of the file to convert"))
            .param(ParamSpec::required(
                "target_format",
                ParamKind::Enum(&["mp3", "wav", "aac", "mp4", "avi", "mov"]),
                "Format to convert to",
            )),

            BuiltinTool::ProcessImage => ToolSpec::new(
                PROCESS_IMAGE,
                "Resize, compress or convert a local image.",
            )
            .param(ParamSpec::required("image_path", ParamKind::String, "Path of the image"))
            .param(ParamSpec::required(
                "operation",
                ParamKind::Enum(&["resize", "compress", "convert"]),
                "What to do with the image",
            ))
            .param(ParamSpec::optional(
                "width",
                ParamKind::Integer { min: Some(1), max: Some(10_000) },
                "Target width for resize (default 800)",
            ))
            .param(ParamSpec::optional(
                "height",
                ParamKind::Integer { min: Some(1), max: Some(10_000) },
                "Target height for resize (default 600)",
            ))
            .param(ParamSpec::optional(
                "quality",
                ParamKind::Integer { min: Some(1), max: Some(100) },
                "JPEG quality for compress (default 85)",
            ))
            .param(ParamSpec::optional(
                "format",
                ParamKind::Enum(&["jpeg", "jpg", "png", "webp", "bmp", "gif", "tiff"]),
                "Target format for convert (default jpeg)",
            )),

            BuiltinTool::ManageArchive => ToolSpec::new(
                MANAGE_ARCHIVE,
                "Create a zip archive from files, or extract a zip archive (the first entry of files) into a directory.",
            )
            .param(ParamSpec::required("operation", ParamKind::Enum(&["create", "extract"]), "create or extract"))
            .param(ParamSpec::required("files", ParamKind::StringList, "Files to archive, or the archive to extract"))
            .param(ParamSpec::required(
                "output_path",
                ParamKind::String,
                "Archive to write, or directory to extract into",
            )),

            BuiltinTool::TrimVideo => ToolSpec::new(
                TRIM_VIDEO,
                "Cut a local video between two timestamps.",
            )
            .param(ParamSpec::required("video_path", ParamKind::String, "Path of the video"))
            .param(ParamSpec::required("start_seconds", ParamKind::Number { min: Some(0.0) }, "Start time in seconds"))
            .param(ParamSpec::required("end_seconds", ParamKind::Number { min: Some(0.0) }, "End time in seconds")),
        }
    }
}

/// Shared state for the built-in tools.
pub struct MediaToolbox {
    downloader: Downloader,
    processed_dir: PathBuf,
}

impl MediaToolbox {
    pub fn new(downloader: Downloader, processed_dir: PathBuf) -> Self {
        Self {
            downloader,
            processed_dir,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let downloader = Downloader::new(settings.downloads_dir())
            .with_subtitles(settings.media.write_subtitles)
            .with_max_description_chars(settings.media.max_description_chars);
        Self::new(downloader, settings.processed_dir())
    }

    /// Run `tool` with already validated `args`.
    pub async fn run(&self, tool: BuiltinTool, args: Value) -> ToolOutcome {
        match tool {
            BuiltinTool::DownloadMedia => self.download(args).await,
            BuiltinTool::MediaInfo => self.media_info(args).await,
            BuiltinTool::PlaylistInfo => self.playlist_info(args).await,
            BuiltinTool::ConvertFile => self.convert(args).await,
            BuiltinTool::ProcessImage => self.process_image(args).await,
            BuiltinTool::ManageArchive => self.manage_archive(args).await,
            BuiltinTool::TrimVideo => self.trim(args).await,
        }
    }

    async fn download(&self, args: Value) -> ToolOutcome {
        let args: DownloadArgs = match parse(args) {
            Ok(a) => a,
            Err(e) => return ToolOutcome::from_error("Download", &e),
        };
        match self
            .downloader
            .download(&args.url, &args.quality, args.format_type)
            .await
        {
            Ok(result) => ToolOutcome::success(format!(
                "{} Downloaded {} at {} quality: {}",
                SUCCESS_MARKER,
                result.kind,
                result.quality,
                result.path.display()
            )),
            Err(e) => ToolOutcome::from_error("Download", &e),
        }
    }

    async fn media_info(&self, args: Value) -> ToolOutcome {
        let args: UrlArgs = match parse(args) {
            Ok(a) => a,
            Err(e) => return ToolOutcome::from_error("Info lookup", &e),
        };
        match self.downloader.fetch_info(&args.url).await {
            Ok(info) => ToolOutcome::success(info.render()),
            Err(e) => ToolOutcome::from_error("Info lookup", &e),
        }
    }

    async fn playlist_info(&self, args: Value) -> ToolOutcome {
        let args: UrlArgs = match parse(args) {
            Ok(a) => a,
            Err(e) => return ToolOutcome::from_error("Playlist lookup", &e),
        };
        match self.downloader.fetch_playlist(&args.url).await {
            Ok(playlist) => ToolOutcome::success(playlist.render()),
            Err(e) => ToolOutcome::from_error("Playlist lookup", &e),
        }
    }

    async fn convert(&self, args: Value) -> ToolOutcome {
        let args: ConvertArgs = match parse(args) {
            Ok(a) => a,
            Err(e) => return ToolOutcome::from_error("Conversion", &e),
        };
        match transcode::convert(&args.file_path, args.target_format, &self.processed_dir).await {
            Ok(path) => ToolOutcome::success(format!(
                "{} Converted to {}: {}",
                SUCCESS_MARKER,
                args.target_format,
                path.display()
            )),
            Err(e) => ToolOutcome::from_error("Conversion", &e),
        }
    }

    async fn process_image(&self, args: Value) -> ToolOutcome {
        let args: ImageArgs = match parse(args) {
            Ok(a) => a,
            Err(e) => return ToolOutcome::from_error("Image processing", &e),
        };
        let operation = match ImageOperation::from_options(&args.operation, &args.options) {
            Ok(op) => op,
            Err(e) => return ToolOutcome::from_error("Image processing", &e),
        };
        match images::process(&args.image_path, operation, &self.processed_dir).await {
            Ok(path) => {
                let verb = match operation {
                    ImageOperation::Resize { .. } => "resized",
                    ImageOperation::Compress { .. } => "compressed",
                    ImageOperation::Convert { .. } => "converted",
                };
                ToolOutcome::success(format!("{} Image {}: {}", SUCCESS_MARKER, verb, path.display()))
            }
            Err(e) => ToolOutcome::from_error("Image processing", &e),
        }
    }

    async fn manage_archive(&self, args: Value) -> ToolOutcome {
        let args: ArchiveArgs = match parse(args) {
            Ok(a) => a,
            Err(e) => return ToolOutcome::from_error("Archive", &e),
        };
        match args.operation {
            ArchiveOperation::Create => match archive::create(args.files, args.output_path).await {
                Ok(summary) => {
                    let mut text = format!(
                        "{} Created archive {} with {} file(s)",
                        SUCCESS_MARKER,
                        summary.path.display(),
                        summary.added.len()
                    );
                    if !summary.skipped.is_empty() {
                        text.push_str(&format!(" ({} missing or duplicate file(s) skipped)", summary.skipped.len()));
                    }
                    ToolOutcome::success(text)
                }
                Err(e) => ToolOutcome::from_error("Archive", &e),
            },
            ArchiveOperation::Extract => {
                let Some(source) = args.files.into_iter().next() else {
                    return ToolOutcome::failure(
                        FailureKind::InvalidArguments,
                        "Archive error: no archive given to extract",
                    );
                };
                let output = args.output_path;
                match archive::extract(source, output.clone()).await {
                    Ok(count) => ToolOutcome::success(format!(
                        "{} Extracted {} entries into {}",
                        SUCCESS_MARKER,
                        count,
                        output.display()
                    )),
                    Err(e) => ToolOutcome::from_error("Archive", &e),
                }
            }
        }
    }

    async fn trim(&self, args: Value) -> ToolOutcome {
        let args: TrimArgs = match parse(args) {
            Ok(a) => a,
            Err(e) => return ToolOutcome::from_error("Trim", &e),
        };
        match transcode::trim(&args.video_path, args.start_seconds, args.end_seconds, &self.processed_dir).await {
            Ok(path) => ToolOutcome::success(format!("{} Trimmed video: {}", SUCCESS_MARKER, path.display())),
            Err(e) => ToolOutcome::from_error("Trim", &e),
        }
    }
}

fn parse<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| MediabotError::InvalidInput(e.to_string()))
}

/// Handler running one built-in tool against a shared toolbox.
struct BuiltinHandler {
    tool: BuiltinTool,
    toolbox: Arc<MediaToolbox>,
}

#[async_trait]
impl ToolHandler for BuiltinHandler {
    async fn call(&self, args: Value) -> ToolOutcome {
        self.toolbox.run(self.tool, args).await
    }
}

/// Register every built-in tool.
pub fn register_builtin(registry: &mut ToolRegistry, toolbox: Arc<MediaToolbox>) -> Result<()> {
    for tool in BuiltinTool::ALL {
        registry.register(
            tool.spec(),
            Arc::new(BuiltinHandler {
                tool,
                toolbox: toolbox.clone(),
            }),
        )?;
    }
    Ok(())
}

/// Registry holding all built-in tools, configured from settings.
pub fn default_registry(settings: &Settings) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_builtin(&mut registry, Arc::new(MediaToolbox::from_settings(settings)))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn test_registry(dir: &Path) -> ToolRegistry {
        let toolbox = MediaToolbox::new(Downloader::new(dir.join("dl")), dir.join("processed"));
        let mut registry = ToolRegistry::new();
        register_builtin(&mut registry, Arc::new(toolbox)).unwrap();
        registry
    }

    #[test]
    fn test_all_tools_registered_once() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry(dir.path());
        assert_eq!(registry.len(), BuiltinTool::ALL.len());
        for name in [
            DOWNLOAD_MEDIA,
            MEDIA_INFO,
            PLAYLIST_INFO,
            CONVERT_FILE,
            PROCESS_IMAGE,
            MANAGE_ARCHIVE,
            TRIM_VIDEO,
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_specs_serialize_for_function_calling() {
        for tool in BuiltinTool::ALL {
            let def = tool.spec().to_function();
            let params = def.function.parameters.unwrap();
            assert_eq!(params["type"], "object");
            assert!(params["properties"].is_object());
            serde_json::to_string(&params).unwrap();
        }
    }

    #[test]
    fn test_download_quality_is_free_text() {
        // Unknown qualities must reach the adapter, which falls back to "best".
        let spec = BuiltinTool::DownloadMedia.spec();
        let args = spec
            .validate(&json!({"url": "https://youtu.be/x", "quality": "8k-hdr"}))
            .unwrap();
        assert_eq!(args["quality"], "8k-hdr");
        assert_eq!(args["format_type"], "video");
        assert!(QUALITIES.contains(&"audio_normal"));
    }

    #[tokio::test]
    async fn test_archive_tool_partial_archive() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry(dir.path());
        let existing = dir.path().join("keep.txt");
        std::fs::write(&existing, "data").unwrap();
        let output = dir.path().join("bundle.zip");

        let outcome = registry
            .dispatch(
                MANAGE_ARCHIVE,
                &json!({
                    "operation": "create",
                    "files": [dir.path().join("gone.txt"), existing],
                    "output_path": output,
                }),
            )
            .await
            .unwrap();

        let text = outcome.render(300);
        assert!(outcome.is_success(), "{}", text);
        assert!(text.contains("1 file(s)"));
        assert!(text.contains("1 missing or duplicate file(s) skipped"));
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_extract_without_files_is_a_failure_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry(dir.path());
        let outcome = registry
            .dispatch(
                MANAGE_ARCHIVE,
                &json!({"operation": "extract", "files": [], "output_path": "out"}),
            )
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ToolOutcome::Failure { kind: FailureKind::InvalidArguments, .. }
        ));
    }

    #[tokio::test]
    async fn test_convert_missing_file_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry(dir.path());
        let outcome = registry
            .dispatch(
                CONVERT_FILE,
                &json!({"file_path": dir.path().join("nope.mp4"), "target_format": "MP3"}),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, ToolOutcome::Failure { kind: FailureKind::NotFound, .. }));
        assert!(outcome.render(300).starts_with("❌ Conversion error"));
    }

    #[tokio::test]
    async fn test_image_tool_rejects_out_of_range_quality() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry(dir.path());
        let err = registry
            .dispatch(
                PROCESS_IMAGE,
                &json!({"image_path": "x.png", "operation": "compress", "quality": 0}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MediabotError::SchemaValidation { ref field, .. } if field == "quality"));
    }
}
