//! Media operation adapters.
//!
//! Thin wrappers over the programs and libraries that do the real work:
//! yt-dlp for downloads and metadata, ffmpeg/ffprobe for conversion and
//! trimming, the `image` crate for picture edits and the `zip` crate for
//! archives. Each adapter returns a typed result; the tool layer turns those
//! into chat text.

pub mod archive;
pub mod downloader;
pub mod images;
pub mod process;
pub mod quality;
pub mod transcode;

pub use archive::{ArchiveOperation, ArchiveSummary};
pub use downloader::{DownloadResult, Downloader, MediaInfo, PlaylistInfo};
pub use images::{ImageOperation, ImageOptions, ImageTarget};
pub use quality::{format_selector_for, DownloadPlan, MediaKind, Quality};
pub use transcode::TargetFormat;
