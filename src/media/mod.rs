//! Media download: formats, the downloader seam and helpers shared by
//! the link flow.

pub mod imghdr;
pub mod links;
pub mod ytdlp;

pub use imghdr::{sniff_image, ImageFormat};
pub use links::{extract_video_link, FetchOutcome, LinkRequest, LinkSession, LinkStore};
pub use ytdlp::YtDlpDownloader;

use async_trait::async_trait;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Requested download format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFormat {
    /// Best audio stream, original container
    Audio,
    /// Best video with best audio
    Video,
}

impl MediaFormat {
    /// Name used in callback data
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// yt-dlp `--format` selector; neither variant re-encodes
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::Audio => "bestaudio/best",
            Self::Video => "bestvideo+bestaudio/best",
        }
    }
}

impl FromStr for MediaFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            _ => Err(()),
        }
    }
}

/// Errors produced while downloading media.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The downloader process could not be started.
    #[error("Failed to start downloader: {0}")]
    Spawn(std::io::Error),
    /// Filesystem error around the download directory.
    #[error("Download IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The downloader exited with a failure.
    #[error("Downloader failed ({code:?}): {stderr}")]
    Failed {
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Tail of the downloader's stderr.
        stderr: String,
    },
    /// The download exceeded the configured timeout.
    #[error("Download timed out after {0}s")]
    Timeout(u64),
    /// The downloader's output could not be understood.
    #[error("Unexpected downloader output: {0}")]
    Output(String),
}

/// A file produced by a [`Downloader`]
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    /// Downloaded file
    pub path: PathBuf,
    /// Title reported by the source
    pub title: Option<String>,
    /// Page the media was downloaded from
    pub webpage_url: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Scratch directory owned by this download
    pub work_dir: PathBuf,
}

impl DownloadedMedia {
    /// Removes the download's scratch directory
    pub async fn cleanup(&self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.work_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %self.work_dir.display(), error = %e, "Failed to clean up download");
            }
        }
    }
}

/// Fetches media for a URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads `url` in `format`
    async fn download(&self, url: &str, format: MediaFormat)
        -> Result<DownloadedMedia, DownloadError>;
}

/// Formats a byte count the way file managers do (`1.5MB`)
#[must_use]
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1}{unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1}TB")
}
