//! yt-dlp downloader
//!
//! Runs the yt-dlp executable on the host. Every download gets its own
//! scratch directory under the configured download dir so concurrent
//! requests never collide and cleanup is a single `remove_dir_all`.

use super::{DownloadError, DownloadedMedia, Downloader, MediaFormat};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

/// Bytes of stderr kept for error messages
const STDERR_TAIL: usize = 1_000;

/// Downloader backed by the yt-dlp CLI
pub struct YtDlpDownloader {
    binary: String,
    download_dir: PathBuf,
    timeout: Duration,
}

impl YtDlpDownloader {
    /// Creates a downloader writing below `download_dir`
    #[must_use]
    pub fn new(binary: impl Into<String>, download_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            download_dir: download_dir.into(),
            timeout,
        }
    }

    fn command(&self, url: &str, format: MediaFormat, work_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--format")
            .arg(format.selector())
            .arg("--output")
            .arg(work_dir.join("%(id)s.%(ext)s"))
            .args(["--no-playlist", "--quiet", "--no-warnings", "--no-simulate"])
            .args(["--print", "after_move:filepath"])
            .args(["--print", "after_move:title"])
            .args(["--print", "after_move:webpage_url"])
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    async fn run(
        &self,
        url: &str,
        format: MediaFormat,
        work_dir: &Path,
    ) -> Result<DownloadedMedia, DownloadError> {
        let output = tokio::time::timeout(self.timeout, self.command(url, format, work_dir).output())
            .await
            .map_err(|_| DownloadError::Timeout(self.timeout.as_secs()))?
            .map_err(DownloadError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::Failed {
                code: output.status.code(),
                stderr: stderr_tail(&stderr),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let printed = parse_printed_fields(&stdout)?;
        let size_bytes = tokio::fs::metadata(&printed.path).await?.len();

        Ok(DownloadedMedia {
            path: printed.path,
            title: printed.title,
            webpage_url: printed.webpage_url.unwrap_or_else(|| url.to_string()),
            size_bytes,
            work_dir: work_dir.to_path_buf(),
        })
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn download(
        &self,
        url: &str,
        format: MediaFormat,
    ) -> Result<DownloadedMedia, DownloadError> {
        let work_dir = self.download_dir.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&work_dir).await?;
        debug!(dir = %work_dir.display(), format = format.as_str(), "Running yt-dlp");

        let result = self.run(url, format, &work_dir).await;
        if let Err(e) = &result {
            warn!(error = %e, "yt-dlp download failed");
            if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
                warn!(error = %e, "Failed to remove download dir");
            }
        }
        result
    }
}

#[derive(Debug, PartialEq, Eq)]
struct PrintedFields {
    path: PathBuf,
    title: Option<String>,
    webpage_url: Option<String>,
}

/// Reads the `filepath`, `title`, `webpage_url` lines printed after the move
/// stage. yt-dlp prints `NA` for missing fields.
fn parse_printed_fields(stdout: &str) -> Result<PrintedFields, DownloadError> {
    let mut lines = stdout.lines().map(str::trim).filter(|line| !line.is_empty());
    let present = |value: Option<&str>| value.filter(|v| *v != "NA").map(str::to_string);

    let path = present(lines.next())
        .ok_or_else(|| DownloadError::Output(format!("no file path in {stdout:?}")))?;
    let title = present(lines.next());
    let webpage_url = present(lines.next());

    Ok(PrintedFields {
        path: PathBuf::from(path),
        title,
        webpage_url,
    })
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let start = trimmed.len().saturating_sub(STDERR_TAIL);
    // Step forward to a char boundary
    let start = (start..=trimmed.len())
        .find(|&i| trimmed.is_char_boundary(i))
        .unwrap_or(trimmed.len());
    trimmed[start..].to_string()
}
