//! Video link flow: detect a link, park it per chat behind a format
//! keyboard, download it once a format is picked.

// lazy_regex! uses once_cell internally
#![allow(clippy::non_std_lazy_statics)]

use super::{DownloadError, DownloadedMedia, Downloader, MediaFormat};
use crate::session::{CallbackToken, Generation, NotFound, SessionResultStore};
use lazy_regex::lazy_regex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Match YouTube links, with or without scheme, starting at a word start
static RE_VIDEO_LINK: lazy_regex::Lazy<regex::Regex> = lazy_regex!(
    r#"(?i)(?:^|[\s(\[<"'])((?:https?://)?(?:[\w-]+\.)*(?:youtube\.com|youtu\.be)/\S+)"#
);

/// Prose punctuation that ends a sentence rather than the link
const TRAILING_PUNCTUATION: &[char] = &[')', ']', '>', '.', ',', ';', ':', '!', '?', '"', '\''];

/// Returns the first YouTube link in `text`
///
/// # Examples
///
/// ```
/// use media_relay_bot::media::extract_video_link;
///
/// assert_eq!(
///     extract_video_link("look: https://youtu.be/dQw4w9WgXcQ !"),
///     Some("https://youtu.be/dQw4w9WgXcQ")
/// );
/// assert_eq!(extract_video_link("daft punk"), None);
/// ```
#[must_use]
pub fn extract_video_link(text: &str) -> Option<&str> {
    RE_VIDEO_LINK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
}

/// A link waiting for the user to pick a format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// Link as sent by the user
    pub url: String,
}

/// Pending links keyed by Telegram chat id
pub type LinkStore = SessionResultStore<i64, LinkRequest>;

/// Errors produced by the link flow.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The button no longer matches the chat's pending link.
    #[error("Invalid selection: {0}")]
    Invalid(NotFound),
    /// The download failed.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Result of a successful download
#[derive(Debug)]
pub enum FetchOutcome {
    /// Small enough to upload
    Upload(DownloadedMedia),
    /// Over the upload limit; only the page link can be shared
    TooLarge(DownloadedMedia),
}

impl FetchOutcome {
    /// The downloaded media, regardless of size
    #[must_use]
    pub const fn media(&self) -> &DownloadedMedia {
        match self {
            Self::Upload(media) | Self::TooLarge(media) => media,
        }
    }
}

/// Connects a [`Downloader`] to a [`LinkStore`]
#[derive(Clone)]
pub struct LinkSession {
    downloader: Arc<dyn Downloader>,
    store: Arc<LinkStore>,
    max_upload_bytes: u64,
}

impl LinkSession {
    /// Creates the link flow
    #[must_use]
    pub fn new(downloader: Arc<dyn Downloader>, store: Arc<LinkStore>, max_upload_bytes: u64) -> Self {
        Self {
            downloader,
            store,
            max_upload_bytes,
        }
    }

    /// Parks `url` for the chat, replacing any earlier pending link
    pub fn offer(&self, chat_id: i64, url: &str) -> Generation {
        let generation = self.store.put(
            chat_id,
            vec![LinkRequest {
                url: url.to_string(),
            }],
        );
        debug!(chat_id, %generation, "Link offered");
        generation
    }

    /// Downloads the pending link the button points at
    ///
    /// The caller owns the returned media and must call
    /// [`DownloadedMedia::cleanup`] once it has been delivered.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Invalid`] for stale or unknown buttons and
    /// [`FetchError::Download`] when the downloader fails.
    pub async fn fetch(
        &self,
        chat_id: i64,
        format: MediaFormat,
        token: CallbackToken,
    ) -> Result<FetchOutcome, FetchError> {
        let request = self
            .store
            .resolve_token(&chat_id, token)
            .map_err(FetchError::Invalid)?;

        info!(chat_id, format = format.as_str(), "Starting download");
        let media = self.downloader.download(&request.url, format).await?;

        if media.size_bytes > self.max_upload_bytes {
            info!(chat_id, size = media.size_bytes, "Download exceeds upload limit");
            Ok(FetchOutcome::TooLarge(media))
        } else {
            Ok(FetchOutcome::Upload(media))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockDownloader;
    use mockall::predicate::{always, eq};
    use std::path::PathBuf;
    use std::time::Duration;

    fn media(size_bytes: u64) -> DownloadedMedia {
        DownloadedMedia {
            path: PathBuf::from("/tmp/downloads/job/abc.webm"),
            title: Some("Song".to_string()),
            webpage_url: "https://www.youtube.com/watch?v=abc".to_string(),
            size_bytes,
            work_dir: PathBuf::from("/tmp/downloads/job"),
        }
    }

    fn session(downloader: MockDownloader) -> LinkSession {
        let store = Arc::new(LinkStore::new(100, Duration::from_secs(60)));
        LinkSession::new(Arc::new(downloader), store, 1000)
    }

    #[test]
    fn test_extract_video_link() {
        assert_eq!(
            extract_video_link("https://www.youtube.com/watch?v=abc&t=1"),
            Some("https://www.youtube.com/watch?v=abc&t=1")
        );
        assert_eq!(
            extract_video_link("see youtube.com/shorts/xyz please"),
            Some("youtube.com/shorts/xyz")
        );
        assert_eq!(
            extract_video_link("https://music.youtube.com/watch?v=q"),
            Some("https://music.youtube.com/watch?v=q")
        );
        assert_eq!(extract_video_link("youtube is great"), None);
        assert_eq!(extract_video_link("https://vimeo.com/1"), None);
    }

    #[test]
    fn test_extract_video_link_from_prose() {
        assert_eq!(extract_video_link("notyoutube.com/x"), None);
        assert_eq!(extract_video_link("https://notyoutube.com/x"), None);
        assert_eq!(
            extract_video_link("watch this (https://youtu.be/abc)."),
            Some("https://youtu.be/abc")
        );
        assert_eq!(
            extract_video_link("first youtu.be/one, then youtu.be/two"),
            Some("youtu.be/one")
        );
        assert_eq!(
            extract_video_link("\"https://www.youtube.com/watch?v=abc\"!"),
            Some("https://www.youtube.com/watch?v=abc")
        );
    }

    #[tokio::test]
    async fn test_fetch_small_file_is_uploaded() {
        let mut downloader = MockDownloader::new();
        downloader
            .expect_download()
            .with(eq("https://youtu.be/abc"), eq(MediaFormat::Audio))
            .times(1)
            .returning(|_, _| Ok(media(10)));
        let session = session(downloader);

        let generation = session.offer(7, "https://youtu.be/abc");
        let outcome = session
            .fetch(7, MediaFormat::Audio, CallbackToken::new(0, Some(generation)))
            .await;
        assert!(matches!(outcome, Ok(FetchOutcome::Upload(_))));
    }

    #[tokio::test]
    async fn test_fetch_large_file_is_not_uploaded() {
        let mut downloader = MockDownloader::new();
        downloader
            .expect_download()
            .with(always(), eq(MediaFormat::Video))
            .returning(|_, _| Ok(media(5000)));
        let session = session(downloader);

        let generation = session.offer(7, "https://youtu.be/abc");
        let outcome = session
            .fetch(7, MediaFormat::Video, CallbackToken::new(0, Some(generation)))
            .await;
        let Ok(FetchOutcome::TooLarge(media)) = outcome else {
            panic!("expected oversized download");
        };
        assert_eq!(media.size_bytes, 5000);
    }

    #[tokio::test]
    async fn test_stale_button_never_downloads() {
        let mut downloader = MockDownloader::new();
        downloader.expect_download().never();
        let session = session(downloader);

        let old = session.offer(7, "https://youtu.be/old");
        session.offer(7, "https://youtu.be/new");

        let outcome = session
            .fetch(7, MediaFormat::Audio, CallbackToken::new(0, Some(old)))
            .await;
        assert!(matches!(
            outcome,
            Err(FetchError::Invalid(NotFound::StaleToken { .. }))
        ));

        let outcome = session
            .fetch(8, MediaFormat::Audio, CallbackToken::new(0, None))
            .await;
        assert!(matches!(
            outcome,
            Err(FetchError::Invalid(NotFound::EmptySession))
        ));
    }

    #[tokio::test]
    async fn test_download_error_propagates() {
        let mut downloader = MockDownloader::new();
        downloader.expect_download().returning(|_, _| {
            Err(DownloadError::Failed {
                code: Some(1),
                stderr: "ERROR: Video unavailable".to_string(),
            })
        });
        let session = session(downloader);

        let generation = session.offer(7, "https://youtu.be/abc");
        let outcome = session
            .fetch(7, MediaFormat::Audio, CallbackToken::new(0, Some(generation)))
            .await;
        assert!(matches!(
            outcome,
            Err(FetchError::Download(DownloadError::Failed { .. }))
        ));
    }
}
