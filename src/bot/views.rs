//! Bot UI components
//!
//! Contains keyboards, text messages, and formatters for the search and
//! link flows.

use crate::media::{human_size, DownloadedMedia, MediaFormat};
use crate::search::ResultItem;
use crate::session::{CallbackAction, Generation};
use crate::utils::{ellipsize, escape_attr, escape_html};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// ─────────────────────────────────────────────────────────────────────────────
// Texts
// ─────────────────────────────────────────────────────────────────────────────

/// Greeting for `/start`
pub const WELCOME: &str = "👋 Send me a song name to search, or a YouTube link \
    to get it as MP3 (audio) or video.\n\
    Note: files over 49MB can't be uploaded by bots.";
/// Reply for `/help`
pub const HELP: &str = "🔎 Text: search tracks, then tap a result.\n\
    🎬 YouTube link (youtube.com or youtu.be): choose a format and wait.";
/// Shown above the format keyboard
pub const CHOOSE_FORMAT: &str = "Choose format:";
/// Search produced nothing
pub const NOTHING_FOUND: &str = "😕 Nothing found. Try another query.";
/// Button pointed at results that are gone
pub const INVALID_SELECTION: &str = "⚠️ This selection is no longer valid. Please search again.";
/// Callback data we cannot decode
pub const INVALID_ACTION: &str = "Invalid action.";
/// Shown while yt-dlp runs
pub const DOWNLOADING: &str = "⏳ Downloading... (this can take some seconds)";
/// Shown after a successful upload
pub const DELIVERED: &str = "✅ Here you go!";
/// Message kinds the bot does not handle
pub const UNSUPPORTED: &str = "Send a song name or a YouTube link.";

/// Longest button label, in graphemes
const BUTTON_LABEL_LIMIT: usize = 48;

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// One button per search result, in result order
#[must_use]
pub fn results_keyboard(items: &[ResultItem], generation: Generation) -> InlineKeyboardMarkup {
    let rows = items.iter().enumerate().map(|(index, item)| {
        vec![InlineKeyboardButton::callback(
            result_label(index, item),
            CallbackAction::pick(index, generation).encode(),
        )]
    });
    InlineKeyboardMarkup::new(rows)
}

/// Audio / video choice for a pending link
#[must_use]
pub fn format_keyboard(generation: Generation) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            "🎵 MP3 (audio)",
            CallbackAction::fetch(MediaFormat::Audio, generation).encode(),
        ),
        InlineKeyboardButton::callback(
            "🎬 Video",
            CallbackAction::fetch(MediaFormat::Video, generation).encode(),
        ),
    ]])
}

// ─────────────────────────────────────────────────────────────────────────────
// Formatters
// ─────────────────────────────────────────────────────────────────────────────

/// Button label: `1. Title — Artist`
#[must_use]
pub fn result_label(index: usize, item: &ResultItem) -> String {
    ellipsize(
        &format!("{}. {} — {}", index + 1, item.title, item.artist),
        BUTTON_LABEL_LIMIT,
    )
}

/// Header above the results keyboard
#[must_use]
pub fn results_header(query: &str, count: usize) -> String {
    format!("🔎 {count} result(s) for <b>{}</b>:", escape_html(query))
}

/// HTML caption for a picked track
#[must_use]
pub fn track_caption(item: &ResultItem) -> String {
    format!(
        "<b>{}</b> — {}\n<a href=\"{}\">Open track</a>",
        escape_html(&item.title),
        escape_html(&item.artist),
        escape_attr(&item.link)
    )
}

/// Reply when a download is over the upload limit
#[must_use]
pub fn too_large(media: &DownloadedMedia) -> String {
    format!(
        "❌ File too large to send via Telegram ({}). Open original page: {}",
        human_size(media.size_bytes),
        media.webpage_url
    )
}

/// Reply for any failure while handling a request
#[must_use]
pub fn error_message(error: &impl std::fmt::Display) -> String {
    format!("❌ Error: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use teloxide::types::InlineKeyboardButtonKind;

    fn item(title: &str, artist: &str) -> ResultItem {
        ResultItem {
            title: title.to_string(),
            artist: artist.to_string(),
            preview_url: None,
            link: "https://www.deezer.com/track/1?a=1&b=2".to_string(),
        }
    }

    fn callback_data(button: &InlineKeyboardButton) -> Option<&str> {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_results_keyboard_buttons_point_at_indices() {
        let items = vec![item("A", "X"), item("B", "Y")];
        let keyboard = results_keyboard(&items, Generation(5));

        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "1. A — X");
        assert_eq!(callback_data(&keyboard.inline_keyboard[0][0]), Some("pick:0:5"));
        assert_eq!(callback_data(&keyboard.inline_keyboard[1][0]), Some("pick:1:5"));
    }

    #[test]
    fn test_format_keyboard() {
        let keyboard = format_keyboard(Generation(3));
        let row = &keyboard.inline_keyboard[0];
        assert_eq!(callback_data(&row[0]), Some("dl:audio:3"));
        assert_eq!(callback_data(&row[1]), Some("dl:video:3"));
    }

    #[test]
    fn test_long_labels_are_shortened() {
        let long = item(&"x".repeat(200), "Artist");
        let label = result_label(0, &long);
        assert_eq!(label.chars().count(), BUTTON_LABEL_LIMIT);
        assert!(label.ends_with('…'));
    }

    #[test]
    fn test_caption_escapes_html() {
        let caption = track_caption(&item("<Live>", "AC&DC"));
        assert!(caption.contains("<b>&lt;Live&gt;</b> — AC&amp;DC"));
        assert!(caption.contains("href=\"https://www.deezer.com/track/1?a=1&amp;b=2\""));
    }

    #[test]
    fn test_too_large_message() {
        let media = DownloadedMedia {
            path: PathBuf::from("/tmp/x.mp4"),
            title: None,
            webpage_url: "https://www.youtube.com/watch?v=abc".to_string(),
            size_bytes: 60 * 1024 * 1024,
            work_dir: PathBuf::from("/tmp"),
        };
        assert_eq!(
            too_large(&media),
            "❌ File too large to send via Telegram (60.0MB). Open original page: https://www.youtube.com/watch?v=abc"
        );
    }
}
