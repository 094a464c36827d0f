use crate::bot::resilient::{edit_message_safe_resilient, send_message_resilient};
use crate::bot::views;
use crate::media::links::FetchError;
use crate::media::{extract_video_link, DownloadedMedia, FetchOutcome, LinkSession, MediaFormat};
use crate::search::{ResultItem, SearchError, SearchOutcome, SearchSession, Selection};
use crate::session::{CallbackAction, CallbackToken};
use anyhow::{anyhow, Result};
use teloxide::{
    prelude::*,
    types::{InputFile, MessageId, ParseMode},
    utils::command::BotCommands,
};
use tracing::{error, info, warn};

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Start the bot and show welcome message
    #[command(description = "Start the bot.")]
    Start,
    /// Show usage
    #[command(description = "Show usage.")]
    Help,
}

/// Handle the `/start` command.
///
/// # Errors
///
/// Returns an error if sending the message fails.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, views::WELCOME).await?;
    Ok(())
}

/// Handle the `/help` command.
///
/// # Errors
///
/// Returns an error if sending the message fails.
pub async fn help(bot: Bot, msg: Message) -> Result<()> {
    let text = format!("{}\n\n{}", views::HELP, Command::descriptions());
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle a text message: offer formats for a video link, search otherwise.
///
/// # Errors
///
/// Returns an error if Telegram API calls fail.
pub async fn handle_text(
    bot: Bot,
    msg: Message,
    search: SearchSession,
    links: LinkSession,
) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    if let Some(url) = extract_video_link(text) {
        let generation = links.offer(chat_id.0, url);
        bot.send_message(chat_id, views::CHOOSE_FORMAT)
            .reply_markup(views::format_keyboard(generation))
            .await?;
        return Ok(());
    }

    match search.search(chat_id.0, text).await {
        Ok(SearchOutcome::Results { generation, items }) => {
            bot.send_message(chat_id, views::results_header(text.trim(), items.len()))
                .parse_mode(ParseMode::Html)
                .reply_markup(views::results_keyboard(&items, generation))
                .await?;
        }
        Ok(SearchOutcome::NoResults) => {
            bot.send_message(chat_id, views::NOTHING_FOUND).await?;
        }
        Err(SearchError::EmptyQuery) => {
            bot.send_message(chat_id, views::UNSUPPORTED).await?;
        }
        Err(e) => {
            warn!(chat_id = chat_id.0, error = %e, "Search failed");
            bot.send_message(chat_id, views::error_message(&e)).await?;
        }
    }
    Ok(())
}

/// Handle messages without text.
///
/// # Errors
///
/// Returns an error if sending the message fails.
pub async fn handle_unsupported(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, views::UNSUPPORTED).await?;
    Ok(())
}

/// Handle inline keyboard callbacks.
///
/// # Errors
///
/// Returns an error if Telegram API calls fail.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    search: SearchSession,
    links: LinkSession,
) -> Result<()> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    let _ = bot.answer_callback_query(q.id.clone()).await;

    let message = q
        .message
        .as_ref()
        .ok_or_else(|| anyhow!("Callback message missing chat id"))?;
    let chat_id = message.chat().id;
    let message_id = message.id();

    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            warn!(chat_id = chat_id.0, error = %e, "Unrecognised callback data");
            edit_message_safe_resilient(&bot, chat_id, message_id, views::INVALID_ACTION).await;
            return Ok(());
        }
    };

    match action {
        CallbackAction::Pick(token) => handle_pick(&bot, chat_id, &search, token).await,
        CallbackAction::Fetch { format, token } => {
            edit_message_safe_resilient(&bot, chat_id, message_id, views::DOWNLOADING).await;
            // Downloads take a while; keep the chat responsive
            tokio::spawn(run_fetch(bot, chat_id, message_id, links, format, token));
            Ok(())
        }
    }
}

async fn handle_pick(
    bot: &Bot,
    chat_id: ChatId,
    search: &SearchSession,
    token: CallbackToken,
) -> Result<()> {
    match search.select(chat_id.0, token) {
        Selection::Item(item) => send_track(bot, chat_id, &item).await,
        Selection::Invalid(reason) => {
            info!(chat_id = chat_id.0, %reason, "Rejected selection");
            bot.send_message(chat_id, views::INVALID_SELECTION).await?;
            Ok(())
        }
    }
}

async fn send_track(bot: &Bot, chat_id: ChatId, item: &ResultItem) -> Result<()> {
    let caption = views::track_caption(item);

    let preview = item
        .preview_url
        .as_deref()
        .and_then(|url| reqwest::Url::parse(url).ok());
    if let Some(preview) = preview {
        let sent = bot
            .send_audio(chat_id, InputFile::url(preview))
            .caption(caption.clone())
            .parse_mode(ParseMode::Html)
            .title(item.title.clone())
            .performer(item.artist.clone())
            .await;
        match sent {
            Ok(_) => return Ok(()),
            Err(e) => warn!(chat_id = chat_id.0, error = %e, "Preview upload failed, sending link only"),
        }
    }

    bot.send_message(chat_id, caption)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

async fn run_fetch(
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    links: LinkSession,
    format: MediaFormat,
    token: CallbackToken,
) {
    let status = match links.fetch(chat_id.0, format, token).await {
        Ok(FetchOutcome::Upload(media)) => {
            let status = match deliver(&bot, chat_id, &media, format).await {
                Ok(()) => views::DELIVERED.to_string(),
                Err(e) => {
                    error!(chat_id = chat_id.0, error = %e, "Failed to upload download");
                    views::error_message(&e)
                }
            };
            media.cleanup().await;
            status
        }
        Ok(FetchOutcome::TooLarge(media)) => {
            media.cleanup().await;
            views::too_large(&media)
        }
        Err(FetchError::Invalid(reason)) => {
            info!(chat_id = chat_id.0, %reason, "Rejected download selection");
            views::INVALID_SELECTION.to_string()
        }
        Err(FetchError::Download(e)) => views::error_message(&e),
    };

    if !edit_message_safe_resilient(&bot, chat_id, message_id, &status).await {
        if let Err(e) = send_message_resilient(&bot, chat_id, status, None).await {
            error!(chat_id = chat_id.0, error = %e, "Failed to report download status");
        }
    }
}

async fn deliver(
    bot: &Bot,
    chat_id: ChatId,
    media: &DownloadedMedia,
    format: MediaFormat,
) -> Result<()> {
    let file = InputFile::file(media.path.clone());
    let caption = media.title.clone().unwrap_or_default();

    match format {
        MediaFormat::Audio => {
            let mut req = bot.send_audio(chat_id, file).caption(caption);
            if let Some(title) = &media.title {
                req = req.title(title.clone());
            }
            req.await?;
        }
        MediaFormat::Video => {
            bot.send_video(chat_id, file).caption(caption).await?;
        }
    }
    Ok(())
}
