use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, Document, InputFile};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::interaction::{Event, InteractionRouter, Reply};
use crate::session::SessionKey;

const IMAGES_NOT_SUPPORTED: &str = "❌ OCR text extraction from images is not supported. Please upload PDF, DOCX, or TXT files.";

/// Maps one Telegram message onto a router event and sends the replies back.
pub(super) async fn handle_message(
    bot: Bot,
    msg: Message,
    router: InteractionRouter,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let key = SessionKey::telegram(chat_id.0);

    let event = if let Some(document) = msg.document() {
        match download_document(&bot, document, router.chat_upload_limit()).await {
            Ok(event) => event,
            Err(err) => {
                bot.send_message(chat_id, err.user_message()).await?;
                return Ok(());
            }
        }
    } else if let Some(text) = msg.text() {
        Event::from_text(text)
    } else if msg.photo().is_some() {
        bot.send_message(chat_id, IMAGES_NOT_SUPPORTED).await?;
        return Ok(());
    } else {
        debug!("Ignoring non-text message in chat {chat_id}");
        return Ok(());
    };

    if matches!(
        event,
        Event::Upload { .. } | Event::Text(_) | Event::Interview(Some(_))
    ) {
        if let Err(e) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
            debug!("Typing indicator failed for chat {chat_id}: {e}");
        }
    }

    for reply in router.handle(&key, event).await {
        send_reply(&bot, chat_id, reply).await?;
    }
    Ok(())
}

/// The size ceiling is enforced from the message metadata, before any bytes
/// are fetched.
async fn download_document(
    bot: &Bot,
    document: &Document,
    limit_bytes: usize,
) -> Result<Event, AppError> {
    if document.file.size as usize > limit_bytes {
        return Err(AppError::PayloadTooLarge { limit_bytes });
    }
    let file_name = document
        .file_name
        .clone()
        .unwrap_or_else(|| "document".to_string());

    let file = bot
        .get_file(document.file.id.clone())
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("getFile failed: {e}")))?;
    let mut bytes = Vec::with_capacity(file.size as usize);
    bot.download_file(&file.path, &mut bytes)
        .await
        .map_err(|e| {
            warn!("Download of {file_name} failed: {e}");
            AppError::Internal(anyhow::anyhow!("download failed: {e}"))
        })?;

    debug!("Downloaded {file_name} ({} bytes)", bytes.len());
    Ok(Event::Upload {
        file_name,
        bytes: bytes.into(),
    })
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> ResponseResult<()> {
    match reply {
        Reply::Text(text) => {
            bot.send_message(chat_id, text).await?;
        }
        Reply::Document {
            file_name,
            bytes,
            caption,
        } => {
            let mut request =
                bot.send_document(chat_id, InputFile::memory(bytes).file_name(file_name));
            if let Some(caption) = caption {
                request = request.caption(caption);
            }
            request.await?;
        }
    }
    Ok(())
}
