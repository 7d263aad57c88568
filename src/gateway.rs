use super::*;
use teloxide::{ApiError, RequestError};

/// Outbound side of the Telegram Bot API as the handlers see it.
#[async_trait]
pub(super) trait Gateway: Send + Sync {
    async fn send(&self, chat_id: ChatId, surface: &Surface) -> Result<MessageId>;

    /// Replaces the text and keyboard of an existing text message.
    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, surface: &Surface)
        -> Result<()>;

    async fn delete(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;

    /// Stops the client spinner; `alert` shows a modal banner instead of a toast.
    async fn answer_callback(&self, callback_id: &str, alert: Option<&str>) -> Result<()>;

    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<()>;
}

pub(super) struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub(super) fn new(bot: Bot) -> Self {
        TelegramGateway { bot }
    }
}

impl TelegramGateway {
    async fn send_once(
        &self,
        chat_id: ChatId,
        surface: &Surface,
        html: bool,
    ) -> Result<Message, RequestError> {
        match &surface.photo {
            Some(path) => {
                let mut req = self
                    .bot
                    .send_photo(chat_id, InputFile::file(path.clone()))
                    .caption(surface.text.clone());
                if html {
                    req = req.parse_mode(ParseMode::Html);
                }
                if surface.has_keyboard() {
                    req = req.reply_markup(surface.keyboard.clone());
                }
                req.await
            }
            None => {
                let mut req = self.bot.send_message(chat_id, surface.text.clone());
                if html {
                    req = req.parse_mode(ParseMode::Html);
                }
                if surface.has_keyboard() {
                    req = req.reply_markup(surface.keyboard.clone());
                }
                req.await
            }
        }
    }

    async fn edit_once(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        surface: &Surface,
        html: bool,
    ) -> Result<Message, RequestError> {
        let mut req = self
            .bot
            .edit_message_text(chat_id, message_id, surface.text.clone());
        if html {
            req = req.parse_mode(ParseMode::Html);
        }
        if surface.has_keyboard() {
            req = req.reply_markup(surface.keyboard.clone());
        }
        req.await
    }
}

fn is_entity_parse_error(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::CantParseEntities))
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn send(&self, chat_id: ChatId, surface: &Surface) -> Result<MessageId> {
        let sent = match self.send_once(chat_id, surface, surface.html).await {
            Err(err) if surface.html && is_entity_parse_error(&err) => {
                warn!("HTML send to {} rejected, retrying as plain text: {}", chat_id.0, err);
                self.send_once(chat_id, surface, false).await?
            }
            other => other?,
        };
        Ok(sent.id)
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        surface: &Surface,
    ) -> Result<()> {
        match self.edit_once(chat_id, message_id, surface, surface.html).await {
            Err(err) if surface.html && is_entity_parse_error(&err) => {
                warn!("HTML edit in {} rejected, retrying as plain text: {}", chat_id.0, err);
                self.edit_once(chat_id, message_id, surface, false).await?;
            }
            other => {
                other?;
            }
        }
        Ok(())
    }

    async fn delete(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, alert: Option<&str>) -> Result<()> {
        let mut req = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(text) = alert {
            req = req.text(text).show_alert(true);
        }
        req.await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<()> {
        let file = self.bot.get_file(file_id.to_string()).await?;
        let mut out = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("create {}", dest.display()))?;
        if let Err(err) = self.bot.download_file(&file.path, &mut out).await {
            drop(out);
            let _ = tokio::fs::remove_file(dest).await;
            return Err(anyhow!("download {}: {}", file_id, err));
        }
        Ok(())
    }
}
