use super::*;

/// Content for the one bot-authored message a chat is looking at.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct Surface {
    pub(super) text: String,
    pub(super) photo: Option<PathBuf>,
    pub(super) keyboard: InlineKeyboardMarkup,
    pub(super) html: bool,
}

impl Surface {
    pub(super) fn text(text: impl Into<String>, keyboard: InlineKeyboardMarkup) -> Self {
        Surface {
            text: text.into(),
            photo: None,
            keyboard,
            html: false,
        }
    }

    pub(super) fn with_photo(mut self, path: PathBuf) -> Self {
        self.photo = Some(path);
        self
    }

    pub(super) fn html(mut self) -> Self {
        self.html = true;
        self
    }

    pub(super) fn has_keyboard(&self) -> bool {
        !self.keyboard.inline_keyboard.is_empty()
    }

    /// Photos cannot be turned into text (or swapped) through a text edit.
    fn editable_in_place(&self) -> bool {
        self.photo.is_none()
    }
}

/// Tracks the active message per chat so at most one surface stays visible.
#[derive(Default)]
pub(super) struct Surfaces {
    active: Mutex<HashMap<i64, MessageId>>,
}

impl Surfaces {
    pub(super) async fn active(&self, chat_id: ChatId) -> Option<MessageId> {
        self.active.lock().await.get(&chat_id.0).copied()
    }

    /// Replaces whatever the chat currently shows with a freshly sent message.
    pub(super) async fn show<G: Gateway + ?Sized>(
        &self,
        gateway: &G,
        chat_id: ChatId,
        surface: &Surface,
    ) -> Result<MessageId> {
        let previous = self.active.lock().await.remove(&chat_id.0);
        if let Some(previous) = previous {
            if let Err(err) = gateway.delete(chat_id, previous).await {
                debug!(
                    "delete of previous surface {} in {} ignored: {:#}",
                    previous.0, chat_id.0, err
                );
            }
        }

        let sent = gateway.send(chat_id, surface).await?;
        self.active.lock().await.insert(chat_id.0, sent);
        Ok(sent)
    }

    /// Edits `message_id` in place when it is still the live surface, otherwise shows anew.
    pub(super) async fn update<G: Gateway + ?Sized>(
        &self,
        gateway: &G,
        chat_id: ChatId,
        message_id: MessageId,
        surface: &Surface,
    ) -> Result<MessageId> {
        let is_active = self.active(chat_id).await == Some(message_id);
        if is_active && surface.editable_in_place() {
            match gateway.edit_text(chat_id, message_id, surface).await {
                Ok(()) => return Ok(message_id),
                Err(err) => {
                    debug!(
                        "edit of surface {} in {} failed, resending: {:#}",
                        message_id.0, chat_id.0, err
                    );
                }
            }
        } else if !is_active {
            debug!("surface {} in {} is stale", message_id.0, chat_id.0);
        }
        self.show(gateway, chat_id, surface).await
    }

    pub(super) async fn dismiss<G: Gateway + ?Sized>(&self, gateway: &G, chat_id: ChatId) {
        let previous = self.active.lock().await.remove(&chat_id.0);
        if let Some(previous) = previous {
            if let Err(err) = gateway.delete(chat_id, previous).await {
                debug!("dismiss of {} in {} ignored: {:#}", previous.0, chat_id.0, err);
            }
        }
    }
}
