use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::{InlineKeyboard, MediaKind},
    Result,
};

/// Outbound transport operations the relay engine needs.
///
/// Telegram is the only production implementation; adapter crates map their
/// errors into `Error::Transport` so the engine handles failures uniformly.
/// Every call is a bounded request/response; fan-out loops rely on that to
/// isolate per-recipient failures.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send HTML-formatted text, optionally threaded and with controls.
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef>;

    /// Re-emit media by file reference.
    async fn send_media(
        &self,
        chat: ChatId,
        kind: MediaKind,
        file_id: &str,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef>;

    async fn forward_message(&self, to: ChatId, source: MessageRef) -> Result<MessageRef>;

    async fn leave_chat(&self, chat: ChatId) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    /// Remove the inline keyboard from a previously sent message.
    async fn clear_keyboard(&self, msg: MessageRef) -> Result<()>;
}
