//! Telegram adapter (teloxide).
//!
//! This crate implements the `grb-core` MessagingPort over the Telegram Bot
//! API and hosts the update router and handlers.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode},
};

use tokio::time::sleep;

use grb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MediaKind},
    },
    Result,
};

pub mod handlers;
pub mod router;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn markup(keyboard: &InlineKeyboard) -> InlineKeyboardMarkup {
        let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
            .buttons
            .iter()
            .map(|b| {
                vec![InlineKeyboardButton::callback(
                    b.label.clone(),
                    b.callback_data.clone(),
                )]
            })
            .collect();
        InlineKeyboardMarkup::new(rows)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_message(Self::tg_chat(chat), text.to_string())
                    .parse_mode(ParseMode::Html);
                if let Some(id) = reply_to {
                    req = req.reply_to_message_id(Self::tg_msg_id(id));
                }
                if let Some(kb) = &keyboard {
                    req = req.reply_markup(Self::markup(kb));
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id: chat,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_media(
        &self,
        chat: ChatId,
        kind: MediaKind,
        file_id: &str,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        let dest = Self::tg_chat(chat);
        let input = InputFile::file_id(file_id.to_string());

        // The send_* payloads are distinct types with identical setters, so a
        // local macro instead of a generic helper.
        macro_rules! send_media_as {
            ($method:ident) => {
                self.with_retry(|| {
                    let mut req = self.bot.$method(dest, input.clone());
                    if let Some(c) = caption {
                        req = req.caption(c.to_string()).parse_mode(ParseMode::Html);
                    }
                    if let Some(id) = reply_to {
                        req = req.reply_to_message_id(Self::tg_msg_id(id));
                    }
                    if let Some(kb) = &keyboard {
                        req = req.reply_markup(Self::markup(kb));
                    }
                    req
                })
                .await?
            };
        }

        let msg = match kind {
            MediaKind::Photo => send_media_as!(send_photo),
            MediaKind::Document => send_media_as!(send_document),
            MediaKind::Video => send_media_as!(send_video),
            MediaKind::Voice => send_media_as!(send_voice),
            MediaKind::Audio => send_media_as!(send_audio),
        };

        Ok(MessageRef {
            chat_id: chat,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn forward_message(&self, to: ChatId, source: MessageRef) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot.forward_message(
                    Self::tg_chat(to),
                    Self::tg_chat(source.chat_id),
                    Self::tg_msg_id(source.message_id),
                )
            })
            .await?;

        Ok(MessageRef {
            chat_id: to,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn leave_chat(&self, chat: ChatId) -> Result<()> {
        self.with_retry(|| self.bot.leave_chat(Self::tg_chat(chat)))
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn clear_keyboard(&self, msg: MessageRef) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .edit_message_reply_markup(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
        })
        .await?;
        Ok(())
    }
}
