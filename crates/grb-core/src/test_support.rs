//! Hand-rolled recording mock of the messaging port for engine tests.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MediaKind},
    },
    Result,
};

/// One captured outbound call. Keyboards are recorded as their
/// callback-data payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    Text {
        chat: ChatId,
        text: String,
        reply_to: Option<MessageId>,
        buttons: Vec<String>,
    },
    Media {
        chat: ChatId,
        kind: MediaKind,
        file_id: String,
        caption: Option<String>,
        reply_to: Option<MessageId>,
        buttons: Vec<String>,
    },
    Forward {
        to: ChatId,
        source: MessageRef,
    },
    Leave {
        chat: ChatId,
    },
    Answer {
        callback_id: String,
        text: Option<String>,
    },
    ClearKeyboard {
        msg: MessageRef,
    },
}

#[derive(Default)]
pub struct RecordingPort {
    calls: Mutex<Vec<Outbound>>,
    failing: Mutex<HashSet<i64>>,
    next_id: Mutex<i32>,
}

impl RecordingPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent send to this chat fails with a transport error.
    pub fn fail_chat(&self, chat: ChatId) {
        self.failing.lock().insert(chat.0);
    }

    pub fn calls(&self) -> Vec<Outbound> {
        self.calls.lock().clone()
    }

    /// Texts sent to a chat, as (text, button payloads) pairs.
    pub fn texts_to(&self, chat: ChatId) -> Vec<(String, Vec<String>)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Outbound::Text {
                    chat: c2,
                    text,
                    buttons,
                    ..
                } if *c2 == chat => Some((text.clone(), buttons.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn answers(&self) -> Vec<(String, Option<String>)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Outbound::Answer { callback_id, text } => {
                    Some((callback_id.clone(), text.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn check(&self, chat: ChatId) -> Result<()> {
        if self.failing.lock().contains(&chat.0) {
            return Err(Error::Transport("recipient unavailable".to_string()));
        }
        Ok(())
    }

    fn next_ref(&self, chat: ChatId) -> MessageRef {
        let mut id = self.next_id.lock();
        *id += 1;
        MessageRef {
            chat_id: chat,
            message_id: MessageId(*id),
        }
    }

    fn record(&self, call: Outbound) {
        self.calls.lock().push(call);
    }
}

fn button_payloads(keyboard: Option<InlineKeyboard>) -> Vec<String> {
    keyboard
        .map(|k| k.buttons.into_iter().map(|b| b.callback_data).collect())
        .unwrap_or_default()
}

#[async_trait]
impl MessagingPort for RecordingPort {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        self.check(chat)?;
        self.record(Outbound::Text {
            chat,
            text: text.to_string(),
            reply_to,
            buttons: button_payloads(keyboard),
        });
        Ok(self.next_ref(chat))
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
        self.check(chat)?;
        self.record(Outbound::Media {
            chat,
            kind,
            file_id: file_id.to_string(),
            caption: caption.map(|s| s.to_string()),
            reply_to,
            buttons: button_payloads(keyboard),
        });
        Ok(self.next_ref(chat))
    }

    async fn forward_message(&self, to: ChatId, source: MessageRef) -> Result<MessageRef> {
        self.check(to)?;
        self.record(Outbound::Forward { to, source });
        Ok(self.next_ref(to))
    }

    async fn leave_chat(&self, chat: ChatId) -> Result<()> {
        self.record(Outbound::Leave { chat });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.record(Outbound::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(|s| s.to_string()),
        });
        Ok(())
    }

    async fn clear_keyboard(&self, msg: MessageRef) -> Result<()> {
        self.record(Outbound::ClearKeyboard { msg });
        Ok(())
    }
}
