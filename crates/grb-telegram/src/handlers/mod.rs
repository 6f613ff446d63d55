//! Update handlers: classify each incoming update and bridge it into the
//! core relay engine. Transport types are converted to core types here, once.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use grb_core::{
    domain::UserId,
    messaging::types::{InboundContent, MediaKind, Sender},
};

use crate::router::AppState;

mod callback;
mod commands;
mod group;
mod membership;
mod private;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle_callback(q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(members) = msg.new_chat_members() {
        if members.iter().any(|u| u.id.0 as i64 == state.bot_id) {
            return membership::handle_bot_added(msg, state).await;
        }
        return Ok(());
    }

    if msg.chat.is_group() || msg.chat.is_supergroup() {
        return group::handle_group_message(msg, state).await;
    }

    if msg.chat.is_private() {
        return private::handle_private_message(msg, state).await;
    }

    Ok(())
}

/// Classify message content into the relay's tagged union. Runs exactly once
/// per update; everything downstream matches on the result.
pub(crate) fn inbound_content(msg: &Message) -> InboundContent {
    if let Some(text) = msg.text() {
        return InboundContent::Text(text.to_string());
    }

    let caption = msg.caption().map(|s| s.to_string());
    let media = |kind: MediaKind, file_id: String| InboundContent::Media {
        kind,
        file_id,
        caption,
    };

    if let Some(best) = msg.photo().and_then(|sizes| sizes.last()) {
        return media(MediaKind::Photo, best.file.id.clone());
    }
    if let Some(doc) = msg.document() {
        return media(MediaKind::Document, doc.file.id.clone());
    }
    if let Some(video) = msg.video() {
        return media(MediaKind::Video, video.file.id.clone());
    }
    if let Some(voice) = msg.voice() {
        return media(MediaKind::Voice, voice.file.id.clone());
    }
    if let Some(audio) = msg.audio() {
        return media(MediaKind::Audio, audio.file.id.clone());
    }

    InboundContent::Unsupported
}

pub(crate) fn sender_of(msg: &Message) -> Option<Sender> {
    msg.from().map(|u| Sender {
        id: UserId(u.id.0 as i64),
        display_name: u
            .username
            .as_ref()
            .map(|n| format!("@{n}"))
            .unwrap_or_else(|| u.first_name.clone()),
    })
}
