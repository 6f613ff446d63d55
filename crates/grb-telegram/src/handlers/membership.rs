use std::sync::Arc;

use teloxide::prelude::*;

use grb_core::{domain::ChatId, formatting::escape_html, relay::forward::notify_admins};

use crate::router::AppState;

/// The bot was added to a group: run the admission gate, then either
/// register + announce, or refuse + leave.
pub async fn handle_bot_added(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);
    let title = msg.chat.title().unwrap_or("(untitled)").to_string();

    if !state.registry.is_admitted(chat) {
        tracing::info!(chat = chat.0, title = %title, "group refused by admission gate");
        let _ = state
            .messenger
            .send_text(chat, "🚫 This group is not admitted to the relay.", None, None)
            .await;
        let _ = state.messenger.leave_chat(chat).await;
        return Ok(());
    }

    if !state.registry.register_group(chat, &title) {
        return Ok(()); // re-added while still registered
    }
    tracing::info!(chat = chat.0, title = %title, "group registered");

    let note = format!(
        "📌 New group joined:\n<b>{}</b>\nID: <code>{chat}</code>",
        escape_html(&title)
    );
    notify_admins(&state.registry, state.messenger.as_ref(), &note).await;

    let _ = state
        .messenger
        .send_text(
            chat,
            "✅ Message relay active. Group messages are forwarded to the administrators.",
            None,
            None,
        )
        .await;

    Ok(())
}
