use std::sync::Arc;

use teloxide::{prelude::*, types::CallbackQuery};

use grb_core::{
    audit::AuditEvent,
    domain::{ChatId, MessageId, MessageRef, UserId},
    relay::control::handle_control_activation,
};

use crate::router::AppState;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(data) = q.data.as_deref() else {
        let _ = state.messenger.answer_callback(&q.id, None).await;
        return Ok(());
    };

    let invoker = UserId(q.from.id.0 as i64);
    let message = q.message.as_ref().map(|m| MessageRef {
        chat_id: ChatId(m.chat.id.0),
        message_id: MessageId(m.id.0),
    });

    if let Err(e) = handle_control_activation(
        &state.registry,
        &state.pending,
        state.messenger.as_ref(),
        invoker,
        &q.id,
        data,
        message,
    )
    .await
    {
        tracing::warn!(admin = invoker.0, error = %e, "control activation failed");
        return Ok(());
    }

    if let Err(e) = state.audit.write(AuditEvent::control(invoker.0, data)) {
        tracing::warn!(error = %e, "failed to write control audit event");
    }

    Ok(())
}
