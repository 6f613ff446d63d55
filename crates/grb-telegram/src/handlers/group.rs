use std::sync::Arc;

use teloxide::prelude::*;

use grb_core::{
    audit::AuditEvent,
    domain::{ChatId, MessageId},
    relay::forward::{relay_group_message, GroupInbound},
};

use crate::router::AppState;

use super::{inbound_content, sender_of};

pub async fn handle_group_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let inbound = GroupInbound {
        chat: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        sender: sender_of(&msg),
        content: inbound_content(&msg),
    };

    let report = relay_group_message(&state.registry, state.messenger.as_ref(), &inbound).await;
    if report.delivered + report.failed == 0 {
        return Ok(()); // dropped: unknown or paused group
    }

    let event = AuditEvent::group_relay(
        inbound.chat.0,
        inbound.sender.as_ref().map(|s| s.id.0),
        inbound.content.kind_label(),
        report,
    );
    if let Err(e) = state.audit.write(event) {
        tracing::warn!(error = %e, "failed to write group relay audit event");
    }

    Ok(())
}
