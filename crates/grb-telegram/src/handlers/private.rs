use std::sync::Arc;

use teloxide::prelude::*;

use grb_core::{
    audit::AuditEvent,
    domain::MessageId,
    relay::{
        dispatch::{dispatch_admin_message, DispatchOutcome},
        forward::{relay_private_message, PrivateInbound},
    },
};

use crate::router::AppState;

use super::{commands, inbound_content, sender_of};

pub async fn handle_private_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(sender) = sender_of(&msg) else {
        return Ok(());
    };

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(msg, state).await;
        }
    }

    let content = inbound_content(&msg);

    if state.registry.is_admin(sender.id) {
        let result = dispatch_admin_message(
            &state.registry,
            &state.pending,
            state.messenger.as_ref(),
            sender.id,
            &content,
        )
        .await;

        match result {
            Ok(DispatchOutcome::Delivered { target })
            | Ok(DispatchOutcome::DeliveryFailed { target }) => {
                let event = AuditEvent::admin_reply(sender.id.0, content.kind_label(), &target);
                if let Err(e) = state.audit.write(event) {
                    tracing::warn!(error = %e, "failed to write admin reply audit event");
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(admin = sender.id.0, error = %e, "admin dispatch failed");
            }
        }
        return Ok(());
    }

    // Ordinary user: relay to the administrators, independent of any group
    // registry state.
    let inbound = PrivateInbound {
        sender: sender.clone(),
        message_id: MessageId(msg.id.0),
        content,
    };
    let report =
        relay_private_message(&state.registry, state.messenger.as_ref(), &inbound).await;

    let event = AuditEvent::private_relay(
        sender.id.0,
        &sender.display_name,
        inbound.content.kind_label(),
        report,
    );
    if let Err(e) = state.audit.write(event) {
        tracing::warn!(error = %e, "failed to write private relay audit event");
    }

    Ok(())
}
