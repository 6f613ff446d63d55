use crate::{
    controls::ControlAction,
    domain::{ChatId, MessageId, MessageRef},
    formatting::escape_html,
    messaging::{
        port::MessagingPort,
        types::{InboundContent, InlineButton, InlineKeyboard, Sender},
    },
    registry::Registry,
    Result,
};

/// A message observed in a group chat, ready for fan-out.
#[derive(Clone, Debug)]
pub struct GroupInbound {
    pub chat: ChatId,
    pub message_id: MessageId,
    pub sender: Option<Sender>,
    pub content: InboundContent,
}

/// A private message from an ordinary (non-administrator) user.
#[derive(Clone, Debug)]
pub struct PrivateInbound {
    pub sender: Sender,
    pub message_id: MessageId,
    pub content: InboundContent,
}

/// Delivery counts for one fan-out pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FanOut {
    pub delivered: usize,
    pub failed: usize,
}

/// Relay a group message to every administrator, best-effort.
///
/// Messages from unknown or paused groups are dropped silently. A delivery
/// failure for one administrator is logged and never aborts the rest.
pub async fn relay_group_message(
    registry: &Registry,
    port: &dyn MessagingPort,
    inbound: &GroupInbound,
) -> FanOut {
    let Some(title) = registry.touch(inbound.chat) else {
        tracing::debug!(
            chat = inbound.chat.0,
            "dropping message from unregistered or paused group"
        );
        return FanOut::default();
    };

    let context = format!("From <b>{}</b>", escape_html(&title));
    let keyboard = group_controls(inbound);
    let source = MessageRef {
        chat_id: inbound.chat,
        message_id: inbound.message_id,
    };

    fan_out(registry, port, source, &inbound.content, &context, &keyboard).await
}

/// Relay a private user's message to every administrator, unconditionally.
/// The group registry has no say over private traffic.
pub async fn relay_private_message(
    registry: &Registry,
    port: &dyn MessagingPort,
    inbound: &PrivateInbound,
) -> FanOut {
    let context = format!(
        "Private message from <b>{}</b> (<code>{}</code>)",
        escape_html(&inbound.sender.display_name),
        inbound.sender.id
    );
    let keyboard = InlineKeyboard::new(vec![InlineButton::new(
        format!("👤 Reply to {}", inbound.sender.display_name),
        &ControlAction::ReplyUser {
            user: inbound.sender.id,
        },
    )]);
    let source = MessageRef {
        chat_id: inbound.sender.id.private_chat(),
        message_id: inbound.message_id,
    };

    fan_out(registry, port, source, &inbound.content, &context, &keyboard).await
}

/// Best-effort plain-text broadcast to every administrator.
pub async fn notify_admins(registry: &Registry, port: &dyn MessagingPort, text: &str) -> FanOut {
    let mut report = FanOut::default();
    for admin in registry.admins() {
        match port.send_text(admin.private_chat(), text, None, None).await {
            Ok(_) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(admin = admin.0, error = %e, "admin notification failed");
            }
        }
    }
    report
}

async fn fan_out(
    registry: &Registry,
    port: &dyn MessagingPort,
    source: MessageRef,
    content: &InboundContent,
    context: &str,
    keyboard: &InlineKeyboard,
) -> FanOut {
    let mut report = FanOut::default();
    for admin in registry.admins() {
        let result = deliver_copy(
            port,
            admin.private_chat(),
            source,
            content,
            context,
            keyboard.clone(),
        )
        .await;

        match result {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(admin = admin.0, error = %e, "fan-out delivery failed");
            }
        }
    }
    report
}

async fn deliver_copy(
    port: &dyn MessagingPort,
    admin_chat: ChatId,
    source: MessageRef,
    content: &InboundContent,
    context: &str,
    keyboard: InlineKeyboard,
) -> Result<()> {
    match content {
        InboundContent::Text(_) => {
            // Forward the original so the admin sees it verbatim, then attach
            // the controls to a context line threaded under the copy.
            let copy = port.forward_message(admin_chat, source).await?;
            port.send_text(admin_chat, context, Some(copy.message_id), Some(keyboard))
                .await?;
        }
        InboundContent::Media {
            kind,
            file_id,
            caption,
        } => {
            let caption = match caption {
                Some(c) => format!("{context}\n{}", escape_html(c)),
                None => context.to_string(),
            };
            port.send_media(admin_chat, *kind, file_id, Some(&caption), None, Some(keyboard))
                .await?;
        }
        InboundContent::Unsupported => {
            let note = format!("{context} (unsupported message type)");
            port.send_text(admin_chat, &note, None, Some(keyboard))
                .await?;
        }
    }
    Ok(())
}

fn group_controls(inbound: &GroupInbound) -> InlineKeyboard {
    let mut buttons = vec![InlineButton::new(
        "↩️ Reply to group",
        &ControlAction::ReplyGroup {
            chat: inbound.chat,
        },
    )];

    if let Some(sender) = &inbound.sender {
        buttons.push(InlineButton::new(
            format!("👤 Reply to {}", sender.display_name),
            &ControlAction::ReplyMessage {
                chat: inbound.chat,
                message: inbound.message_id,
            },
        ));
    }

    buttons.push(InlineButton::new(
        "⏯ Toggle forwarding",
        &ControlAction::ToggleGroup {
            chat: inbound.chat,
        },
    ));

    InlineKeyboard::new(buttons)
}
