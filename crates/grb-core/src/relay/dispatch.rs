use crate::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    formatting::escape_html,
    messaging::{port::MessagingPort, types::InboundContent},
    pending::{PendingAction, PendingStore, Take},
    registry::Registry,
    Result,
};

const HELP_PROMPT: &str = "ℹ️ Tap a reply button under a forwarded message, \
then send your reply here.\nUse /help for the command list.";

/// What the dispatcher did with an administrator's message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered { target: String },
    DeliveryFailed { target: String },
    /// No session was armed; the administrator got the help prompt.
    NoSession,
    SessionExpired,
    /// The pending target left the registry before the reply arrived.
    TargetGone,
    UnsupportedContent,
}

/// Route an administrator's free-form message through their pending action.
///
/// The action is consumed up front, exactly once. Every failure path below
/// leaves the administrator disarmed and re-initiating via a control.
pub async fn dispatch_admin_message(
    registry: &Registry,
    pending: &PendingStore,
    port: &dyn MessagingPort,
    admin: UserId,
    content: &InboundContent,
) -> Result<DispatchOutcome> {
    let admin_chat = admin.private_chat();

    let action = match pending.take(admin) {
        Take::Action(action) => action,
        Take::Expired => {
            port.send_text(
                admin_chat,
                "⌛ Reply session expired. Tap a control button to start again.",
                None,
                None,
            )
            .await?;
            return Ok(DispatchOutcome::SessionExpired);
        }
        Take::Missing => {
            port.send_text(admin_chat, HELP_PROMPT, None, None).await?;
            return Ok(DispatchOutcome::NoSession);
        }
    };

    if matches!(content, InboundContent::Unsupported) {
        port.send_text(
            admin_chat,
            "❌ Unsupported message type. The reply session was consumed; \
tap a control button to try again.",
            None,
            None,
        )
        .await?;
        return Ok(DispatchOutcome::UnsupportedContent);
    }

    let (dest, reply_to, target) = match action {
        PendingAction::User { user } => (user.private_chat(), None, format!("user {user}")),
        PendingAction::Group { chat } | PendingAction::GroupMessage { chat, .. } => {
            let Some(title) = registry.group_title(chat) else {
                port.send_text(
                    admin_chat,
                    "⚠️ Target group is no longer registered.",
                    None,
                    None,
                )
                .await?;
                return Ok(DispatchOutcome::TargetGone);
            };
            let reply_to = match action {
                PendingAction::GroupMessage { message, .. } => Some(message),
                _ => None,
            };
            (chat, reply_to, format!("group {chat} ({title})"))
        }
    };

    match send_content(port, dest, content, reply_to).await {
        Ok(_) => {
            port.send_text(
                admin_chat,
                &format!("✅ Sent to {}", escape_html(&target)),
                None,
                None,
            )
            .await?;
            Ok(DispatchOutcome::Delivered { target })
        }
        Err(e) => {
            tracing::warn!(admin = admin.0, target = %target, error = %e, "reply delivery failed");
            port.send_text(
                admin_chat,
                &format!("❌ Delivery failed: {}", escape_html(&e.to_string())),
                None,
                None,
            )
            .await?;
            Ok(DispatchOutcome::DeliveryFailed { target })
        }
    }
}

async fn send_content(
    port: &dyn MessagingPort,
    dest: ChatId,
    content: &InboundContent,
    reply_to: Option<MessageId>,
) -> Result<MessageRef> {
    match content {
        InboundContent::Text(text) => {
            port.send_text(dest, &escape_html(text), reply_to, None).await
        }
        InboundContent::Media {
            kind,
            file_id,
            caption,
        } => {
            port.send_media(dest, *kind, file_id, caption.as_deref(), reply_to, None)
                .await
        }
        InboundContent::Unsupported => Err(crate::Error::UnsupportedContent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::types::MediaKind;
    use crate::pending::Take;
    use crate::test_support::{Outbound, RecordingPort};
    use std::time::Duration;

    const OPS: ChatId = ChatId(-100);
    const ADMIN: UserId = UserId(1);

    fn ops_registry() -> Registry {
        let registry = Registry::new(&[1], &[], &[]);
        registry.register_group(OPS, "Ops");
        registry
    }

    fn text(s: &str) -> InboundContent {
        InboundContent::Text(s.to_string())
    }

    #[tokio::test]
    async fn reply_to_group_is_sent_once_and_confirmed() {
        let registry = ops_registry();
        let pending = PendingStore::new(None);
        let port = RecordingPort::new();
        pending.set(ADMIN, PendingAction::Group { chat: OPS });

        let outcome = dispatch_admin_message(&registry, &pending, &port, ADMIN, &text("ack"))
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Delivered { .. }));

        let to_group = port.texts_to(OPS);
        assert_eq!(to_group.len(), 1);
        assert_eq!(to_group[0].0, "ack");

        let confirmations = port.texts_to(ADMIN.private_chat());
        assert_eq!(confirmations.len(), 1);
        assert!(confirmations[0].0.contains("Ops"));

        // the action was consumed
        assert_eq!(pending.take(ADMIN), Take::Missing);
    }

    #[tokio::test]
    async fn threaded_reply_targets_the_recorded_message() {
        let registry = ops_registry();
        let pending = PendingStore::new(None);
        let port = RecordingPort::new();
        pending.set(
            ADMIN,
            PendingAction::GroupMessage {
                chat: OPS,
                message: MessageId(42),
            },
        );

        dispatch_admin_message(&registry, &pending, &port, ADMIN, &text("ack"))
            .await
            .unwrap();

        let threaded = port.calls().into_iter().any(|c| {
            matches!(c, Outbound::Text { chat, reply_to, .. }
                if chat == OPS && reply_to == Some(MessageId(42)))
        });
        assert!(threaded);
    }

    #[tokio::test]
    async fn reply_to_user_is_not_threaded() {
        let registry = ops_registry();
        let pending = PendingStore::new(None);
        let port = RecordingPort::new();
        pending.set(ADMIN, PendingAction::User { user: UserId(7) });

        let photo = InboundContent::Media {
            kind: MediaKind::Photo,
            file_id: "f".to_string(),
            caption: Some("here".to_string()),
        };
        dispatch_admin_message(&registry, &pending, &port, ADMIN, &photo)
            .await
            .unwrap();

        let sent = port.calls().into_iter().any(|c| {
            matches!(c, Outbound::Media { chat, reply_to, .. }
                if chat == ChatId(7) && reply_to.is_none())
        });
        assert!(sent);
    }

    #[tokio::test]
    async fn vanished_target_group_is_reported_and_nothing_is_sent() {
        let registry = ops_registry();
        let pending = PendingStore::new(None);
        let port = RecordingPort::new();

        let gone = ChatId(-999);
        pending.set(ADMIN, PendingAction::Group { chat: gone });

        let outcome = dispatch_admin_message(&registry, &pending, &port, ADMIN, &text("late"))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::TargetGone);
        assert!(port.texts_to(gone).is_empty());
        assert!(port.texts_to(ADMIN.private_chat())[0]
            .0
            .contains("no longer registered"));
    }

    #[tokio::test]
    async fn no_session_yields_the_help_prompt() {
        let registry = ops_registry();
        let pending = PendingStore::new(None);
        let port = RecordingPort::new();

        let outcome = dispatch_admin_message(&registry, &pending, &port, ADMIN, &text("hi"))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::NoSession);
        assert!(port.texts_to(ADMIN.private_chat())[0].0.contains("/help"));
    }

    #[tokio::test]
    async fn stale_session_is_reported_as_expired() {
        let registry = ops_registry();
        let pending = PendingStore::new(Some(Duration::from_millis(1)));
        let port = RecordingPort::new();
        pending.set(ADMIN, PendingAction::Group { chat: OPS });
        std::thread::sleep(Duration::from_millis(5));

        let outcome = dispatch_admin_message(&registry, &pending, &port, ADMIN, &text("late"))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::SessionExpired);
        assert!(port.texts_to(OPS).is_empty());
    }

    #[tokio::test]
    async fn unsupported_reply_is_rejected_after_consuming_the_session() {
        let registry = ops_registry();
        let pending = PendingStore::new(None);
        let port = RecordingPort::new();
        pending.set(ADMIN, PendingAction::Group { chat: OPS });

        let outcome = dispatch_admin_message(
            &registry,
            &pending,
            &port,
            ADMIN,
            &InboundContent::Unsupported,
        )
        .await
        .unwrap();
        assert_eq!(outcome, DispatchOutcome::UnsupportedContent);
        assert!(port.texts_to(OPS).is_empty());
        assert_eq!(pending.take(ADMIN), Take::Missing);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_and_the_action_is_not_requeued() {
        let registry = ops_registry();
        let pending = PendingStore::new(None);
        let port = RecordingPort::new();
        port.fail_chat(ChatId(7));
        pending.set(ADMIN, PendingAction::User { user: UserId(7) });

        let outcome = dispatch_admin_message(&registry, &pending, &port, ADMIN, &text("hi"))
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::DeliveryFailed { .. }));
        assert!(port.texts_to(ADMIN.private_chat())[0]
            .0
            .contains("Delivery failed"));
        assert_eq!(pending.take(ADMIN), Take::Missing);
    }
}
