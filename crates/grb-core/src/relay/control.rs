use crate::{
    controls::ControlAction,
    domain::{ChatId, MessageRef, UserId},
    messaging::port::MessagingPort,
    pending::{PendingAction, PendingStore},
    registry::Registry,
    Result,
};

/// Turn a callback-button activation into a pending-store write (or a
/// toggle), acknowledging the activation either way.
///
/// The administrator check runs before any payload parsing. Reply controls
/// are disarmed on the copy that carried them afterwards; the toggle control
/// stays live.
pub async fn handle_control_activation(
    registry: &Registry,
    pending: &PendingStore,
    port: &dyn MessagingPort,
    invoker: UserId,
    callback_id: &str,
    payload: &str,
    message: Option<MessageRef>,
) -> Result<()> {
    if !registry.is_admin(invoker) {
        port.answer_callback(callback_id, Some("Administrator privileges required"))
            .await?;
        return Ok(());
    }

    let action = match ControlAction::decode(payload) {
        Ok(action) => action,
        Err(e) => {
            tracing::warn!(admin = invoker.0, error = %e, "rejecting malformed control payload");
            port.answer_callback(callback_id, Some("Invalid control"))
                .await?;
            return Ok(());
        }
    };

    let armed = match action {
        ControlAction::ReplyGroup { chat } => {
            if !require_group(registry, port, chat, callback_id).await? {
                return Ok(());
            }
            pending.set(invoker, PendingAction::Group { chat });
            "Send your reply to the group..."
        }
        ControlAction::ReplyMessage { chat, message } => {
            if !require_group(registry, port, chat, callback_id).await? {
                return Ok(());
            }
            pending.set(invoker, PendingAction::GroupMessage { chat, message });
            "Send your reply to the message..."
        }
        ControlAction::ReplyUser { user } => {
            pending.set(invoker, PendingAction::User { user });
            "Send your reply to the user..."
        }
        ControlAction::ToggleGroup { chat } => {
            let text = match registry.toggle_active(chat) {
                Ok(true) => "Forwarding enabled",
                Ok(false) => "Forwarding paused",
                Err(_) => "Group is no longer registered",
            };
            port.answer_callback(callback_id, Some(text)).await?;
            return Ok(());
        }
    };

    port.answer_callback(callback_id, Some(armed)).await?;

    // Disarm the reply controls on this copy; stale re-activations would
    // race the registry. Best-effort: the armed session stands either way.
    if let Some(msg) = message {
        if let Err(e) = port.clear_keyboard(msg).await {
            tracing::debug!(error = %e, "failed to clear control keyboard");
        }
    }

    Ok(())
}

async fn require_group(
    registry: &Registry,
    port: &dyn MessagingPort,
    chat: ChatId,
    callback_id: &str,
) -> Result<bool> {
    if registry.contains_group(chat) {
        return Ok(true);
    }
    port.answer_callback(callback_id, Some("Group is no longer registered"))
        .await?;
    Ok(false)
}
