use std::sync::Arc;

use teloxide::prelude::*;

use grb_core::{
    audit::AuditEvent,
    domain::{ChatId, UserId},
    errors::Error,
    formatting::escape_html,
    registry::Group,
    Result,
};

use crate::router::AppState;

const ADMIN_HELP: &str = "Relay commands:\n\
/groups: list registered groups\n\
/toggle &lt;chat_id&gt;: pause/resume forwarding for a group\n\
/allow &lt;chat_id&gt;: add a group to the allow-list\n\
/block &lt;chat_id&gt;: block a group (and leave it)\n\
/addadmin &lt;user_id&gt;: add an administrator\n\
/send &lt;chat_id&gt; &lt;text&gt;: send text to a group\n\n\
To answer forwarded messages, tap a reply button and send your reply here.";

const USER_HELP: &str =
    "👋 Messages you send here are relayed to the administrators; they can reply to you directly.";

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let admin = UserId(user.id.0 as i64);
    let chat = ChatId(msg.chat.id.0);
    let (cmd, args) = parse_command(msg.text().unwrap_or(""));

    let is_admin = state.registry.is_admin(admin);

    let reply = match cmd.as_str() {
        "start" | "help" => {
            if is_admin {
                ADMIN_HELP.to_string()
            } else {
                USER_HELP.to_string()
            }
        }
        _ if !is_admin => format!("❌ {}", Error::PermissionDenied),
        "groups" => list_groups(&state),
        "toggle" => toggle_group(&state, &args),
        "allow" => allow_group(&state, &args),
        "block" => block_group(&state, &args).await,
        "addadmin" => add_admin(&state, &args),
        "send" => send_to_group(&state, &args).await,
        _ => "Unknown command. Use /help for the command list.".to_string(),
    };

    if is_admin {
        if let Err(e) = state.audit.write(AuditEvent::command(admin.0, &cmd, &args)) {
            tracing::warn!(error = %e, "failed to write command audit event");
        }
    }

    if let Err(e) = state.messenger.send_text(chat, &reply, None, None).await {
        tracing::warn!(chat = chat.0, error = %e, "failed to answer command");
    }

    Ok(())
}

/// Telegram may send `/cmd@botname arg1 ...`.
pub(crate) fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn parse_id_arg(args: &str, usage: &str) -> Result<i64> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("missing id, usage: {usage}")));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| Error::Validation(format!("id must be numeric, usage: {usage}")))
}

fn list_groups(state: &AppState) -> String {
    let groups = state.registry.groups_snapshot();
    if groups.is_empty() {
        return "No groups registered yet.".to_string();
    }

    let mut out = String::from("📋 Registered groups:\n");
    for group in groups {
        out.push_str(&format_group_line(&group));
    }
    out
}

fn format_group_line(group: &Group) -> String {
    let status = if group.active { "▶️ active" } else { "⏸ paused" };
    format!(
        "\n🏷 <b>{}</b>\nID: <code>{}</code> ({status})\nLast activity: {}\n",
        escape_html(&group.title),
        group.id,
        group.last_activity.format("%m-%d %H:%M"),
    )
}

fn toggle_group(state: &AppState, args: &str) -> String {
    let id = match parse_id_arg(args, "/toggle <chat_id>") {
        Ok(id) => ChatId(id),
        Err(e) => return format!("❌ {e}"),
    };

    match state.registry.toggle_active(id) {
        Ok(true) => format!("▶️ Forwarding enabled for <code>{id}</code>."),
        Ok(false) => format!("⏸ Forwarding paused for <code>{id}</code>."),
        Err(e) => format!("❌ {e}"),
    }
}

fn allow_group(state: &AppState, args: &str) -> String {
    let id = match parse_id_arg(args, "/allow <chat_id>") {
        Ok(id) => ChatId(id),
        Err(e) => return format!("❌ {e}"),
    };

    state.registry.allow(id);
    format!("✅ Group <code>{id}</code> is on the allow-list.")
}

async fn block_group(state: &AppState, args: &str) -> String {
    let id = match parse_id_arg(args, "/block <chat_id>") {
        Ok(id) => ChatId(id),
        Err(e) => return format!("❌ {e}"),
    };

    let Some(group) = state.registry.block(id) else {
        return format!("⛔ Group <code>{id}</code> is on the block-list.");
    };

    // The group was live: tell the chat and leave it, best-effort.
    let _ = state
        .messenger
        .send_text(
            group.id,
            "🚫 This group has been blocked; the relay is leaving.",
            None,
            None,
        )
        .await;
    if let Err(e) = state.messenger.leave_chat(group.id).await {
        tracing::warn!(chat = group.id.0, error = %e, "failed to leave blocked group");
    }

    format!(
        "⛔ Blocked and left <b>{}</b> (<code>{id}</code>).",
        escape_html(&group.title)
    )
}

fn add_admin(state: &AppState, args: &str) -> String {
    let id = match parse_id_arg(args, "/addadmin <user_id>") {
        Ok(id) => UserId(id),
        Err(e) => return format!("❌ {e}"),
    };

    if state.registry.add_admin(id) {
        format!("✅ User <code>{id}</code> is now an administrator.")
    } else {
        format!("ℹ️ User <code>{id}</code> is already an administrator.")
    }
}

async fn send_to_group(state: &AppState, args: &str) -> String {
    let mut parts = args.trim().splitn(2, char::is_whitespace);
    let id = match parse_id_arg(parts.next().unwrap_or(""), "/send <chat_id> <text>") {
        Ok(id) => ChatId(id),
        Err(e) => return format!("❌ {e}"),
    };
    let text = parts.next().unwrap_or("").trim();
    if text.is_empty() {
        return format!(
            "❌ {}",
            Error::Validation("missing text, usage: /send <chat_id> <text>".to_string())
        );
    }

    let Some(group) = state.registry.group(id) else {
        return format!("❌ {}", Error::GroupNotFound(id));
    };
    if !group.active {
        return format!("❌ {}", Error::GroupInactive(id));
    }

    match state
        .messenger
        .send_text(id, &escape_html(text), None, None)
        .await
    {
        Ok(_) => format!("✅ Sent to <b>{}</b>.", escape_html(&group.title)),
        Err(e) => format!("❌ Delivery failed: {}", escape_html(&e.to_string())),
    }
}
